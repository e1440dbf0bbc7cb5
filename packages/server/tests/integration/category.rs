use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn categories_are_admin_managed_and_listed_by_name() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let jane = app.attendee("Jane").await;

    let res = app
        .post(routes::CATEGORIES, &json!({"name": "Sports"}), &jane.token)
        .await;
    assert_eq!(res.status, 403);

    for name in ["Sports", "Culture", "Business"] {
        let res = app.post(routes::CATEGORIES, &json!({"name": name}), &admin.token).await;
        assert_eq!(res.status, 201, "{}", res.text);
    }

    let res = app.get_anonymous(routes::CATEGORIES).await;
    let names: Vec<_> = res.body["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["Business", "Culture", "Sports"]);
}

#[tokio::test]
async fn category_names_are_unique() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    app.post(routes::CATEGORIES, &json!({"name": "Sports"}), &admin.token)
        .await;

    let res = app
        .post(routes::CATEGORIES, &json!({"name": "Sports"}), &admin.token)
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["message"], "Category name already exists");
}

#[tokio::test]
async fn opportunity_category_in_use_cannot_be_deleted() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let org = app.organizer("Olga").await;
    let used = app.create_opportunity_category(&admin.token, "Jobs").await;
    let unused = app.create_opportunity_category(&admin.token, "Grants").await;
    app.create_opportunity(&org.token, used, json!({})).await;

    let res = app
        .delete(&routes::opportunity_category(used), &admin.token)
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "BUSINESS_RULE");

    let res = app
        .delete(&routes::opportunity_category(unused), &admin.token)
        .await;
    assert_eq!(res.status, 200);
}
