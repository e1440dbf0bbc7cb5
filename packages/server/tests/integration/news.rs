use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn published_at_is_stamped_on_first_publication_only() {
    let app = TestApp::spawn().await;
    let jane = app.attendee("Jane").await;

    let res = app
        .post(
            routes::NEWS,
            &json!({"title": "Draft", "content": "Body", "tags": [" music ", "music", "live"]}),
            &jane.token,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert!(res.body["publishedAt"].is_null());
    assert_eq!(res.body["tags"], json!(["music", "live"]));
    assert_eq!(res.body["authorId"], jane.id);
    let id = res.id();

    let published = app
        .patch(&routes::news(id), &json!({"status": "published"}), &jane.token)
        .await;
    assert_eq!(published.status, 200, "{}", published.text);
    let stamped = published.body["publishedAt"].clone();
    assert!(stamped.is_string());

    app.patch(&routes::news(id), &json!({"status": "archived"}), &jane.token)
        .await;
    let again = app
        .patch(&routes::news(id), &json!({"status": "published"}), &jane.token)
        .await;
    assert_eq!(again.body["publishedAt"], stamped);
}

#[tokio::test]
async fn only_author_or_admin_edits_news() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let jane = app.attendee("Jane").await;
    let john = app.attendee("John").await;
    let res = app
        .post(routes::NEWS, &json!({"title": "Hello", "content": "Body"}), &jane.token)
        .await;
    let id = res.id();

    let res = app
        .patch(&routes::news(id), &json!({"title": "Hijacked"}), &john.token)
        .await;
    assert_eq!(res.status, 403);

    let res = app.delete(&routes::news(id), &john.token).await;
    assert_eq!(res.status, 403);

    let res = app.delete(&routes::news(id), &admin.token).await;
    assert_eq!(res.status, 200);
}

#[tokio::test]
async fn unknown_category_is_not_found() {
    let app = TestApp::spawn().await;
    let jane = app.attendee("Jane").await;

    let res = app
        .post(
            routes::NEWS,
            &json!({"title": "Hello", "content": "Body", "categoryId": 99}),
            &jane.token,
        )
        .await;

    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn list_filters_by_status_and_reports_stats() {
    let app = TestApp::spawn().await;
    let jane = app.attendee("Jane").await;
    for (title, status) in [("A", "published"), ("B", "published"), ("C", "draft")] {
        let res = app
            .post(
                routes::NEWS,
                &json!({"title": title, "content": "Body", "status": status}),
                &jane.token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
    }

    let res = app
        .get_anonymous(&format!("{}?status=published&includeStats=true", routes::NEWS))
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["pagination"]["total"], 2);
    assert_eq!(res.body["stats"]["total"], 3);
    assert_eq!(res.body["stats"]["byStatus"]["draft"], 1);
    assert_eq!(res.body["stats"]["publishedLast7Days"], 2);
}

#[tokio::test]
async fn deleting_a_category_detaches_its_news() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let jane = app.attendee("Jane").await;
    let category = app
        .post(routes::CATEGORIES, &json!({"name": "Culture"}), &admin.token)
        .await;
    assert_eq!(category.status, 201, "{}", category.text);
    let category_id = category.id();

    let news = app
        .post(
            routes::NEWS,
            &json!({"title": "Hello", "content": "Body", "categoryId": category_id}),
            &jane.token,
        )
        .await;
    assert_eq!(news.body["categoryId"], category_id);

    let res = app.delete(&routes::category(category_id), &admin.token).await;
    assert_eq!(res.status, 200, "{}", res.text);

    let res = app.get_anonymous(&routes::news(news.id())).await;
    assert!(res.body["categoryId"].is_null());
}
