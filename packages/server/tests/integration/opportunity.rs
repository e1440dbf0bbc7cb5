use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn any_user_posts_an_opportunity_in_an_existing_category() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let jane = app.attendee("Jane").await;
    let category = app.create_opportunity_category(&admin.token, "Jobs").await;

    let id = app.create_opportunity(&jane.token, category, json!({"isRemote": true})).await;

    let res = app.get_anonymous(&routes::opportunity(id)).await;
    assert_eq!(res.body["authorId"], jane.id);
    assert_eq!(res.body["status"], "open");
    assert_eq!(res.body["isRemote"], true);

    let res = app
        .post(
            routes::OPPORTUNITIES,
            &json!({
                "title": "Orphan",
                "description": "No category",
                "deadline": "2099-01-01T00:00:00Z",
                "categoryId": 999,
            }),
            &jane.token,
        )
        .await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn deleting_an_opportunity_removes_its_applicants() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let author = app.organizer("Olga").await;
    let other = app.organizer("Oscar").await;
    let category = app.create_opportunity_category(&admin.token, "Jobs").await;
    let id = app.create_opportunity(&author.token, category, json!({})).await;
    let res = app
        .post_anonymous(
            &routes::apply(id),
            &json!({"name": "Abebe", "email": "a@example.com"}),
        )
        .await;
    let applicant_id = res.id();

    let res = app.delete(&routes::opportunity(id), &other.token).await;
    assert_eq!(res.status, 403);

    let res = app.delete(&routes::opportunity(id), &author.token).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(app.get_anonymous(&routes::opportunity(id)).await.status, 404);
    assert_eq!(
        app.get(&routes::applicant(applicant_id), &admin.token).await.status,
        404
    );
}

#[tokio::test]
async fn list_filters_and_stats() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let jane = app.attendee("Jane").await;
    let jobs = app.create_opportunity_category(&admin.token, "Jobs").await;
    let grants = app.create_opportunity_category(&admin.token, "Grants").await;
    app.create_opportunity(&jane.token, jobs, json!({"isRemote": true})).await;
    app.create_opportunity(&jane.token, jobs, json!({"status": "closed"})).await;
    app.create_opportunity(&jane.token, grants, json!({})).await;

    let res = app
        .get_anonymous(&format!("{}?categoryId={jobs}", routes::OPPORTUNITIES))
        .await;
    assert_eq!(res.body["pagination"]["total"], 2);

    let res = app
        .get_anonymous(&format!("{}?isRemote=true", routes::OPPORTUNITIES))
        .await;
    assert_eq!(res.body["pagination"]["total"], 1);

    let res = app
        .get_anonymous(&format!("{}?includeStats=true", routes::OPPORTUNITIES))
        .await;
    assert_eq!(res.body["stats"]["total"], 3);
    assert_eq!(res.body["stats"]["byStatus"]["open"], 2);
    assert_eq!(res.body["stats"]["byStatus"]["closed"], 1);
    assert_eq!(res.body["stats"]["createdLast7Days"], 3);
}
