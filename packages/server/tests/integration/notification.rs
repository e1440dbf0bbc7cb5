use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn admin_notifies_a_user_who_marks_it_read() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let jane = app.attendee("Jane").await;

    let res = app
        .post(
            routes::NOTIFICATIONS,
            &json!({"userId": jane.id, "message": "Welcome aboard"}),
            &admin.token,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    let id = res.id();

    let unread = app
        .get(&format!("{}?unread=true", routes::NOTIFICATIONS), &jane.token)
        .await;
    assert_eq!(unread.body["pagination"]["total"], 1);

    let res = app
        .patch(&routes::notification(id), &json!({"isRead": true}), &jane.token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["isRead"], true);

    let unread = app
        .get(&format!("{}?unread=true", routes::NOTIFICATIONS), &jane.token)
        .await;
    assert_eq!(unread.body["pagination"]["total"], 0);
}

#[tokio::test]
async fn users_only_see_their_own_notifications() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let jane = app.attendee("Jane").await;
    let john = app.attendee("John").await;
    let res = app
        .post(
            routes::NOTIFICATIONS,
            &json!({"userId": jane.id, "message": "For Jane"}),
            &admin.token,
        )
        .await;
    let id = res.id();

    let res = app.get(routes::NOTIFICATIONS, &john.token).await;
    assert_eq!(res.body["pagination"]["total"], 0);

    assert_eq!(app.get(&routes::notification(id), &john.token).await.status, 403);
    assert_eq!(app.delete(&routes::notification(id), &john.token).await.status, 403);
    assert_eq!(app.delete(&routes::notification(id), &jane.token).await.status, 200);
}

#[tokio::test]
async fn only_admins_send_notifications_to_existing_users() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let jane = app.attendee("Jane").await;

    let res = app
        .post(
            routes::NOTIFICATIONS,
            &json!({"userId": jane.id, "message": "Spam"}),
            &jane.token,
        )
        .await;
    assert_eq!(res.status, 403);

    let res = app
        .post(
            routes::NOTIFICATIONS,
            &json!({"userId": 999, "message": "Nobody"}),
            &admin.token,
        )
        .await;
    assert_eq!(res.status, 404);

    let res = app
        .post(
            routes::NOTIFICATIONS,
            &json!({"userId": jane.id, "message": "   "}),
            &admin.token,
        )
        .await;
    assert_eq!(res.status, 400);
}
