use reqwest::Method;
use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn event_owner_adds_guests_and_anyone_lists_them() {
    let app = TestApp::spawn().await;
    let org = app.organizer("Olga").await;
    let event_id = app.create_event(&org.token, json!({})).await;

    app.create_guest(event_id, &org.token, "Speaker One").await;
    app.create_guest(event_id, &org.token, "Speaker Two").await;

    let res = app.get_anonymous(&routes::event_guests(event_id)).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["pagination"]["total"], 2);
    assert_eq!(res.body["guests"][0]["eventId"], event_id);

    let res = app
        .get_anonymous(&format!("{}?eventId={event_id}&limit=1", routes::GUESTS))
        .await;
    assert_eq!(res.body["guests"].as_array().map(Vec::len), Some(1));
    assert_eq!(res.body["pagination"]["hasMore"], true);
}

#[tokio::test]
async fn guests_of_a_missing_event_are_not_found() {
    let app = TestApp::spawn().await;

    let res = app.get_anonymous(&routes::event_guests(42)).await;

    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn other_organizer_cannot_add_or_edit_guests() {
    let app = TestApp::spawn().await;
    let org = app.organizer("Olga").await;
    let other = app.organizer("Oscar").await;
    let event_id = app.create_event(&org.token, json!({})).await;
    let guest_id = app.create_guest(event_id, &org.token, "Speaker").await;

    let res = app
        .post(&routes::event_guests(event_id), &json!({"name": "Crasher"}), &other.token)
        .await;
    assert_eq!(res.status, 403);

    let res = app
        .patch(&routes::guest(guest_id), &json!({"name": "Renamed"}), &other.token)
        .await;
    assert_eq!(res.status, 403);

    let res = app.delete(&routes::guest(guest_id), &other.token).await;
    assert_eq!(res.status, 403);
}

#[tokio::test]
async fn owner_updates_and_deletes_a_guest() {
    let app = TestApp::spawn().await;
    let org = app.organizer("Olga").await;
    let event_id = app.create_event(&org.token, json!({})).await;
    let guest_id = app.create_guest(event_id, &org.token, "Speaker").await;

    let res = app
        .multipart(
            Method::PATCH,
            &routes::guest(guest_id),
            &json!({"profession": null, "membership": "Gold"}),
            vec![("image", "face.jpg", "image/jpeg", vec![0xff, 0xd8, 0xff])],
            Some(&org.token),
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert!(res.body["profession"].is_null());
    assert_eq!(res.body["membership"], "Gold");
    assert!(
        res.body["image"]
            .as_str()
            .is_some_and(|p| p.starts_with("/uploads/guests/guest-"))
    );

    let res = app.delete(&routes::guest(guest_id), &org.token).await;
    assert_eq!(res.status, 200);
    assert_eq!(app.get_anonymous(&routes::guest(guest_id)).await.status, 404);
}

#[tokio::test]
async fn guest_cannot_be_moved_to_another_event() {
    let app = TestApp::spawn().await;
    let org = app.organizer("Olga").await;
    let event_id = app.create_event(&org.token, json!({})).await;
    let guest_id = app.create_guest(event_id, &org.token, "Speaker").await;

    let res = app
        .patch(&routes::guest(guest_id), &json!({"eventId": 7}), &org.token)
        .await;

    assert_eq!(res.status, 400);
}
