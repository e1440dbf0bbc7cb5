use reqwest::Method;
use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait};
use serde_json::json;

use crate::common::{TestApp, routes};
use server::entity::{calendar, event, guest, registration};

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

mod create {
    use super::*;

    #[tokio::test]
    async fn organizer_creates_event_with_calendar_and_notification() {
        let app = TestApp::spawn().await;
        let org = app.organizer("Olga").await;

        let id = app.create_event(&org.token, json!({"isRecurring": true, "recurrencePattern": "weekly"})).await;

        let res = app.get_anonymous(&routes::event(id)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["organizerId"], org.id);
        assert_eq!(res.body["location"]["city"], "Addis Ababa");
        assert_eq!(res.body["status"], "upcoming");

        let cal = app
            .get_anonymous(&format!("{}?eventId={id}", routes::CALENDARS))
            .await;
        assert_eq!(cal.body["pagination"]["total"], 1);
        assert_eq!(cal.body["calendars"][0]["startDate"], "2099-05-01");
        assert_eq!(cal.body["calendars"][0]["recurrencePattern"], "weekly");

        let notes = app.get(routes::NOTIFICATIONS, &org.token).await;
        assert_eq!(notes.body["pagination"]["total"], 1);
        assert_eq!(
            notes.body["notifications"][0]["message"],
            "There is a new event: Community Meetup"
        );
    }

    #[tokio::test]
    async fn attendee_cannot_create_events() {
        let app = TestApp::spawn().await;
        let jane = app.attendee("Jane").await;

        let res = app
            .post(
                routes::EVENTS,
                &json!({
                    "title": "Party",
                    "startDateTime": "2099-05-01T18:00:00Z",
                    "endDateTime": "2099-05-01T21:00:00Z",
                }),
                &jane.token,
            )
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn client_supplied_organizer_is_ignored() {
        let app = TestApp::spawn().await;
        let org = app.organizer("Olga").await;
        let other = app.organizer("Oscar").await;

        let id = app.create_event(&org.token, json!({"organizerId": other.id})).await;

        let res = app.get_anonymous(&routes::event(id)).await;
        assert_eq!(res.body["organizerId"], org.id);
    }

    #[tokio::test]
    async fn inconsistent_fields_are_rejected() {
        let app = TestApp::spawn().await;
        let org = app.organizer("Olga").await;

        let res = app
            .post(
                routes::EVENTS,
                &json!({
                    "title": "Backwards",
                    "startDateTime": "2099-05-02T18:00:00Z",
                    "endDateTime": "2099-05-01T18:00:00Z",
                    "isPaid": true,
                    "location": {"lat": 123.0},
                }),
                &org.token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(res.body["errors"].as_array().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn unknown_fields_are_rejected() {
        let app = TestApp::spawn().await;
        let org = app.organizer("Olga").await;

        let res = app
            .post(
                routes::EVENTS,
                &json!({
                    "title": "Meetup",
                    "startDateTime": "2099-05-01T18:00:00Z",
                    "endDateTime": "2099-05-01T21:00:00Z",
                    "sponsor": "ACME",
                }),
                &org.token,
            )
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn multipart_images_are_stored_and_served() {
        let app = TestApp::spawn().await;
        let org = app.organizer("Olga").await;

        let res = app
            .multipart(
                Method::POST,
                routes::EVENTS,
                &json!({
                    "title": "Gallery",
                    "startDateTime": "2099-05-01T18:00:00Z",
                    "endDateTime": "2099-05-01T21:00:00Z",
                }),
                vec![
                    ("mainImage", "cover.png", "image/png", PNG.to_vec()),
                    ("images", "a.png", "image/png", PNG.to_vec()),
                    ("images", "b.png", "image/png", PNG.to_vec()),
                ],
                Some(&org.token),
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);

        let main = res.body["mainImage"].as_str().expect("mainImage").to_string();
        assert!(main.starts_with("/uploads/events/event-"));
        assert_eq!(res.body["images"].as_array().map(Vec::len), Some(2));

        let file = app.get_raw(&main).await;
        assert_eq!(file.status(), 200);
        assert_eq!(file.headers()["content-type"], "image/png");
        assert_eq!(file.bytes().await.unwrap().as_ref(), PNG);
    }

    #[tokio::test]
    async fn rejected_gallery_leaves_no_files_behind() {
        let app = TestApp::spawn().await;
        let org = app.organizer("Olga").await;

        let res = app
            .multipart(
                Method::POST,
                routes::EVENTS,
                &json!({
                    "title": "Gallery",
                    "startDateTime": "2099-05-01T18:00:00Z",
                    "endDateTime": "2099-05-01T21:00:00Z",
                }),
                vec![
                    ("mainImage", "cover.png", "image/png", PNG.to_vec()),
                    ("images", "a.png", "image/png", PNG.to_vec()),
                    ("images", "run.sh", "application/x-sh", b"#!/bin/sh".to_vec()),
                ],
                Some(&org.token),
            )
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(app.stored_uploads("events"), 0);
    }

    #[tokio::test]
    async fn failed_insert_removes_stored_images() {
        let app = TestApp::spawn().await;
        let org = app.organizer("Olga").await;
        app.db
            .execute_unprepared(
                "CREATE TRIGGER event_insert_fails BEFORE INSERT ON event \
                 BEGIN SELECT RAISE(ABORT, 'simulated event insert failure'); END;",
            )
            .await
            .unwrap();

        let res = app
            .multipart(
                Method::POST,
                routes::EVENTS,
                &json!({
                    "title": "Gallery",
                    "startDateTime": "2099-05-01T18:00:00Z",
                    "endDateTime": "2099-05-01T21:00:00Z",
                }),
                vec![
                    ("mainImage", "cover.png", "image/png", PNG.to_vec()),
                    ("images", "a.png", "image/png", PNG.to_vec()),
                ],
                Some(&org.token),
            )
            .await;

        assert_eq!(res.status, 500);
        assert_eq!(app.stored_uploads("events"), 0);
    }

    #[tokio::test]
    async fn non_image_upload_is_rejected() {
        let app = TestApp::spawn().await;
        let org = app.organizer("Olga").await;

        let res = app
            .multipart(
                Method::POST,
                routes::EVENTS,
                &json!({
                    "title": "Gallery",
                    "startDateTime": "2099-05-01T18:00:00Z",
                    "endDateTime": "2099-05-01T21:00:00Z",
                }),
                vec![("mainImage", "run.sh", "application/x-sh", b"#!/bin/sh".to_vec())],
                Some(&org.token),
            )
            .await;

        assert_eq!(res.status, 400);
        let count = event::Entity::find().count(&app.db).await.unwrap();
        assert_eq!(count, 0);
    }
}

mod read {
    use super::*;

    #[tokio::test]
    async fn repeated_get_returns_identical_body() {
        let app = TestApp::spawn().await;
        let org = app.organizer("Olga").await;
        let id = app.create_event(&org.token, json!({})).await;

        let first = app.get_anonymous(&routes::event(id)).await;
        let second = app.get_anonymous(&routes::event(id)).await;

        assert_eq!(first.status, 200);
        assert_eq!(first.text, second.text);
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn owner_updates_and_calendar_follows() {
        let app = TestApp::spawn().await;
        let org = app.organizer("Olga").await;
        let id = app.create_event(&org.token, json!({})).await;

        let res = app
            .patch(
                &routes::event(id),
                &json!({
                    "startDateTime": "2099-06-01T10:00:00Z",
                    "endDateTime": "2099-06-02T12:00:00Z",
                    "location": {"place": null},
                }),
                &org.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["location"]["city"], "Addis Ababa");
        assert!(res.body["location"]["place"].is_null());

        let cal = app
            .get_anonymous(&format!("{}?eventId={id}", routes::CALENDARS))
            .await;
        assert_eq!(cal.body["calendars"][0]["startDate"], "2099-06-01");
        assert_eq!(cal.body["calendars"][0]["endDate"], "2099-06-02");
    }

    #[tokio::test]
    async fn null_location_clears_every_part() {
        let app = TestApp::spawn().await;
        let org = app.organizer("Olga").await;
        let id = app.create_event(&org.token, json!({})).await;

        let res = app
            .patch(&routes::event(id), &json!({"location": null}), &org.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        for part in ["city", "place", "lat", "lng"] {
            assert!(res.body["location"][part].is_null(), "{part} kept");
        }

        let stored = event::Entity::find_by_id(id).one(&app.db).await.unwrap().unwrap();
        assert!(stored.city.is_none() && stored.lat.is_none());
    }

    #[tokio::test]
    async fn other_organizer_cannot_update() {
        let app = TestApp::spawn().await;
        let org = app.organizer("Olga").await;
        let other = app.organizer("Oscar").await;
        let id = app.create_event(&org.token, json!({})).await;

        let res = app
            .patch(&routes::event(id), &json!({"title": "Mine now"}), &other.token)
            .await;

        assert_eq!(res.status, 403);
        let res = app.get_anonymous(&routes::event(id)).await;
        assert_eq!(res.body["title"], "Community Meetup");
    }

    #[tokio::test]
    async fn end_before_existing_start_is_rejected() {
        let app = TestApp::spawn().await;
        let org = app.organizer("Olga").await;
        let id = app.create_event(&org.token, json!({})).await;

        let res = app
            .patch(
                &routes::event(id),
                &json!({"endDateTime": "2099-04-01T00:00:00Z"}),
                &org.token,
            )
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn gallery_is_replaced_unless_appending() {
        let app = TestApp::spawn().await;
        let org = app.organizer("Olga").await;
        let id = app.create_event(&org.token, json!({})).await;
        let image = || vec![("images", "a.png", "image/png", PNG.to_vec())];

        let res = app
            .multipart(Method::PATCH, &routes::event(id), &json!({}), image(), Some(&org.token))
            .await;
        assert_eq!(res.body["images"].as_array().map(Vec::len), Some(1));

        let res = app
            .multipart(
                Method::PATCH,
                &format!("{}?append=true", routes::event(id)),
                &json!({}),
                image(),
                Some(&org.token),
            )
            .await;
        assert_eq!(res.body["images"].as_array().map(Vec::len), Some(2));

        let res = app
            .multipart(Method::PATCH, &routes::event(id), &json!({}), image(), Some(&org.token))
            .await;
        assert_eq!(res.body["images"].as_array().map(Vec::len), Some(1));
    }
}

mod delete {
    use super::*;

    async fn count_children(app: &TestApp, event_id: i32) -> (u64, u64, u64) {
        use sea_orm::{ColumnTrait, QueryFilter};

        let calendars = calendar::Entity::find()
            .filter(calendar::Column::EventId.eq(event_id))
            .count(&app.db)
            .await
            .unwrap();
        let guests = guest::Entity::find()
            .filter(guest::Column::EventId.eq(event_id))
            .count(&app.db)
            .await
            .unwrap();
        let registrations = registration::Entity::find()
            .filter(registration::Column::EventId.eq(event_id))
            .count(&app.db)
            .await
            .unwrap();
        (calendars, guests, registrations)
    }

    #[tokio::test]
    async fn only_owner_or_admin_may_delete_and_cascade_is_complete() {
        let app = TestApp::spawn().await;
        let admin = app.admin().await;
        let owner = app.organizer("Olga").await;
        let other = app.organizer("Oscar").await;
        let jane = app.attendee("Jane").await;

        let id = app.create_event(&owner.token, json!({})).await;
        app.create_guest(id, &owner.token, "Speaker One").await;
        app.create_guest(id, &owner.token, "Speaker Two").await;
        let res = app
            .post(routes::REGISTRATIONS, &json!({"eventId": id}), &jane.token)
            .await;
        assert_eq!(res.status, 201, "{}", res.text);

        let res = app.delete(&routes::event(id), &other.token).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "FORBIDDEN");
        assert_eq!(count_children(&app, id).await, (1, 2, 1));
        assert_eq!(app.get_anonymous(&routes::event(id)).await.status, 200);

        let res = app.delete(&routes::event(id), &admin.token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "Event deleted successfully");

        assert_eq!(app.get_anonymous(&routes::event(id)).await.status, 404);
        let guests = app
            .get_anonymous(&format!("{}?eventId={id}", routes::GUESTS))
            .await;
        assert_eq!(guests.body["pagination"]["total"], 0);
        let regs = app
            .get(&format!("{}?eventId={id}", routes::REGISTRATIONS), &admin.token)
            .await;
        assert_eq!(regs.body["pagination"]["total"], 0);
        assert_eq!(count_children(&app, id).await, (0, 0, 0));
    }

    #[tokio::test]
    async fn owner_may_delete_own_event() {
        let app = TestApp::spawn().await;
        let owner = app.organizer("Olga").await;
        let id = app.create_event(&owner.token, json!({})).await;

        let res = app.delete(&routes::event(id), &owner.token).await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn missing_event_is_not_found_even_for_non_owners() {
        let app = TestApp::spawn().await;
        let jane = app.attendee("Jane").await;

        let res = app.delete(&routes::event(999), &jane.token).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn failing_step_rolls_back_everything() {
        let app = TestApp::spawn().await;
        let owner = app.organizer("Olga").await;
        let jane = app.attendee("Jane").await;
        let id = app.create_event(&owner.token, json!({})).await;
        app.create_guest(id, &owner.token, "Speaker").await;
        app.post(routes::REGISTRATIONS, &json!({"eventId": id}), &jane.token)
            .await;

        app.db
            .execute_unprepared(
                "CREATE TRIGGER guest_delete_fails BEFORE DELETE ON guest \
                 BEGIN SELECT RAISE(ABORT, 'simulated guest delete failure'); END;",
            )
            .await
            .unwrap();

        let res = app.delete(&routes::event(id), &owner.token).await;
        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"], "INTERNAL_ERROR");

        assert_eq!(app.get_anonymous(&routes::event(id)).await.status, 200);
        assert_eq!(count_children(&app, id).await, (1, 1, 1));
    }
}

mod list {
    use super::*;

    #[tokio::test]
    async fn pagination_walks_the_whole_set() {
        let app = TestApp::spawn().await;
        let org = app.organizer("Olga").await;
        for day in 1..=25 {
            app.create_event(
                &org.token,
                json!({
                    "title": format!("Event {day}"),
                    "startDateTime": format!("2099-01-{day:02}T10:00:00Z"),
                    "endDateTime": format!("2099-01-{day:02}T12:00:00Z"),
                }),
            )
            .await;
        }

        let res = app
            .get_anonymous(&format!("{}?page=2&limit=10", routes::EVENTS))
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["events"].as_array().map(Vec::len), Some(10));
        assert_eq!(res.body["events"][0]["title"], "Event 11");
        assert_eq!(res.body["pagination"]["total"], 25);
        assert_eq!(res.body["pagination"]["totalPages"], 3);
        assert_eq!(res.body["pagination"]["currentPage"], 2);
        assert_eq!(res.body["pagination"]["hasMore"], true);

        let res = app
            .get_anonymous(&format!("{}?page=4&limit=10", routes::EVENTS))
            .await;
        assert_eq!(res.body["events"].as_array().map(Vec::len), Some(0));
        assert_eq!(res.body["pagination"]["hasMore"], false);

        let res = app
            .get_anonymous(&format!("{}?limit=1000", routes::EVENTS))
            .await;
        assert_eq!(res.body["pagination"]["perPage"], 100);
    }

    #[tokio::test]
    async fn page_far_past_the_end_is_empty() {
        let app = TestApp::spawn().await;
        let org = app.organizer("Olga").await;
        app.create_event(&org.token, json!({})).await;

        let res = app
            .get_anonymous(&format!("{}?page={}&limit=100", routes::EVENTS, u64::MAX))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["events"].as_array().map(Vec::len), Some(0));
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["pagination"]["hasMore"], false);
    }

    #[tokio::test]
    async fn filters_and_stats() {
        let app = TestApp::spawn().await;
        let org = app.organizer("Olga").await;
        app.create_event(&org.token, json!({"category": "music"})).await;
        app.create_event(&org.token, json!({"category": "tech", "isActive": false}))
            .await;
        app.create_event(
            &org.token,
            json!({
                "startDateTime": "2001-01-01T10:00:00Z",
                "endDateTime": "2001-01-01T12:00:00Z",
                "status": "completed",
            }),
        )
        .await;

        let res = app
            .get_anonymous(&format!("{}?category=music", routes::EVENTS))
            .await;
        assert_eq!(res.body["pagination"]["total"], 1);

        let res = app
            .get_anonymous(&format!("{}?isActive=false", routes::EVENTS))
            .await;
        assert_eq!(res.body["pagination"]["total"], 1);

        let res = app
            .get_anonymous(&format!("{}?includeStats=true", routes::EVENTS))
            .await;
        let stats = &res.body["stats"];
        assert_eq!(stats["total"], 3);
        assert_eq!(stats["byStatus"]["upcoming"], 2);
        assert_eq!(stats["byCategory"]["tech"], 2);
        assert_eq!(stats["upcoming"], 2);
        assert_eq!(stats["past"], 1);
        assert_eq!(stats["createdLast7Days"], 3);
    }

    #[tokio::test]
    async fn bad_query_parameter_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .get_anonymous(&format!("{}?status=maybe", routes::EVENTS))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod dashboard {
    use super::*;

    #[tokio::test]
    async fn admin_sees_counts_and_recent_events() {
        let app = TestApp::spawn().await;
        let admin = app.admin().await;
        let org = app.organizer("Olga").await;
        for _ in 0..6 {
            app.create_event(&org.token, json!({})).await;
        }
        app.create_event(
            &org.token,
            json!({
                "startDateTime": "2001-01-01T10:00:00Z",
                "endDateTime": "2001-01-01T12:00:00Z",
                "isActive": false,
            }),
        )
        .await;

        let res = app.get(routes::DASHBOARD, &admin.token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["totalEvents"], 7);
        assert_eq!(res.body["upcomingEvents"], 6);
        assert_eq!(res.body["pastEvents"], 1);
        assert_eq!(res.body["ongoingEvents"], 0);
        assert_eq!(res.body["inactiveEvents"], 1);
        assert_eq!(res.body["recentEvents"].as_array().map(Vec::len), Some(5));
    }

    #[tokio::test]
    async fn dashboard_is_admin_only() {
        let app = TestApp::spawn().await;
        let org = app.organizer("Olga").await;

        let res = app.get(routes::DASHBOARD, &org.token).await;
        assert_eq!(res.status, 403);
    }
}
