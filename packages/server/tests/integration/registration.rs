use chrono::Utc;
use ::common::RegistrationStatus;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde_json::json;

use crate::common::{TestApp, routes};
use server::entity::registration;

#[tokio::test]
async fn free_registration_is_pending_without_payment() {
    let app = TestApp::spawn().await;
    let org = app.organizer("Olga").await;
    let jane = app.attendee("Jane").await;
    let event_id = app.create_event(&org.token, json!({})).await;

    let res = app
        .post(
            routes::REGISTRATIONS,
            &json!({"eventId": event_id, "userId": 12345}),
            &jane.token,
        )
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["registration"]["userId"], jane.id);
    assert_eq!(res.body["registration"]["status"], "pending");
    assert!(res.body.get("checkoutUrl").is_none());
    assert!(app.gateway.requests.lock().unwrap().is_empty());

    let payments = app.get(routes::PAYMENTS, &jane.token).await;
    assert_eq!(payments.body["pagination"]["total"], 0);
}

#[tokio::test]
async fn paid_registration_goes_through_the_gateway() {
    let app = TestApp::spawn().await;
    let org = app.organizer("Olga").await;
    let jane = app.attendee("Jane").await;
    let event_id = app
        .create_event(&org.token, json!({"isPaid": true, "price": 250.0}))
        .await;

    let missing_method = app
        .post(routes::REGISTRATIONS, &json!({"eventId": event_id}), &jane.token)
        .await;
    assert_eq!(missing_method.status, 400);

    let wrong_amount = app
        .post(
            routes::REGISTRATIONS,
            &json!({"eventId": event_id, "paymentMethod": "chapa", "amount": 10.0}),
            &jane.token,
        )
        .await;
    assert_eq!(wrong_amount.status, 400);

    let res = app
        .post(
            routes::REGISTRATIONS,
            &json!({"eventId": event_id, "paymentMethod": "chapa", "amount": 250.0}),
            &jane.token,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    let reference = res.body["registration"]["paymentReference"]
        .as_str()
        .expect("payment reference")
        .to_string();
    assert!(reference.starts_with(&format!("evt-{event_id}-")));
    assert_eq!(
        res.body["checkoutUrl"],
        format!("https://checkout.test/{reference}")
    );
    assert_eq!(res.body["registration"]["amount"], 250.0);

    {
        let requests = app.gateway.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].email, "jane@example.com");
        assert_eq!(requests[0].amount, 250.0);
    }

    let payments = app.get(routes::PAYMENTS, &jane.token).await;
    assert_eq!(payments.body["pagination"]["total"], 1);
    assert_eq!(payments.body["payments"][0]["paymentStatus"], "pending");
    assert_eq!(payments.body["payments"][0]["transactionId"], reference);

    let stranger = app.attendee("John").await;
    let payments = app.get(routes::PAYMENTS, &stranger.token).await;
    assert_eq!(payments.body["pagination"]["total"], 0);
}

#[tokio::test]
async fn duplicate_closed_and_full_events_are_refused() {
    let app = TestApp::spawn().await;
    let org = app.organizer("Olga").await;
    let jane = app.attendee("Jane").await;
    let john = app.attendee("John").await;
    let tiny = app.create_event(&org.token, json!({"capacity": 1})).await;
    let canceled = app
        .create_event(&org.token, json!({"status": "canceled"}))
        .await;

    let res = app
        .post(routes::REGISTRATIONS, &json!({"eventId": tiny}), &jane.token)
        .await;
    assert_eq!(res.status, 201);

    let duplicate = app
        .post(routes::REGISTRATIONS, &json!({"eventId": tiny}), &jane.token)
        .await;
    assert_eq!(duplicate.status, 400);
    assert_eq!(duplicate.body["message"], "You are already registered for this event");

    let full = app
        .post(routes::REGISTRATIONS, &json!({"eventId": tiny}), &john.token)
        .await;
    assert_eq!(full.body["message"], "This event is fully booked");

    let closed = app
        .post(routes::REGISTRATIONS, &json!({"eventId": canceled}), &john.token)
        .await;
    assert_eq!(closed.status, 400);
    assert_eq!(closed.body["code"], "BUSINESS_RULE");

    let missing = app
        .post(routes::REGISTRATIONS, &json!({"eventId": 999}), &john.token)
        .await;
    assert_eq!(missing.status, 404);
}

#[tokio::test]
async fn organizer_sees_registrations_to_own_events() {
    let app = TestApp::spawn().await;
    let org = app.organizer("Olga").await;
    let other = app.organizer("Oscar").await;
    let jane = app.attendee("Jane").await;
    let free = app.create_event(&org.token, json!({})).await;
    let paid = app
        .create_event(&org.token, json!({"isPaid": true, "price": 100.0}))
        .await;
    app.post(routes::REGISTRATIONS, &json!({"eventId": free}), &jane.token)
        .await;
    app.post(
        routes::REGISTRATIONS,
        &json!({"eventId": paid, "paymentMethod": "chapa"}),
        &jane.token,
    )
    .await;

    let res = app
        .get(&format!("{}?includeStats=true", routes::REGISTRATIONS), &org.token)
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["pagination"]["total"], 2);
    assert_eq!(res.body["stats"]["paid"], 1);
    assert_eq!(res.body["stats"]["free"], 1);

    let res = app.get(routes::REGISTRATIONS, &other.token).await;
    assert_eq!(res.body["pagination"]["total"], 0);

    let res = app
        .get(&format!("{}?eventId={free}", routes::REGISTRATIONS), &jane.token)
        .await;
    assert_eq!(res.body["pagination"]["total"], 1);
}

#[tokio::test]
async fn registrant_updates_and_deletes_with_payments() {
    let app = TestApp::spawn().await;
    let org = app.organizer("Olga").await;
    let jane = app.attendee("Jane").await;
    let john = app.attendee("John").await;
    let event_id = app
        .create_event(&org.token, json!({"isPaid": true, "price": 100.0}))
        .await;
    let res = app
        .post(
            routes::REGISTRATIONS,
            &json!({"eventId": event_id, "paymentMethod": "chapa"}),
            &jane.token,
        )
        .await;
    let id = res.body["registration"]["id"].as_i64().unwrap() as i32;

    let res = app
        .patch(&routes::registration(id), &json!({"status": "canceled"}), &john.token)
        .await;
    assert_eq!(res.status, 403);

    let res = app
        .patch(&routes::registration(id), &json!({"eventId": 1}), &jane.token)
        .await;
    assert_eq!(res.status, 400);

    let res = app
        .patch(&routes::registration(id), &json!({"status": "confirmed"}), &jane.token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["status"], "confirmed");

    let res = app.delete(&routes::registration(id), &jane.token).await;
    assert_eq!(res.status, 200, "{}", res.text);
    let payments = app.get(routes::PAYMENTS, &jane.token).await;
    assert_eq!(payments.body["pagination"]["total"], 0);
}

#[tokio::test]
async fn payment_updates_are_admin_only() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let org = app.organizer("Olga").await;
    let jane = app.attendee("Jane").await;
    let event_id = app
        .create_event(&org.token, json!({"isPaid": true, "price": 100.0}))
        .await;
    app.post(
        routes::REGISTRATIONS,
        &json!({"eventId": event_id, "paymentMethod": "chapa"}),
        &jane.token,
    )
    .await;
    let payments = app.get(routes::PAYMENTS, &jane.token).await;
    let payment_id = payments.body["payments"][0]["id"].as_i64().unwrap();
    let path = format!("{}/{payment_id}", routes::PAYMENTS);

    let res = app
        .patch(&path, &json!({"paymentStatus": "completed"}), &jane.token)
        .await;
    assert_eq!(res.status, 403);

    let res = app
        .patch(&path, &json!({"paymentStatus": "completed"}), &admin.token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["paymentStatus"], "completed");

    let res = app.get(&path, &jane.token).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["paymentStatus"], "completed");
}

#[tokio::test]
async fn manual_payment_needs_an_owned_registration_and_unique_transaction() {
    let app = TestApp::spawn().await;
    let org = app.organizer("Olga").await;
    let jane = app.attendee("Jane").await;
    let john = app.attendee("John").await;
    let event_id = app.create_event(&org.token, json!({})).await;
    let res = app
        .post(routes::REGISTRATIONS, &json!({"eventId": event_id}), &jane.token)
        .await;
    let registration_id = res.body["registration"]["id"].clone();
    let body = json!({
        "registrationId": registration_id,
        "amount": 50.0,
        "paymentMethod": "bank_transfer",
        "transactionId": "TX-1",
    });

    let res = app.post(routes::PAYMENTS, &body, &john.token).await;
    assert_eq!(res.status, 403);

    let res = app.post(routes::PAYMENTS, &body, &jane.token).await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["paymentStatus"], "pending");

    let res = app.post(routes::PAYMENTS, &body, &jane.token).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["message"], "transactionId already exists");

    let res = app
        .post(
            routes::PAYMENTS,
            &json!({"registrationId": 999, "amount": 5.0, "paymentMethod": "paypal"}),
            &jane.token,
        )
        .await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn concurrent_registrations_keep_one_row() {
    let app = TestApp::spawn().await;
    let org = app.organizer("Olga").await;
    let jane = app.attendee("Jane").await;
    let event_id = app.create_event(&org.token, json!({})).await;

    let body = json!({"eventId": event_id});
    let register = || app.post(routes::REGISTRATIONS, &body, &jane.token);
    let (a, b, c, d) = tokio::join!(register(), register(), register(), register());

    let responses = [a, b, c, d];
    let created = responses.iter().filter(|r| r.status == 201).count();
    assert_eq!(created, 1, "{:?}", responses.iter().map(|r| r.status).collect::<Vec<_>>());
    for res in responses.iter().filter(|r| r.status != 201) {
        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "BUSINESS_RULE");
    }

    let rows = registration::Entity::find()
        .filter(registration::Column::EventId.eq(event_id))
        .filter(registration::Column::UserId.eq(jane.id))
        .count(&app.db)
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn concurrent_registrations_respect_capacity() {
    let app = TestApp::spawn().await;
    let org = app.organizer("Olga").await;
    let jane = app.attendee("Jane").await;
    let john = app.attendee("John").await;
    let event_id = app.create_event(&org.token, json!({"capacity": 1})).await;

    let body = json!({"eventId": event_id});
    let (a, b) = tokio::join!(
        app.post(routes::REGISTRATIONS, &body, &jane.token),
        app.post(routes::REGISTRATIONS, &body, &john.token),
    );

    let mut statuses = [a.status, b.status];
    statuses.sort_unstable();
    assert_eq!(statuses, [201, 400]);
    let refused = if a.status == 400 { &a } else { &b };
    assert_eq!(refused.body["message"], "This event is fully booked");

    let rows = registration::Entity::find()
        .filter(registration::Column::EventId.eq(event_id))
        .count(&app.db)
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn store_rejects_second_registration_for_same_user_and_event() {
    let app = TestApp::spawn().await;
    let org = app.organizer("Olga").await;
    let jane = app.attendee("Jane").await;
    let event_id = app.create_event(&org.token, json!({})).await;

    let row = || registration::ActiveModel {
        user_id: Set(jane.id),
        event_id: Set(event_id),
        status: Set(RegistrationStatus::Pending),
        payment_method: Set(None),
        payment_reference: Set(None),
        amount: Set(None),
        registration_date: Set(Utc::now()),
        updated_at: Set(Utc::now()),
        ..Default::default()
    };

    row().insert(&app.db).await.unwrap();
    assert!(row().insert(&app.db).await.is_err());
}
