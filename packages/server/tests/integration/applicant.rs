use reqwest::Method;
use serde_json::json;

use crate::common::{TestApp, TestUser, routes};

struct Setup {
    app: TestApp,
    author: TestUser,
    opportunity_id: i32,
}

async fn setup() -> Setup {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let author = app.organizer("Olga").await;
    let category = app.create_opportunity_category(&admin.token, "Internships").await;
    let opportunity_id = app.create_opportunity(&author.token, category, json!({})).await;
    Setup {
        app,
        author,
        opportunity_id,
    }
}

fn application(email: &str) -> serde_json::Value {
    json!({"name": "Abebe Kebede", "email": email, "coverLetter": "Hire me"})
}

#[tokio::test]
async fn anonymous_application_is_accepted() {
    let Setup {
        app,
        opportunity_id,
        ..
    } = setup().await;

    let res = app
        .post_anonymous(&routes::apply(opportunity_id), &application("Abebe@Example.com"))
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert!(res.body["userId"].is_null());
    assert_eq!(res.body["status"], "pending");
    assert_eq!(res.body["email"], "abebe@example.com");
}

#[tokio::test]
async fn author_reviews_but_other_users_cannot() {
    let Setup {
        app,
        author,
        opportunity_id,
    } = setup().await;
    let other = app.organizer("Oscar").await;
    let res = app
        .post_anonymous(&routes::apply(opportunity_id), &application("a@example.com"))
        .await;
    let applicant_id = res.id();

    let res = app
        .patch(
            &routes::applicant_status(applicant_id),
            &json!({"status": "shortlisted"}),
            &author.token,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["status"], "shortlisted");

    let res = app
        .patch(
            &routes::applicant_status(applicant_id),
            &json!({"status": "rejected"}),
            &other.token,
        )
        .await;
    assert_eq!(res.status, 403);

    let res = app.get(&routes::applicant(applicant_id), &author.token).await;
    assert_eq!(res.body["status"], "shortlisted");
}

#[tokio::test]
async fn malformed_email_is_rejected() {
    let Setup {
        app,
        opportunity_id,
        ..
    } = setup().await;

    let res = app
        .post_anonymous(&routes::apply(opportunity_id), &application("not-an-email"))
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn applying_to_a_missing_opportunity_is_not_found() {
    let Setup { app, .. } = setup().await;

    let res = app
        .post_anonymous(&routes::apply(999), &application("a@example.com"))
        .await;

    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn closed_opportunity_refuses_applications() {
    let Setup {
        app,
        author,
        opportunity_id,
    } = setup().await;
    let res = app
        .patch(
            &routes::opportunity(opportunity_id),
            &json!({"status": "closed"}),
            &author.token,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let res = app
        .post_anonymous(&routes::apply(opportunity_id), &application("a@example.com"))
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "BUSINESS_RULE");
}

#[tokio::test]
async fn concurrent_applications_by_one_user_keep_one_row() {
    let Setup {
        app,
        author,
        opportunity_id,
    } = setup().await;
    let jane = app.attendee("Jane").await;

    let path = routes::apply(opportunity_id);
    let body = application("jane@example.com");
    let apply = || app.post(&path, &body, &jane.token);
    let (a, b, c) = tokio::join!(apply(), apply(), apply());

    let responses = [a, b, c];
    assert_eq!(responses.iter().filter(|r| r.status == 201).count(), 1);
    for res in responses.iter().filter(|r| r.status != 201) {
        assert_eq!(res.body["code"], "BUSINESS_RULE", "{}", res.text);
    }

    let list = app
        .get(&routes::applicants(opportunity_id), &author.token)
        .await;
    assert_eq!(list.body["pagination"]["total"], 1);
}

#[tokio::test]
async fn anonymous_applications_are_not_limited() {
    let Setup {
        app,
        author,
        opportunity_id,
    } = setup().await;

    for _ in 0..2 {
        let res = app
            .post_anonymous(&routes::apply(opportunity_id), &application("a@example.com"))
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
    }

    let list = app
        .get(&routes::applicants(opportunity_id), &author.token)
        .await;
    assert_eq!(list.body["pagination"]["total"], 2);
}

#[tokio::test]
async fn authenticated_user_applies_once_and_can_withdraw() {
    let Setup {
        app,
        opportunity_id,
        ..
    } = setup().await;
    let jane = app.attendee("Jane").await;

    let first = app
        .post(&routes::apply(opportunity_id), &application("jane@example.com"), &jane.token)
        .await;
    assert_eq!(first.status, 201, "{}", first.text);
    assert_eq!(first.body["userId"], jane.id);

    let second = app
        .post(&routes::apply(opportunity_id), &application("jane@example.com"), &jane.token)
        .await;
    assert_eq!(second.status, 400);
    assert_eq!(second.body["code"], "BUSINESS_RULE");

    let own = app.get(&routes::applicant(first.id()), &jane.token).await;
    assert_eq!(own.status, 200);

    let status = app
        .patch(
            &routes::applicant_status(first.id()),
            &json!({"status": "hired"}),
            &jane.token,
        )
        .await;
    assert_eq!(status.status, 403);

    let res = app.delete(&routes::applicant(first.id()), &jane.token).await;
    assert_eq!(res.status, 200);
}

#[tokio::test]
async fn invalid_token_on_apply_is_not_treated_as_anonymous() {
    let Setup {
        app,
        opportunity_id,
        ..
    } = setup().await;

    let res = app
        .post(&routes::apply(opportunity_id), &application("a@example.com"), "garbage")
        .await;

    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn applicant_list_is_for_the_author() {
    let Setup {
        app,
        author,
        opportunity_id,
    } = setup().await;
    let jane = app.attendee("Jane").await;
    for email in ["a@example.com", "b@example.com", "c@example.com"] {
        app.post_anonymous(&routes::apply(opportunity_id), &application(email))
            .await;
    }

    let res = app.get(&routes::applicants(opportunity_id), &author.token).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["pagination"]["total"], 3);

    let res = app.get(&routes::applicants(opportunity_id), &jane.token).await;
    assert_eq!(res.status, 403);
}

#[tokio::test]
async fn resume_upload_accepts_documents_only() {
    let Setup {
        app,
        opportunity_id,
        ..
    } = setup().await;

    let res = app
        .multipart(
            Method::POST,
            &routes::apply(opportunity_id),
            &application("a@example.com"),
            vec![("resume", "cv.pdf", "application/pdf", b"%PDF-1.4".to_vec())],
            None,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    let resume = res.body["resume"].as_str().expect("resume path");
    assert!(resume.starts_with("/uploads/resumes/resume-"));
    assert!(resume.ends_with(".pdf"));

    let res = app
        .multipart(
            Method::POST,
            &routes::apply(opportunity_id),
            &application("b@example.com"),
            vec![("resume", "cv.png", "image/png", vec![0x89, b'P', b'N', b'G'])],
            None,
        )
        .await;
    assert_eq!(res.status, 400);
}
