use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::{self, upload_body_limit};
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/users", user_routes())
        .nest("/events", event_routes())
        .nest("/guests", guest_routes())
        .nest("/calendars", calendar_routes())
        .nest("/opportunities", opportunity_routes())
        .nest("/applicants", applicant_routes())
        .nest("/news", news_routes())
        .nest("/categories", category_routes())
        .nest("/opportunity-categories", opportunity_category_routes())
        .nest("/registrations", registration_routes())
        .nest("/payments", payment_routes())
        .nest("/notifications", notification_routes())
        .nest("/dashboard", dashboard_routes())
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::signup))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
        .routes(routes!(handlers::user::list_users))
        .routes(routes!(
            handlers::user::get_user,
            handlers::user::update_user,
            handlers::user::delete_user
        ))
}

fn event_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::event::list_events,
            handlers::event::create_event
        ))
        .routes(routes!(
            handlers::event::get_event,
            handlers::event::update_event,
            handlers::event::delete_event
        ))
        .routes(routes!(
            handlers::guest::list_event_guests,
            handlers::guest::create_guest
        ))
        .layer(upload_body_limit())
}

fn guest_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::guest::list_guests))
        .routes(routes!(
            handlers::guest::get_guest,
            handlers::guest::update_guest,
            handlers::guest::delete_guest
        ))
        .layer(upload_body_limit())
}

fn calendar_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::calendar::list_calendars))
        .routes(routes!(
            handlers::calendar::get_calendar,
            handlers::calendar::update_calendar
        ))
}

fn opportunity_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::opportunity::list_opportunities,
            handlers::opportunity::create_opportunity
        ))
        .routes(routes!(
            handlers::opportunity::get_opportunity,
            handlers::opportunity::update_opportunity,
            handlers::opportunity::delete_opportunity
        ))
        .routes(routes!(handlers::applicant::apply))
        .routes(routes!(handlers::applicant::list_applicants))
        .layer(upload_body_limit())
}

fn applicant_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::applicant::get_applicant,
            handlers::applicant::delete_applicant
        ))
        .routes(routes!(handlers::applicant::update_applicant_status))
}

fn news_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::news::list_news,
            handlers::news::create_news
        ))
        .routes(routes!(
            handlers::news::get_news,
            handlers::news::update_news,
            handlers::news::delete_news
        ))
        .layer(upload_body_limit())
}

fn category_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::category::list_categories,
            handlers::category::create_category
        ))
        .routes(routes!(
            handlers::category::get_category,
            handlers::category::update_category,
            handlers::category::delete_category
        ))
}

fn opportunity_category_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::category::list_opportunity_categories,
            handlers::category::create_opportunity_category
        ))
        .routes(routes!(
            handlers::category::get_opportunity_category,
            handlers::category::update_opportunity_category,
            handlers::category::delete_opportunity_category
        ))
}

fn registration_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::registration::list_registrations,
            handlers::registration::create_registration
        ))
        .routes(routes!(
            handlers::registration::get_registration,
            handlers::registration::update_registration,
            handlers::registration::delete_registration
        ))
}

fn payment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::payment::list_payments,
            handlers::payment::create_payment
        ))
        .routes(routes!(
            handlers::payment::get_payment,
            handlers::payment::update_payment,
            handlers::payment::delete_payment
        ))
}

fn notification_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::notification::list_notifications,
            handlers::notification::create_notification
        ))
        .routes(routes!(
            handlers::notification::get_notification,
            handlers::notification::update_notification,
            handlers::notification::delete_notification
        ))
}

fn dashboard_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::dashboard::get_stats))
}
