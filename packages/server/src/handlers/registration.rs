use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::{EventStatus, PaymentMethod, PaymentStatus, RegistrationStatus};
use sea_orm::sea_query::Query as SeaQuery;
use sea_orm::*;
use tracing::instrument;

use super::event::{find_event, find_event_for_update};
use super::{best_effort_stats, fetch_page, found};
use crate::authz::{Action, Identity, Owned};
use crate::entity::{event, payment, registration};
use crate::error::{AppError, ErrorBody, unique_conflict};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::models::registration::*;
use crate::models::shared::{MessageResponse, PageParams};
use crate::services::payment::{PaymentInit, PaymentRequest, split_name};
use crate::state::AppState;

/// Shown on the gateway's checkout page.
const CHECKOUT_TITLE: &str = "Event Ticket";
const ALREADY_REGISTERED: &str = "You are already registered for this event";

#[utoipa::path(
    post,
    path = "/",
    tag = "Registrations",
    operation_id = "createRegistration",
    summary = "Register for an event",
    description = "Registers the caller. Inactive, canceled and fully booked events refuse registration, as does a second registration for the same event. For paid events a `paymentMethod` is required; the payment gateway is initialized for the event price and a pending payment is recorded. The response carries the gateway checkout link when there is one.",
    request_body = CreateRegistrationRequest,
    responses(
        (status = 201, description = "Registered", body = CreatedRegistrationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR) or registration refused (BUSINESS_RULE)", body = ErrorBody),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, event_id = payload.event_id))]
pub async fn create_registration(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateRegistrationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let event = find_event(&state.db, payload.event_id).await?;
    // Fast path; repeated under the event lock below.
    check_open(&state.db, &event, auth_user.user_id).await?;

    let checkout = if event.is_paid {
        Some(start_checkout(&state, &auth_user, &event, &payload).await?)
    } else {
        None
    };

    let now = Utc::now();
    let txn = state.db.begin().await?;
    let event = find_event_for_update(&txn, event.id).await?;
    check_open(&txn, &event, auth_user.user_id).await?;

    let model = registration::ActiveModel {
        user_id: Set(auth_user.user_id),
        event_id: Set(event.id),
        status: Set(RegistrationStatus::Pending),
        payment_method: Set(checkout.as_ref().map(|c| c.method)),
        payment_reference: Set(checkout.as_ref().map(|c| c.init.reference.clone())),
        amount: Set(checkout.as_ref().map(|c| c.amount)),
        registration_date: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| unique_conflict(e, ALREADY_REGISTERED))?;

    if let Some(ref checkout) = checkout {
        payment::ActiveModel {
            registration_id: Set(model.id),
            amount: Set(checkout.amount),
            payment_status: Set(PaymentStatus::Pending),
            payment_method: Set(checkout.method),
            transaction_id: Set(Some(checkout.init.reference.clone())),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    tracing::info!(registration_id = model.id, paid = checkout.is_some(), "Registered for event");

    Ok((
        StatusCode::CREATED,
        Json(CreatedRegistrationResponse {
            registration: model.into(),
            checkout_url: checkout.and_then(|c| c.init.checkout_url),
        }),
    ))
}

/// Refuses registration for inactive, canceled or fully booked events and
/// for a caller who is already registered.
async fn check_open<C: ConnectionTrait>(
    db: &C,
    event: &event::Model,
    user_id: i32,
) -> Result<(), AppError> {
    if !event.is_active || event.status == EventStatus::Canceled {
        return Err(AppError::BusinessRule(
            "Registration is closed for this event".into(),
        ));
    }

    let already = registration::Entity::find()
        .filter(registration::Column::EventId.eq(event.id))
        .filter(registration::Column::UserId.eq(user_id))
        .count(db)
        .await?;
    if already > 0 {
        return Err(AppError::BusinessRule(ALREADY_REGISTERED.into()));
    }

    if let Some(capacity) = event.capacity {
        let taken = registration::Entity::find()
            .filter(registration::Column::EventId.eq(event.id))
            .filter(registration::Column::Status.ne(RegistrationStatus::Canceled))
            .count(db)
            .await?;
        if taken >= u64::try_from(capacity).unwrap_or(0) {
            return Err(AppError::BusinessRule("This event is fully booked".into()));
        }
    }
    Ok(())
}

struct Checkout {
    amount: f64,
    method: PaymentMethod,
    init: PaymentInit,
}

/// Validates the payment fields of a paid registration and opens a gateway
/// transaction. Runs before any row is written.
async fn start_checkout(
    state: &AppState,
    auth_user: &AuthUser,
    event: &event::Model,
    payload: &CreateRegistrationRequest,
) -> Result<Checkout, AppError> {
    let price = event
        .price
        .ok_or_else(|| AppError::Internal(format!("Paid event {} has no price", event.id)))?;
    let method = payload
        .payment_method
        .ok_or_else(|| AppError::validation("paymentMethod is required for paid events"))?;
    if payload.amount.is_some_and(|amount| (amount - price).abs() > 0.005) {
        return Err(AppError::validation("amount must match the event price"));
    }

    let (first_name, last_name) = split_name(&auth_user.name);
    let init = state
        .payments
        .initialize(PaymentRequest {
            amount: price,
            email: auth_user.email.clone(),
            first_name,
            last_name,
            tx_ref: format!("evt-{}-{}", event.id, uuid::Uuid::new_v4().simple()),
            title: CHECKOUT_TITLE.into(),
        })
        .await?;

    Ok(Checkout {
        amount: price,
        method,
        init,
    })
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Registrations",
    operation_id = "listRegistrations",
    summary = "List registrations",
    description = "Admins see every registration; other users see their own plus registrations to events they organize. Filters: `eventId`, `status`. `includeStats=true` adds total, paid and free counts over the visible set.",
    params(RegistrationListQuery),
    responses(
        (status = 200, description = "List of registrations", body = RegistrationListResponse),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_registrations(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<RegistrationListQuery>,
) -> Result<Json<RegistrationListResponse>, AppError> {
    let page = PageParams::resolve(query.page, query.limit);

    let mut select = visible_to(auth_user.identity());
    if let Some(event_id) = query.event_id {
        select = select.filter(registration::Column::EventId.eq(event_id));
    }
    if let Some(status) = query.status {
        select = select.filter(registration::Column::Status.eq(status));
    }

    let stats = if query.include_stats {
        best_effort_stats("registrations", registration_stats(&state.db, select.clone())).await
    } else {
        None
    };

    let select = select
        .order_by_desc(registration::Column::RegistrationDate)
        .order_by_desc(registration::Column::Id);
    let (items, pagination) = fetch_page(&state.db, select, page).await?;

    Ok(Json(RegistrationListResponse {
        registrations: items.into_iter().map(Into::into).collect(),
        pagination,
        stats,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Registrations",
    operation_id = "getRegistration",
    summary = "Get a registration",
    description = "Registrant or admin only.",
    params(("id" = i32, Path, description = "Registration ID")),
    responses(
        (status = 200, description = "Registration", body = RegistrationResponse),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Registration not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_registration(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<RegistrationResponse>, AppError> {
    let model = find_registration(&state.db, id).await?;
    model.authorize(auth_user.identity(), Action::View)?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Registrations",
    operation_id = "updateRegistration",
    summary = "Update a registration",
    description = "Registrant or admin only. Only `status`, `paymentMethod` and `paymentReference` may change.",
    params(("id" = i32, Path, description = "Registration ID")),
    request_body = UpdateRegistrationRequest,
    responses(
        (status = 200, description = "Registration updated", body = RegistrationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Registration not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_registration(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateRegistrationRequest>,
) -> Result<Json<RegistrationResponse>, AppError> {
    let existing = find_registration(&state.db, id).await?;
    existing.authorize(auth_user.identity(), Action::Edit)?;

    if payload == UpdateRegistrationRequest::default() {
        return Ok(Json(existing.into()));
    }

    let mut active: registration::ActiveModel = existing.into();
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    if let Some(method) = payload.payment_method {
        active.payment_method = Set(method);
    }
    if let Some(reference) = payload.payment_reference {
        active.payment_reference = Set(reference);
    }
    active.updated_at = Set(Utc::now());

    let model = active.update(&state.db).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Registrations",
    operation_id = "deleteRegistration",
    summary = "Cancel and delete a registration",
    description = "Registrant or admin only. Its payments are removed in the same transaction.",
    params(("id" = i32, Path, description = "Registration ID")),
    responses(
        (status = 200, description = "Registration deleted", body = MessageResponse),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Registration not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_registration(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    let txn = state.db.begin().await?;
    let existing = find_registration(&txn, id).await?;
    existing.authorize(auth_user.identity(), Action::Delete)?;

    payment::Entity::delete_many()
        .filter(payment::Column::RegistrationId.eq(id))
        .exec(&txn)
        .await?;
    registration::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    Ok(Json(MessageResponse::new("Registration deleted successfully")))
}

/// Registrations `identity` may list: all for admins, otherwise their own and
/// those for events they organize.
fn visible_to(identity: Identity) -> Select<registration::Entity> {
    let select = registration::Entity::find();
    if identity.is_admin() {
        return select;
    }
    select.filter(
        Condition::any()
            .add(registration::Column::UserId.eq(identity.id))
            .add(
                registration::Column::EventId.in_subquery(
                    SeaQuery::select()
                        .column(event::Column::Id)
                        .from(event::Entity)
                        .and_where(event::Column::OrganizerId.eq(identity.id))
                        .to_owned(),
                ),
            ),
    )
}

async fn registration_stats(
    db: &DatabaseConnection,
    select: Select<registration::Entity>,
) -> Result<RegistrationStats, DbErr> {
    let total = select.clone().count(db).await?;
    let paid = select
        .filter(
            registration::Column::EventId.in_subquery(
                SeaQuery::select()
                    .column(event::Column::Id)
                    .from(event::Entity)
                    .and_where(event::Column::IsPaid.eq(true))
                    .to_owned(),
            ),
        )
        .count(db)
        .await?;
    Ok(RegistrationStats {
        total,
        paid,
        free: total.saturating_sub(paid),
    })
}

pub(crate) async fn find_registration<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<registration::Model, AppError> {
    found(registration::Entity::find_by_id(id).one(db).await?, "Registration")
}
