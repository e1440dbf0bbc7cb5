use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::PaymentStatus;
use sea_orm::sea_query::Query as SeaQuery;
use sea_orm::*;
use tracing::instrument;

use super::registration::find_registration;
use super::{fetch_page, found};
use crate::authz::{self, Action, Owned};
use crate::entity::{payment, registration};
use crate::error::{AppError, ErrorBody, unique_violation};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::models::payment::*;
use crate::models::shared::{MessageResponse, PageParams};
use crate::state::AppState;

const DUPLICATE_TRANSACTION: &str = "transactionId already exists";

#[utoipa::path(
    get,
    path = "/",
    tag = "Payments",
    operation_id = "listPayments",
    summary = "List payments",
    description = "Admins see every payment; other users see payments for their own registrations. Filters: `registrationId`, `paymentStatus`.",
    params(PaymentListQuery),
    responses(
        (status = 200, description = "List of payments", body = PaymentListResponse),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_payments(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PaymentListQuery>,
) -> Result<Json<PaymentListResponse>, AppError> {
    let page = PageParams::resolve(query.page, query.limit);

    let mut select = payment::Entity::find();
    if !auth_user.identity().is_admin() {
        select = select.filter(
            payment::Column::RegistrationId.in_subquery(
                SeaQuery::select()
                    .column(registration::Column::Id)
                    .from(registration::Entity)
                    .and_where(registration::Column::UserId.eq(auth_user.user_id))
                    .to_owned(),
            ),
        );
    }
    if let Some(registration_id) = query.registration_id {
        select = select.filter(payment::Column::RegistrationId.eq(registration_id));
    }
    if let Some(status) = query.payment_status {
        select = select.filter(payment::Column::PaymentStatus.eq(status));
    }
    let select = select
        .order_by_desc(payment::Column::CreatedAt)
        .order_by_desc(payment::Column::Id);

    let (items, pagination) = fetch_page(&state.db, select, page).await?;
    Ok(Json(PaymentListResponse {
        payments: items.into_iter().map(Into::into).collect(),
        pagination,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Payments",
    operation_id = "getPayment",
    summary = "Get a payment",
    description = "Registrant of the paid registration or admin only.",
    params(("id" = i32, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment", body = PaymentResponse),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Payment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_payment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PaymentResponse>, AppError> {
    let model = find_payment(&state.db, id).await?;
    let registration = find_registration(&state.db, model.registration_id).await?;
    authz::authorize(
        auth_user.identity(),
        registration.owner_id(),
        Action::View,
        "payment",
    )?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Payments",
    operation_id = "createPayment",
    summary = "Record a payment",
    description = "Registrant of the registration or admin only. New payments start as `pending`.",
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = PaymentResponse),
        (status = 400, description = "Validation error or duplicate transaction (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Registration not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_payment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let registration = find_registration(&state.db, payload.registration_id).await?;
    authz::authorize(
        auth_user.identity(),
        registration.owner_id(),
        Action::Edit,
        "registration",
    )?;
    validate_create_payment(&payload)?;

    let now = Utc::now();
    let model = payment::ActiveModel {
        registration_id: Set(registration.id),
        amount: Set(payload.amount),
        payment_status: Set(PaymentStatus::Pending),
        payment_method: Set(payload.payment_method),
        transaction_id: Set(payload.transaction_id.map(|t| t.trim().to_string())),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| unique_violation(e, DUPLICATE_TRANSACTION))?;

    Ok((StatusCode::CREATED, Json(PaymentResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Payments",
    operation_id = "updatePayment",
    summary = "Update a payment",
    description = "Admin only. Only `amount`, `paymentMethod` and `paymentStatus` may change.",
    params(("id" = i32, Path, description = "Payment ID")),
    request_body = UpdatePaymentRequest,
    responses(
        (status = 200, description = "Payment updated", body = PaymentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Not an admin (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Payment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_payment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdatePaymentRequest>,
) -> Result<Json<PaymentResponse>, AppError> {
    let existing = find_payment(&state.db, id).await?;
    authz::require_admin(auth_user.identity(), Action::Edit, "payment")?;
    validate_update_payment(&payload)?;

    if payload == UpdatePaymentRequest::default() {
        return Ok(Json(existing.into()));
    }

    let mut active: payment::ActiveModel = existing.into();
    if let Some(amount) = payload.amount {
        active.amount = Set(amount);
    }
    if let Some(method) = payload.payment_method {
        active.payment_method = Set(method);
    }
    if let Some(status) = payload.payment_status {
        active.payment_status = Set(status);
    }
    active.updated_at = Set(Utc::now());

    let model = active.update(&state.db).await?;
    tracing::info!(payment_id = model.id, status = %model.payment_status, "Payment updated");
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Payments",
    operation_id = "deletePayment",
    summary = "Delete a payment",
    description = "Admin only.",
    params(("id" = i32, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment deleted", body = MessageResponse),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Not an admin (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Payment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_payment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    let existing = find_payment(&state.db, id).await?;
    authz::require_admin(auth_user.identity(), Action::Delete, "payment")?;

    payment::Entity::delete_by_id(existing.id)
        .exec(&state.db)
        .await?;
    Ok(Json(MessageResponse::new("Payment deleted successfully")))
}

async fn find_payment<C: ConnectionTrait>(db: &C, id: i32) -> Result<payment::Model, AppError> {
    found(payment::Entity::find_by_id(id).one(db).await?, "Payment")
}
