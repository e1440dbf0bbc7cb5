use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;

use super::{fetch_page, found};
use crate::authz::{self, Action, Owned};
use crate::entity::{notification, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::models::notification::*;
use crate::models::shared::{MessageResponse, PageParams};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Notifications",
    operation_id = "listNotifications",
    summary = "List notifications",
    description = "The caller's own notifications, newest first. Admins see every notification. `unread=true` hides read ones.",
    params(NotificationListQuery),
    responses(
        (status = 200, description = "List of notifications", body = NotificationListResponse),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_notifications(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<NotificationListQuery>,
) -> Result<Json<NotificationListResponse>, AppError> {
    let page = PageParams::resolve(query.page, query.limit);

    let mut select = notification::Entity::find();
    if !auth_user.identity().is_admin() {
        select = select.filter(notification::Column::UserId.eq(auth_user.user_id));
    }
    if query.unread {
        select = select.filter(notification::Column::IsRead.eq(false));
    }
    let select = select
        .order_by_desc(notification::Column::CreatedAt)
        .order_by_desc(notification::Column::Id);

    let (items, pagination) = fetch_page(&state.db, select, page).await?;
    Ok(Json(NotificationListResponse {
        notifications: items.into_iter().map(Into::into).collect(),
        pagination,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Notifications",
    operation_id = "getNotification",
    summary = "Get a notification",
    params(("id" = i32, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification", body = NotificationResponse),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Not the recipient (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Notification not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_notification(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<NotificationResponse>, AppError> {
    let model = find_notification(&state.db, id).await?;
    model.authorize(auth_user.identity(), Action::View)?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Notifications",
    operation_id = "createNotification",
    summary = "Send a notification",
    description = "Admin only. Delivers a message to one user.",
    request_body = CreateNotificationRequest,
    responses(
        (status = 201, description = "Notification created", body = NotificationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Not an admin (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Recipient not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_notification(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateNotificationRequest>,
) -> Result<impl IntoResponse, AppError> {
    authz::require_admin(auth_user.identity(), Action::Edit, "notification")?;
    validate_message(&payload.message)?;
    let recipient = found(
        user::Entity::find_by_id(payload.user_id).one(&state.db).await?,
        "User",
    )?;

    let model = notification::ActiveModel {
        user_id: Set(recipient.id),
        message: Set(payload.message.trim().to_string()),
        is_read: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(NotificationResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Notifications",
    operation_id = "updateNotification",
    summary = "Update a notification",
    description = "Recipient or admin. Typically used to mark a notification as read.",
    params(("id" = i32, Path, description = "Notification ID")),
    request_body = UpdateNotificationRequest,
    responses(
        (status = 200, description = "Notification updated", body = NotificationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Not the recipient (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Notification not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_notification(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateNotificationRequest>,
) -> Result<Json<NotificationResponse>, AppError> {
    let existing = find_notification(&state.db, id).await?;
    existing.authorize(auth_user.identity(), Action::Edit)?;
    if let Some(message) = payload.message.as_deref() {
        validate_message(message)?;
    }

    if payload == UpdateNotificationRequest::default() {
        return Ok(Json(existing.into()));
    }

    let mut active: notification::ActiveModel = existing.into();
    if let Some(message) = payload.message {
        active.message = Set(message.trim().to_string());
    }
    if let Some(is_read) = payload.is_read {
        active.is_read = Set(is_read);
    }

    let model = active.update(&state.db).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Notifications",
    operation_id = "deleteNotification",
    summary = "Delete a notification",
    params(("id" = i32, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification deleted", body = MessageResponse),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Not the recipient (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Notification not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_notification(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    let existing = find_notification(&state.db, id).await?;
    existing.authorize(auth_user.identity(), Action::Delete)?;

    notification::Entity::delete_by_id(existing.id)
        .exec(&state.db)
        .await?;
    Ok(Json(MessageResponse::new("Notification deleted successfully")))
}

async fn find_notification<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<notification::Model, AppError> {
    found(
        notification::Entity::find_by_id(id).one(db).await?,
        "Notification",
    )
}
