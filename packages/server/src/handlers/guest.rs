use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::storage::UploadCategory;
use sea_orm::*;
use tracing::instrument;

use super::event::find_event;
use super::{discard_on_error, fetch_page, found, store_upload};
use crate::authz::{self, Action};
use crate::entity::guest;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::query::AppQuery;
use crate::extractors::upload::UploadForm;
use crate::models::guest::*;
use crate::models::shared::{MessageResponse, PageParams, PageQuery};
use crate::state::AppState;

pub const IMAGE_FIELD: &str = "image";

#[utoipa::path(
    get,
    path = "/{event_id}/guests",
    tag = "Guests",
    operation_id = "listEventGuests",
    summary = "List the guests of an event",
    params(("event_id" = i32, Path, description = "Event ID"), PageQuery),
    responses(
        (status = 200, description = "Guests of the event", body = GuestListResponse),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_event_guests(
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<GuestListResponse>, AppError> {
    find_event(&state.db, event_id).await?;
    list(&state, Some(event_id), PageParams::resolve(query.page, query.limit)).await
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Guests",
    operation_id = "listGuests",
    summary = "List guests",
    description = "Paginated guests, optionally restricted to one event with `eventId`. An unknown event simply yields an empty list.",
    params(GuestListQuery),
    responses(
        (status = 200, description = "List of guests", body = GuestListResponse),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_guests(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<GuestListQuery>,
) -> Result<Json<GuestListResponse>, AppError> {
    list(
        &state,
        query.event_id,
        PageParams::resolve(query.page, query.limit),
    )
    .await
}

async fn list(
    state: &AppState,
    event_id: Option<i32>,
    page: PageParams,
) -> Result<Json<GuestListResponse>, AppError> {
    let mut select = guest::Entity::find();
    if let Some(event_id) = event_id {
        select = select.filter(guest::Column::EventId.eq(event_id));
    }
    let select = select.order_by_asc(guest::Column::Id);
    let (guests, pagination) = fetch_page(&state.db, select, page).await?;

    Ok(Json(GuestListResponse {
        guests: guests.into_iter().map(Into::into).collect(),
        pagination,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Guests",
    operation_id = "getGuest",
    summary = "Get a guest by ID",
    params(("id" = i32, Path, description = "Guest ID")),
    responses(
        (status = 200, description = "Guest details", body = GuestResponse),
        (status = 404, description = "Guest not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_guest(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<GuestResponse>, AppError> {
    let model = find_guest(&state.db, id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/{event_id}/guests",
    tag = "Guests",
    operation_id = "createGuest",
    summary = "Add a guest to an event",
    description = "Organizer of the event or admin only. Accepts JSON, or multipart with a `payload` part and an optional `image`.",
    params(("event_id" = i32, Path, description = "Event ID")),
    request_body(content = CreateGuestRequest, description = "Guest fields (JSON body or `payload` part)"),
    responses(
        (status = 201, description = "Guest created", body = GuestResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, form), fields(user_id = auth_user.user_id))]
pub async fn create_guest(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
    mut form: UploadForm<CreateGuestRequest>,
) -> Result<impl IntoResponse, AppError> {
    let image = form.take(IMAGE_FIELD);
    form.ensure_consumed()?;

    let event = find_event(&state.db, event_id).await?;
    authz::authorize(auth_user.identity(), event.organizer_id, Action::Edit, "event")?;
    validate_create_guest(&form.payload)?;

    let image = store_upload(&state, image, UploadCategory::Guests).await?;
    let payload = form.payload;
    let now = Utc::now();

    let row = guest::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        email: Set(payload.email.map(|e| e.trim().to_string())),
        profession: Set(payload.profession),
        description: Set(payload.description),
        membership: Set(payload.membership),
        image: Set(image.clone()),
        event_id: Set(event.id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let model = discard_on_error(&state, image.as_slice(), row.insert(&state.db)).await?;

    Ok((StatusCode::CREATED, Json(GuestResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Guests",
    operation_id = "updateGuest",
    summary = "Update a guest",
    description = "Organizer of the guest's event or admin only. A new `image` part replaces the current image.",
    params(("id" = i32, Path, description = "Guest ID")),
    request_body(content = UpdateGuestRequest, description = "Fields to change (JSON body or `payload` part)"),
    responses(
        (status = 200, description = "Guest updated", body = GuestResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Guest not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, form), fields(user_id = auth_user.user_id))]
pub async fn update_guest(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut form: UploadForm<UpdateGuestRequest>,
) -> Result<Json<GuestResponse>, AppError> {
    let image = form.take(IMAGE_FIELD);
    form.ensure_consumed()?;

    let existing = find_guest(&state.db, id).await?;
    authorize_through_event(&state.db, &auth_user, &existing, Action::Edit).await?;
    validate_update_guest(&form.payload)?;

    let payload = form.payload;
    if payload == UpdateGuestRequest::default() && image.is_none() {
        return Ok(Json(existing.into()));
    }
    let image = store_upload(&state, image, UploadCategory::Guests).await?;

    let mut active: guest::ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(email) = payload.email {
        active.email = Set(email.map(|e| e.trim().to_string()));
    }
    if let Some(profession) = payload.profession {
        active.profession = Set(profession);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(membership) = payload.membership {
        active.membership = Set(membership);
    }
    if image.is_some() {
        active.image = Set(image.clone());
    }
    active.updated_at = Set(Utc::now());

    let model = discard_on_error(&state, image.as_slice(), active.update(&state.db)).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Guests",
    operation_id = "deleteGuest",
    summary = "Remove a guest",
    params(("id" = i32, Path, description = "Guest ID")),
    responses(
        (status = 200, description = "Guest deleted", body = MessageResponse),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Guest not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_guest(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    let existing = find_guest(&state.db, id).await?;
    authorize_through_event(&state.db, &auth_user, &existing, Action::Delete).await?;

    guest::Entity::delete_by_id(existing.id)
        .exec(&state.db)
        .await?;
    Ok(Json(MessageResponse::new("Guest deleted successfully")))
}

/// Guests have no owner column; the organizer of their event owns them.
async fn authorize_through_event<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    guest: &guest::Model,
    action: Action,
) -> Result<(), AppError> {
    let event = find_event(db, guest.event_id).await?;
    authz::authorize(auth_user.identity(), event.organizer_id, action, "guest")
}

async fn find_guest<C: ConnectionTrait>(db: &C, id: i32) -> Result<guest::Model, AppError> {
    found(guest::Entity::find_by_id(id).one(db).await?, "Guest")
}
