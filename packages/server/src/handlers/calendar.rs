use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;

use super::event::find_event;
use super::{fetch_page, found};
use crate::authz::{self, Action};
use crate::entity::calendar;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::models::calendar::*;
use crate::models::shared::PageParams;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Calendars",
    operation_id = "listCalendars",
    summary = "List calendar entries",
    description = "Paginated calendar entries ordered by start date, optionally for one event.",
    params(CalendarListQuery),
    responses(
        (status = 200, description = "List of calendar entries", body = CalendarListResponse),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_calendars(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CalendarListQuery>,
) -> Result<Json<CalendarListResponse>, AppError> {
    let page = PageParams::resolve(query.page, query.limit);
    let mut select = calendar::Entity::find();
    if let Some(event_id) = query.event_id {
        select = select.filter(calendar::Column::EventId.eq(event_id));
    }
    let select = select
        .order_by_asc(calendar::Column::StartDate)
        .order_by_asc(calendar::Column::StartTime)
        .order_by_asc(calendar::Column::Id);

    let (calendars, pagination) = fetch_page(&state.db, select, page).await?;
    Ok(Json(CalendarListResponse {
        calendars: calendars.into_iter().map(Into::into).collect(),
        pagination,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Calendars",
    operation_id = "getCalendar",
    summary = "Get a calendar entry",
    params(("id" = i32, Path, description = "Calendar entry ID")),
    responses(
        (status = 200, description = "Calendar entry", body = CalendarResponse),
        (status = 404, description = "Calendar entry not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_calendar(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CalendarResponse>, AppError> {
    let model = find_calendar(&state.db, id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Calendars",
    operation_id = "updateCalendar",
    summary = "Update a calendar entry",
    description = "Organizer of the parent event or admin only. Accepts only the schedule fields.",
    params(("id" = i32, Path, description = "Calendar entry ID")),
    request_body = UpdateCalendarRequest,
    responses(
        (status = 200, description = "Calendar entry updated", body = CalendarResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Calendar entry not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_calendar(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateCalendarRequest>,
) -> Result<Json<CalendarResponse>, AppError> {
    let existing = find_calendar(&state.db, id).await?;
    let event = find_event(&state.db, existing.event_id).await?;
    authz::authorize(auth_user.identity(), event.organizer_id, Action::Edit, "calendar entry")?;

    if payload == UpdateCalendarRequest::default() {
        return Ok(Json(existing.into()));
    }

    let merged = Schedule {
        start_date: payload.start_date.unwrap_or(existing.start_date),
        end_date: payload.end_date.unwrap_or(existing.end_date),
        start_time: payload.start_time.unwrap_or(existing.start_time),
        end_time: payload.end_time.unwrap_or(existing.end_time),
    };
    validate_calendar_range(&merged)?;

    let mut active: calendar::ActiveModel = existing.into();
    active.start_date = Set(merged.start_date);
    active.end_date = Set(merged.end_date);
    active.start_time = Set(merged.start_time);
    active.end_time = Set(merged.end_time);
    if let Some(is_recurring) = payload.is_recurring {
        active.is_recurring = Set(is_recurring);
    }
    if let Some(pattern) = payload.recurrence_pattern {
        active.recurrence_pattern = Set(pattern);
    }
    active.updated_at = Set(Utc::now());

    let model = active.update(&state.db).await?;
    Ok(Json(model.into()))
}

async fn find_calendar<C: ConnectionTrait>(db: &C, id: i32) -> Result<calendar::Model, AppError> {
    found(calendar::Entity::find_by_id(id).one(db).await?, "Calendar entry")
}
