use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{Duration, Utc};
use common::storage::UploadCategory;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;

use super::{
    best_effort_stats, count_by, discard_on_error, fetch_page, found, store_upload, store_uploads,
};
use crate::authz::{self, Action, Owned};
use crate::entity::{calendar, event, notification};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::query::AppQuery;
use crate::extractors::upload::UploadForm;
use crate::models::calendar::Schedule;
use crate::models::event::*;
use crate::models::shared::{FieldErrors, MessageResponse, PageParams};
use crate::services::event_cascade;
use crate::state::AppState;

/// Multipart part holding the cover image.
pub const MAIN_IMAGE_FIELD: &str = "mainImage";
/// Multipart part(s) holding gallery images; `images[]` is accepted too.
pub const IMAGES_FIELD: &str = "images";

#[utoipa::path(
    get,
    path = "/",
    tag = "Events",
    operation_id = "listEvents",
    summary = "List events",
    description = "Paginated events ordered by start time. Filters: `status`, `category`, `isActive`. With `includeStats=true` the response also carries aggregate counts over all events.",
    params(EventListQuery),
    responses(
        (status = 200, description = "List of events", body = EventListResponse),
        (status = 400, description = "Invalid query (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_events(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<EventListQuery>,
) -> Result<Json<EventListResponse>, AppError> {
    let page = PageParams::resolve(query.page, query.limit);

    let mut select = event::Entity::find();
    if let Some(status) = query.status {
        select = select.filter(event::Column::Status.eq(status));
    }
    if let Some(ref category) = query.category {
        select = select.filter(event::Column::Category.eq(category.trim()));
    }
    if let Some(is_active) = query.is_active {
        select = select.filter(event::Column::IsActive.eq(is_active));
    }
    let select = select
        .order_by_asc(event::Column::StartDateTime)
        .order_by_asc(event::Column::Id);

    let (events, pagination) = fetch_page(&state.db, select, page).await?;

    let stats = if query.include_stats {
        best_effort_stats("events", event_stats(&state.db)).await
    } else {
        None
    };

    Ok(Json(EventListResponse {
        events: events.into_iter().map(Into::into).collect(),
        pagination,
        stats,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Events",
    operation_id = "getEvent",
    summary = "Get an event by ID",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event details", body = EventResponse),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<EventResponse>, AppError> {
    let model = find_event(&state.db, id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Events",
    operation_id = "createEvent",
    summary = "Create an event",
    description = "Organizers and admins only. Send JSON, or `multipart/form-data` with the JSON in a `payload` part plus an optional `mainImage` and any number of `images` parts. The organizer is always the caller. A calendar entry and a notification for the organizer are created in the same transaction.",
    request_body(content = CreateEventRequest, description = "Event fields (JSON body or `payload` part)"),
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Caller is not an organizer (FORBIDDEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, form), fields(user_id = auth_user.user_id))]
pub async fn create_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut form: UploadForm<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    authz::require_organizer(auth_user.identity())?;
    validate_create_event(&form.payload)?;

    let main_image = form.take(MAIN_IMAGE_FIELD);
    let gallery = form.take_all(IMAGES_FIELD);
    form.ensure_consumed()?;

    let main_image = store_upload(&state, main_image, UploadCategory::Events).await?;
    let images = discard_on_error(
        &state,
        main_image.as_slice(),
        store_uploads(&state, &gallery, UploadCategory::Events),
    )
    .await?;
    let stored: Vec<String> = main_image.iter().chain(&images).cloned().collect();

    let payload = form.payload;
    let now = Utc::now();

    let model = discard_on_error(&state, &stored, async {
        let txn = state.db.begin().await?;

        let model = event::ActiveModel {
            title: Set(payload.title.trim().to_string()),
            description: Set(payload.description),
            start_date_time: Set(payload.start_date_time),
            end_date_time: Set(payload.end_date_time),
            city: Set(payload.location.city),
            place: Set(payload.location.place),
            lat: Set(payload.location.lat),
            lng: Set(payload.location.lng),
            organizer_id: Set(auth_user.user_id),
            main_image: Set(main_image),
            images: Set(strings_to_json(&images)),
            capacity: Set(payload.capacity),
            is_paid: Set(payload.is_paid),
            price: Set(payload.price),
            is_recurring: Set(payload.is_recurring),
            recurrence_pattern: Set(payload.recurrence_pattern),
            category: Set(payload.category.map(|c| c.trim().to_string())),
            status: Set(payload.status),
            visibility: Set(payload.visibility),
            is_active: Set(payload.is_active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        insert_calendar(&txn, &model).await?;

        notification::ActiveModel {
            user_id: Set(model.organizer_id),
            message: Set(format!("There is a new event: {}", model.title)),
            is_read: Set(false),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok::<_, AppError>(model)
    })
    .await?;
    tracing::info!(event_id = model.id, "Event created");

    Ok((StatusCode::CREATED, Json(EventResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Events",
    operation_id = "updateEvent",
    summary = "Update an event",
    description = "Partially updates an event. Organizer of the event or admin only. Uploaded `images` replace the gallery unless `append=true`. Changes to the schedule are mirrored onto the event's calendar entry.",
    params(("id" = i32, Path, description = "Event ID"), UpdateEventQuery),
    request_body(content = UpdateEventRequest, description = "Fields to change (JSON body or `payload` part)"),
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query, form), fields(user_id = auth_user.user_id))]
pub async fn update_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppQuery(query): AppQuery<UpdateEventQuery>,
    mut form: UploadForm<UpdateEventRequest>,
) -> Result<Json<EventResponse>, AppError> {
    let main_image = form.take(MAIN_IMAGE_FIELD);
    let gallery = form.take_all(IMAGES_FIELD);
    form.ensure_consumed()?;
    let payload = form.payload;

    let txn = state.db.begin().await?;
    let existing = find_event_for_update(&txn, id).await?;
    existing.authorize(auth_user.identity(), Action::Edit)?;

    let mut errors = FieldErrors::new();
    validate_update_event(&payload, &mut errors);
    check_consistency(
        &mut errors,
        payload.start_date_time.unwrap_or(existing.start_date_time),
        payload.end_date_time.unwrap_or(existing.end_date_time),
        payload.is_paid.unwrap_or(existing.is_paid),
        payload.price.unwrap_or(existing.price),
    );
    errors.finish()?;

    if payload == UpdateEventRequest::default() && main_image.is_none() && gallery.is_empty() {
        return Ok(Json(existing.into()));
    }

    let main_image = store_upload(&state, main_image, UploadCategory::Events).await?;
    let new_images = discard_on_error(
        &state,
        main_image.as_slice(),
        store_uploads(&state, &gallery, UploadCategory::Events),
    )
    .await?;
    let stored: Vec<String> = main_image.iter().chain(&new_images).cloned().collect();
    let schedule_changed = payload.touches_schedule();

    let mut images = strings_from_json(&existing.images);
    let mut active: event::ActiveModel = existing.into();

    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(start) = payload.start_date_time {
        active.start_date_time = Set(start);
    }
    if let Some(end) = payload.end_date_time {
        active.end_date_time = Set(end);
    }
    match payload.location {
        Some(None) => {
            active.city = Set(None);
            active.place = Set(None);
            active.lat = Set(None);
            active.lng = Set(None);
        }
        Some(Some(location)) => apply_location(&mut active, location),
        None => {}
    }
    if let Some(capacity) = payload.capacity {
        active.capacity = Set(capacity);
    }
    if let Some(is_paid) = payload.is_paid {
        active.is_paid = Set(is_paid);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(is_recurring) = payload.is_recurring {
        active.is_recurring = Set(is_recurring);
    }
    if let Some(pattern) = payload.recurrence_pattern {
        active.recurrence_pattern = Set(pattern);
    }
    if let Some(category) = payload.category {
        active.category = Set(category.map(|c| c.trim().to_string()));
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    if let Some(visibility) = payload.visibility {
        active.visibility = Set(visibility);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if main_image.is_some() {
        active.main_image = Set(main_image);
    }
    if !new_images.is_empty() {
        if query.append {
            images.extend(new_images);
        } else {
            images = new_images;
        }
        active.images = Set(strings_to_json(&images));
    }

    let now = Utc::now();
    active.updated_at = Set(now);
    let model = discard_on_error(&state, &stored, async {
        let model = active.update(&txn).await?;
        if schedule_changed {
            sync_calendar(&txn, &model).await?;
        }
        txn.commit().await?;
        Ok::<_, DbErr>(model)
    })
    .await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Events",
    operation_id = "deleteEvent",
    summary = "Delete an event",
    description = "Organizer of the event or admin only. Removes the event's calendar entries, guests, registrations and their payments, then the event, all in one transaction. Nothing is removed if any step fails.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event deleted", body = MessageResponse),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Cascade failed and was rolled back (INTERNAL_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    event_cascade::delete_event(&state.db, auth_user.identity(), id).await?;
    Ok(Json(MessageResponse::new("Event deleted successfully")))
}

/// Upcoming, ongoing and past event counts relative to now.
pub(crate) async fn timeline_counts<C: ConnectionTrait>(db: &C) -> Result<(u64, u64, u64), DbErr> {
    let now = Utc::now();
    let upcoming = event::Entity::find()
        .filter(event::Column::StartDateTime.gt(now))
        .count(db)
        .await?;
    let ongoing = event::Entity::find()
        .filter(event::Column::StartDateTime.lte(now))
        .filter(event::Column::EndDateTime.gte(now))
        .count(db)
        .await?;
    let past = event::Entity::find()
        .filter(event::Column::EndDateTime.lt(now))
        .count(db)
        .await?;
    Ok((upcoming, ongoing, past))
}

async fn event_stats(db: &DatabaseConnection) -> Result<EventStats, DbErr> {
    let week_ago = Utc::now() - Duration::days(7);
    let (upcoming, ongoing, past) = timeline_counts(db).await?;

    Ok(EventStats {
        total: event::Entity::find().count(db).await?,
        by_status: count_by(db, event::Entity::find(), event::Column::Status).await?,
        by_category: count_by(db, event::Entity::find(), event::Column::Category).await?,
        created_last7_days: event::Entity::find()
            .filter(event::Column::CreatedAt.gte(week_ago))
            .count(db)
            .await?,
        upcoming,
        ongoing,
        past,
    })
}

async fn insert_calendar<C: ConnectionTrait>(db: &C, model: &event::Model) -> Result<(), DbErr> {
    let schedule = Schedule::from_range(model.start_date_time, model.end_date_time);
    calendar::ActiveModel {
        event_id: Set(model.id),
        start_date: Set(schedule.start_date),
        end_date: Set(schedule.end_date),
        start_time: Set(schedule.start_time),
        end_time: Set(schedule.end_time),
        is_recurring: Set(model.is_recurring),
        recurrence_pattern: Set(model.recurrence_pattern),
        created_at: Set(model.updated_at),
        updated_at: Set(model.updated_at),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}

/// Mirrors the event's schedule onto its calendar entries, creating one if none exists.
async fn sync_calendar<C: ConnectionTrait>(db: &C, model: &event::Model) -> Result<(), DbErr> {
    let schedule = Schedule::from_range(model.start_date_time, model.end_date_time);
    let result = calendar::Entity::update_many()
        .col_expr(calendar::Column::StartDate, Expr::value(schedule.start_date))
        .col_expr(calendar::Column::EndDate, Expr::value(schedule.end_date))
        .col_expr(calendar::Column::StartTime, Expr::value(schedule.start_time))
        .col_expr(calendar::Column::EndTime, Expr::value(schedule.end_time))
        .col_expr(calendar::Column::IsRecurring, Expr::value(model.is_recurring))
        .col_expr(
            calendar::Column::RecurrencePattern,
            Expr::value(model.recurrence_pattern),
        )
        .col_expr(calendar::Column::UpdatedAt, Expr::value(model.updated_at))
        .filter(calendar::Column::EventId.eq(model.id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        insert_calendar(db, model).await?;
    }
    Ok(())
}

pub(crate) async fn find_event<C: ConnectionTrait>(db: &C, id: i32) -> Result<event::Model, AppError> {
    found(event::Entity::find_by_id(id).one(db).await?, "Event")
}

pub(crate) async fn find_event_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<event::Model, AppError> {
    found(
        event::Entity::find_by_id(id)
            .lock(LockType::Update)
            .one(txn)
            .await?,
        "Event",
    )
}

/// Applies the parts of a location patch that are present.
fn apply_location(active: &mut event::ActiveModel, location: LocationPatch) {
    if let Some(city) = location.city {
        active.city = Set(city);
    }
    if let Some(place) = location.place {
        active.place = Set(place);
    }
    if let Some(lat) = location.lat {
        active.lat = Set(lat);
    }
    if let Some(lng) = location.lng {
        active.lng = Set(lng);
    }
}
