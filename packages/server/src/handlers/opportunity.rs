use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{Duration, Utc};
use common::storage::UploadCategory;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;

use super::{best_effort_stats, count_by, discard_on_error, fetch_page, found, store_upload};
use crate::authz::{Action, Owned};
use crate::entity::{applicant, opportunity, opportunity_category};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::query::AppQuery;
use crate::extractors::upload::UploadForm;
use crate::models::opportunity::*;
use crate::models::shared::{MessageResponse, PageParams};
use crate::state::AppState;

pub const IMAGE_FIELD: &str = "image";

#[utoipa::path(
    get,
    path = "/",
    tag = "Opportunities",
    operation_id = "listOpportunities",
    summary = "List opportunities",
    description = "Paginated opportunities, nearest deadline first. Filters: `status`, `categoryId`, `isRemote`. `includeStats=true` adds counts by status and the number created in the last seven days.",
    params(OpportunityListQuery),
    responses(
        (status = 200, description = "List of opportunities", body = OpportunityListResponse),
        (status = 400, description = "Invalid query (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_opportunities(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<OpportunityListQuery>,
) -> Result<Json<OpportunityListResponse>, AppError> {
    let page = PageParams::resolve(query.page, query.limit);

    let mut select = opportunity::Entity::find();
    if let Some(status) = query.status {
        select = select.filter(opportunity::Column::Status.eq(status));
    }
    if let Some(category_id) = query.category_id {
        select = select.filter(opportunity::Column::CategoryId.eq(category_id));
    }
    if let Some(is_remote) = query.is_remote {
        select = select.filter(opportunity::Column::IsRemote.eq(is_remote));
    }
    let select = select
        .order_by_asc(opportunity::Column::Deadline)
        .order_by_asc(opportunity::Column::Id);

    let (items, pagination) = fetch_page(&state.db, select, page).await?;

    let stats = if query.include_stats {
        best_effort_stats("opportunities", opportunity_stats(&state.db)).await
    } else {
        None
    };

    Ok(Json(OpportunityListResponse {
        opportunities: items.into_iter().map(Into::into).collect(),
        pagination,
        stats,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Opportunities",
    operation_id = "getOpportunity",
    summary = "Get an opportunity by ID",
    params(("id" = i32, Path, description = "Opportunity ID")),
    responses(
        (status = 200, description = "Opportunity details", body = OpportunityResponse),
        (status = 404, description = "Opportunity not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_opportunity(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<OpportunityResponse>, AppError> {
    let model = find_opportunity(&state.db, id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Opportunities",
    operation_id = "createOpportunity",
    summary = "Publish an opportunity",
    description = "Any authenticated user; the author is the caller. The referenced category must exist. Accepts JSON, or multipart with a `payload` part and an optional `image`.",
    request_body(content = CreateOpportunityRequest, description = "Opportunity fields (JSON body or `payload` part)"),
    responses(
        (status = 201, description = "Opportunity created", body = OpportunityResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, form), fields(user_id = auth_user.user_id))]
pub async fn create_opportunity(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut form: UploadForm<CreateOpportunityRequest>,
) -> Result<impl IntoResponse, AppError> {
    let image = form.take(IMAGE_FIELD);
    form.ensure_consumed()?;
    validate_create_opportunity(&form.payload)?;
    ensure_category(&state.db, form.payload.category_id).await?;

    let image = store_upload(&state, image, UploadCategory::Opportunities).await?;
    let payload = form.payload;
    let now = Utc::now();

    let row = opportunity::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description),
        requirements: Set(payload.requirements),
        deadline: Set(payload.deadline),
        image: Set(image.clone()),
        status: Set(payload.status),
        location: Set(payload.location),
        is_remote: Set(payload.is_remote),
        category_id: Set(payload.category_id),
        author_id: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let model = discard_on_error(&state, image.as_slice(), row.insert(&state.db)).await?;

    Ok((StatusCode::CREATED, Json(OpportunityResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Opportunities",
    operation_id = "updateOpportunity",
    summary = "Update an opportunity",
    description = "Author or admin only.",
    params(("id" = i32, Path, description = "Opportunity ID")),
    request_body(content = UpdateOpportunityRequest, description = "Fields to change (JSON body or `payload` part)"),
    responses(
        (status = 200, description = "Opportunity updated", body = OpportunityResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Opportunity or category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, form), fields(user_id = auth_user.user_id))]
pub async fn update_opportunity(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut form: UploadForm<UpdateOpportunityRequest>,
) -> Result<Json<OpportunityResponse>, AppError> {
    let image = form.take(IMAGE_FIELD);
    form.ensure_consumed()?;

    let existing = find_opportunity(&state.db, id).await?;
    existing.authorize(auth_user.identity(), Action::Edit)?;
    validate_update_opportunity(&form.payload)?;

    let payload = form.payload;
    if payload == UpdateOpportunityRequest::default() && image.is_none() {
        return Ok(Json(existing.into()));
    }
    if let Some(category_id) = payload.category_id {
        ensure_category(&state.db, category_id).await?;
    }
    let image = store_upload(&state, image, UploadCategory::Opportunities).await?;

    let mut active: opportunity::ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(requirements) = payload.requirements {
        active.requirements = Set(requirements);
    }
    if let Some(deadline) = payload.deadline {
        active.deadline = Set(deadline);
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(category_id);
    }
    if let Some(location) = payload.location {
        active.location = Set(location);
    }
    if let Some(is_remote) = payload.is_remote {
        active.is_remote = Set(is_remote);
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
    tag = "Opportunities",
    operation_id = "deleteOpportunity",
    summary = "Delete an opportunity",
    description = "Author or admin only. Its applications are removed in the same transaction.",
    params(("id" = i32, Path, description = "Opportunity ID")),
    responses(
        (status = 200, description = "Opportunity deleted", body = MessageResponse),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Opportunity not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_opportunity(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    let txn = state.db.begin().await?;
    let existing = found(
        opportunity::Entity::find_by_id(id)
            .lock(LockType::Update)
            .one(&txn)
            .await?,
        "Opportunity",
    )?;
    existing.authorize(auth_user.identity(), Action::Delete)?;

    let removed = applicant::Entity::delete_many()
        .filter(applicant::Column::OpportunityId.eq(id))
        .exec(&txn)
        .await?
        .rows_affected;
    opportunity::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(opportunity_id = id, applicants = removed, "Opportunity deleted");
    Ok(Json(MessageResponse::new("Opportunity deleted successfully")))
}

async fn opportunity_stats(db: &DatabaseConnection) -> Result<OpportunityStats, DbErr> {
    let week_ago = Utc::now() - Duration::days(7);
    Ok(OpportunityStats {
        total: opportunity::Entity::find().count(db).await?,
        by_status: count_by(db, opportunity::Entity::find(), opportunity::Column::Status).await?,
        created_last7_days: opportunity::Entity::find()
            .filter(opportunity::Column::CreatedAt.gte(week_ago))
            .count(db)
            .await?,
    })
}

async fn ensure_category<C: ConnectionTrait>(db: &C, id: i32) -> Result<(), AppError> {
    found(
        opportunity_category::Entity::find_by_id(id).one(db).await?,
        "Opportunity category",
    )
    .map(|_| ())
}

pub(crate) async fn find_opportunity<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<opportunity::Model, AppError> {
    found(opportunity::Entity::find_by_id(id).one(db).await?, "Opportunity")
}
