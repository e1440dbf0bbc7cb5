use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{Duration, Utc};
use common::storage::UploadCategory;
use sea_orm::*;
use tracing::instrument;

use super::{best_effort_stats, count_by, discard_on_error, fetch_page, found, store_upload};
use crate::authz::{Action, Owned};
use crate::entity::{category, news};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::query::AppQuery;
use crate::extractors::upload::UploadForm;
use crate::models::event::strings_to_json;
use crate::models::news::*;
use crate::models::shared::{MessageResponse, PageParams};
use crate::state::AppState;

pub const IMAGE_FIELD: &str = "image";

#[utoipa::path(
    get,
    path = "/",
    tag = "News",
    operation_id = "listNews",
    summary = "List news articles",
    description = "Paginated articles, most recently published first. Filters: `status`, `categoryId`. `includeStats=true` adds counts by status and the number published in the last seven days.",
    params(NewsListQuery),
    responses(
        (status = 200, description = "List of articles", body = NewsListResponse),
        (status = 400, description = "Invalid query (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_news(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<NewsListQuery>,
) -> Result<Json<NewsListResponse>, AppError> {
    let page = PageParams::resolve(query.page, query.limit);

    let mut select = news::Entity::find();
    if let Some(status) = query.status {
        select = select.filter(news::Column::Status.eq(status));
    }
    if let Some(category_id) = query.category_id {
        select = select.filter(news::Column::CategoryId.eq(category_id));
    }
    let select = select
        .order_by_desc(news::Column::PublishedAt)
        .order_by_desc(news::Column::CreatedAt)
        .order_by_desc(news::Column::Id);

    let (items, pagination) = fetch_page(&state.db, select, page).await?;

    let stats = if query.include_stats {
        best_effort_stats("news", news_stats(&state.db)).await
    } else {
        None
    };

    Ok(Json(NewsListResponse {
        news: items.into_iter().map(Into::into).collect(),
        pagination,
        stats,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "News",
    operation_id = "getNews",
    summary = "Get a news article by ID",
    params(("id" = i32, Path, description = "News ID")),
    responses(
        (status = 200, description = "Article", body = NewsResponse),
        (status = 404, description = "News not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_news(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<NewsResponse>, AppError> {
    let model = find_news(&state.db, id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "News",
    operation_id = "createNews",
    summary = "Write a news article",
    description = "Any authenticated user; the author is the caller. Creating an article as `published` stamps `publishedAt`. Accepts JSON, or multipart with a `payload` part and an optional `image`.",
    request_body(content = CreateNewsRequest, description = "Article fields (JSON body or `payload` part)"),
    responses(
        (status = 201, description = "Article created", body = NewsResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, form), fields(user_id = auth_user.user_id))]
pub async fn create_news(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut form: UploadForm<CreateNewsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let image = form.take(IMAGE_FIELD);
    form.ensure_consumed()?;
    validate_create_news(&form.payload)?;
    if let Some(category_id) = form.payload.category_id {
        ensure_category(&state.db, category_id).await?;
    }

    let image = store_upload(&state, image, UploadCategory::News).await?;
    let payload = form.payload;
    let now = Utc::now();

    let row = news::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        content: Set(payload.content),
        image: Set(image.clone()),
        status: Set(payload.status),
        tags: Set(strings_to_json(&normalize_tags(&payload.tags))),
        published_at: Set(published_at_after(None, payload.status, now)),
        author_id: Set(auth_user.user_id),
        category_id: Set(payload.category_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let model = discard_on_error(&state, image.as_slice(), row.insert(&state.db)).await?;

    Ok((StatusCode::CREATED, Json(NewsResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "News",
    operation_id = "updateNews",
    summary = "Update a news article",
    description = "Author or admin only. The first transition to `published` stamps `publishedAt`; later transitions keep it.",
    params(("id" = i32, Path, description = "News ID")),
    request_body(content = UpdateNewsRequest, description = "Fields to change (JSON body or `payload` part)"),
    responses(
        (status = 200, description = "Article updated", body = NewsResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "News or category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, form), fields(user_id = auth_user.user_id))]
pub async fn update_news(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut form: UploadForm<UpdateNewsRequest>,
) -> Result<Json<NewsResponse>, AppError> {
    let image = form.take(IMAGE_FIELD);
    form.ensure_consumed()?;

    let existing = find_news(&state.db, id).await?;
    existing.authorize(auth_user.identity(), Action::Edit)?;
    validate_update_news(&form.payload)?;

    let payload = form.payload;
    if payload == UpdateNewsRequest::default() && image.is_none() {
        return Ok(Json(existing.into()));
    }
    if let Some(Some(category_id)) = payload.category_id {
        ensure_category(&state.db, category_id).await?;
    }
    let image = store_upload(&state, image, UploadCategory::News).await?;

    let now = Utc::now();
    let published_at = existing.published_at;
    let mut active: news::ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(content) = payload.content {
        active.content = Set(content);
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
        active.published_at = Set(published_at_after(published_at, status, now));
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(category_id);
    }
    if let Some(tags) = payload.tags {
        active.tags = Set(strings_to_json(&normalize_tags(&tags)));
    }
    if image.is_some() {
        active.image = Set(image.clone());
    }
    active.updated_at = Set(now);

    let model = discard_on_error(&state, image.as_slice(), active.update(&state.db)).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "News",
    operation_id = "deleteNews",
    summary = "Delete a news article",
    description = "Author or admin only.",
    params(("id" = i32, Path, description = "News ID")),
    responses(
        (status = 200, description = "Article deleted", body = MessageResponse),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "News not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_news(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    let existing = find_news(&state.db, id).await?;
    existing.authorize(auth_user.identity(), Action::Delete)?;

    news::Entity::delete_by_id(existing.id).exec(&state.db).await?;
    Ok(Json(MessageResponse::new("News deleted successfully")))
}

async fn news_stats(db: &DatabaseConnection) -> Result<NewsStats, DbErr> {
    let week_ago = Utc::now() - Duration::days(7);
    Ok(NewsStats {
        total: news::Entity::find().count(db).await?,
        by_status: count_by(db, news::Entity::find(), news::Column::Status).await?,
        published_last7_days: news::Entity::find()
            .filter(news::Column::PublishedAt.gte(week_ago))
            .count(db)
            .await?,
    })
}

async fn ensure_category<C: ConnectionTrait>(db: &C, id: i32) -> Result<(), AppError> {
    found(category::Entity::find_by_id(id).one(db).await?, "Category").map(|_| ())
}

async fn find_news<C: ConnectionTrait>(db: &C, id: i32) -> Result<news::Model, AppError> {
    found(news::Entity::find_by_id(id).one(db).await?, "News")
}
