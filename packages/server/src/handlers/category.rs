//! News categories (`/categories`) and opportunity categories
//! (`/opportunity-categories`). Both are admin-managed lookup tables with
//! unique names.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::instrument;

use super::found;
use crate::authz::{self, Action};
use crate::entity::{category, news, opportunity, opportunity_category};
use crate::error::{AppError, ErrorBody, unique_violation};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::category::*;
use crate::models::shared::MessageResponse;
use crate::state::AppState;

const DUPLICATE_NAME: &str = "Category name already exists";

#[utoipa::path(
    get,
    path = "/",
    tag = "Categories",
    operation_id = "listCategories",
    summary = "List news categories",
    responses((status = 200, description = "Categories ordered by name", body = CategoryListResponse)),
)]
#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoryListResponse>, AppError> {
    let rows = category::Entity::find()
        .order_by_asc(category::Column::Name)
        .all(&state.db)
        .await?;
    Ok(Json(CategoryListResponse {
        categories: rows.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Categories",
    operation_id = "getCategory",
    summary = "Get a news category",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category", body = CategoryResponse),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CategoryResponse>, AppError> {
    let model = found(category::Entity::find_by_id(id).one(&state.db).await?, "Category")?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Categories",
    operation_id = "createCategory",
    summary = "Create a news category",
    description = "Admin only.",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Validation error or duplicate name (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Not an admin (FORBIDDEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    authz::require_admin(auth_user.identity(), Action::Edit, "category")?;
    validate_create_category(&payload)?;

    let now = Utc::now();
    let model = category::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| unique_violation(e, DUPLICATE_NAME))?;

    Ok((StatusCode::CREATED, Json(CategoryResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Categories",
    operation_id = "updateCategory",
    summary = "Update a news category",
    description = "Admin only.",
    params(("id" = i32, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 400, description = "Validation error or duplicate name (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Not an admin (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>, AppError> {
    let existing = found(category::Entity::find_by_id(id).one(&state.db).await?, "Category")?;
    authz::require_admin(auth_user.identity(), Action::Edit, "category")?;
    validate_update_category(&payload)?;

    if payload == UpdateCategoryRequest::default() {
        return Ok(Json(existing.into()));
    }

    let mut active: category::ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    active.updated_at = Set(Utc::now());

    let model = active
        .update(&state.db)
        .await
        .map_err(|e| unique_violation(e, DUPLICATE_NAME))?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Categories",
    operation_id = "deleteCategory",
    summary = "Delete a news category",
    description = "Admin only. Articles in the category are kept and become uncategorized.",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted", body = MessageResponse),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Not an admin (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    let txn = state.db.begin().await?;
    found(category::Entity::find_by_id(id).one(&txn).await?, "Category")?;
    authz::require_admin(auth_user.identity(), Action::Delete, "category")?;

    news::Entity::update_many()
        .col_expr(news::Column::CategoryId, Expr::value(Option::<i32>::None))
        .filter(news::Column::CategoryId.eq(id))
        .exec(&txn)
        .await?;
    category::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    Ok(Json(MessageResponse::new("Category deleted successfully")))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Opportunity Categories",
    operation_id = "listOpportunityCategories",
    summary = "List opportunity categories",
    responses((status = 200, description = "Categories ordered by name", body = CategoryListResponse)),
)]
#[instrument(skip(state))]
pub async fn list_opportunity_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoryListResponse>, AppError> {
    let rows = opportunity_category::Entity::find()
        .order_by_asc(opportunity_category::Column::Name)
        .all(&state.db)
        .await?;
    Ok(Json(CategoryListResponse {
        categories: rows.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Opportunity Categories",
    operation_id = "getOpportunityCategory",
    summary = "Get an opportunity category",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category", body = CategoryResponse),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_opportunity_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CategoryResponse>, AppError> {
    let model = find_opportunity_category(&state.db, id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Opportunity Categories",
    operation_id = "createOpportunityCategory",
    summary = "Create an opportunity category",
    description = "Admin only.",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Validation error or duplicate name (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Not an admin (FORBIDDEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_opportunity_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    authz::require_admin(auth_user.identity(), Action::Edit, "category")?;
    validate_create_category(&payload)?;

    let now = Utc::now();
    let model = opportunity_category::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| unique_violation(e, DUPLICATE_NAME))?;

    Ok((StatusCode::CREATED, Json(CategoryResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Opportunity Categories",
    operation_id = "updateOpportunityCategory",
    summary = "Update an opportunity category",
    description = "Admin only.",
    params(("id" = i32, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 400, description = "Validation error or duplicate name (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Not an admin (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_opportunity_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>, AppError> {
    let existing = find_opportunity_category(&state.db, id).await?;
    authz::require_admin(auth_user.identity(), Action::Edit, "category")?;
    validate_update_category(&payload)?;

    if payload == UpdateCategoryRequest::default() {
        return Ok(Json(existing.into()));
    }

    let mut active: opportunity_category::ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    active.updated_at = Set(Utc::now());

    let model = active
        .update(&state.db)
        .await
        .map_err(|e| unique_violation(e, DUPLICATE_NAME))?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Opportunity Categories",
    operation_id = "deleteOpportunityCategory",
    summary = "Delete an opportunity category",
    description = "Admin only. Refused while opportunities still reference the category.",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted", body = MessageResponse),
        (status = 400, description = "Category still in use (BUSINESS_RULE)", body = ErrorBody),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Not an admin (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_opportunity_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    find_opportunity_category(&state.db, id).await?;
    authz::require_admin(auth_user.identity(), Action::Delete, "category")?;

    let in_use = opportunity::Entity::find()
        .filter(opportunity::Column::CategoryId.eq(id))
        .count(&state.db)
        .await?;
    if in_use > 0 {
        return Err(AppError::BusinessRule(format!(
            "Category is used by {in_use} opportunities"
        )));
    }

    opportunity_category::Entity::delete_by_id(id)
        .exec(&state.db)
        .await?;
    Ok(Json(MessageResponse::new("Category deleted successfully")))
}

async fn find_opportunity_category<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<opportunity_category::Model, AppError> {
    found(
        opportunity_category::Entity::find_by_id(id).one(db).await?,
        "Opportunity category",
    )
}
