use axum::Json;
use axum::extract::{Path, State};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::Query as SeaQuery;
use sea_orm::*;
use tracing::instrument;

use super::{fetch_page, found};
use crate::authz::{self, Action};
use crate::entity::{applicant, event, news, notification, opportunity, payment, registration, user};
use crate::error::{AppError, ErrorBody, unique_violation};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::models::shared::{MessageResponse, PageParams, normalize_email};
use crate::models::user::*;
use crate::state::AppState;
use crate::utils::hash;

#[utoipa::path(
    get,
    path = "/",
    tag = "Users",
    operation_id = "listUsers",
    summary = "List users",
    description = "Paginated user directory, newest first, optionally filtered by role. Admin only.",
    params(UserListQuery),
    responses(
        (status = 200, description = "List of users", body = UserListResponse),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Not an admin (FORBIDDEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<UserListQuery>,
) -> Result<Json<UserListResponse>, AppError> {
    authz::require_admin(auth_user.identity(), Action::View, "user directory")?;

    let page = PageParams::resolve(query.page, query.limit);
    let mut select = user::Entity::find();
    if let Some(role) = query.role {
        select = select.filter(user::Column::Role.eq(role));
    }
    let select = select
        .order_by_desc(user::Column::CreatedAt)
        .order_by_desc(user::Column::Id);

    let (users, pagination) = fetch_page(&state.db, select, page).await?;

    Ok(Json(UserListResponse {
        users: users.into_iter().map(Into::into).collect(),
        pagination,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Users",
    operation_id = "getUser",
    summary = "Get a user by ID",
    description = "Users may read their own profile; admins may read any.",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserResponse>, AppError> {
    let model = find_user(&state.db, id).await?;
    authz::authorize(auth_user.identity(), model.id, Action::View, "user")?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Users",
    operation_id = "updateUser",
    summary = "Update a user",
    description = "Partially updates a profile. Users may edit themselves; `role` and `isRestricted` may only be changed by an admin.",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let identity = auth_user.identity();
    let existing = find_user(&state.db, id).await?;
    authz::authorize(identity, existing.id, Action::Edit, "user")?;

    if (payload.role.is_some() || payload.is_restricted.is_some()) && !identity.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can change roles or restrictions".into(),
        ));
    }
    validate_update_user(&payload)?;

    if payload == UpdateUserRequest::default() {
        return Ok(Json(existing.into()));
    }

    let mut active: user::ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(email) = payload.email {
        active.email = Set(normalize_email(&email));
    }
    if let Some(password) = payload.password {
        let hash = hash::hash_password(&password)
            .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;
        active.password = Set(hash);
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(phone.map(|p| p.trim().to_string()));
    }
    if let Some(role) = payload.role {
        active.role = Set(role);
    }
    if let Some(is_restricted) = payload.is_restricted {
        active.is_restricted = Set(is_restricted);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active
        .update(&state.db)
        .await
        .map_err(|e| unique_violation(e, "Email is already in use"))?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Users",
    operation_id = "deleteUser",
    summary = "Delete a user",
    description = "Deletes an account together with its registrations, payments and notifications; applications are kept but detached. Refused while the user still owns events, opportunities or news.",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 400, description = "User still owns content (BUSINESS_RULE)", body = ErrorBody),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    let txn = state.db.begin().await?;
    let existing = found(user::Entity::find_by_id(id).one(&txn).await?, "User")?;
    authz::authorize(auth_user.identity(), existing.id, Action::Delete, "user")?;

    let owns_content = event::Entity::find()
        .filter(event::Column::OrganizerId.eq(id))
        .count(&txn)
        .await?
        + opportunity::Entity::find()
            .filter(opportunity::Column::AuthorId.eq(id))
            .count(&txn)
            .await?
        + news::Entity::find()
            .filter(news::Column::AuthorId.eq(id))
            .count(&txn)
            .await?;
    if owns_content > 0 {
        return Err(AppError::BusinessRule(
            "User still owns events, opportunities or news".into(),
        ));
    }

    payment::Entity::delete_many()
        .filter(
            payment::Column::RegistrationId.in_subquery(
                SeaQuery::select()
                    .column(registration::Column::Id)
                    .from(registration::Entity)
                    .and_where(registration::Column::UserId.eq(id))
                    .to_owned(),
            ),
        )
        .exec(&txn)
        .await?;
    registration::Entity::delete_many()
        .filter(registration::Column::UserId.eq(id))
        .exec(&txn)
        .await?;
    notification::Entity::delete_many()
        .filter(notification::Column::UserId.eq(id))
        .exec(&txn)
        .await?;
    applicant::Entity::update_many()
        .col_expr(applicant::Column::UserId, Expr::value(Option::<i32>::None))
        .filter(applicant::Column::UserId.eq(id))
        .exec(&txn)
        .await?;
    user::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    tracing::info!(deleted_user = id, "User deleted");

    Ok(Json(MessageResponse::new("User deleted successfully")))
}

async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    found(user::Entity::find_by_id(id).one(db).await?, "User")
}
