use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::{header, request::Parts};
use common::Role;
use sea_orm::EntityTrait;

use crate::authz::Identity;
use crate::entity::user;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication, or
/// `Option<AuthUser>` where anonymous callers are allowed. The user row is
/// reloaded on every request, so deleted users are rejected immediately.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub role: Role,
    pub name: String,
    pub email: String,
}

impl AuthUser {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.user_id,
            role: self.role,
        }
    }
}

async fn authenticate(header_value: &str, state: &AppState) -> Result<AuthUser, AppError> {
    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthenticated)?;

    let claims = jwt::verify(token.trim(), &state.config.auth.jwt_secret).map_err(|e| {
        tracing::debug!("Token rejected: {e}");
        AppError::Unauthenticated
    })?;
    let user_id = claims.user_id().ok_or(AppError::Unauthenticated)?;

    let user = user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    let role = if state.config.auth.trust_token_role {
        claims.role
    } else {
        user.role
    };

    Ok(AuthUser {
        user_id: user.id,
        role,
        name: user.name,
        email: user.email,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthenticated)?;

        authenticate(auth_header, state).await
    }
}

/// No header means anonymous; a header that fails verification is still a 401.
impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
            return Ok(None);
        };
        let auth_header = value.to_str().map_err(|_| AppError::Unauthenticated)?;
        authenticate(auth_header, state).await.map(Some)
    }
}
