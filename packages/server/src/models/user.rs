use chrono::{DateTime, Utc};
use common::Role;
use serde::{Deserialize, Serialize};

use super::shared::{FieldErrors, Pagination, double_option};
use crate::entity::user;
use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct SignupRequest {
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[schema(example = "s3cure-pass")]
    pub password: String,
    pub phone: Option<String>,
    /// `organizer` or `attendee`; defaults to `attendee`.
    pub role: Option<Role>,
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    /// Admin only.
    pub role: Option<Role>,
    /// Admin only.
    pub is_restricted: Option<bool>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub is_restricted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[serde(deny_unknown_fields)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub role: Option<Role>,
}

impl From<user::Model> for UserResponse {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            phone: m.phone,
            role: m.role,
            is_restricted: m.is_restricted,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

fn check_password(errors: &mut FieldErrors, password: &str) {
    let len = password.chars().count();
    errors.check(
        (MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len),
        format!("password must be {MIN_PASSWORD_LEN}-{MAX_PASSWORD_LEN} characters"),
    );
}

pub fn validate_signup(req: &SignupRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    errors.required_text("name", &req.name, 100);
    errors.email("email", &req.email);
    check_password(&mut errors, &req.password);
    errors.optional_text("phone", req.phone.as_deref(), 32);
    errors.check(
        req.role != Some(Role::Admin),
        "role must be one of: organizer, attendee",
    );
    errors.finish()
}

pub fn validate_update_user(req: &UpdateUserRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    if let Some(ref name) = req.name {
        errors.required_text("name", name, 100);
    }
    if let Some(ref email) = req.email {
        errors.email("email", email);
    }
    if let Some(ref password) = req.password {
        check_password(&mut errors, password);
    }
    if let Some(Some(ref phone)) = req.phone {
        errors.optional_text("phone", Some(phone), 32);
    }
    errors.finish()
}
