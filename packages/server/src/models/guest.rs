use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{FieldErrors, Pagination, double_option};
use crate::entity::guest;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateGuestRequest {
    #[schema(example = "Mulatu Astatke")]
    pub name: String,
    pub email: Option<String>,
    pub profession: Option<String>,
    pub description: Option<String>,
    pub membership: Option<String>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdateGuestRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub profession: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub membership: Option<Option<String>>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct GuestListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub event_id: Option<i32>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuestResponse {
    pub id: i32,
    pub event_id: i32,
    pub name: String,
    pub email: Option<String>,
    pub profession: Option<String>,
    pub description: Option<String>,
    pub membership: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct GuestListResponse {
    pub guests: Vec<GuestResponse>,
    pub pagination: Pagination,
}

impl From<guest::Model> for GuestResponse {
    fn from(m: guest::Model) -> Self {
        Self {
            id: m.id,
            event_id: m.event_id,
            name: m.name,
            email: m.email,
            profession: m.profession,
            description: m.description,
            membership: m.membership,
            image: m.image,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

pub fn validate_create_guest(req: &CreateGuestRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    errors.required_text("name", &req.name, 150);
    if let Some(ref email) = req.email {
        errors.email("email", email);
    }
    errors.optional_text("profession", req.profession.as_deref(), 150);
    errors.optional_text("membership", req.membership.as_deref(), 100);
    errors.finish()
}

pub fn validate_update_guest(req: &UpdateGuestRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    if let Some(ref name) = req.name {
        errors.required_text("name", name, 150);
    }
    if let Some(Some(ref email)) = req.email {
        errors.email("email", email);
    }
    if let Some(ref profession) = req.profession {
        errors.optional_text("profession", profession.as_deref(), 150);
    }
    if let Some(ref membership) = req.membership {
        errors.optional_text("membership", membership.as_deref(), 100);
    }
    errors.finish()
}
