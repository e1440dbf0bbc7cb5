use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{FieldErrors, double_option};
use crate::entity::{category, opportunity_category};
use crate::error::AppError;

/// Body shared by news categories and opportunity categories.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateCategoryRequest {
    #[schema(example = "Technology")]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CategoryListResponse {
    pub categories: Vec<CategoryResponse>,
}

impl From<category::Model> for CategoryResponse {
    fn from(m: category::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<opportunity_category::Model> for CategoryResponse {
    fn from(m: opportunity_category::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

pub fn validate_create_category(req: &CreateCategoryRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    errors.required_text("name", &req.name, 100);
    errors.optional_text("description", req.description.as_deref(), 2000);
    errors.finish()
}

pub fn validate_update_category(req: &UpdateCategoryRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    if let Some(ref name) = req.name {
        errors.required_text("name", name, 100);
    }
    if let Some(Some(ref description)) = req.description {
        errors.optional_text("description", Some(description), 2000);
    }
    errors.finish()
}
