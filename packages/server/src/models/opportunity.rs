use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::OpportunityStatus;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use super::shared::{FieldErrors, Pagination, double_option};
use crate::entity::opportunity;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateOpportunityRequest {
    #[schema(example = "Backend Engineer")]
    pub title: String,
    pub description: String,
    pub requirements: Option<String>,
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub status: OpportunityStatus,
    pub category_id: i32,
    pub location: Option<String>,
    #[serde(default)]
    pub is_remote: bool,
    /// Ignored; the author is the caller.
    #[schema(value_type = Option<i32>)]
    pub author_id: Option<IgnoredAny>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdateOpportunityRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub requirements: Option<Option<String>>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: Option<OpportunityStatus>,
    pub category_id: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub location: Option<Option<String>>,
    pub is_remote: Option<bool>,
    /// Ignored; ownership cannot be transferred through an update.
    #[schema(value_type = Option<i32>)]
    pub author_id: Option<IgnoredAny>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OpportunityListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<OpportunityStatus>,
    pub category_id: Option<i32>,
    pub is_remote: Option<bool>,
    #[serde(default)]
    pub include_stats: bool,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub requirements: Option<String>,
    pub deadline: DateTime<Utc>,
    pub image: Option<String>,
    pub status: OpportunityStatus,
    pub category_id: i32,
    pub location: Option<String>,
    pub is_remote: bool,
    pub author_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityStats {
    pub total: u64,
    pub by_status: BTreeMap<String, u64>,
    pub created_last7_days: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct OpportunityListResponse {
    pub opportunities: Vec<OpportunityResponse>,
    pub pagination: Pagination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<OpportunityStats>,
}

impl From<opportunity::Model> for OpportunityResponse {
    fn from(m: opportunity::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            requirements: m.requirements,
            deadline: m.deadline,
            image: m.image,
            status: m.status,
            category_id: m.category_id,
            location: m.location,
            is_remote: m.is_remote,
            author_id: m.author_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

pub fn validate_create_opportunity(req: &CreateOpportunityRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    errors.required_text("title", &req.title, 200);
    errors.required_text("description", &req.description, 20_000);
    errors.optional_text("location", req.location.as_deref(), 200);
    errors.finish()
}

pub fn validate_update_opportunity(req: &UpdateOpportunityRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    if let Some(ref title) = req.title {
        errors.required_text("title", title, 200);
    }
    if let Some(ref description) = req.description {
        errors.required_text("description", description, 20_000);
    }
    if let Some(Some(ref location)) = req.location {
        errors.optional_text("location", Some(location), 200);
    }
    errors.finish()
}
