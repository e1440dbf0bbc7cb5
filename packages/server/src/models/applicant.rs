use chrono::{DateTime, Utc};
use common::ApplicantStatus;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use super::shared::{FieldErrors, Pagination};
use crate::entity::applicant;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ApplyRequest {
    #[schema(example = "Hana Tesfaye")]
    pub name: String,
    #[schema(example = "hana@example.com")]
    pub email: String,
    pub phone: Option<String>,
    pub cover_letter: Option<String>,
    /// Ignored; taken from the bearer token when present.
    #[schema(value_type = Option<i32>)]
    pub user_id: Option<IgnoredAny>,
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateApplicantStatusRequest {
    pub status: ApplicantStatus,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[serde(deny_unknown_fields)]
#[into_params(parameter_in = Query)]
pub struct ApplicantListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<ApplicantStatus>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantResponse {
    pub id: i32,
    pub opportunity_id: i32,
    /// `null` for anonymous applications.
    pub user_id: Option<i32>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub cover_letter: Option<String>,
    pub resume: Option<String>,
    pub status: ApplicantStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ApplicantListResponse {
    pub applicants: Vec<ApplicantResponse>,
    pub pagination: Pagination,
}

impl From<applicant::Model> for ApplicantResponse {
    fn from(m: applicant::Model) -> Self {
        Self {
            id: m.id,
            opportunity_id: m.opportunity_id,
            user_id: m.user_id,
            name: m.name,
            email: m.email,
            phone: m.phone,
            cover_letter: m.cover_letter,
            resume: m.resume,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

pub fn validate_apply(req: &ApplyRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    errors.required_text("name", &req.name, 150);
    errors.email("email", &req.email);
    errors.optional_text("phone", req.phone.as_deref(), 32);
    errors.optional_text("coverLetter", req.cover_letter.as_deref(), 10_000);
    errors.finish()
}
