use chrono::{DateTime, Utc};
use common::{PaymentMethod, RegistrationStatus};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use super::shared::{Pagination, double_option};
use crate::entity::registration;

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateRegistrationRequest {
    pub event_id: i32,
    /// Required for paid events.
    pub payment_method: Option<PaymentMethod>,
    /// Must equal the event price when sent.
    pub amount: Option<f64>,
    /// Ignored; the registrant is the caller.
    #[schema(value_type = Option<i32>)]
    pub user_id: Option<IgnoredAny>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdateRegistrationRequest {
    pub status: Option<RegistrationStatus>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<PaymentMethod>)]
    pub payment_method: Option<Option<PaymentMethod>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub payment_reference: Option<Option<String>>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RegistrationListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub event_id: Option<i32>,
    pub status: Option<RegistrationStatus>,
    #[serde(default)]
    pub include_stats: bool,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub id: i32,
    pub user_id: i32,
    pub event_id: i32,
    pub status: RegistrationStatus,
    pub payment_method: Option<PaymentMethod>,
    pub payment_reference: Option<String>,
    pub amount: Option<f64>,
    pub registration_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Returned on creation; carries the gateway checkout link for paid events.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedRegistrationResponse {
    pub registration: RegistrationResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,
}

#[derive(Debug, Default, Serialize, utoipa::ToSchema)]
pub struct RegistrationStats {
    pub total: u64,
    pub paid: u64,
    pub free: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RegistrationListResponse {
    pub registrations: Vec<RegistrationResponse>,
    pub pagination: Pagination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<RegistrationStats>,
}

impl From<registration::Model> for RegistrationResponse {
    fn from(m: registration::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            event_id: m.event_id,
            status: m.status,
            payment_method: m.payment_method,
            payment_reference: m.payment_reference,
            amount: m.amount,
            registration_date: m.registration_date,
            updated_at: m.updated_at,
        }
    }
}
