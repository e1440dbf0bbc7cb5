use chrono::{DateTime, Utc};
use common::{PaymentMethod, PaymentStatus};
use serde::{Deserialize, Serialize};

use super::shared::{FieldErrors, Pagination};
use crate::entity::payment;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub registration_id: i32,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub transaction_id: Option<String>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdatePaymentRequest {
    pub amount: Option<f64>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: Option<PaymentStatus>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PaymentListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub registration_id: Option<i32>,
    pub payment_status: Option<PaymentStatus>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: i32,
    pub registration_id: i32,
    pub amount: f64,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PaymentListResponse {
    pub payments: Vec<PaymentResponse>,
    pub pagination: Pagination,
}

impl From<payment::Model> for PaymentResponse {
    fn from(m: payment::Model) -> Self {
        Self {
            id: m.id,
            registration_id: m.registration_id,
            amount: m.amount,
            payment_status: m.payment_status,
            payment_method: m.payment_method,
            transaction_id: m.transaction_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

pub fn validate_amount(errors: &mut FieldErrors, amount: f64) {
    errors.check(
        amount.is_finite() && amount > 0.0,
        "amount must be a positive number",
    );
}

pub fn validate_create_payment(req: &CreatePaymentRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    validate_amount(&mut errors, req.amount);
    errors.optional_text("transactionId", req.transaction_id.as_deref(), 100);
    errors.finish()
}

pub fn validate_update_payment(req: &UpdatePaymentRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    if let Some(amount) = req.amount {
        validate_amount(&mut errors, amount);
    }
    errors.finish()
}
