use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;

use crate::services::payment::PaymentError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `UNAUTHENTICATED`,
    /// `INVALID_CREDENTIALS`, `FORBIDDEN`, `NOT_FOUND`, `BUSINESS_RULE`,
    /// `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Invalid email format")]
    pub message: String,
    /// Per-field messages, present for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    /// Malformed input. Carries one message per offending field.
    Validation(Vec<String>),
    Unauthenticated,
    InvalidCredentials,
    Forbidden(String),
    NotFound(String),
    /// The request is well-formed but breaks a rule of the domain.
    BusinessRule(String),
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(vec![msg.into()])
    }

    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(errors) => {
                let message = match errors.as_slice() {
                    [single] => single.clone(),
                    _ => "Validation failed".into(),
                };
                (
                    StatusCode::BAD_REQUEST,
                    ErrorBody {
                        code: "VALIDATION_ERROR",
                        message,
                        errors: Some(errors),
                    },
                )
            }
            AppError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "UNAUTHENTICATED",
                    message: "Please authenticate".into(),
                    errors: None,
                },
            ),
            AppError::InvalidCredentials => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "INVALID_CREDENTIALS",
                    message: "Invalid email or password".into(),
                    errors: None,
                },
            ),
            AppError::Forbidden(msg) => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "FORBIDDEN",
                    message: msg,
                    errors: None,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                    errors: None,
                },
            ),
            AppError::BusinessRule(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "BUSINESS_RULE",
                    message: msg,
                    errors: None,
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                        errors: None,
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(name) => AppError::NotFound(format!("File '{name}' not found")),
            e if e.is_client_error() => AppError::validation(e.to_string()),
            e => AppError::Internal(e.to_string()),
        }
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Disabled => {
                AppError::BusinessRule("Online payment is not available".into())
            }
            PaymentError::Rejected(_) => {
                AppError::BusinessRule("Payment initialization failed".into())
            }
            other => AppError::Internal(format!("Payment gateway error: {other}")),
        }
    }
}

/// Maps a unique-constraint violation to a validation error with `message`;
/// any other database error stays internal.
pub fn unique_violation(err: DbErr, message: &str) -> AppError {
    on_unique_violation(err, || AppError::validation(message))
}

/// Like [`unique_violation`], for keys that encode a domain rule (one
/// registration per event, one application per user): the violation is a
/// `BUSINESS_RULE` error.
pub fn unique_conflict(err: DbErr, message: &str) -> AppError {
    on_unique_violation(err, || AppError::BusinessRule(message.into()))
}

fn on_unique_violation(err: DbErr, conflict: impl FnOnce() -> AppError) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Unique constraint caught on write");
            conflict()
        }
        _ => AppError::from(err),
    }
}
