use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{FieldErrors, Pagination};
use crate::entity::notification;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateNotificationRequest {
    /// Recipient.
    pub user_id: i32,
    pub message: String,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdateNotificationRequest {
    pub message: Option<String>,
    pub is_read: Option<bool>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[serde(deny_unknown_fields)]
#[into_params(parameter_in = Query)]
pub struct NotificationListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Only unread notifications.
    #[serde(default)]
    pub unread: bool,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: i32,
    pub user_id: i32,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub pagination: Pagination,
}

impl From<notification::Model> for NotificationResponse {
    fn from(m: notification::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            message: m.message,
            is_read: m.is_read,
            created_at: m.created_at,
        }
    }
}

pub fn validate_message(message: &str) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    errors.required_text("message", message, 1000);
    errors.finish()
}
