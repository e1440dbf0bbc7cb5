use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use common::RecurrencePattern;
use serde::{Deserialize, Serialize};

use super::shared::{FieldErrors, Pagination};
use crate::entity::calendar;
use crate::error::AppError;

/// Date/time columns of a calendar entry derived from an event's start and end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl Schedule {
    pub fn from_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start_date: start.date_naive(),
            end_date: end.date_naive(),
            start_time: start.time(),
            end_time: end.time(),
        }
    }
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdateCalendarRequest {
    #[schema(value_type = Option<String>, format = Date)]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub end_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, example = "18:00:00")]
    pub start_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>, example = "21:00:00")]
    pub end_time: Option<NaiveTime>,
    pub is_recurring: Option<bool>,
    pub recurrence_pattern: Option<RecurrencePattern>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CalendarListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub event_id: Option<i32>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalendarResponse {
    pub id: i32,
    pub event_id: i32,
    #[schema(value_type = String, format = Date)]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub end_date: NaiveDate,
    #[schema(value_type = String)]
    pub start_time: NaiveTime,
    #[schema(value_type = String)]
    pub end_time: NaiveTime,
    pub is_recurring: bool,
    pub recurrence_pattern: RecurrencePattern,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CalendarListResponse {
    pub calendars: Vec<CalendarResponse>,
    pub pagination: Pagination,
}

impl From<calendar::Model> for CalendarResponse {
    fn from(m: calendar::Model) -> Self {
        Self {
            id: m.id,
            event_id: m.event_id,
            start_date: m.start_date,
            end_date: m.end_date,
            start_time: m.start_time,
            end_time: m.end_time,
            is_recurring: m.is_recurring,
            recurrence_pattern: m.recurrence_pattern,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Validates the merged entry: it must not end before it starts.
pub fn validate_calendar_range(schedule: &Schedule) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    errors.check(
        (schedule.end_date, schedule.end_time) >= (schedule.start_date, schedule.start_time),
        "calendar entry must not end before it starts",
    );
    errors.finish()
}
