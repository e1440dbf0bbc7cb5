use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{EventStatus, RecurrencePattern, Visibility};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use super::shared::{FieldErrors, Pagination, double_option};
use crate::entity::event;
use crate::error::AppError;

pub const MAX_TITLE_LEN: usize = 200;

/// Canonical event location. Every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(deny_unknown_fields)]
pub struct Location {
    pub city: Option<String>,
    pub place: Option<String>,
    /// Latitude in degrees, -90..=90.
    pub lat: Option<f64>,
    /// Longitude in degrees, -180..=180.
    pub lng: Option<f64>,
}

/// Partial location update; absent parts are kept, `null` clears.
#[derive(Debug, Default, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(deny_unknown_fields)]
pub struct LocationPatch {
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub place: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>)]
    pub lat: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>)]
    pub lng: Option<Option<f64>>,
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[schema(example = "Addis Jazz Night")]
    pub title: String,
    pub description: Option<String>,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    #[serde(default)]
    pub location: Location,
    pub capacity: Option<i32>,
    #[serde(default)]
    pub is_paid: bool,
    pub price: Option<f64>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence_pattern: RecurrencePattern,
    pub category: Option<String>,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub visibility: Visibility,
    pub is_active: Option<bool>,
    /// Accepted for compatibility and ignored; the organizer is the caller.
    #[schema(value_type = Option<i32>)]
    pub organizer_id: Option<IgnoredAny>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub start_date_time: Option<DateTime<Utc>>,
    pub end_date_time: Option<DateTime<Utc>>,
    /// `null` clears the whole location.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<LocationPatch>)]
    pub location: Option<Option<LocationPatch>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub capacity: Option<Option<i32>>,
    pub is_paid: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>)]
    pub price: Option<Option<f64>>,
    pub is_recurring: Option<bool>,
    pub recurrence_pattern: Option<RecurrencePattern>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub category: Option<Option<String>>,
    pub status: Option<EventStatus>,
    pub visibility: Option<Visibility>,
    pub is_active: Option<bool>,
    /// Ignored; ownership cannot be transferred through an update.
    #[schema(value_type = Option<i32>)]
    pub organizer_id: Option<IgnoredAny>,
}

impl UpdateEventRequest {
    /// Whether any field that maps onto the calendar entry is present.
    pub fn touches_schedule(&self) -> bool {
        self.start_date_time.is_some()
            || self.end_date_time.is_some()
            || self.is_recurring.is_some()
            || self.recurrence_pattern.is_some()
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EventListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<EventStatus>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
    #[serde(default)]
    pub include_stats: bool,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[serde(deny_unknown_fields)]
#[into_params(parameter_in = Query)]
pub struct UpdateEventQuery {
    /// Append uploaded images instead of replacing the gallery.
    #[serde(default)]
    pub append: bool,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub location: Location,
    pub organizer_id: i32,
    pub main_image: Option<String>,
    pub images: Vec<String>,
    pub capacity: Option<i32>,
    pub is_paid: bool,
    pub price: Option<f64>,
    pub is_recurring: bool,
    pub recurrence_pattern: RecurrencePattern,
    pub category: Option<String>,
    pub status: EventStatus,
    pub visibility: Visibility,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventStats {
    pub total: u64,
    pub by_status: BTreeMap<String, u64>,
    pub by_category: BTreeMap<String, u64>,
    pub created_last7_days: u64,
    /// Events that have not started yet.
    pub upcoming: u64,
    /// Events in progress right now.
    pub ongoing: u64,
    /// Events that have ended.
    pub past: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EventListResponse {
    pub events: Vec<EventResponse>,
    pub pagination: Pagination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<EventStats>,
}

/// Reads a stored JSON string list (images, tags), skipping non-string items.
pub fn strings_from_json(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub fn strings_to_json(images: &[String]) -> serde_json::Value {
    serde_json::Value::from(images.to_vec())
}

impl From<event::Model> for EventResponse {
    fn from(m: event::Model) -> Self {
        Self {
            id: m.id,
            images: strings_from_json(&m.images),
            title: m.title,
            description: m.description,
            start_date_time: m.start_date_time,
            end_date_time: m.end_date_time,
            location: Location {
                city: m.city,
                place: m.place,
                lat: m.lat,
                lng: m.lng,
            },
            organizer_id: m.organizer_id,
            main_image: m.main_image,
            capacity: m.capacity,
            is_paid: m.is_paid,
            price: m.price,
            is_recurring: m.is_recurring,
            recurrence_pattern: m.recurrence_pattern,
            category: m.category,
            status: m.status,
            visibility: m.visibility,
            is_active: m.is_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

fn check_coordinates(errors: &mut FieldErrors, lat: Option<f64>, lng: Option<f64>) {
    if let Some(lat) = lat {
        errors.check(
            (-90.0..=90.0).contains(&lat),
            "location.lat must be between -90 and 90",
        );
    }
    if let Some(lng) = lng {
        errors.check(
            (-180.0..=180.0).contains(&lng),
            "location.lng must be between -180 and 180",
        );
    }
}

/// Rules that involve more than one field, checked on the merged record.
pub fn check_consistency(
    errors: &mut FieldErrors,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    is_paid: bool,
    price: Option<f64>,
) {
    errors.check(end >= start, "endDateTime must not be before startDateTime");
    if is_paid {
        errors.check(
            price.is_some_and(|p| p > 0.0),
            "price is required for paid events",
        );
    }
    if let Some(price) = price {
        errors.check(price >= 0.0, "price must not be negative");
    }
}

pub fn validate_create_event(req: &CreateEventRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    errors.required_text("title", &req.title, MAX_TITLE_LEN);
    check_coordinates(&mut errors, req.location.lat, req.location.lng);
    if let Some(capacity) = req.capacity {
        errors.check(capacity >= 1, "capacity must be at least 1");
    }
    check_consistency(
        &mut errors,
        req.start_date_time,
        req.end_date_time,
        req.is_paid,
        req.price,
    );
    errors.finish()
}

/// Field-level checks; cross-field rules run on the merged record in the handler.
pub fn validate_update_event(req: &UpdateEventRequest, errors: &mut FieldErrors) {
    if let Some(ref title) = req.title {
        errors.required_text("title", title, MAX_TITLE_LEN);
    }
    if let Some(Some(ref location)) = req.location {
        check_coordinates(errors, location.lat.flatten(), location.lng.flatten());
    }
    if let Some(Some(capacity)) = req.capacity {
        errors.check(capacity >= 1, "capacity must be at least 1");
    }
}
