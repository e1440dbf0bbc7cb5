use common::{EventStatus, RecurrencePattern, Visibility};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(indexed)]
    pub start_date_time: DateTimeUtc,
    pub end_date_time: DateTimeUtc,

    // Location, flattened.
    pub city: Option<String>,
    pub place: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,

    #[sea_orm(indexed)]
    pub organizer_id: i32,
    #[sea_orm(belongs_to, from = "organizer_id", to = "id")]
    pub organizer: HasOne<super::user::Entity>,

    pub main_image: Option<String>,
    /// JSON array of upload paths.
    #[sea_orm(column_type = "Json")]
    pub images: Json,
    pub capacity: Option<i32>,
    #[sea_orm(default_value = false)]
    pub is_paid: bool,
    pub price: Option<f64>,
    #[sea_orm(default_value = false)]
    pub is_recurring: bool,
    pub recurrence_pattern: RecurrencePattern,
    #[sea_orm(indexed)]
    pub category: Option<String>,
    #[sea_orm(indexed)]
    pub status: EventStatus,
    pub visibility: Visibility,
    #[sea_orm(default_value = true)]
    pub is_active: bool,

    #[sea_orm(has_many)]
    pub calendars: HasMany<super::calendar::Entity>,
    #[sea_orm(has_many)]
    pub guests: HasMany<super::guest::Entity>,
    #[sea_orm(has_many)]
    pub registrations: HasMany<super::registration::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
