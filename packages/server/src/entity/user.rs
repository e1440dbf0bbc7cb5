use common::Role;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    /// argon2 PHC string.
    pub password: String,
    pub phone: Option<String>,
    pub role: Role,
    /// Restricted users cannot log in.
    #[sea_orm(default_value = false)]
    pub is_restricted: bool,

    #[sea_orm(has_many)]
    pub events: HasMany<super::event::Entity>,
    #[sea_orm(has_many)]
    pub opportunities: HasMany<super::opportunity::Entity>,
    #[sea_orm(has_many)]
    pub news: HasMany<super::news::Entity>,
    #[sea_orm(has_many)]
    pub registrations: HasMany<super::registration::Entity>,
    #[sea_orm(has_many)]
    pub notifications: HasMany<super::notification::Entity>,
    #[sea_orm(has_many)]
    pub applications: HasMany<super::applicant::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
