use common::OpportunityStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Job opportunity that accepts applications while `open`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "opportunity")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub requirements: Option<String>,
    pub deadline: DateTimeUtc,
    pub image: Option<String>,
    #[sea_orm(indexed)]
    pub status: OpportunityStatus,
    pub location: Option<String>,
    #[sea_orm(default_value = false)]
    pub is_remote: bool,

    #[sea_orm(indexed)]
    pub category_id: i32,
    #[sea_orm(belongs_to, from = "category_id", to = "id")]
    pub category: HasOne<super::opportunity_category::Entity>,

    #[sea_orm(indexed)]
    pub author_id: i32,
    #[sea_orm(belongs_to, from = "author_id", to = "id")]
    pub author: HasOne<super::user::Entity>,

    #[sea_orm(has_many)]
    pub applicants: HasMany<super::applicant::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
