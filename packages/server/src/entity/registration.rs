use common::{PaymentMethod, RegistrationStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "registration")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "user_event")]
    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    #[sea_orm(indexed, unique_key = "user_event")]
    pub event_id: i32,
    #[sea_orm(belongs_to, from = "event_id", to = "id")]
    pub event: HasOne<super::event::Entity>,

    pub status: RegistrationStatus,
    pub payment_method: Option<PaymentMethod>,
    /// Gateway transaction reference for paid events.
    pub payment_reference: Option<String>,
    /// Amount due; `None` for free events.
    pub amount: Option<f64>,

    #[sea_orm(has_many)]
    pub payments: HasMany<super::payment::Entity>,

    pub registration_date: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
