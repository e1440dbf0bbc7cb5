//! Enumerations shared by the API surface and the persistence layer.
//!
//! Every enum serializes as its snake_case wire name. With the `sea-orm`
//! feature enabled they can be used directly as entity columns, stored as
//! the same string.

#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Generates `ALL`, `as_str` and `Display` from the variant/wire-name table.
macro_rules! wire_names {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// All variants in declaration order.
            pub const ALL: &'static [$ty] = &[$(Self::$variant),+];

            /// The wire (and storage) name of this value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// Account role. Admins bypass every ownership check.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "admin"))]
    Admin,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "organizer"))]
    Organizer,
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "attendee"))]
    Attendee,
}

wire_names!(Role {
    Admin => "admin",
    Organizer => "organizer",
    Attendee => "attendee",
});

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Lifecycle state of an event.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "upcoming"))]
    Upcoming,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ongoing"))]
    Ongoing,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "completed"))]
    Completed,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "canceled"))]
    Canceled,
}

wire_names!(EventStatus {
    Upcoming => "upcoming",
    Ongoing => "ongoing",
    Completed => "completed",
    Canceled => "canceled",
});

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "public"))]
    Public,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "private"))]
    Private,
}

wire_names!(Visibility {
    Public => "public",
    Private => "private",
});

/// How a calendar entry repeats.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum RecurrencePattern {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "daily"))]
    Daily,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "weekly"))]
    Weekly,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "monthly"))]
    Monthly,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "yearly"))]
    Yearly,
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "none"))]
    None,
}

wire_names!(RecurrencePattern {
    Daily => "daily",
    Weekly => "weekly",
    Monthly => "monthly",
    Yearly => "yearly",
    None => "none",
});

/// Review state of a job application.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum ApplicantStatus {
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "pending"))]
    Pending,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "reviewed"))]
    Reviewed,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "shortlisted"))]
    Shortlisted,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "rejected"))]
    Rejected,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "hired"))]
    Hired,
}

wire_names!(ApplicantStatus {
    Pending => "pending",
    Reviewed => "reviewed",
    Shortlisted => "shortlisted",
    Rejected => "rejected",
    Hired => "hired",
});

/// Publication state of a job opportunity. Only `open` accepts applications.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityStatus {
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "open"))]
    Open,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "closed"))]
    Closed,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "draft"))]
    Draft,
}

wire_names!(OpportunityStatus {
    Open => "open",
    Closed => "closed",
    Draft => "draft",
});

impl OpportunityStatus {
    pub fn accepts_applications(&self) -> bool {
        matches!(self, Self::Open)
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum NewsStatus {
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "draft"))]
    Draft,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "published"))]
    Published,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "archived"))]
    Archived,
}

wire_names!(NewsStatus {
    Draft => "draft",
    Published => "published",
    Archived => "archived",
});

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "pending"))]
    Pending,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "confirmed"))]
    Confirmed,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "canceled"))]
    Canceled,
}

wire_names!(RegistrationStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Canceled => "canceled",
});

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "pending"))]
    Pending,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "completed"))]
    Completed,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "failed"))]
    Failed,
}

wire_names!(PaymentStatus {
    Pending => "pending",
    Completed => "completed",
    Failed => "failed",
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "credit_card"))]
    CreditCard,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "paypal"))]
    Paypal,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "bank_transfer"))]
    BankTransfer,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "chapa"))]
    Chapa,
}

wire_names!(PaymentMethod {
    CreditCard => "credit_card",
    Paypal => "paypal",
    BankTransfer => "bank_transfer",
    Chapa => "chapa",
});
