pub mod domain;
pub mod storage;

pub use domain::{
    ApplicantStatus, EventStatus, NewsStatus, OpportunityStatus, PaymentMethod, PaymentStatus,
    RecurrencePattern, RegistrationStatus, Role, Visibility,
};
