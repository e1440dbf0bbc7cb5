pub mod event_cascade;
pub mod payment;
