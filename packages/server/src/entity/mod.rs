pub mod applicant;
pub mod calendar;
pub mod category;
pub mod event;
pub mod guest;
pub mod news;
pub mod notification;
pub mod opportunity;
pub mod opportunity_category;
pub mod payment;
pub mod registration;
pub mod user;
