//! Business logic layer

pub mod checkin;
pub mod notify;
pub mod reservation;
pub mod rules;
