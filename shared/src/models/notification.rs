//! Lifecycle notification events
//!
//! The engine only defines the trigger contract; delivery transport is a
//! collaborator concern.

use serde::{Deserialize, Serialize};

/// Lifecycle events consumed by the notification dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    ReservationCreated,
    ReservationApproved,
    ReservationRejected,
    ReservationCancelled,
    ReservationReminder,
    CheckinOpened,
    PaymentConfirmed,
    CheckoutCompleted,
}

impl NotificationEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReservationCreated => "reservation_created",
            Self::ReservationApproved => "reservation_approved",
            Self::ReservationRejected => "reservation_rejected",
            Self::ReservationCancelled => "reservation_cancelled",
            Self::ReservationReminder => "reservation_reminder",
            Self::CheckinOpened => "checkin_opened",
            Self::PaymentConfirmed => "payment_confirmed",
            Self::CheckoutCompleted => "checkout_completed",
        }
    }
}

impl std::fmt::Display for NotificationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
