//! Reservation entity and state machine

use crate::clock::ClockInstant;
use crate::slot::{ShiftKind, TimeSlot};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reservation lifecycle status
///
/// ```text
/// pending    -> approved | rejected | cancelled
/// approved   -> checked_in | cancelled | completed (auto) | no_show (auto)
/// checked_in -> completed
/// ```
/// rejected / cancelled / completed / no_show are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Approved,
    Rejected,
    CheckedIn,
    Completed,
    Cancelled,
    NoShow,
}

impl ReservationStatus {
    /// Active reservations hold capacity and block overlapping bookings.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Approved | Self::CheckedIn)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Rejected | Self::Cancelled | Self::Completed | Self::NoShow
        )
    }

    /// Whether the state machine permits a transition to `next`.
    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        match self {
            Self::Pending => matches!(next, Self::Approved | Self::Rejected | Self::Cancelled),
            Self::Approved => matches!(
                next,
                Self::CheckedIn | Self::Cancelled | Self::Completed | Self::NoShow
            ),
            Self::CheckedIn => matches!(next, Self::Completed),
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::CheckedIn => "checked_in",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::NoShow => "no_show",
        }
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "checked_in" => Ok(Self::CheckedIn),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "no_show" => Ok(Self::NoShow),
            other => Err(format!("unknown reservation status: {other}")),
        }
    }
}

/// Reservation entity
///
/// `date` is the business date; the slot's extended hours may land on the
/// next calendar day. Reservations are never hard-deleted; terminal
/// statuses replace them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub device_id: Uuid,
    /// Business date of the slot
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub status: ReservationStatus,
    /// Human-facing number, e.g. RR-20250726-0421
    pub reservation_number: String,
    pub status_reason: Option<String>,
    /// Set when the reminder sweep has fired for this reservation
    pub reminder_sent: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Start instant on the venue clock.
    pub fn start_instant(&self) -> ClockInstant {
        self.time_slot.start_instant(self.date)
    }

    /// End instant on the venue clock.
    pub fn end_instant(&self) -> ClockInstant {
        self.time_slot.end_instant(self.date)
    }

    pub fn shift_kind(&self) -> ShiftKind {
        self.time_slot.shift_kind()
    }

    /// Generate a human-facing reservation number for a business date.
    pub fn generate_number(date: NaiveDate) -> String {
        let suffix: u16 = rand::random::<u16>() % 10000;
        format!("RR-{}-{:04}", date.format("%Y%m%d"), suffix)
    }
}

/// Create payload (`POST /reservations`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationCreate {
    pub user_id: Uuid,
    pub device_id: Uuid,
    /// Business date, YYYY-MM-DD
    pub date: NaiveDate,
    pub start_hour: u32,
    pub end_hour: u32,
    pub notes: Option<String>,
}

/// Partial update payload (`PATCH /reservations/{id}`)
///
/// Hours must be supplied as a pair; a lone bound is rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationUpdate {
    pub date: Option<NaiveDate>,
    pub start_hour: Option<u32>,
    pub end_hour: Option<u32>,
    pub notes: Option<String>,
}

impl ReservationUpdate {
    pub fn changes_schedule(&self) -> bool {
        self.date.is_some() || self.start_hour.is_some() || self.end_hour.is_some()
    }
}

/// Cancel payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

/// Reject payload; the reason is mandatory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

/// No-show payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoShowRequest {
    pub reason: Option<String>,
}
