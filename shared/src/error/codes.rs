//! Unified error codes for the reservation engine
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authorization errors
//! - 2xxx: Reservation errors
//! - 3xxx: Check-in and payment errors
//! - 4xxx: Resource errors (devices, users)
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient
/// serialization and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Authorization ====================
    /// No acting user supplied with the request
    NotAuthenticated = 1001,
    /// Permission denied
    PermissionDenied = 1002,
    /// Admin role required
    AdminRequired = 1003,
    /// Only the reservation owner (or an admin) may act
    NotOwner = 1004,
    /// Account is disabled
    AccountDisabled = 1005,

    // ==================== 2xxx: Reservation ====================
    /// Reservation not found
    ReservationNotFound = 2001,
    /// The device is already booked for an overlapping slot
    SlotAlreadyBooked = 2002,
    /// Transition attempted from the wrong reservation state
    InvalidStateTransition = 2003,
    /// Early/overnight shifts require 24h lead time
    LeadTimeTooShort = 2004,
    /// Start is beyond the 21-day booking window
    BookingWindowExceeded = 2005,
    /// User already holds the maximum number of active reservations
    ActiveReservationLimit = 2006,
    /// Per-type rental unit cap reached for this shift
    RentalUnitCapExceeded = 2007,
    /// Cancellation window (2h before start) has closed
    CancelWindowClosed = 2008,
    /// Updates are only allowed 24h or more before start
    UpdateWindowClosed = 2009,
    /// Requested start is in the past
    StartInPast = 2010,
    /// Rejection requires a reason
    RejectionReasonRequired = 2011,
    /// No-shows can only be recorded after the grace period
    NoShowTooEarly = 2012,

    // ==================== 3xxx: Check-in / Payment ====================
    /// Check-in not found
    CheckInNotFound = 3001,
    /// A check-in is already open for this reservation
    CheckInAlreadyActive = 3002,
    /// Payment has already been confirmed
    PaymentAlreadyConfirmed = 3003,
    /// Checkout requires a confirmed payment
    PaymentNotConfirmed = 3004,
    /// Amount adjustments require a non-empty reason
    AdjustmentReasonRequired = 3005,
    /// Check-in is already completed
    CheckInCompleted = 3006,
    /// Adjustment must change at least one of time or amount
    AdjustmentEmpty = 3007,

    // ==================== 4xxx: Resource ====================
    /// Device not found
    DeviceNotFound = 4001,
    /// Device is under maintenance or broken
    DeviceUnavailable = 4002,
    /// Device type not found
    DeviceTypeNotFound = 4003,
    /// User not found
    UserNotFound = 4004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
}

/// Error returned when converting an unknown u16 into an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => Self::Success,
            1 => Self::Unknown,
            2 => Self::ValidationFailed,
            3 => Self::NotFound,
            5 => Self::InvalidRequest,
            6 => Self::InvalidFormat,
            7 => Self::RequiredField,
            8 => Self::ValueOutOfRange,
            1001 => Self::NotAuthenticated,
            1002 => Self::PermissionDenied,
            1003 => Self::AdminRequired,
            1004 => Self::NotOwner,
            1005 => Self::AccountDisabled,
            2001 => Self::ReservationNotFound,
            2002 => Self::SlotAlreadyBooked,
            2003 => Self::InvalidStateTransition,
            2004 => Self::LeadTimeTooShort,
            2005 => Self::BookingWindowExceeded,
            2006 => Self::ActiveReservationLimit,
            2007 => Self::RentalUnitCapExceeded,
            2008 => Self::CancelWindowClosed,
            2009 => Self::UpdateWindowClosed,
            2010 => Self::StartInPast,
            2011 => Self::RejectionReasonRequired,
            2012 => Self::NoShowTooEarly,
            3001 => Self::CheckInNotFound,
            3002 => Self::CheckInAlreadyActive,
            3003 => Self::PaymentAlreadyConfirmed,
            3004 => Self::PaymentNotConfirmed,
            3005 => Self::AdjustmentReasonRequired,
            3006 => Self::CheckInCompleted,
            3007 => Self::AdjustmentEmpty,
            4001 => Self::DeviceNotFound,
            4002 => Self::DeviceUnavailable,
            4003 => Self::DeviceTypeNotFound,
            4004 => Self::UserNotFound,
            9001 => Self::InternalError,
            9002 => Self::DatabaseError,
            9003 => Self::ConfigError,
            other => return Err(InvalidErrorCode(other)),
        };
        Ok(code)
    }
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the default human-readable message for this code
    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::InvalidRequest => "Invalid request",
            Self::InvalidFormat => "Invalid format",
            Self::RequiredField => "Required field missing",
            Self::ValueOutOfRange => "Value out of range",
            Self::NotAuthenticated => "Acting user not supplied",
            Self::PermissionDenied => "Permission denied",
            Self::AdminRequired => "Admin role required",
            Self::NotOwner => "Only the owner or an admin may perform this action",
            Self::AccountDisabled => "Account is disabled",
            Self::ReservationNotFound => "Reservation not found",
            Self::SlotAlreadyBooked => "Device is already booked for this time slot",
            Self::InvalidStateTransition => "Operation not allowed in the current state",
            Self::LeadTimeTooShort => {
                "Early and overnight shifts must be booked at least 24 hours in advance"
            }
            Self::BookingWindowExceeded => "Reservations are limited to 21 days in advance",
            Self::ActiveReservationLimit => "Maximum number of active reservations reached",
            Self::RentalUnitCapExceeded => "No rental units left for this shift",
            Self::CancelWindowClosed => {
                "Reservations must be cancelled at least 2 hours before start"
            }
            Self::UpdateWindowClosed => {
                "Reservations can only be changed 24 hours or more before start"
            }
            Self::StartInPast => "Reservation start must be in the future",
            Self::RejectionReasonRequired => "A rejection reason is required",
            Self::NoShowTooEarly => {
                "No-shows can be recorded 30 minutes after the scheduled start"
            }
            Self::CheckInNotFound => "Check-in not found",
            Self::CheckInAlreadyActive => "A check-in is already open for this reservation",
            Self::PaymentAlreadyConfirmed => "Payment has already been confirmed",
            Self::PaymentNotConfirmed => "Payment must be confirmed before checkout",
            Self::AdjustmentReasonRequired => "Amount adjustments require a reason",
            Self::CheckInCompleted => "Check-in is already completed",
            Self::AdjustmentEmpty => "Adjustment must change the time or the amount",
            Self::DeviceNotFound => "Device not found",
            Self::DeviceUnavailable => "Device is not available for rental",
            Self::DeviceTypeNotFound => "Device type not found",
            Self::UserNotFound => "User not found",
            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
            Self::ConfigError => "Configuration error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
