//! HTTP status code mapping for error codes
//!
//! Adapters map the error code to a status; they never match on message
//! text.

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::ReservationNotFound
            | Self::CheckInNotFound
            | Self::DeviceNotFound
            | Self::DeviceTypeNotFound
            | Self::UserNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict (overlap, wrong-state transition, capacity,
            // double payment)
            Self::SlotAlreadyBooked
            | Self::InvalidStateTransition
            | Self::ActiveReservationLimit
            | Self::RentalUnitCapExceeded
            | Self::CancelWindowClosed
            | Self::UpdateWindowClosed
            | Self::NoShowTooEarly
            | Self::CheckInAlreadyActive
            | Self::PaymentAlreadyConfirmed
            | Self::PaymentNotConfirmed
            | Self::CheckInCompleted
            | Self::DeviceUnavailable => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied
            | Self::AdminRequired
            | Self::NotOwner
            | Self::AccountDisabled => StatusCode::FORBIDDEN,

            // 500 Internal Server Error
            Self::InternalError | Self::DatabaseError | Self::ConfigError | Self::Unknown => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request (default for validation errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy_mapping() {
        assert_eq!(
            ErrorCode::ValidationFailed.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::AdjustmentReasonRequired.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::ReservationNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ErrorCode::NotOwner.http_status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ErrorCode::SlotAlreadyBooked.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::PaymentAlreadyConfirmed.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::DatabaseError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_lead_time_rules_are_validation_errors() {
        assert_eq!(
            ErrorCode::LeadTimeTooShort.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::BookingWindowExceeded.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ErrorCode::StartInPast.http_status(), StatusCode::BAD_REQUEST);
    }
}
