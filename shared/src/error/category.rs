//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the range of the error code:
/// - 0xxx: General errors
/// - 1xxx: Authorization errors
/// - 2xxx: Reservation errors
/// - 3xxx: Check-in and payment errors
/// - 4xxx: Resource errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Authorization errors (1xxx)
    Authorization,
    /// Reservation errors (2xxx)
    Reservation,
    /// Check-in and payment errors (3xxx)
    CheckIn,
    /// Resource errors (4xxx)
    Resource,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Authorization,
            2000..3000 => Self::Reservation,
            3000..4000 => Self::CheckIn,
            4000..5000 => Self::Resource,
            _ => Self::System,
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
