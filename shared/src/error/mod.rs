//! Unified error system for the reservation engine
//!
//! - [`ErrorCode`]: standardized error codes, grouped in category ranges
//! - [`ErrorCategory`]: classification of errors by domain
//! - [`AppError`]: rich error type with codes, messages, and details
//! - [`ApiResponse`]: unified API response format
//!
//! Adapters map `ErrorCode` straight to HTTP status codes; error message
//! text is never inspected.
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! let err = AppError::new(ErrorCode::SlotAlreadyBooked);
//! assert_eq!(err.http_status(), shared::http::StatusCode::CONFLICT);
//!
//! let err = AppError::validation("end_hour must exceed start_hour")
//!     .with_detail("field", "end_hour");
//! let response = ApiResponse::<()>::error(&err);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
