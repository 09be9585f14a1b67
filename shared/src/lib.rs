//! Shared types for the rental reservation engine
//!
//! Domain types used across the server and clients: the extended-hour
//! clock model, time slots, entity models, the unified error system and
//! response structures.

pub mod clock;
pub mod error;
pub mod models;
pub mod slot;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use clock::ClockInstant;
pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use slot::{ShiftKind, TimeSlot};
