//! Time slots on the extended-hour clock

use crate::clock::{BUSINESS_DAY_ROLLOVER_HOUR, ClockInstant};
use crate::error::{AppError, AppResult, ErrorCode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A half-open interval [start, end) on the extended 0–30 hour clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    start_hour: u32,
    end_hour: u32,
}

impl TimeSlot {
    /// Create a slot, validating 0 <= start < end <= 30.
    pub fn new(start_hour: u32, end_hour: u32) -> AppResult<Self> {
        if start_hour >= 30 {
            return Err(AppError::with_message(
                ErrorCode::ValueOutOfRange,
                "start_hour must be between 0 and 29",
            )
            .with_detail("start_hour", start_hour));
        }
        if end_hour > 30 {
            return Err(AppError::with_message(
                ErrorCode::ValueOutOfRange,
                "end_hour must be between 1 and 30",
            )
            .with_detail("end_hour", end_hour));
        }
        if start_hour >= end_hour {
            return Err(AppError::with_message(
                ErrorCode::ValidationFailed,
                "end_hour must exceed start_hour",
            ));
        }
        Ok(Self {
            start_hour,
            end_hour,
        })
    }

    /// Canonicalize a requested (calendar date, hours) pair to
    /// business-date form.
    ///
    /// Wall-clock hours 0–5 denote the overnight tail of the previous
    /// business day; they are re-attributed as hours 24–29 of that date so
    /// one physical window always has exactly one stored encoding. Without
    /// this, `(2025-07-26, 26–29)` and `(2025-07-27, 2–5)` would name the
    /// same wall-clock window under two keys and slip past the overlap
    /// check.
    pub fn canonicalize(
        date: NaiveDate,
        start_hour: u32,
        end_hour: u32,
    ) -> AppResult<(NaiveDate, TimeSlot)> {
        if start_hour < BUSINESS_DAY_ROLLOVER_HOUR {
            if end_hour > BUSINESS_DAY_ROLLOVER_HOUR {
                return Err(AppError::with_message(
                    ErrorCode::ValidationFailed,
                    "a slot starting before 06:00 must end by 06:00",
                ));
            }
            let business_date = date.pred_opt().ok_or_else(|| {
                AppError::with_message(ErrorCode::ValueOutOfRange, "date out of range")
            })?;
            return Ok((business_date, Self::new(start_hour + 24, end_hour + 24)?));
        }
        Ok((date, Self::new(start_hour, end_hour)?))
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u32 {
        self.end_hour
    }

    /// Two slots overlap iff a.start < b.end && b.start < a.end.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start_hour < other.end_hour && other.start_hour < self.end_hour
    }

    pub fn duration_hours(&self) -> u32 {
        self.end_hour - self.start_hour
    }

    pub fn duration_minutes(&self) -> u32 {
        self.duration_hours() * 60
    }

    /// Start instant of this slot on the given business date.
    pub fn start_instant(&self, business_date: NaiveDate) -> ClockInstant {
        // Invariant upheld by `new`: start_hour < 30
        ClockInstant::from_business(business_date, self.start_hour, 0)
            .unwrap_or_else(|| ClockInstant::from_wall(business_date, 0, 0).unwrap())
    }

    /// End instant of this slot on the given business date.
    pub fn end_instant(&self, business_date: NaiveDate) -> ClockInstant {
        ClockInstant::from_business(business_date, self.end_hour, 0)
            .unwrap_or_else(|| ClockInstant::from_wall(business_date, 0, 0).unwrap())
    }

    /// Shift classification of this slot, derived from its start hour.
    pub fn shift_kind(&self) -> ShiftKind {
        ShiftKind::from_start_hour(self.start_hour)
    }
}

impl std::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.start_hour, self.end_hour)
    }
}

/// Shift classification used for capacity grouping and lead-time rules.
///
/// Canonical boundaries: early = start 7–14, overnight = start 22–29
/// (wall-clock 22:00–05:59), regular otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftKind {
    Early,
    Overnight,
    Regular,
}

impl ShiftKind {
    /// Classify from an extended start hour (0–29).
    ///
    /// Raw hours 0–5 are the tail of an overnight shift and classify as
    /// overnight.
    pub fn from_start_hour(start_hour: u32) -> Self {
        match start_hour {
            7..=14 => Self::Early,
            22..=29 => Self::Overnight,
            0..=5 => Self::Overnight,
            _ => Self::Regular,
        }
    }

    /// Early and overnight shifts require 24h booking lead time.
    pub fn requires_lead_time(&self) -> bool {
        matches!(self, Self::Early | Self::Overnight)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Early => "early",
            Self::Overnight => "overnight",
            Self::Regular => "regular",
        }
    }
}

impl std::fmt::Display for ShiftKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
