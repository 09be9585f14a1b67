//! Check-in entity: the on-site usage session of an approved reservation

use crate::error::{AppError, AppResult, ErrorCode};
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Check-in lifecycle status
///
/// ```text
/// awaiting_payment -> active -> completed
/// ```
/// `awaiting_payment` is the opened, unpaid session; `active` is paid and
/// in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInStatus {
    AwaitingPayment,
    Active,
    Completed,
}

impl CheckInStatus {
    /// A live session that still accepts adjustments.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::AwaitingPayment | Self::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingPayment => "awaiting_payment",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl std::str::FromStr for CheckInStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "awaiting_payment" => Ok(Self::AwaitingPayment),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown check-in status: {other}")),
        }
    }
}

/// Accepted payment methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Card,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::BankTransfer => "BANK_TRANSFER",
            Self::Card => "CARD",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CASH" => Ok(Self::Cash),
            "BANK_TRANSFER" => Ok(Self::BankTransfer),
            "CARD" => Ok(Self::Card),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

/// Check-in entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckIn {
    pub id: Uuid,
    pub reservation_id: Uuid,
    pub device_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub status: CheckInStatus,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: PaymentStatus,
    /// Amount computed at open from the slot duration and hourly rate
    pub payment_amount: Decimal,
    pub receipt_number: Option<String>,
    /// Venue-local overrides of the scheduled slot bounds
    pub adjusted_start_time: Option<NaiveDateTime>,
    pub adjusted_end_time: Option<NaiveDateTime>,
    pub adjusted_amount: Option<Decimal>,
    pub adjustment_reason: Option<String>,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CheckIn {
    /// Final amount: the adjusted amount when present, else the original.
    pub fn final_amount(&self) -> Decimal {
        self.adjusted_amount.unwrap_or(self.payment_amount)
    }
}

/// Open payload (`POST /checkins`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInCreate {
    pub reservation_id: Uuid,
    pub device_id: Uuid,
}

/// Payment confirmation payload (`PATCH /checkins/{id}/payment`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub payment_method: PaymentMethod,
}

/// Adjustment payload (`PATCH /checkins/{id}/adjust`)
///
/// At least one of time/amount must change; an amount change requires a
/// non-empty reason. Time and amount adjustments are independent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdjustRequest {
    pub adjusted_start_time: Option<NaiveDateTime>,
    pub adjusted_end_time: Option<NaiveDateTime>,
    pub adjusted_amount: Option<Decimal>,
    pub adjustment_reason: Option<String>,
}

impl AdjustRequest {
    /// Validate the adjustment invariants.
    pub fn validate(&self) -> AppResult<()> {
        let changes_time =
            self.adjusted_start_time.is_some() || self.adjusted_end_time.is_some();
        if !changes_time && self.adjusted_amount.is_none() {
            return Err(AppError::new(ErrorCode::AdjustmentEmpty));
        }
        if let Some(amount) = self.adjusted_amount {
            if amount < Decimal::ZERO {
                return Err(AppError::with_message(
                    ErrorCode::ValueOutOfRange,
                    "adjusted_amount must not be negative",
                ));
            }
            let has_reason = self
                .adjustment_reason
                .as_deref()
                .is_some_and(|r| !r.trim().is_empty());
            if !has_reason {
                return Err(AppError::new(ErrorCode::AdjustmentReasonRequired));
            }
        }
        if let (Some(start), Some(end)) = (self.adjusted_start_time, self.adjusted_end_time) {
            if start >= end {
                return Err(AppError::with_message(
                    ErrorCode::ValidationFailed,
                    "adjusted_end_time must be after adjusted_start_time",
                ));
            }
        }
        Ok(())
    }
}

/// Checkout payload (`PATCH /checkins/{id}/checkout`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub notes: Option<String>,
}

/// Checkout result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSummary {
    /// Elapsed usage in minutes
    pub total_time: i64,
    pub final_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub receipt_number: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_adjust() -> AdjustRequest {
        AdjustRequest::default()
    }

    #[test]
    fn test_empty_adjustment_rejected() {
        let err = base_adjust().validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::AdjustmentEmpty);
    }

    #[test]
    fn test_amount_without_reason_rejected() {
        let req = AdjustRequest {
            adjusted_amount: Some(Decimal::new(3000, 2)),
            ..base_adjust()
        };
        assert_eq!(
            req.validate().unwrap_err().code,
            ErrorCode::AdjustmentReasonRequired
        );

        let req = AdjustRequest {
            adjusted_amount: Some(Decimal::new(3000, 2)),
            adjustment_reason: Some("   ".into()),
            ..base_adjust()
        };
        assert_eq!(
            req.validate().unwrap_err().code,
            ErrorCode::AdjustmentReasonRequired
        );
    }

    #[test]
    fn test_amount_with_reason_accepted() {
        let req = AdjustRequest {
            adjusted_amount: Some(Decimal::new(3000, 2)),
            adjustment_reason: Some("machine fault, one hour refunded".into()),
            ..base_adjust()
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_negative_amount_rejected() {
        let req = AdjustRequest {
            adjusted_amount: Some(Decimal::new(-100, 2)),
            adjustment_reason: Some("typo".into()),
            ..base_adjust()
        };
        assert_eq!(
            req.validate().unwrap_err().code,
            ErrorCode::ValueOutOfRange
        );
    }

    #[test]
    fn test_time_only_adjustment_needs_no_reason() {
        let req = AdjustRequest {
            adjusted_start_time: "2025-07-26T14:30:00".parse().ok(),
            ..base_adjust()
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_inverted_time_range_rejected() {
        let req = AdjustRequest {
            adjusted_start_time: "2025-07-26T16:00:00".parse().ok(),
            adjusted_end_time: "2025-07-26T14:00:00".parse().ok(),
            ..base_adjust()
        };
        assert_eq!(
            req.validate().unwrap_err().code,
            ErrorCode::ValidationFailed
        );
    }

    #[test]
    fn test_final_amount_prefers_adjustment() {
        let now = Utc::now();
        let mut checkin = CheckIn {
            id: Uuid::new_v4(),
            reservation_id: Uuid::new_v4(),
            device_id: Uuid::new_v4(),
            started_at: now,
            status: CheckInStatus::Active,
            payment_method: Some(PaymentMethod::Cash),
            payment_status: PaymentStatus::Completed,
            payment_amount: Decimal::new(4000, 2),
            receipt_number: None,
            adjusted_start_time: None,
            adjusted_end_time: None,
            adjusted_amount: None,
            adjustment_reason: None,
            checked_out_at: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(checkin.final_amount(), Decimal::new(4000, 2));

        checkin.adjusted_amount = Some(Decimal::new(2500, 2));
        assert_eq!(checkin.final_amount(), Decimal::new(2500, 2));
    }

    #[test]
    fn test_payment_method_wire_format() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::BankTransfer).unwrap(),
            "\"BANK_TRANSFER\""
        );
        let method: PaymentMethod = serde_json::from_str("\"CASH\"").unwrap();
        assert_eq!(method, PaymentMethod::Cash);
    }

    #[test]
    fn test_status_is_open() {
        assert!(CheckInStatus::AwaitingPayment.is_open());
        assert!(CheckInStatus::Active.is_open());
        assert!(!CheckInStatus::Completed.is_open());
    }
}
