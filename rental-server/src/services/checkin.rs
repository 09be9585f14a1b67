//! Check-in, payment and checkout
//!
//! Admin-side on-site flow: open a session against an approved
//! reservation, confirm payment, optionally adjust time or amount, then
//! close it. All flows are conditional on the current status; a wrong
//! state is a conflict, not a validation error.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    AdjustRequest, CheckIn, CheckInCreate, CheckInStatus, CheckoutRequest, CheckoutSummary,
    NotificationEvent, PaymentRequest, PaymentStatus, User,
};
use uuid::Uuid;

use crate::db;
use crate::services::notify;
use crate::state::AppState;

fn require_admin(actor: &User) -> AppResult<()> {
    if !actor.is_admin() {
        return Err(AppError::new(ErrorCode::AdminRequired));
    }
    Ok(())
}

fn generate_receipt_number(date: NaiveDate) -> String {
    let suffix: u16 = rand::random::<u16>() % 10000;
    format!("RC-{}-{:04}", date.format("%Y%m%d"), suffix)
}

/// Open a session for an approved reservation.
///
/// The payment amount is fixed at open: hourly rate of the device type
/// times the scheduled slot hours.
pub async fn open(state: &AppState, actor: &User, req: CheckInCreate) -> AppResult<CheckIn> {
    require_admin(actor)?;

    let reservation = db::reservations::require(&state.pool, req.reservation_id).await?;
    if reservation.device_id != req.device_id {
        return Err(AppError::invalid_request(
            "device_id does not match the reservation",
        ));
    }
    let device = db::devices::require(&state.pool, reservation.device_id).await?;
    let device_type = db::devices::require_type(&state.pool, device.type_id).await?;

    let amount =
        device_type.hourly_rate * Decimal::from(reservation.time_slot.duration_hours());
    let now = Utc::now();
    let checkin = CheckIn {
        id: Uuid::new_v4(),
        reservation_id: reservation.id,
        device_id: reservation.device_id,
        started_at: now,
        status: CheckInStatus::AwaitingPayment,
        payment_method: None,
        payment_status: PaymentStatus::Pending,
        payment_amount: amount,
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

    match db::checkins::open(&state.pool, &checkin).await? {
        db::checkins::OpenOutcome::Opened => {}
        db::checkins::OpenOutcome::WrongReservationState => {
            return Err(AppError::wrong_state(format!(
                "cannot check in a {} reservation",
                reservation.status.as_str()
            )));
        }
        db::checkins::OpenOutcome::AlreadyOpen => {
            return Err(AppError::new(ErrorCode::CheckInAlreadyActive));
        }
    }

    tracing::info!(
        reservation = %reservation.reservation_number,
        amount = %checkin.payment_amount,
        "Check-in opened"
    );
    notify::fire(
        &state.notifier,
        reservation.user_id,
        NotificationEvent::CheckinOpened,
        json!({
            "reservation_number": reservation.reservation_number,
            "amount": checkin.payment_amount,
        }),
    );
    Ok(checkin)
}

pub async fn get(state: &AppState, id: Uuid) -> AppResult<CheckIn> {
    db::checkins::require(&state.pool, id).await
}

/// Confirm payment: the session becomes active and a receipt is issued.
pub async fn confirm_payment(
    state: &AppState,
    actor: &User,
    id: Uuid,
    req: PaymentRequest,
) -> AppResult<CheckIn> {
    require_admin(actor)?;

    let checkin = db::checkins::require(&state.pool, id).await?;
    match checkin.status {
        CheckInStatus::AwaitingPayment => {}
        CheckInStatus::Active => {
            return Err(AppError::new(ErrorCode::PaymentAlreadyConfirmed));
        }
        CheckInStatus::Completed => return Err(AppError::new(ErrorCode::CheckInCompleted)),
    }

    let receipt = generate_receipt_number(state.now().business_date());
    let won =
        db::checkins::confirm_payment(&state.pool, id, req.payment_method, &receipt).await?;
    if !won {
        // A racer confirmed first
        return Err(AppError::new(ErrorCode::PaymentAlreadyConfirmed));
    }

    let checkin = db::checkins::require(&state.pool, id).await?;
    let reservation = db::reservations::require(&state.pool, checkin.reservation_id).await?;
    tracing::info!(
        reservation = %reservation.reservation_number,
        method = req.payment_method.as_str(),
        receipt = %receipt,
        "Payment confirmed"
    );
    notify::fire(
        &state.notifier,
        reservation.user_id,
        NotificationEvent::PaymentConfirmed,
        json!({
            "reservation_number": reservation.reservation_number,
            "receipt_number": receipt,
            "amount": checkin.payment_amount,
        }),
    );
    Ok(checkin)
}

/// Adjust the session's effective time bounds and/or amount.
pub async fn adjust(
    state: &AppState,
    actor: &User,
    id: Uuid,
    req: AdjustRequest,
) -> AppResult<CheckIn> {
    require_admin(actor)?;
    req.validate()?;

    let checkin = db::checkins::require(&state.pool, id).await?;
    if checkin.status == CheckInStatus::Completed {
        return Err(AppError::new(ErrorCode::CheckInCompleted));
    }

    let won = db::checkins::apply_adjustment(
        &state.pool,
        id,
        req.adjusted_start_time,
        req.adjusted_end_time,
        req.adjusted_amount,
        req.adjustment_reason.as_deref(),
    )
    .await?;
    if !won {
        return Err(AppError::new(ErrorCode::CheckInCompleted));
    }

    db::checkins::require(&state.pool, id).await
}

/// Close an active (paid) session and complete its reservation.
pub async fn checkout(
    state: &AppState,
    actor: &User,
    id: Uuid,
    req: CheckoutRequest,
) -> AppResult<CheckoutSummary> {
    require_admin(actor)?;

    let checkin = db::checkins::require(&state.pool, id).await?;
    match checkin.status {
        CheckInStatus::Active => {}
        CheckInStatus::AwaitingPayment => {
            return Err(AppError::new(ErrorCode::PaymentNotConfirmed));
        }
        CheckInStatus::Completed => return Err(AppError::new(ErrorCode::CheckInCompleted)),
    }

    let reservation = db::reservations::require(&state.pool, checkin.reservation_id).await?;
    let now = state.now();
    let closed =
        match db::checkins::checkout(&state.pool, id, req.notes.as_deref(), Utc::now()).await? {
            Some(closed) => closed,
            None => {
                // A racer closed it first
                return Err(AppError::new(ErrorCode::CheckInCompleted));
            }
        };

    // Elapsed time prefers the adjusted bounds; the scheduled slot start
    // and the checkout instant fill the gaps.
    let effective_start = closed
        .adjusted_start_time
        .unwrap_or_else(|| reservation.start_instant().to_local_datetime());
    let effective_end = closed
        .adjusted_end_time
        .unwrap_or_else(|| now.to_local_datetime());
    let total_time = (effective_end - effective_start).num_minutes();

    let payment_method = closed
        .payment_method
        .ok_or_else(|| AppError::internal("active check-in has no payment method"))?;
    let summary = CheckoutSummary {
        total_time,
        final_amount: closed.final_amount(),
        payment_method,
        receipt_number: closed.receipt_number.clone(),
    };

    tracing::info!(
        reservation = %reservation.reservation_number,
        total_time_minutes = summary.total_time,
        final_amount = %summary.final_amount,
        "Checkout completed"
    );
    notify::fire(
        &state.notifier,
        reservation.user_id,
        NotificationEvent::CheckoutCompleted,
        json!({
            "reservation_number": reservation.reservation_number,
            "total_time": summary.total_time,
            "final_amount": summary.final_amount,
        }),
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_receipt_number_format() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 26).unwrap();
        let number = generate_receipt_number(date);
        assert!(number.starts_with("RC-20250726-"));
        assert_eq!(number.len(), "RC-20250726-0000".len());
    }
}
