//! Reservation lifecycle
//!
//! Orchestrates rule evaluation, the conflict-checked insert and the
//! conditional state transitions. All race resolution happens in storage;
//! a losing writer surfaces here as zero rows and maps to a 409.

use chrono::Utc;
use serde_json::json;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    CancelRequest, NoShowRequest, NotificationEvent, RejectRequest, Reservation,
    ReservationCreate, ReservationStatus, ReservationUpdate, User,
};
use shared::slot::TimeSlot;
use uuid::Uuid;

use crate::db;
use crate::services::{notify, rules};
use crate::state::AppState;

fn require_admin(actor: &User) -> AppResult<()> {
    if !actor.is_admin() {
        return Err(AppError::new(ErrorCode::AdminRequired));
    }
    Ok(())
}

fn require_owner_or_admin(actor: &User, res: &Reservation) -> AppResult<()> {
    if actor.id != res.user_id && !actor.is_admin() {
        return Err(AppError::new(ErrorCode::NotOwner));
    }
    Ok(())
}

/// Create a reservation: rules, then the atomic conflict-checked insert.
///
/// Types that do not require approval land directly in `approved`.
pub async fn create(
    state: &AppState,
    actor: &User,
    req: ReservationCreate,
) -> AppResult<Reservation> {
    if req.user_id != actor.id && !actor.is_admin() {
        return Err(AppError::permission_denied(
            "only admins may book on behalf of another user",
        ));
    }

    let booking_user = if req.user_id == actor.id {
        actor.clone()
    } else {
        db::users::require(&state.pool, req.user_id).await?
    };
    rules::check_account(&booking_user)?;

    let device = db::devices::require(&state.pool, req.device_id).await?;
    rules::check_device(&device)?;
    let device_type = db::devices::require_type(&state.pool, device.type_id).await?;

    // One physical window, one stored key: raw wall-clock hours 0-5
    // become hours 24-29 of the previous business date before any rule
    // or overlap check sees them.
    let (date, slot) = TimeSlot::canonicalize(req.date, req.start_hour, req.end_hour)?;
    let now = state.now();
    let ctx = rules::RuleContext {
        now,
        actor_is_admin: actor.is_admin(),
        future_active_count: db::reservations::count_future_active_for_user(
            &state.pool,
            booking_user.id,
            &now,
        )
        .await?,
        shift_active_count: db::reservations::count_active_for_type_shift(
            &state.pool,
            device_type.id,
            date,
            slot.shift_kind(),
        )
        .await?,
        max_rental_units: device_type.max_rental_units,
    };
    rules::evaluate(&ctx, date, slot)?;

    let status = if device_type.requires_approval {
        ReservationStatus::Pending
    } else {
        ReservationStatus::Approved
    };
    let created_at = Utc::now();
    let mut reservation = Reservation {
        id: Uuid::new_v4(),
        user_id: booking_user.id,
        device_id: device.id,
        date,
        time_slot: slot,
        status,
        reservation_number: Reservation::generate_number(date),
        status_reason: None,
        reminder_sent: false,
        notes: req.notes,
        created_at,
        updated_at: created_at,
    };

    let mut attempts = 0;
    loop {
        match db::reservations::insert_if_free(&state.pool, &reservation).await? {
            db::reservations::InsertOutcome::Inserted => break,
            db::reservations::InsertOutcome::SlotTaken => {
                return Err(AppError::new(ErrorCode::SlotAlreadyBooked)
                    .with_detail("device_id", reservation.device_id.to_string())
                    .with_detail("date", reservation.date.to_string()));
            }
            // Random suffix collided with an existing number; draw again
            db::reservations::InsertOutcome::NumberTaken => {
                attempts += 1;
                if attempts >= 5 {
                    return Err(AppError::internal(
                        "could not allocate a unique reservation number",
                    ));
                }
                reservation.reservation_number = Reservation::generate_number(date);
            }
        }
    }

    tracing::info!(
        reservation = %reservation.reservation_number,
        device = %device.number,
        slot = %reservation.time_slot,
        status = reservation.status.as_str(),
        "Reservation created"
    );
    notify::fire(
        &state.notifier,
        reservation.user_id,
        NotificationEvent::ReservationCreated,
        json!({
            "reservation_number": reservation.reservation_number,
            "date": reservation.date,
            "slot": reservation.time_slot.to_string(),
        }),
    );
    Ok(reservation)
}

pub async fn get(state: &AppState, id: Uuid) -> AppResult<Reservation> {
    db::reservations::require(&state.pool, id).await
}

pub async fn list_for_user(state: &AppState, user_id: Uuid) -> AppResult<Vec<Reservation>> {
    db::reservations::list_for_user(&state.pool, user_id).await
}

/// Approve a pending reservation. Admin only.
pub async fn approve(state: &AppState, actor: &User, id: Uuid) -> AppResult<Reservation> {
    require_admin(actor)?;
    let won = db::reservations::transition(
        &state.pool,
        id,
        &[ReservationStatus::Pending],
        ReservationStatus::Approved,
        None,
    )
    .await?;
    if !won {
        let current = db::reservations::require(&state.pool, id).await?;
        return Err(AppError::wrong_state(format!(
            "cannot approve a {} reservation",
            current.status.as_str()
        )));
    }
    let reservation = db::reservations::require(&state.pool, id).await?;
    notify::fire(
        &state.notifier,
        reservation.user_id,
        NotificationEvent::ReservationApproved,
        json!({ "reservation_number": reservation.reservation_number }),
    );
    Ok(reservation)
}

/// Reject a pending reservation with a mandatory reason. Admin only.
pub async fn reject(
    state: &AppState,
    actor: &User,
    id: Uuid,
    req: RejectRequest,
) -> AppResult<Reservation> {
    require_admin(actor)?;
    let reason = req.reason.trim();
    if reason.is_empty() {
        return Err(AppError::new(ErrorCode::RejectionReasonRequired));
    }
    let won = db::reservations::transition(
        &state.pool,
        id,
        &[ReservationStatus::Pending],
        ReservationStatus::Rejected,
        Some(reason),
    )
    .await?;
    if !won {
        let current = db::reservations::require(&state.pool, id).await?;
        return Err(AppError::wrong_state(format!(
            "cannot reject a {} reservation",
            current.status.as_str()
        )));
    }
    let reservation = db::reservations::require(&state.pool, id).await?;
    notify::fire(
        &state.notifier,
        reservation.user_id,
        NotificationEvent::ReservationRejected,
        json!({
            "reservation_number": reservation.reservation_number,
            "reason": reason,
        }),
    );
    Ok(reservation)
}

/// Cancel a pending or approved reservation.
///
/// Owner or admin; members cannot cancel within the cutoff before start,
/// and nobody cancels a checked-in session.
pub async fn cancel(
    state: &AppState,
    actor: &User,
    id: Uuid,
    req: CancelRequest,
) -> AppResult<Reservation> {
    let reservation = db::reservations::require(&state.pool, id).await?;
    require_owner_or_admin(actor, &reservation)?;

    if !actor.is_admin() {
        let now = state.now();
        let start = reservation.start_instant();
        if now.hours_until(&start) < rules::CANCEL_CUTOFF_HOURS {
            return Err(AppError::new(ErrorCode::CancelWindowClosed)
                .with_detail("cutoff_hours", rules::CANCEL_CUTOFF_HOURS));
        }
    }

    let reason = req.reason.as_deref().map(str::trim).filter(|r| !r.is_empty());
    let won = db::reservations::transition(
        &state.pool,
        id,
        &[ReservationStatus::Pending, ReservationStatus::Approved],
        ReservationStatus::Cancelled,
        reason,
    )
    .await?;
    if !won {
        return Err(AppError::wrong_state(format!(
            "cannot cancel a {} reservation",
            reservation.status.as_str()
        )));
    }
    let reservation = db::reservations::require(&state.pool, id).await?;
    notify::fire(
        &state.notifier,
        reservation.user_id,
        NotificationEvent::ReservationCancelled,
        json!({ "reservation_number": reservation.reservation_number }),
    );
    Ok(reservation)
}

/// Record a no-show on an approved reservation. Admin only.
///
/// Allowed from 30 minutes after the scheduled start; a checked-in
/// reservation can no longer be marked.
pub async fn mark_no_show(
    state: &AppState,
    actor: &User,
    id: Uuid,
    req: NoShowRequest,
) -> AppResult<Reservation> {
    require_admin(actor)?;
    let reservation = db::reservations::require(&state.pool, id).await?;

    let now = state.now();
    let start = reservation.start_instant();
    if start.minutes_until(&now) < rules::NO_SHOW_GRACE_MINUTES {
        return Err(AppError::new(ErrorCode::NoShowTooEarly)
            .with_detail("grace_minutes", rules::NO_SHOW_GRACE_MINUTES));
    }

    let reason = req.reason.as_deref().map(str::trim).filter(|r| !r.is_empty());
    let won = db::reservations::transition(
        &state.pool,
        id,
        &[ReservationStatus::Approved],
        ReservationStatus::NoShow,
        reason,
    )
    .await?;
    if !won {
        return Err(AppError::wrong_state(format!(
            "cannot mark a {} reservation as no-show",
            reservation.status.as_str()
        )));
    }
    tracing::info!(
        reservation = %reservation.reservation_number,
        "Reservation marked no-show"
    );
    db::reservations::require(&state.pool, id).await
}

/// Update schedule and/or notes on a pending or approved reservation.
///
/// Closes `UPDATE_CUTOFF_HOURS` before the current start. A schedule
/// change re-runs the overlap check against the new slot, excluding the
/// reservation's own row.
pub async fn update(
    state: &AppState,
    actor: &User,
    id: Uuid,
    req: ReservationUpdate,
) -> AppResult<Reservation> {
    let reservation = db::reservations::require(&state.pool, id).await?;
    require_owner_or_admin(actor, &reservation)?;

    if !matches!(
        reservation.status,
        ReservationStatus::Pending | ReservationStatus::Approved
    ) {
        return Err(AppError::wrong_state(format!(
            "cannot update a {} reservation",
            reservation.status.as_str()
        )));
    }

    if req.changes_schedule() {
        let now = state.now();
        if now.hours_until(&reservation.start_instant()) < rules::UPDATE_CUTOFF_HOURS {
            return Err(AppError::new(ErrorCode::UpdateWindowClosed)
                .with_detail("cutoff_hours", rules::UPDATE_CUTOFF_HOURS));
        }

        if req.start_hour.is_some() != req.end_hour.is_some() {
            return Err(AppError::invalid_request(
                "start_hour and end_hour must be supplied together",
            ));
        }
        let base_date = req.date.unwrap_or(reservation.date);
        // Stored hours are already canonical; only fresh input needs the
        // overnight re-attribution
        let (date, slot) = match (req.start_hour, req.end_hour) {
            (Some(start), Some(end)) => TimeSlot::canonicalize(base_date, start, end)?,
            _ => (base_date, reservation.time_slot),
        };

        if !db::reservations::reschedule_if_free(&state.pool, id, date, slot).await? {
            return Err(AppError::new(ErrorCode::SlotAlreadyBooked)
                .with_detail("date", date.to_string()));
        }
    }

    if let Some(notes) = req.notes {
        db::reservations::set_notes(&state.pool, id, Some(&notes)).await?;
    }

    db::reservations::require(&state.pool, id).await
}
