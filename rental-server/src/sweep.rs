//! Scheduled background sweeps
//!
//! Two passes over reservation state, both idempotent:
//! - auto-expiry: approved reservations whose business date passed become
//!   completed, pending ones past their start are cancelled;
//! - reminders: approved reservations starting within the next hour get a
//!   single reminder, deduplicated by the reminder flag.
//!
//! Errors are logged and the next tick retries; the sweeps never touch
//! rows a concurrent request already moved.

use serde_json::json;
use shared::models::NotificationEvent;

use crate::db;
use crate::services::notify;
use crate::state::AppState;

/// Reminders fire for reservations starting within this many hours.
const REMINDER_WINDOW_HOURS: i64 = 1;

pub async fn run_once(state: &AppState) {
    let now = state.now();

    match db::reservations::complete_past_approved(&state.pool, now.business_date()).await {
        Ok(swept) if !swept.is_empty() => {
            tracing::info!(count = swept.len(), "Auto-completed past reservations");
        }
        Ok(_) => {}
        Err(e) => tracing::error!(error = %e, "Auto-complete sweep failed"),
    }

    match db::reservations::cancel_past_pending(&state.pool, now.business_date()).await {
        Ok(swept) => {
            for res in &swept {
                notify::fire(
                    &state.notifier,
                    res.user_id,
                    NotificationEvent::ReservationCancelled,
                    json!({
                        "reservation_number": res.reservation_number,
                        "reason": res.status_reason,
                    }),
                );
            }
            if !swept.is_empty() {
                tracing::info!(count = swept.len(), "Expired unapproved reservations");
            }
        }
        Err(e) => tracing::error!(error = %e, "Expiry sweep failed"),
    }

    let window_end = now.add_hours(REMINDER_WINDOW_HOURS);
    match db::reservations::find_due_reminders(&state.pool, &now, &window_end).await {
        Ok(due) => {
            for res in due {
                // The conditional flag update makes concurrent sweeps
                // dispatch at most once per reservation.
                match db::reservations::mark_reminder_sent(&state.pool, res.id).await {
                    Ok(true) => notify::fire(
                        &state.notifier,
                        res.user_id,
                        NotificationEvent::ReservationReminder,
                        json!({
                            "reservation_number": res.reservation_number,
                            "date": res.date,
                            "slot": res.time_slot.to_string(),
                        }),
                    ),
                    Ok(false) => {}
                    Err(e) => {
                        tracing::error!(error = %e, reservation = %res.reservation_number,
                            "Failed to mark reminder sent");
                    }
                }
            }
        }
        Err(e) => tracing::error!(error = %e, "Reminder sweep failed"),
    }
}
