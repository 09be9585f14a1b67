//! Reservation queries
//!
//! The conflict check is a single `INSERT .. SELECT .. WHERE NOT EXISTS`
//! statement so check and insert cannot be separated by a concurrent
//! writer; the gist exclusion constraint in the migration backstops it.

use chrono::{DateTime, NaiveDate, Utc};
use shared::clock::ClockInstant;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Reservation, ReservationStatus};
use shared::slot::{ShiftKind, TimeSlot};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: Uuid,
    user_id: Uuid,
    device_id: Uuid,
    date: NaiveDate,
    start_hour: i32,
    end_hour: i32,
    status: String,
    reservation_number: String,
    status_reason: Option<String>,
    reminder_sent: bool,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ReservationRow {
    fn into_model(self) -> AppResult<Reservation> {
        let status: ReservationStatus = self
            .status
            .parse()
            .map_err(|e| super::corrupt("reservation status", e))?;
        let start = u32::try_from(self.start_hour)
            .map_err(|e| super::corrupt("reservation start_hour", e))?;
        let end = u32::try_from(self.end_hour)
            .map_err(|e| super::corrupt("reservation end_hour", e))?;
        let time_slot = TimeSlot::new(start, end)
            .map_err(|e| super::corrupt("reservation hour range", e))?;
        Ok(Reservation {
            id: self.id,
            user_id: self.user_id,
            device_id: self.device_id,
            date: self.date,
            time_slot,
            status,
            reservation_number: self.reservation_number,
            status_reason: self.status_reason,
            reminder_sent: self.reminder_sent,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_COLS: &str = "id, user_id, device_id, date, start_hour, end_hour, status, \
     reservation_number, status_reason, reminder_sent, notes, created_at, updated_at";

/// SQL fragment for statuses that hold capacity.
const ACTIVE_STATUSES: &str = "('pending', 'approved', 'checked_in')";

/// Constraint names from the migration; conflict handling keys on them.
const NO_OVERLAP_CONSTRAINT: &str = "reservations_no_overlap";
const NUMBER_UNIQUE_CONSTRAINT: &str = "reservations_reservation_number_key";

/// Result of the conflict-checked insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// An active reservation overlaps the slot, found either by the
    /// NOT EXISTS check or by a concurrent insert winning the exclusion
    /// constraint.
    SlotTaken,
    /// The random reservation number collided; the slot itself is free
    /// and the caller should redraw.
    NumberTaken,
}

/// Insert a reservation unless an active reservation already overlaps the
/// slot on the same device and business date.
pub async fn insert_if_free(pool: &PgPool, res: &Reservation) -> AppResult<InsertOutcome> {
    let query = format!(
        "INSERT INTO reservations \
             (id, user_id, device_id, date, start_hour, end_hour, status, \
              reservation_number, notes, created_at, updated_at) \
         SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10 \
         WHERE NOT EXISTS ( \
             SELECT 1 FROM reservations \
             WHERE device_id = $3 AND date = $4 \
               AND status IN {ACTIVE_STATUSES} \
               AND start_hour < $6 AND end_hour > $5)"
    );
    let result = sqlx::query(&query)
        .bind(res.id)
        .bind(res.user_id)
        .bind(res.device_id)
        .bind(res.date)
        .bind(res.time_slot.start_hour() as i32)
        .bind(res.time_slot.end_hour() as i32)
        .bind(res.status.as_str())
        .bind(&res.reservation_number)
        .bind(&res.notes)
        .bind(res.created_at)
        .execute(pool)
        .await;
    match result {
        Ok(done) if done.rows_affected() == 1 => Ok(InsertOutcome::Inserted),
        Ok(_) => Ok(InsertOutcome::SlotTaken),
        Err(e) if super::violates_constraint(&e, NO_OVERLAP_CONSTRAINT) => {
            Ok(InsertOutcome::SlotTaken)
        }
        Err(e) if super::violates_constraint(&e, NUMBER_UNIQUE_CONSTRAINT) => {
            Ok(InsertOutcome::NumberTaken)
        }
        Err(e) => Err(super::internal(e)),
    }
}

pub async fn fetch(pool: &PgPool, id: Uuid) -> AppResult<Option<Reservation>> {
    let query = format!("SELECT {SELECT_COLS} FROM reservations WHERE id = $1");
    let row: Option<ReservationRow> = sqlx::query_as(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(super::internal)?;
    row.map(ReservationRow::into_model).transpose()
}

/// Fetch a reservation, requiring existence.
pub async fn require(pool: &PgPool, id: Uuid) -> AppResult<Reservation> {
    fetch(pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ReservationNotFound))
}

pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> AppResult<Vec<Reservation>> {
    let query = format!(
        "SELECT {SELECT_COLS} FROM reservations \
         WHERE user_id = $1 ORDER BY date, start_hour"
    );
    let rows: Vec<ReservationRow> = sqlx::query_as(&query)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(super::internal)?;
    rows.into_iter().map(ReservationRow::into_model).collect()
}

/// Count a user's active reservations that have not yet ended.
pub async fn count_future_active_for_user(
    pool: &PgPool,
    user_id: Uuid,
    now: &ClockInstant,
) -> AppResult<i64> {
    let query = format!(
        "SELECT COUNT(*) FROM reservations \
         WHERE user_id = $1 AND status IN {ACTIVE_STATUSES} \
           AND (date > $2 OR (date = $2 AND end_hour > $3))"
    );
    let count: i64 = sqlx::query_scalar(&query)
        .bind(user_id)
        .bind(now.business_date())
        .bind(now.extended_hour() as i32)
        .fetch_one(pool)
        .await
        .map_err(super::internal)?;
    Ok(count)
}

/// Count active reservations for a device type on a business date within a
/// shift classification. Coarse capacity cap; exact per-device overlap is
/// handled by the conflict-checked insert.
pub async fn count_active_for_type_shift(
    pool: &PgPool,
    type_id: Uuid,
    date: NaiveDate,
    shift: ShiftKind,
) -> AppResult<i64> {
    let shift_cond = match shift {
        ShiftKind::Early => "r.start_hour BETWEEN 7 AND 14",
        ShiftKind::Overnight => "(r.start_hour >= 22 OR r.start_hour <= 5)",
        ShiftKind::Regular => "(r.start_hour = 6 OR r.start_hour BETWEEN 15 AND 21)",
    };
    let query = format!(
        "SELECT COUNT(*) FROM reservations r \
         JOIN devices d ON d.id = r.device_id \
         WHERE d.type_id = $1 AND r.date = $2 \
           AND r.status IN {ACTIVE_STATUSES} \
           AND {shift_cond}"
    );
    let count: i64 = sqlx::query_scalar(&query)
        .bind(type_id)
        .bind(date)
        .fetch_one(pool)
        .await
        .map_err(super::internal)?;
    Ok(count)
}

/// Conditionally transition a reservation. Only rows currently in one of
/// `from` are touched; returns whether this writer won.
pub async fn transition(
    executor: impl sqlx::PgExecutor<'_>,
    id: Uuid,
    from: &[ReservationStatus],
    to: ReservationStatus,
    reason: Option<&str>,
) -> AppResult<bool> {
    let from: Vec<String> = from.iter().map(|s| s.as_str().to_string()).collect();
    let result = sqlx::query(
        "UPDATE reservations \
         SET status = $3, status_reason = COALESCE($4, status_reason), updated_at = now() \
         WHERE id = $1 AND status = ANY($2)",
    )
    .bind(id)
    .bind(&from)
    .bind(to.as_str())
    .bind(reason)
    .execute(executor)
    .await
    .map_err(super::internal)?;
    Ok(result.rows_affected() == 1)
}

/// Move a pending/approved reservation to a new slot unless another active
/// reservation overlaps it. The reservation's own row is excluded from the
/// overlap test.
pub async fn reschedule_if_free(
    pool: &PgPool,
    id: Uuid,
    date: NaiveDate,
    slot: TimeSlot,
) -> AppResult<bool> {
    let query = format!(
        "UPDATE reservations \
         SET date = $2, start_hour = $3, end_hour = $4, updated_at = now() \
         WHERE id = $1 AND status IN ('pending', 'approved') \
           AND NOT EXISTS ( \
               SELECT 1 FROM reservations r \
               WHERE r.device_id = reservations.device_id AND r.date = $2 \
                 AND r.id <> $1 \
                 AND r.status IN {ACTIVE_STATUSES} \
                 AND r.start_hour < $4 AND r.end_hour > $3)"
    );
    let result = sqlx::query(&query)
        .bind(id)
        .bind(date)
        .bind(slot.start_hour() as i32)
        .bind(slot.end_hour() as i32)
        .execute(pool)
        .await;
    match result {
        Ok(done) => Ok(done.rows_affected() == 1),
        Err(e) if super::violates_constraint(&e, NO_OVERLAP_CONSTRAINT) => Ok(false),
        Err(e) => Err(super::internal(e)),
    }
}

pub async fn set_notes(pool: &PgPool, id: Uuid, notes: Option<&str>) -> AppResult<bool> {
    let result =
        sqlx::query("UPDATE reservations SET notes = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(notes)
            .execute(pool)
            .await
            .map_err(super::internal)?;
    Ok(result.rows_affected() == 1)
}

/// Sweep: approved reservations whose business date has passed become
/// completed. Returns the swept rows.
pub async fn complete_past_approved(
    pool: &PgPool,
    today: NaiveDate,
) -> AppResult<Vec<Reservation>> {
    let query = format!(
        "UPDATE reservations \
         SET status = 'completed', status_reason = 'auto-completed after business date', \
             updated_at = now() \
         WHERE status = 'approved' AND date < $1 \
         RETURNING {SELECT_COLS}"
    );
    let rows: Vec<ReservationRow> = sqlx::query_as(&query)
        .bind(today)
        .fetch_all(pool)
        .await
        .map_err(super::internal)?;
    rows.into_iter().map(ReservationRow::into_model).collect()
}

/// Sweep: pending reservations whose business date has passed without a
/// decision become cancelled. Returns the swept rows.
pub async fn cancel_past_pending(
    pool: &PgPool,
    today: NaiveDate,
) -> AppResult<Vec<Reservation>> {
    let query = format!(
        "UPDATE reservations \
         SET status = 'cancelled', status_reason = 'expired without approval', \
             updated_at = now() \
         WHERE status = 'pending' AND date < $1 \
         RETURNING {SELECT_COLS}"
    );
    let rows: Vec<ReservationRow> = sqlx::query_as(&query)
        .bind(today)
        .fetch_all(pool)
        .await
        .map_err(super::internal)?;
    rows.into_iter().map(ReservationRow::into_model).collect()
}

/// Approved reservations starting in (now, limit] that have not had their
/// reminder fired yet.
pub async fn find_due_reminders(
    pool: &PgPool,
    now: &ClockInstant,
    limit: &ClockInstant,
) -> AppResult<Vec<Reservation>> {
    let query = format!(
        "SELECT {SELECT_COLS} FROM reservations \
         WHERE status = 'approved' AND reminder_sent = FALSE \
           AND (date > $1 OR (date = $1 AND start_hour >= $2)) \
           AND (date < $3 OR (date = $3 AND start_hour <= $4)) \
         ORDER BY date, start_hour"
    );
    let rows: Vec<ReservationRow> = sqlx::query_as(&query)
        .bind(now.business_date())
        .bind(now.extended_hour() as i32)
        .bind(limit.business_date())
        .bind(limit.extended_hour() as i32)
        .fetch_all(pool)
        .await
        .map_err(super::internal)?;
    rows.into_iter().map(ReservationRow::into_model).collect()
}

/// Mark the reminder fired; conditional on the flag so concurrent sweeps
/// dispatch at most once.
pub async fn mark_reminder_sent(pool: &PgPool, id: Uuid) -> AppResult<bool> {
    let result = sqlx::query(
        "UPDATE reservations SET reminder_sent = TRUE, updated_at = now() \
         WHERE id = $1 AND reminder_sent = FALSE",
    )
    .bind(id)
    .execute(pool)
    .await
    .map_err(super::internal)?;
    Ok(result.rows_affected() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testutil;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL test database (DATABASE_URL)"]
    async fn test_overlapping_insert_has_one_winner() {
        let pool = testutil::test_pool().await;
        let fx = testutil::seed(&pool).await;
        let day = date(2025, 7, 26);

        let first = testutil::reservation(&fx, day, 14, 16, ReservationStatus::Approved);
        assert_eq!(
            insert_if_free(&pool, &first).await.unwrap(),
            InsertOutcome::Inserted
        );

        let overlapping = testutil::reservation(&fx, day, 15, 18, ReservationStatus::Pending);
        assert_eq!(
            insert_if_free(&pool, &overlapping).await.unwrap(),
            InsertOutcome::SlotTaken
        );
        assert!(fetch(&pool, overlapping.id).await.unwrap().is_none());

        // Touching endpoints do not overlap
        let adjacent = testutil::reservation(&fx, day, 16, 18, ReservationStatus::Pending);
        assert_eq!(
            insert_if_free(&pool, &adjacent).await.unwrap(),
            InsertOutcome::Inserted
        );
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL test database (DATABASE_URL)"]
    async fn test_number_collision_is_not_a_slot_conflict() {
        let pool = testutil::test_pool().await;
        let fx = testutil::seed(&pool).await;
        let day = date(2025, 7, 26);

        let first = testutil::reservation(&fx, day, 8, 10, ReservationStatus::Approved);
        assert_eq!(
            insert_if_free(&pool, &first).await.unwrap(),
            InsertOutcome::Inserted
        );

        // Free slot, duplicate number: the caller should redraw, not 409
        let mut colliding = testutil::reservation(&fx, day, 10, 12, ReservationStatus::Pending);
        colliding.reservation_number = first.reservation_number.clone();
        assert_eq!(
            insert_if_free(&pool, &colliding).await.unwrap(),
            InsertOutcome::NumberTaken
        );

        let redrawn = testutil::reservation(&fx, day, 10, 12, ReservationStatus::Pending);
        assert_eq!(
            insert_if_free(&pool, &redrawn).await.unwrap(),
            InsertOutcome::Inserted
        );
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL test database (DATABASE_URL)"]
    async fn test_overnight_reservation_round_trips() {
        let pool = testutil::test_pool().await;
        let fx = testutil::seed(&pool).await;
        let day = date(2025, 7, 26);

        let res = testutil::reservation(&fx, day, 26, 29, ReservationStatus::Approved);
        assert_eq!(
            insert_if_free(&pool, &res).await.unwrap(),
            InsertOutcome::Inserted
        );

        let loaded = require(&pool, res.id).await.unwrap();
        assert_eq!(loaded.date, day);
        assert_eq!(loaded.time_slot, TimeSlot::new(26, 29).unwrap());
        assert_eq!(loaded.status, ReservationStatus::Approved);
        assert_eq!(loaded.reservation_number, res.reservation_number);
        assert_eq!(loaded.shift_kind(), ShiftKind::Overnight);
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL test database (DATABASE_URL)"]
    async fn test_expiry_sweeps_are_idempotent() {
        let pool = testutil::test_pool().await;
        let fx = testutil::seed(&pool).await;
        let past = date(2025, 7, 20);
        let today = date(2025, 7, 26);

        let approved = testutil::reservation(&fx, past, 14, 16, ReservationStatus::Approved);
        let pending = testutil::reservation(&fx, past, 16, 18, ReservationStatus::Pending);
        for res in [&approved, &pending] {
            assert_eq!(
                insert_if_free(&pool, res).await.unwrap(),
                InsertOutcome::Inserted
            );
        }

        let completed = complete_past_approved(&pool, today).await.unwrap();
        assert!(completed.iter().any(|r| r.id == approved.id));
        let cancelled = cancel_past_pending(&pool, today).await.unwrap();
        assert!(cancelled.iter().any(|r| r.id == pending.id));

        // The second pass finds the rows already terminal
        let completed_again = complete_past_approved(&pool, today).await.unwrap();
        assert!(completed_again.iter().all(|r| r.id != approved.id));
        let cancelled_again = cancel_past_pending(&pool, today).await.unwrap();
        assert!(cancelled_again.iter().all(|r| r.id != pending.id));

        let swept = require(&pool, approved.id).await.unwrap();
        assert_eq!(swept.status, ReservationStatus::Completed);
        let expired = require(&pool, pending.id).await.unwrap();
        assert_eq!(expired.status, ReservationStatus::Cancelled);
        assert_eq!(
            expired.status_reason.as_deref(),
            Some("expired without approval")
        );
    }
}
