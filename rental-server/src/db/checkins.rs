//! Check-in queries
//!
//! Opening a session pairs the reservation transition with the insert in
//! one transaction; the partial unique index in the migration guarantees
//! at most one open session per reservation even across racing admins.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{CheckIn, CheckInStatus, PaymentMethod, PaymentStatus, ReservationStatus};
use sqlx::PgPool;
use uuid::Uuid;

use super::reservations;

#[derive(sqlx::FromRow)]
struct CheckInRow {
    id: Uuid,
    reservation_id: Uuid,
    device_id: Uuid,
    started_at: DateTime<Utc>,
    status: String,
    payment_method: Option<String>,
    payment_status: String,
    payment_amount: Decimal,
    receipt_number: Option<String>,
    adjusted_start_time: Option<NaiveDateTime>,
    adjusted_end_time: Option<NaiveDateTime>,
    adjusted_amount: Option<Decimal>,
    adjustment_reason: Option<String>,
    checked_out_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CheckInRow {
    fn into_model(self) -> AppResult<CheckIn> {
        let status: CheckInStatus = self
            .status
            .parse()
            .map_err(|e| super::corrupt("check-in status", e))?;
        let payment_method: Option<PaymentMethod> = self
            .payment_method
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|e| super::corrupt("payment method", e))?;
        let payment_status: PaymentStatus = self
            .payment_status
            .parse()
            .map_err(|e| super::corrupt("payment status", e))?;
        Ok(CheckIn {
            id: self.id,
            reservation_id: self.reservation_id,
            device_id: self.device_id,
            started_at: self.started_at,
            status,
            payment_method,
            payment_status,
            payment_amount: self.payment_amount,
            receipt_number: self.receipt_number,
            adjusted_start_time: self.adjusted_start_time,
            adjusted_end_time: self.adjusted_end_time,
            adjusted_amount: self.adjusted_amount,
            adjustment_reason: self.adjustment_reason,
            checked_out_at: self.checked_out_at,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_COLS: &str = "id, reservation_id, device_id, started_at, status, payment_method, \
     payment_status, payment_amount, receipt_number, adjusted_start_time, adjusted_end_time, \
     adjusted_amount, adjustment_reason, checked_out_at, notes, created_at, updated_at";

/// Partial unique index from the migration: one open session per
/// reservation.
const ONE_OPEN_INDEX: &str = "checkins_one_open_per_reservation";

/// Result of attempting to open a session.
pub enum OpenOutcome {
    Opened,
    /// The reservation was not approved (already checked in, terminal, or
    /// a racer moved it first).
    WrongReservationState,
    /// A non-completed session already exists for this reservation.
    AlreadyOpen,
}

/// Open a session: transition the reservation approved -> checked_in and
/// insert the check-in row, atomically.
pub async fn open(pool: &PgPool, checkin: &CheckIn) -> AppResult<OpenOutcome> {
    let mut tx = pool.begin().await.map_err(super::internal)?;

    let moved = reservations::transition(
        &mut *tx,
        checkin.reservation_id,
        &[ReservationStatus::Approved],
        ReservationStatus::CheckedIn,
        None,
    )
    .await?;
    if !moved {
        tx.rollback().await.map_err(super::internal)?;
        return Ok(OpenOutcome::WrongReservationState);
    }

    let inserted = sqlx::query(
        "INSERT INTO checkins \
             (id, reservation_id, device_id, started_at, status, payment_status, \
              payment_amount, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)",
    )
    .bind(checkin.id)
    .bind(checkin.reservation_id)
    .bind(checkin.device_id)
    .bind(checkin.started_at)
    .bind(checkin.status.as_str())
    .bind(checkin.payment_status.as_str())
    .bind(checkin.payment_amount)
    .bind(checkin.created_at)
    .execute(&mut *tx)
    .await;
    match inserted {
        Ok(_) => {}
        Err(e) if super::violates_constraint(&e, ONE_OPEN_INDEX) => {
            tx.rollback().await.map_err(super::internal)?;
            return Ok(OpenOutcome::AlreadyOpen);
        }
        Err(e) => return Err(super::internal(e)),
    }

    tx.commit().await.map_err(super::internal)?;
    Ok(OpenOutcome::Opened)
}

pub async fn fetch(pool: &PgPool, id: Uuid) -> AppResult<Option<CheckIn>> {
    let query = format!("SELECT {SELECT_COLS} FROM checkins WHERE id = $1");
    let row: Option<CheckInRow> = sqlx::query_as(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(super::internal)?;
    row.map(CheckInRow::into_model).transpose()
}

/// Fetch a check-in, requiring existence.
pub async fn require(pool: &PgPool, id: Uuid) -> AppResult<CheckIn> {
    fetch(pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CheckInNotFound))
}

/// Confirm payment: awaiting_payment -> active, payment completed, receipt
/// issued. Returns whether this writer won.
pub async fn confirm_payment(
    pool: &PgPool,
    id: Uuid,
    method: PaymentMethod,
    receipt_number: &str,
) -> AppResult<bool> {
    let result = sqlx::query(
        "UPDATE checkins \
         SET status = 'active', payment_method = $2, payment_status = 'completed', \
             receipt_number = $3, updated_at = now() \
         WHERE id = $1 AND status = 'awaiting_payment'",
    )
    .bind(id)
    .bind(method.as_str())
    .bind(receipt_number)
    .execute(pool)
    .await
    .map_err(super::internal)?;
    Ok(result.rows_affected() == 1)
}

/// Apply an adjustment to a non-completed session. Only the supplied
/// fields change.
pub async fn apply_adjustment(
    pool: &PgPool,
    id: Uuid,
    adjusted_start_time: Option<NaiveDateTime>,
    adjusted_end_time: Option<NaiveDateTime>,
    adjusted_amount: Option<Decimal>,
    adjustment_reason: Option<&str>,
) -> AppResult<bool> {
    let result = sqlx::query(
        "UPDATE checkins \
         SET adjusted_start_time = COALESCE($2, adjusted_start_time), \
             adjusted_end_time = COALESCE($3, adjusted_end_time), \
             adjusted_amount = COALESCE($4, adjusted_amount), \
             adjustment_reason = COALESCE($5, adjustment_reason), \
             updated_at = now() \
         WHERE id = $1 AND status <> 'completed'",
    )
    .bind(id)
    .bind(adjusted_start_time)
    .bind(adjusted_end_time)
    .bind(adjusted_amount)
    .bind(adjustment_reason)
    .execute(pool)
    .await
    .map_err(super::internal)?;
    Ok(result.rows_affected() == 1)
}

/// Close an active (paid) session and complete its reservation, in one
/// transaction. Returns the closed row, or None when the session was not
/// active.
pub async fn checkout(
    pool: &PgPool,
    id: Uuid,
    notes: Option<&str>,
    checked_out_at: DateTime<Utc>,
) -> AppResult<Option<CheckIn>> {
    let mut tx = pool.begin().await.map_err(super::internal)?;

    let query = format!(
        "UPDATE checkins \
         SET status = 'completed', checked_out_at = $2, \
             notes = COALESCE($3, notes), updated_at = now() \
         WHERE id = $1 AND status = 'active' \
         RETURNING {SELECT_COLS}"
    );
    let row: Option<CheckInRow> = sqlx::query_as(&query)
        .bind(id)
        .bind(checked_out_at)
        .bind(notes)
        .fetch_optional(&mut *tx)
        .await
        .map_err(super::internal)?;
    let Some(row) = row else {
        tx.rollback().await.map_err(super::internal)?;
        return Ok(None);
    };

    let moved = reservations::transition(
        &mut *tx,
        row.reservation_id,
        &[ReservationStatus::CheckedIn],
        ReservationStatus::Completed,
        None,
    )
    .await?;
    if !moved {
        // The reservation is not checked_in; closing the session would
        // leave the pair inconsistent
        tx.rollback().await.map_err(super::internal)?;
        return Err(AppError::wrong_state(
            "reservation is not checked in for this session",
        ));
    }

    tx.commit().await.map_err(super::internal)?;
    row.into_model().map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::reservations::{InsertOutcome, insert_if_free};
    use crate::db::testutil;
    use chrono::NaiveDate;

    async fn approved_reservation(
        pool: &PgPool,
        fx: &testutil::Fixture,
    ) -> shared::models::Reservation {
        let day = NaiveDate::from_ymd_opt(2025, 7, 26).unwrap();
        let res = testutil::reservation(fx, day, 14, 16, ReservationStatus::Approved);
        assert_eq!(
            insert_if_free(pool, &res).await.unwrap(),
            InsertOutcome::Inserted
        );
        res
    }

    async fn force_reservation_status(pool: &PgPool, id: Uuid, status: &str) {
        sqlx::query("UPDATE reservations SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(pool)
            .await
            .expect("force reservation status");
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL test database (DATABASE_URL)"]
    async fn test_second_open_session_rejected() {
        let pool = testutil::test_pool().await;
        let fx = testutil::seed(&pool).await;
        let res = approved_reservation(&pool, &fx).await;

        let first = testutil::checkin(&fx, res.id);
        assert!(matches!(
            open(&pool, &first).await.unwrap(),
            OpenOutcome::Opened
        ));

        // Put the reservation back to approved so the insert itself, not
        // the transition, is what the second open trips over
        force_reservation_status(&pool, res.id, "approved").await;
        let second = testutil::checkin(&fx, res.id);
        assert!(matches!(
            open(&pool, &second).await.unwrap(),
            OpenOutcome::AlreadyOpen
        ));
        assert!(fetch(&pool, second.id).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL test database (DATABASE_URL)"]
    async fn test_checkout_aborts_when_reservation_moved_elsewhere() {
        let pool = testutil::test_pool().await;
        let fx = testutil::seed(&pool).await;
        let res = approved_reservation(&pool, &fx).await;

        let session = testutil::checkin(&fx, res.id);
        assert!(matches!(
            open(&pool, &session).await.unwrap(),
            OpenOutcome::Opened
        ));
        assert!(
            confirm_payment(&pool, session.id, PaymentMethod::Cash, "R-0001")
                .await
                .unwrap()
        );

        // A racer moved the reservation out of checked_in
        force_reservation_status(&pool, res.id, "completed").await;

        let err = checkout(&pool, session.id, None, Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);

        // The whole transaction rolled back: the session is still active
        let unchanged = require(&pool, session.id).await.unwrap();
        assert_eq!(unchanged.status, CheckInStatus::Active);
        assert!(unchanged.checked_out_at.is_none());
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL test database (DATABASE_URL)"]
    async fn test_checkout_closes_session_and_reservation_together() {
        let pool = testutil::test_pool().await;
        let fx = testutil::seed(&pool).await;
        let res = approved_reservation(&pool, &fx).await;

        let session = testutil::checkin(&fx, res.id);
        assert!(matches!(
            open(&pool, &session).await.unwrap(),
            OpenOutcome::Opened
        ));
        assert!(
            confirm_payment(&pool, session.id, PaymentMethod::Card, "R-0002")
                .await
                .unwrap()
        );

        let closed = checkout(&pool, session.id, Some("left early"), Utc::now())
            .await
            .unwrap()
            .expect("session was active");
        assert_eq!(closed.status, CheckInStatus::Completed);
        assert!(closed.checked_out_at.is_some());

        let reservation = reservations::require(&pool, res.id).await.unwrap();
        assert_eq!(reservation.status, ReservationStatus::Completed);

        // Closing twice is a no-op for the second caller
        assert!(
            checkout(&pool, session.id, None, Utc::now())
                .await
                .unwrap()
                .is_none()
        );
    }
}
