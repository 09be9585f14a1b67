//! Database access layer
//!
//! Plain sqlx query functions, one module per entity. State transitions
//! are conditional updates (`WHERE status = $expected`) so racing writers
//! yield one winner; the loser sees zero rows and maps that to a 409.

pub mod checkins;
pub mod devices;
pub mod reservations;
pub mod users;

use shared::error::AppError;

/// Postgres error codes signalling that a storage constraint resolved a
/// race: unique_violation and exclusion_violation.
const UNIQUE_VIOLATION: &str = "23505";
const EXCLUSION_VIOLATION: &str = "23P01";

/// Whether this error is a uniqueness/exclusion violation of the named
/// constraint. A table can carry several unique constraints, so conflict
/// handling must key on the constraint name, not just the error class.
pub fn violates_constraint(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err
                .code()
                .is_some_and(|c| c == UNIQUE_VIOLATION || c == EXCLUSION_VIOLATION)
                && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}

/// Map a database error to an opaque internal AppError; the original
/// error is logged with context server-side.
pub fn internal(err: sqlx::Error) -> AppError {
    tracing::error!(error = %err, "Database error");
    AppError::database(err.to_string())
}

/// Map a malformed stored value (status strings etc.) to an internal
/// error.
pub fn corrupt(context: &str, err: impl std::fmt::Display) -> AppError {
    tracing::error!(context = %context, error = %err, "Malformed value in storage");
    AppError::internal(format!("malformed {context} in storage"))
}

/// Fixtures for the ignored database tests. They need a PostgreSQL
/// instance reachable through `DATABASE_URL`; run them with
/// `cargo test -- --ignored` against a scratch database.
///
/// Each seed creates its own user/type/device, so tests stay isolated
/// even on a reused database: the overlap constraint is per device.
#[cfg(test)]
pub mod testutil {
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use shared::models::{
        CheckIn, CheckInStatus, PaymentStatus, Reservation, ReservationStatus,
    };
    use shared::slot::TimeSlot;
    use sqlx::PgPool;
    use uuid::Uuid;

    pub struct Fixture {
        pub user_id: Uuid,
        pub type_id: Uuid,
        pub device_id: Uuid,
    }

    pub async fn test_pool() -> PgPool {
        let url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must point at a scratch database");
        let pool = PgPool::connect(&url).await.expect("connect to test database");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("run migrations");
        pool
    }

    pub async fn seed(pool: &PgPool) -> Fixture {
        let user_id = Uuid::new_v4();
        sqlx::query("INSERT INTO users (id, name) VALUES ($1, $2)")
            .bind(user_id)
            .bind(format!("test-user-{user_id}"))
            .execute(pool)
            .await
            .expect("seed user");

        let type_id = Uuid::new_v4();
        sqlx::query("INSERT INTO device_types (id, name, hourly_rate) VALUES ($1, $2, $3)")
            .bind(type_id)
            .bind(format!("test-type-{type_id}"))
            .bind(Decimal::new(2000, 2))
            .execute(pool)
            .await
            .expect("seed device type");

        let device_id = Uuid::new_v4();
        sqlx::query("INSERT INTO devices (id, type_id, number) VALUES ($1, $2, $3)")
            .bind(device_id)
            .bind(type_id)
            .bind(device_id.to_string())
            .execute(pool)
            .await
            .expect("seed device");

        Fixture {
            user_id,
            type_id,
            device_id,
        }
    }

    /// Build an unsaved reservation on the fixture's device. The number is
    /// derived from the row id so reruns on a reused database never
    /// collide by accident.
    pub fn reservation(
        fixture: &Fixture,
        date: NaiveDate,
        start_hour: u32,
        end_hour: u32,
        status: ReservationStatus,
    ) -> Reservation {
        let id = Uuid::new_v4();
        let now = Utc::now();
        Reservation {
            id,
            user_id: fixture.user_id,
            device_id: fixture.device_id,
            date,
            time_slot: TimeSlot::new(start_hour, end_hour).expect("valid slot"),
            status,
            reservation_number: format!("RR-{}-{}", date.format("%Y%m%d"), id.simple()),
            status_reason: None,
            reminder_sent: false,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Build an unsaved check-in for a reservation on the fixture's device.
    pub fn checkin(fixture: &Fixture, reservation_id: Uuid) -> CheckIn {
        let now = Utc::now();
        CheckIn {
            id: Uuid::new_v4(),
            reservation_id,
            device_id: fixture.device_id,
            started_at: now,
            status: CheckInStatus::AwaitingPayment,
            payment_method: None,
            payment_status: PaymentStatus::Pending,
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
        }
    }
}
