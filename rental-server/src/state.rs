//! Application state

use std::sync::Arc;

use shared::clock::ClockInstant;
use sqlx::PgPool;

use crate::config::Config;
use crate::services::notify::{LogDispatcher, NotificationDispatcher};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
///
/// Handlers are stateless; everything here is either a connection pool or
/// an immutable capability bundle constructed once at startup.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// Notification dispatcher (fire-and-forget, failures never roll back
    /// a committed transition)
    pub notifier: Arc<dyn NotificationDispatcher>,
    /// Venue UTC offset for the extended-hour clock
    pub venue_utc_offset_hours: i32,
}

impl AppState {
    /// Create a new AppState
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self {
            pool,
            notifier: Arc::new(LogDispatcher),
            venue_utc_offset_hours: config.venue_utc_offset_hours,
        })
    }

    /// Current instant on the venue clock.
    pub fn now(&self) -> ClockInstant {
        ClockInstant::now(self.venue_utc_offset_hours)
    }
}
