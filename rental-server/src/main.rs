//! rental-server — temporal reservation engine
//!
//! Long-running service that:
//! - Validates booking requests against the capacity rules
//! - Guards device exclusivity through storage-level constraints
//! - Drives the Reservation and CheckIn/Payment/Checkout state machines
//! - Fires lifecycle notification events (delivery is external)

mod api;
mod config;
mod db;
mod services;
mod state;
mod sweep;

use config::Config;
use state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rental_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting rental-server (env: {})", config.environment);

    // Initialize application state (runs migrations)
    let state = AppState::new(&config).await?;

    let app = api::router(state.clone());

    // Background sweeps: auto-expiry and reservation reminders.
    // They run outside the request path and are idempotent on re-run.
    let sweep_state = state.clone();
    let sweep_interval = config.sweep_interval_secs;
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(sweep_interval));
        loop {
            interval.tick().await;
            sweep::run_once(&sweep_state).await;
        }
    });

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("rental-server HTTP listening on {addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
