//! HTTP API routes

pub mod actor;
pub mod checkins;
pub mod health;
pub mod reservations;

use axum::Router;
use axum::routing::{get, patch, post};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the combined router
pub fn router(state: AppState) -> Router {
    let concurrency_limit = ConcurrencyLimitLayer::new(100);

    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/reservations",
            post(reservations::create).get(reservations::list),
        )
        .route(
            "/reservations/{id}",
            get(reservations::get).patch(reservations::update),
        )
        .route("/reservations/{id}/cancel", post(reservations::cancel))
        .route("/reservations/{id}/approve", post(reservations::approve))
        .route("/reservations/{id}/reject", post(reservations::reject))
        .route("/reservations/{id}/no-show", post(reservations::no_show))
        .route("/checkins", post(checkins::create))
        .route("/checkins/{id}", get(checkins::get))
        .route("/checkins/{id}/payment", patch(checkins::payment))
        .route("/checkins/{id}/adjust", patch(checkins::adjust))
        .route("/checkins/{id}/checkout", patch(checkins::checkout))
        .layer(TraceLayer::new_for_http())
        .layer(concurrency_limit)
        .with_state(state)
}
