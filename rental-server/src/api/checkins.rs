//! Check-in API handlers (admin-side on-site flow)
//!
//! POST  /checkins                 — open a session
//! GET   /checkins/{id}
//! PATCH /checkins/{id}/payment    — confirm payment
//! PATCH /checkins/{id}/adjust     — adjust time/amount
//! PATCH /checkins/{id}/checkout   — close the session

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use shared::error::{ApiResponse, AppResult};
use shared::models::{AdjustRequest, CheckInCreate, CheckoutRequest, PaymentRequest};
use uuid::Uuid;

use crate::api::actor::ActorId;
use crate::services;
use crate::state::AppState;

pub async fn create(
    State(state): State<AppState>,
    actor: ActorId,
    Json(req): Json<CheckInCreate>,
) -> AppResult<impl IntoResponse> {
    let actor = actor.load(&state).await?;
    let checkin = services::checkin::open(&state, &actor, req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(checkin))))
}

pub async fn get(
    State(state): State<AppState>,
    actor: ActorId,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    actor.load(&state).await?;
    let checkin = services::checkin::get(&state, id).await?;
    Ok(Json(ApiResponse::success(checkin)))
}

pub async fn payment(
    State(state): State<AppState>,
    actor: ActorId,
    Path(id): Path<Uuid>,
    Json(req): Json<PaymentRequest>,
) -> AppResult<impl IntoResponse> {
    let actor = actor.load(&state).await?;
    let checkin = services::checkin::confirm_payment(&state, &actor, id, req).await?;
    Ok(Json(ApiResponse::success(checkin)))
}

pub async fn adjust(
    State(state): State<AppState>,
    actor: ActorId,
    Path(id): Path<Uuid>,
    Json(req): Json<AdjustRequest>,
) -> AppResult<impl IntoResponse> {
    let actor = actor.load(&state).await?;
    let checkin = services::checkin::adjust(&state, &actor, id, req).await?;
    Ok(Json(ApiResponse::success(checkin)))
}

pub async fn checkout(
    State(state): State<AppState>,
    actor: ActorId,
    Path(id): Path<Uuid>,
    req: Option<Json<CheckoutRequest>>,
) -> AppResult<impl IntoResponse> {
    let actor = actor.load(&state).await?;
    let req = req.map(|Json(r)| r).unwrap_or_default();
    let summary = services::checkin::checkout(&state, &actor, id, req).await?;
    Ok(Json(ApiResponse::success(summary)))
}
