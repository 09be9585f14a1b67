//! Reservation API handlers
//!
//! POST  /reservations               — book a slot
//! GET   /reservations?user_id=      — list a user's reservations
//! GET   /reservations/{id}
//! PATCH /reservations/{id}          — reschedule / edit notes
//! POST  /reservations/{id}/cancel
//! POST  /reservations/{id}/approve  — admin
//! POST  /reservations/{id}/reject   — admin
//! POST  /reservations/{id}/no-show  — admin

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::{
    CancelRequest, NoShowRequest, RejectRequest, ReservationCreate, ReservationUpdate,
};
use uuid::Uuid;

use crate::api::actor::ActorId;
use crate::services;
use crate::state::AppState;

pub async fn create(
    State(state): State<AppState>,
    actor: ActorId,
    Json(req): Json<ReservationCreate>,
) -> AppResult<impl IntoResponse> {
    let actor = actor.load(&state).await?;
    let reservation = services::reservation::create(&state, &actor, req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(reservation))))
}

pub async fn get(
    State(state): State<AppState>,
    actor: ActorId,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let actor = actor.load(&state).await?;
    let reservation = services::reservation::get(&state, id).await?;
    if reservation.user_id != actor.id && !actor.is_admin() {
        return Err(AppError::new(ErrorCode::NotOwner));
    }
    Ok(Json(ApiResponse::success(reservation)))
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub user_id: Uuid,
}

pub async fn list(
    State(state): State<AppState>,
    actor: ActorId,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    let actor = actor.load(&state).await?;
    if query.user_id != actor.id && !actor.is_admin() {
        return Err(AppError::new(ErrorCode::NotOwner));
    }
    let reservations = services::reservation::list_for_user(&state, query.user_id).await?;
    Ok(Json(ApiResponse::success(reservations)))
}

pub async fn update(
    State(state): State<AppState>,
    actor: ActorId,
    Path(id): Path<Uuid>,
    Json(req): Json<ReservationUpdate>,
) -> AppResult<impl IntoResponse> {
    let actor = actor.load(&state).await?;
    let reservation = services::reservation::update(&state, &actor, id, req).await?;
    Ok(Json(ApiResponse::success(reservation)))
}

pub async fn cancel(
    State(state): State<AppState>,
    actor: ActorId,
    Path(id): Path<Uuid>,
    req: Option<Json<CancelRequest>>,
) -> AppResult<impl IntoResponse> {
    let actor = actor.load(&state).await?;
    let req = req.map(|Json(r)| r).unwrap_or_default();
    let reservation = services::reservation::cancel(&state, &actor, id, req).await?;
    Ok(Json(ApiResponse::success(reservation)))
}

pub async fn approve(
    State(state): State<AppState>,
    actor: ActorId,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let actor = actor.load(&state).await?;
    let reservation = services::reservation::approve(&state, &actor, id).await?;
    Ok(Json(ApiResponse::success(reservation)))
}

pub async fn reject(
    State(state): State<AppState>,
    actor: ActorId,
    Path(id): Path<Uuid>,
    Json(req): Json<RejectRequest>,
) -> AppResult<impl IntoResponse> {
    let actor = actor.load(&state).await?;
    let reservation = services::reservation::reject(&state, &actor, id, req).await?;
    Ok(Json(ApiResponse::success(reservation)))
}

pub async fn no_show(
    State(state): State<AppState>,
    actor: ActorId,
    Path(id): Path<Uuid>,
    req: Option<Json<NoShowRequest>>,
) -> AppResult<impl IntoResponse> {
    let actor = actor.load(&state).await?;
    let req = req.map(|Json(r)| r).unwrap_or_default();
    let reservation = services::reservation::mark_no_show(&state, &actor, id, req).await?;
    Ok(Json(ApiResponse::success(reservation)))
}
