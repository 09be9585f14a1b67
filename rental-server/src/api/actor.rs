//! Acting-user extraction
//!
//! The acting user arrives as an `x-user-id` header; role and active flag
//! are always loaded from the user store, never trusted from the request.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::User;
use uuid::Uuid;

use crate::db;
use crate::state::AppState;

pub const ACTOR_HEADER: &str = "x-user-id";

/// Acting user id, parsed from the `x-user-id` header.
pub struct ActorId(pub Uuid);

impl<S> FromRequestParts<S> for ActorId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::new(ErrorCode::NotAuthenticated))?;
        let id = value.parse::<Uuid>().map_err(|_| {
            AppError::with_message(ErrorCode::NotAuthenticated, "x-user-id is not a valid UUID")
        })?;
        Ok(ActorId(id))
    }
}

impl ActorId {
    /// Load the acting user, rejecting unknown or disabled accounts.
    pub async fn load(&self, state: &AppState) -> AppResult<User> {
        let user = db::users::fetch(&state.pool, self.0)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::NotAuthenticated))?;
        if !user.is_active {
            return Err(AppError::new(ErrorCode::AccountDisabled));
        }
        Ok(user)
    }
}
