use shared::error::{AppError, AppResult};
use shared::models::{User, UserRole};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    role: String,
    is_active: bool,
}

impl UserRow {
    fn into_model(self) -> AppResult<User> {
        let role: UserRole = self
            .role
            .parse()
            .map_err(|e| super::corrupt("user role", e))?;
        Ok(User {
            id: self.id,
            name: self.name,
            role,
            is_active: self.is_active,
        })
    }
}

pub async fn fetch(pool: &PgPool, id: Uuid) -> AppResult<Option<User>> {
    let row: Option<UserRow> =
        sqlx::query_as("SELECT id, name, role, is_active FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(super::internal)?;
    row.map(UserRow::into_model).transpose()
}

/// Fetch a user, requiring existence.
pub async fn require(pool: &PgPool, id: Uuid) -> AppResult<User> {
    fetch(pool, id)
        .await?
        .ok_or_else(|| AppError::new(shared::ErrorCode::UserNotFound))
}
