use rust_decimal::Decimal;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Device, DeviceOperability, DeviceType};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct DeviceRow {
    id: Uuid,
    type_id: Uuid,
    number: String,
    operability: String,
}

impl DeviceRow {
    fn into_model(self) -> AppResult<Device> {
        let operability: DeviceOperability = self
            .operability
            .parse()
            .map_err(|e| super::corrupt("device operability", e))?;
        Ok(Device {
            id: self.id,
            type_id: self.type_id,
            number: self.number,
            operability,
        })
    }
}

pub async fn fetch(pool: &PgPool, id: Uuid) -> AppResult<Option<Device>> {
    let row: Option<DeviceRow> =
        sqlx::query_as("SELECT id, type_id, number, operability FROM devices WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(super::internal)?;
    row.map(DeviceRow::into_model).transpose()
}

/// Fetch a device, requiring existence.
pub async fn require(pool: &PgPool, id: Uuid) -> AppResult<Device> {
    fetch(pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::DeviceNotFound))
}

#[derive(sqlx::FromRow)]
struct DeviceTypeRow {
    id: Uuid,
    name: String,
    max_rental_units: Option<i32>,
    requires_approval: bool,
    hourly_rate: Decimal,
}

pub async fn fetch_type(pool: &PgPool, id: Uuid) -> AppResult<Option<DeviceType>> {
    let row: Option<DeviceTypeRow> = sqlx::query_as(
        "SELECT id, name, max_rental_units, requires_approval, hourly_rate
         FROM device_types WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(super::internal)?;
    Ok(row.map(|r| DeviceType {
        id: r.id,
        name: r.name,
        max_rental_units: r.max_rental_units,
        requires_approval: r.requires_approval,
        hourly_rate: r.hourly_rate,
    }))
}

/// Fetch a device type, requiring existence.
pub async fn require_type(pool: &PgPool, id: Uuid) -> AppResult<DeviceType> {
    fetch_type(pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::DeviceTypeNotFound))
}
