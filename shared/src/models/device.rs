//! Device and device type models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Operability of a physical rental unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceOperability {
    Available,
    InUse,
    Maintenance,
    Broken,
}

impl DeviceOperability {
    /// Whether the unit can accept new reservations.
    pub fn is_reservable(&self) -> bool {
        matches!(self, Self::Available | Self::InUse)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::InUse => "in_use",
            Self::Maintenance => "maintenance",
            Self::Broken => "broken",
        }
    }
}

impl std::str::FromStr for DeviceOperability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "in_use" => Ok(Self::InUse),
            "maintenance" => Ok(Self::Maintenance),
            "broken" => Ok(Self::Broken),
            other => Err(format!("unknown device operability: {other}")),
        }
    }
}

/// Device type: capacity policy for a family of physical units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceType {
    pub id: Uuid,
    pub name: String,
    /// Max concurrently-reserved units per shift classification on one
    /// business date. `None` means uncapped.
    pub max_rental_units: Option<i32>,
    pub requires_approval: bool,
    /// Rental price per hour
    pub hourly_rate: Decimal,
}

/// One physical rental unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: Uuid,
    pub type_id: Uuid,
    /// Display number within the type, e.g. "D1"
    pub number: String,
    pub operability: DeviceOperability,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reservable_operability() {
        assert!(DeviceOperability::Available.is_reservable());
        assert!(DeviceOperability::InUse.is_reservable());
        assert!(!DeviceOperability::Maintenance.is_reservable());
        assert!(!DeviceOperability::Broken.is_reservable());
    }

    #[test]
    fn test_operability_roundtrip() {
        for op in [
            DeviceOperability::Available,
            DeviceOperability::InUse,
            DeviceOperability::Maintenance,
            DeviceOperability::Broken,
        ] {
            assert_eq!(op.as_str().parse::<DeviceOperability>().unwrap(), op);
        }
    }
}
