//! Business models

use serde::{Deserialize, Serialize};

/// Kind of business operating the platform
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "business_type", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum BusinessType {
    Retail,
    Wholesale,
    Distributor,
    Manufacturer,
}

impl BusinessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessType::Retail => "retail",
            BusinessType::Wholesale => "wholesale",
            BusinessType::Distributor => "distributor",
            BusinessType::Manufacturer => "manufacturer",
        }
    }
}
