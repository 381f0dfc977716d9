//! Category and item catalog models

use serde::{Deserialize, Serialize};

/// Category classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "category_type", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CategoryType {
    Goods,
    RawMaterial,
    Consumable,
    Service,
}

/// Unit an item is sold in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "unit_type", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    Pcs,
    Dz,
    Box,
    Pack,
    Kg,
    G,
    L,
    Ml,
}

impl UnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::Pcs => "pcs",
            UnitType::Dz => "dz",
            UnitType::Box => "box",
            UnitType::Pack => "pack",
            UnitType::Kg => "kg",
            UnitType::G => "g",
            UnitType::L => "l",
            UnitType::Ml => "ml",
        }
    }
}
