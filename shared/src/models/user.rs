//! User models and role permissions

use serde::{Deserialize, Serialize};

/// User roles within a business
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "user_role", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Full access, the only role allowed to confirm orders
    Admin,
    /// Back-office staff: stock, deliveries and payments
    Office,
    /// Field sales; bills created by a representative become orders
    Representative,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Office => "office",
            UserRole::Representative => "representative",
        }
    }

    pub fn can_confirm_orders(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Move orders through checking and delivery
    pub fn can_progress_orders(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Office)
    }

    pub fn can_manage_stock(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Office)
    }

    pub fn can_record_payments(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Office)
    }

    pub fn can_view_all_orders(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Office)
    }

    /// Bills created by this role are orders awaiting confirmation
    pub fn creates_orders(&self) -> bool {
        matches!(self, UserRole::Representative)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "office" => Ok(UserRole::Office),
            "representative" => Ok(UserRole::Representative),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}
