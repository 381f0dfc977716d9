//! Customer models and outstanding balance summaries

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::round_money;

/// Days after billing when an unpaid balance counts as overdue
pub const OVERDUE_AFTER_DAYS: i64 = 45;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "customer_type", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CustomerType {
    #[default]
    Retail,
    Enterprise,
}

/// A delivered, not yet settled bill of a customer
#[derive(Debug, Clone, PartialEq)]
pub struct OutstandingBill {
    pub balance_amount: Decimal,
    pub billing_date: NaiveDate,
}

/// What a customer still owes on delivered bills
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerDueSummary {
    pub due_amount: Decimal,
    pub pending_bills_count: usize,
    pub over_45_days_amount: Decimal,
    /// Most recent billing date as `Mon DD, YYYY`, or `N/A`
    pub last_billing_date: String,
}

/// Summarize outstanding bills as of `today`.
///
/// Only bills with a positive balance count towards the due amounts; the
/// last billing date considers every bill passed in.
pub fn summarize_dues(bills: &[OutstandingBill], today: NaiveDate) -> CustomerDueSummary {
    let cutoff = today - Duration::days(OVERDUE_AFTER_DAYS);
    let pending: Vec<&OutstandingBill> = bills
        .iter()
        .filter(|b| b.balance_amount > Decimal::ZERO)
        .collect();

    let due_amount: Decimal = pending.iter().map(|b| b.balance_amount).sum();
    let over_45_days_amount: Decimal = pending
        .iter()
        .filter(|b| b.billing_date < cutoff)
        .map(|b| b.balance_amount)
        .sum();

    let last_billing_date = bills
        .iter()
        .map(|b| b.billing_date)
        .max()
        .map(|d| d.format("%b %d, %Y").to_string())
        .unwrap_or_else(|| "N/A".to_string());

    CustomerDueSummary {
        due_amount: round_money(due_amount),
        pending_bills_count: pending.len(),
        over_45_days_amount: round_money(over_45_days_amount),
        last_billing_date,
    }
}
