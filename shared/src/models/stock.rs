//! Stock and stock transfer models

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::round_money;

/// Transfer lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "transfer_status", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Draft,
    Completed,
    Cancelled,
}

/// Quantity of an item that must leave a location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockRequest {
    pub item_id: Uuid,
    /// Shown to the user when stock is short (item code or name)
    pub item_label: String,
    pub quantity: i32,
}

/// Raised when a location cannot cover a requested quantity
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Insufficient stock for item {item}. Available: {available}, Requested: {requested}")]
pub struct StockShortage {
    pub item: String,
    pub available: i32,
    pub requested: i32,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeductionError {
    #[error(transparent)]
    Shortage(#[from] StockShortage),

    #[error("Quantity for item {item} must be positive, got {quantity}")]
    InvalidQuantity { item: String, quantity: i32 },
}

/// Paid plus free units of a line; `None` when the sum leaves `i32`
pub fn units_with_free(quantity: i32, free_quantity: Option<i32>) -> Option<i32> {
    quantity.checked_add(free_quantity.unwrap_or(0))
}

/// Aggregate requests per item and check them against available stock.
///
/// Returns `(item_id, quantity)` pairs ordered by item id, the order in which
/// stock rows must be locked and updated. Items without a stock row count as
/// zero available. Non-positive request quantities are rejected.
pub fn plan_deductions(
    requests: &[StockRequest],
    available: &HashMap<Uuid, i32>,
) -> Result<Vec<(Uuid, i32)>, DeductionError> {
    let mut totals: BTreeMap<Uuid, (i64, &str)> = BTreeMap::new();
    for request in requests {
        if request.quantity <= 0 {
            return Err(DeductionError::InvalidQuantity {
                item: request.item_label.clone(),
                quantity: request.quantity,
            });
        }
        let entry = totals
            .entry(request.item_id)
            .or_insert((0, request.item_label.as_str()));
        entry.0 += i64::from(request.quantity);
    }

    let mut plan = Vec::with_capacity(totals.len());
    for (item_id, (requested, label)) in totals {
        let on_hand = available.get(&item_id).copied().unwrap_or(0);
        if requested > i64::from(on_hand) {
            return Err(StockShortage {
                item: label.to_string(),
                available: on_hand,
                requested: i32::try_from(requested).unwrap_or(i32::MAX),
            }
            .into());
        }
        // requested <= on_hand, so it fits in i32
        plan.push((item_id, requested as i32));
    }
    Ok(plan)
}

/// Header totals of a stock transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferTotals {
    pub total_items: i32,
    pub total_quantity: i64,
    pub total_value: Decimal,
}

/// Totals over `(quantity, unit_cost)` lines
pub fn transfer_totals(lines: &[(i32, Decimal)]) -> TransferTotals {
    TransferTotals {
        total_items: lines.len() as i32,
        total_quantity: lines.iter().map(|(q, _)| i64::from(*q)).sum(),
        total_value: round_money(
            lines
                .iter()
                .map(|(q, cost)| Decimal::from(*q) * *cost)
                .sum(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn request(id: Uuid, label: &str, quantity: i32) -> StockRequest {
        StockRequest {
            item_id: id,
            item_label: label.to_string(),
            quantity,
        }
    }

    #[test]
    fn test_plan_aggregates_duplicate_lines() {
        let a = Uuid::new_v4();
        let available = HashMap::from([(a, 10)]);
        let plan = plan_deductions(&[request(a, "A1", 4), request(a, "A1", 6)], &available).unwrap();
        assert_eq!(plan, vec![(a, 10)]);
    }

    #[test]
    fn test_plan_rejects_aggregated_shortage() {
        let a = Uuid::new_v4();
        let available = HashMap::from([(a, 10)]);
        let err = plan_deductions(&[request(a, "A1", 6), request(a, "A1", 6)], &available).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Insufficient stock for item A1. Available: 10, Requested: 12"
        );
    }

    #[test]
    fn test_missing_stock_row_counts_as_zero() {
        let a = Uuid::new_v4();
        let err = plan_deductions(&[request(a, "Soap", 1)], &HashMap::new()).unwrap_err();
        match err {
            DeductionError::Shortage(shortage) => {
                assert_eq!(shortage.available, 0);
                assert_eq!(shortage.requested, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_plan_rejects_non_positive_quantities() {
        let a = Uuid::new_v4();
        let available = HashMap::from([(a, 10)]);
        for quantity in [0, -5, i32::MAX.wrapping_add(1)] {
            let err = plan_deductions(&[request(a, "A1", quantity)], &available).unwrap_err();
            assert_eq!(
                err,
                DeductionError::InvalidQuantity {
                    item: "A1".into(),
                    quantity
                }
            );
        }
        assert!(plan_deductions(&[request(a, "A1", 3), request(a, "A1", 0)], &available).is_err());
    }

    #[test]
    fn test_units_with_free_overflow() {
        assert_eq!(units_with_free(5, Some(2)), Some(7));
        assert_eq!(units_with_free(5, None), Some(5));
        assert_eq!(units_with_free(i32::MAX, Some(1)), None);
    }

    #[test]
    fn test_plan_is_sorted_by_item_id() {
        let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let available: HashMap<Uuid, i32> = ids.iter().map(|id| (*id, 100)).collect();
        let requests: Vec<StockRequest> = ids.iter().map(|id| request(*id, "x", 1)).collect();
        let plan = plan_deductions(&requests, &available).unwrap();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(plan.iter().map(|(id, _)| *id).collect::<Vec<_>>(), sorted);
    }

    #[test]
    fn test_transfer_totals() {
        let totals = transfer_totals(&[(3, Decimal::new(250, 2)), (2, Decimal::from(10))]);
        assert_eq!(totals.total_items, 2);
        assert_eq!(totals.total_quantity, 5);
        assert_eq!(totals.total_value, Decimal::new(2750, 2));
    }

    #[test]
    fn test_transfer_total_quantity_exceeds_i32() {
        let lines = vec![(i32::MAX, Decimal::ZERO), (i32::MAX, Decimal::ZERO)];
        assert_eq!(transfer_totals(&lines).total_quantity, 2 * i64::from(i32::MAX));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A successful plan never takes more than is on hand
        #[test]
        fn prop_plan_never_overdraws(
            on_hand in 0i32..500,
            quantities in prop::collection::vec(1i32..100, 1..8),
        ) {
            let id = Uuid::new_v4();
            let available = HashMap::from([(id, on_hand)]);
            let requests: Vec<StockRequest> = quantities.iter().map(|q| request(id, "p", *q)).collect();
            let total: i32 = quantities.iter().sum();
            match plan_deductions(&requests, &available) {
                Ok(plan) => {
                    prop_assert!(total <= on_hand);
                    prop_assert_eq!(plan, vec![(id, total)]);
                }
                Err(DeductionError::Shortage(shortage)) => {
                    prop_assert!(total > on_hand);
                    prop_assert_eq!(shortage.requested, total);
                }
                Err(other) => prop_assert!(false, "unexpected error: {:?}", other),
            }
        }
    }
}
