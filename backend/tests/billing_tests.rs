//! Bill calculator, payment and order workflow tests
//!
//! Property-based tests for:
//! - Bill totals never go negative and the balance starts at the total
//! - Payments never overpay and keep paid + balance equal to the total
//! - Orders only move forward through the confirm workflow

use std::str::FromStr;

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    apply_payment, calculate_bill, calculate_line, round_money, BillStatus, BillingError,
    LineAmounts, OrderStatus,
};

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Prices between 0.00 and 9,999.99
fn price_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Whole percentages 0..=100
fn percentage_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=100).prop_map(Decimal::from)
}

fn line_strategy() -> impl Strategy<Value = LineAmounts> {
    (price_strategy(), 1i32..500, percentage_strategy())
        .prop_map(|(price, quantity, discount)| calculate_line(price, quantity, discount))
}

fn order_status_strategy() -> impl Strategy<Value = OrderStatus> {
    prop_oneof![
        Just(OrderStatus::Pending),
        Just(OrderStatus::Confirmed),
        Just(OrderStatus::Checking),
        Just(OrderStatus::Delivered),
        Just(OrderStatus::Cancelled),
    ]
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Bill totals
// ============================================================================

proptest! {
    #[test]
    fn prop_line_total_within_subtotal(price in price_strategy(), quantity in 1i32..1000, pct in percentage_strategy()) {
        let line = calculate_line(price, quantity, pct);
        prop_assert!(line.total >= Decimal::ZERO);
        prop_assert!(line.total <= line.subtotal);
        prop_assert_eq!(line.subtotal - line.discount_amount, line.total);
    }

    #[test]
    fn prop_bill_total_never_negative(
        lines in prop::collection::vec(line_strategy(), 1..20),
        pct in percentage_strategy(),
        amount in price_strategy(),
    ) {
        let totals = calculate_bill(&lines, Some(pct), Some(amount));
        prop_assert!(totals.total_amount >= Decimal::ZERO);
        prop_assert_eq!(totals.balance_amount, totals.total_amount);
        prop_assert_eq!(totals.paid_amount, Decimal::ZERO);
        prop_assert_eq!(totals.total_items as usize, lines.len());
    }

    #[test]
    fn prop_subtotal_is_sum_of_line_totals(lines in prop::collection::vec(line_strategy(), 1..20)) {
        let totals = calculate_bill(&lines, None, None);
        let expected: Decimal = lines.iter().map(|l| l.total).sum();
        prop_assert_eq!(totals.subtotal, expected);
        prop_assert_eq!(totals.total_amount, expected);
    }

    #[test]
    fn prop_percentage_discount_applied_when_no_amount(
        lines in prop::collection::vec(line_strategy(), 1..10),
        pct in percentage_strategy(),
    ) {
        let totals = calculate_bill(&lines, Some(pct), Some(Decimal::ZERO));
        let expected = round_money(totals.subtotal * pct / Decimal::ONE_HUNDRED);
        prop_assert_eq!(totals.discount_amount, expected);
    }
}

#[test]
fn test_reference_invoice() {
    // 2 x 250.00 at 10% and 3 x 99.99, then 5% off the bill
    let lines = vec![
        calculate_line(dec("250.00"), 2, dec("10")),
        calculate_line(dec("99.99"), 3, Decimal::ZERO),
    ];
    assert_eq!(lines[0].total, dec("450.00"));
    assert_eq!(lines[1].total, dec("299.97"));

    let totals = calculate_bill(&lines, Some(dec("5")), None);
    assert_eq!(totals.subtotal, dec("749.97"));
    assert_eq!(totals.discount_amount, dec("37.50"));
    assert_eq!(totals.total_amount, dec("712.47"));
}

#[test]
fn test_discount_amount_overrides_percentage() {
    let lines = vec![calculate_line(dec("100"), 1, Decimal::ZERO)];
    let totals = calculate_bill(&lines, Some(dec("50")), Some(dec("10")));
    assert_eq!(totals.discount_amount, dec("10"));
    assert_eq!(totals.total_amount, dec("90"));
}

// ============================================================================
// Payments
// ============================================================================

proptest! {
    #[test]
    fn prop_payments_keep_amounts_consistent(
        total in (1i64..1_000_000).prop_map(|c| Decimal::new(c, 2)),
        payments in prop::collection::vec((1i64..200_000).prop_map(|c| Decimal::new(c, 2)), 1..10),
    ) {
        let mut status = BillStatus::Pending;
        let mut paid = Decimal::ZERO;
        let mut balance = total;

        for amount in payments {
            match apply_payment(status, paid, balance, amount) {
                Ok(outcome) => {
                    prop_assert!(amount <= balance);
                    status = outcome.status;
                    paid = outcome.paid_amount;
                    balance = outcome.balance_amount;
                }
                Err(BillingError::InvalidPayment(_)) => prop_assert!(amount > balance),
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
            prop_assert!(balance >= Decimal::ZERO);
            prop_assert_eq!(paid + balance, total);
        }

        if balance.is_zero() {
            prop_assert_eq!(status, BillStatus::Paid);
        }
    }
}

#[test]
fn test_payment_rejected_on_cancelled_bill() {
    let result = apply_payment(BillStatus::Cancelled, Decimal::ZERO, dec("100"), dec("10"));
    assert_eq!(result, Err(BillingError::BillCancelled));
}

#[test]
fn test_partial_then_full_payment() {
    let first = apply_payment(BillStatus::Pending, Decimal::ZERO, dec("100"), dec("30")).unwrap();
    assert_eq!(first.status, BillStatus::PartiallyPaid);

    let second = apply_payment(first.status, first.paid_amount, first.balance_amount, dec("70")).unwrap();
    assert_eq!(second.status, BillStatus::Paid);
    assert_eq!(second.balance_amount, Decimal::ZERO);
}

// ============================================================================
// Order workflow
// ============================================================================

proptest! {
    #[test]
    fn prop_finished_orders_never_move(next in order_status_strategy()) {
        prop_assert!(!OrderStatus::Delivered.can_transition_to(next));
        prop_assert!(!OrderStatus::Cancelled.can_transition_to(next));
    }

    #[test]
    fn prop_no_self_transitions(status in order_status_strategy()) {
        prop_assert!(status.transition_to(status).is_err());
    }
}

#[test]
fn test_confirmation_happens_once() {
    let confirmed = OrderStatus::Pending.transition_to(OrderStatus::Confirmed).unwrap();
    assert!(confirmed.transition_to(OrderStatus::Confirmed).is_err());
}

#[test]
fn test_full_order_lifecycle() {
    let status = OrderStatus::Pending
        .transition_to(OrderStatus::Confirmed)
        .and_then(|s| s.transition_to(OrderStatus::Checking))
        .and_then(|s| s.transition_to(OrderStatus::Delivered))
        .unwrap();
    assert_eq!(status, OrderStatus::Delivered);
}

#[test]
fn test_confirmed_orders_cannot_be_cancelled() {
    assert!(OrderStatus::Confirmed.transition_to(OrderStatus::Cancelled).is_err());
}
