//! Bill, order and payment models with the bill calculator

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::models::stock::units_with_free;
use crate::types::round_money;
use crate::validation::{validate_lines, validate_money, validate_percentage};

/// Status of a customer or supplier bill
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "bill_status", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    #[default]
    Draft,
    Pending,
    Paid,
    PartiallyPaid,
    Cancelled,
}

/// Order workflow status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "order_status", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Checking,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Checking => "checking",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Allowed moves: pending -> confirmed | cancelled, confirmed -> checking,
    /// checking -> delivered
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Confirmed)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Confirmed, OrderStatus::Checking)
                | (OrderStatus::Checking, OrderStatus::Delivered)
        )
    }

    pub fn transition_to(&self, next: OrderStatus) -> Result<OrderStatus, BillingError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(BillingError::InvalidTransition {
                from: *self,
                to: next,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "payment_method", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Check,
    BankTransfer,
    CreditCard,
}

impl PaymentMethod {
    /// Map a free-form client label, falling back to cash
    pub fn from_label(label: &str) -> PaymentMethod {
        match label.trim().to_lowercase().as_str() {
            "check" | "cheque" => PaymentMethod::Check,
            "bank_transfer" | "bank-transfer" => PaymentMethod::BankTransfer,
            "credit_card" | "credit-card" => PaymentMethod::CreditCard,
            _ => PaymentMethod::Cash,
        }
    }
}

/// Whether a customer bill is a direct invoice or a representative's order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillKind {
    Invoice,
    Order,
}

impl BillKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            BillKind::Invoice => "INV",
            BillKind::Order => "ORD",
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BillingError {
    #[error("Cannot change order status from {} to {}", .from.as_str(), .to.as_str())]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("{0}")]
    InvalidPayment(String),

    #[error("Cannot record payment on a cancelled bill")]
    BillCancelled,
}

// ============================================================================
// Bill Calculator
// ============================================================================

/// Computed amounts of one bill line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineAmounts {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
}

/// `price x quantity` less a percentage discount
pub fn calculate_line(unit_price: Decimal, quantity: i32, discount_percentage: Decimal) -> LineAmounts {
    let subtotal = round_money(unit_price * Decimal::from(quantity));
    let discount_amount = round_money(subtotal * discount_percentage / Decimal::ONE_HUNDRED);
    LineAmounts {
        subtotal,
        discount_amount,
        total: subtotal - discount_amount,
    }
}

/// Header totals of a bill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BillTotals {
    pub subtotal: Decimal,
    pub discount_percentage: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub balance_amount: Decimal,
    pub total_items: i32,
}

/// Sum line totals and apply the bill level discount.
///
/// A non-zero `extra_discount_amount` wins over the percentage. The total
/// never drops below zero.
pub fn calculate_bill(
    lines: &[LineAmounts],
    extra_discount_percentage: Option<Decimal>,
    extra_discount_amount: Option<Decimal>,
) -> BillTotals {
    let subtotal: Decimal = lines.iter().map(|l| l.total).sum();
    let discount_percentage = extra_discount_percentage.unwrap_or(Decimal::ZERO);
    let discount_amount = match extra_discount_amount {
        Some(amount) if !amount.is_zero() => round_money(amount),
        _ => round_money(subtotal * discount_percentage / Decimal::ONE_HUNDRED),
    };
    let total_amount = (subtotal - discount_amount).max(Decimal::ZERO);

    BillTotals {
        subtotal,
        discount_percentage,
        discount_amount,
        total_amount,
        paid_amount: Decimal::ZERO,
        balance_amount: total_amount,
        total_items: lines.len() as i32,
    }
}

// ============================================================================
// Payments
// ============================================================================

/// Bill amounts after a payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaymentOutcome {
    pub paid_amount: Decimal,
    pub balance_amount: Decimal,
    pub status: BillStatus,
}

pub fn apply_payment(
    status: BillStatus,
    paid_amount: Decimal,
    balance_amount: Decimal,
    amount: Decimal,
) -> Result<PaymentOutcome, BillingError> {
    if status == BillStatus::Cancelled {
        return Err(BillingError::BillCancelled);
    }
    if amount <= Decimal::ZERO {
        return Err(BillingError::InvalidPayment(
            "Payment amount must be greater than zero".to_string(),
        ));
    }
    if amount.normalize().scale() > 2 {
        return Err(BillingError::InvalidPayment(
            "Payment amount can have at most 2 decimal places".to_string(),
        ));
    }
    if amount > balance_amount {
        return Err(BillingError::InvalidPayment(format!(
            "Payment amount exceeds outstanding balance of {}",
            balance_amount
        )));
    }

    let balance_amount = balance_amount - amount;
    Ok(PaymentOutcome {
        paid_amount: paid_amount + amount,
        balance_amount,
        status: if balance_amount.is_zero() {
            BillStatus::Paid
        } else {
            BillStatus::PartiallyPaid
        },
    })
}

// ============================================================================
// Customer Bill Requests
// ============================================================================

/// One line of a customer bill request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct CustomerBillLine {
    pub item_id: Option<Uuid>,

    #[serde(default, alias = "itemCode")]
    #[validate(length(max = 50, message = "Item code must be at most 50 characters"))]
    pub item_code: Option<String>,

    #[serde(default, alias = "itemName")]
    pub item_name: Option<String>,

    /// Zero means "use the item's selling price"
    #[serde(default)]
    #[validate(custom = "validate_money")]
    pub unit_price: Decimal,

    #[validate(range(min = 1, max = 1_000_000, message = "Quantity must be between 1 and 1000000"))]
    pub quantity: i32,

    #[serde(default)]
    pub unit: Option<String>,

    #[serde(default)]
    #[validate(custom = "validate_percentage")]
    pub discount_percentage: Option<Decimal>,

    #[serde(default)]
    #[validate(range(min = 0, max = 1_000_000, message = "Free quantity must be between 0 and 1000000"))]
    pub free_quantity: Option<i32>,

    #[serde(default)]
    pub notes: Option<String>,
}

impl CustomerBillLine {
    /// Units leaving stock for this line, free items included; `None` on
    /// overflow
    pub fn stock_quantity(&self) -> Option<i32> {
        units_with_free(self.quantity, self.free_quantity)
    }
}

/// Request to create a customer bill or order
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct CreateCustomerBillRequest {
    pub customer_id: Uuid,

    #[serde(default, alias = "invoiceNo")]
    #[validate(length(min = 1, max = 50, message = "Invoice number must be 1-50 characters"))]
    pub invoice_no: Option<String>,

    #[serde(default)]
    pub billing_date: Option<NaiveDate>,

    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,

    #[serde(default)]
    pub status: Option<BillStatus>,

    /// Bill level discount percentage
    #[serde(default, alias = "extraDiscount")]
    #[validate(custom = "validate_percentage")]
    pub extra_discount: Option<Decimal>,

    #[serde(default, alias = "extraDiscountAmount")]
    #[validate(custom = "validate_money")]
    pub extra_discount_amount: Option<Decimal>,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    pub location_id: Option<Uuid>,

    #[validate(
        length(min = 1, message = "At least one item is required"),
        custom = "validate_lines"
    )]
    pub items: Vec<CustomerBillLine>,
}

impl CreateCustomerBillRequest {
    /// Line amounts with the given resolved unit prices, in line order
    pub fn line_amounts(&self, unit_prices: &[Decimal]) -> Vec<LineAmounts> {
        self.items
            .iter()
            .zip(unit_prices)
            .map(|(line, price)| {
                calculate_line(
                    *price,
                    line.quantity,
                    line.discount_percentage.unwrap_or(Decimal::ZERO),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn line(quantity: i32) -> CustomerBillLine {
        CustomerBillLine {
            item_id: Some(Uuid::new_v4()),
            item_code: None,
            item_name: None,
            unit_price: dec("10"),
            quantity,
            unit: None,
            discount_percentage: None,
            free_quantity: None,
            notes: None,
        }
    }

    #[test]
    fn test_calculate_line_with_discount() {
        let amounts = calculate_line(dec("12.50"), 4, dec("10"));
        assert_eq!(amounts.subtotal, dec("50.00"));
        assert_eq!(amounts.discount_amount, dec("5.00"));
        assert_eq!(amounts.total, dec("45.00"));
    }

    #[test]
    fn test_calculate_line_rounds_discount() {
        let amounts = calculate_line(dec("3.33"), 1, dec("15"));
        // 3.33 * 0.15 = 0.4995
        assert_eq!(amounts.discount_amount, dec("0.50"));
        assert_eq!(amounts.total, dec("2.83"));
    }

    #[test]
    fn test_calculate_bill_percentage_discount() {
        let lines = vec![calculate_line(dec("100"), 2, dec("0")), calculate_line(dec("50"), 1, dec("0"))];
        let totals = calculate_bill(&lines, Some(dec("10")), None);
        assert_eq!(totals.subtotal, dec("250"));
        assert_eq!(totals.discount_amount, dec("25.00"));
        assert_eq!(totals.total_amount, dec("225.00"));
        assert_eq!(totals.balance_amount, totals.total_amount);
        assert_eq!(totals.paid_amount, Decimal::ZERO);
        assert_eq!(totals.total_items, 2);
    }

    #[test]
    fn test_explicit_discount_amount_wins() {
        let lines = vec![calculate_line(dec("100"), 1, dec("0"))];
        let totals = calculate_bill(&lines, Some(dec("50")), Some(dec("5")));
        assert_eq!(totals.discount_amount, dec("5"));
        assert_eq!(totals.total_amount, dec("95"));

        let totals = calculate_bill(&lines, Some(dec("50")), Some(Decimal::ZERO));
        assert_eq!(totals.discount_amount, dec("50.00"));
    }

    #[test]
    fn test_total_never_negative() {
        let lines = vec![calculate_line(dec("10"), 1, dec("0"))];
        let totals = calculate_bill(&lines, None, Some(dec("25")));
        assert_eq!(totals.total_amount, Decimal::ZERO);
        assert_eq!(totals.balance_amount, Decimal::ZERO);
    }

    #[test]
    fn test_order_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Checking));
        assert!(OrderStatus::Checking.can_transition_to(OrderStatus::Delivered));

        assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Confirmed));
        assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Pending));

        let err = OrderStatus::Delivered
            .transition_to(OrderStatus::Checking)
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot change order status from delivered to checking");
    }

    #[test]
    fn test_payment_method_labels() {
        assert_eq!(PaymentMethod::from_label("Cheque"), PaymentMethod::Check);
        assert_eq!(PaymentMethod::from_label("bank-transfer"), PaymentMethod::BankTransfer);
        assert_eq!(PaymentMethod::from_label("CREDIT_CARD"), PaymentMethod::CreditCard);
        assert_eq!(PaymentMethod::from_label("bitcoin"), PaymentMethod::Cash);
    }

    #[test]
    fn test_partial_then_full_payment() {
        let first = apply_payment(BillStatus::Pending, Decimal::ZERO, dec("100"), dec("40")).unwrap();
        assert_eq!(first.status, BillStatus::PartiallyPaid);
        assert_eq!(first.balance_amount, dec("60"));

        let second = apply_payment(first.status, first.paid_amount, first.balance_amount, dec("60")).unwrap();
        assert_eq!(second.status, BillStatus::Paid);
        assert_eq!(second.paid_amount, dec("100"));
        assert_eq!(second.balance_amount, Decimal::ZERO);
    }

    #[test]
    fn test_payment_rejections() {
        assert_eq!(
            apply_payment(BillStatus::Cancelled, Decimal::ZERO, dec("10"), dec("1")),
            Err(BillingError::BillCancelled)
        );
        assert!(apply_payment(BillStatus::Pending, Decimal::ZERO, dec("10"), Decimal::ZERO).is_err());
        assert!(apply_payment(BillStatus::Pending, Decimal::ZERO, dec("10"), dec("10.01")).is_err());
    }

    #[test]
    fn test_request_accepts_camel_case_aliases() {
        let json = serde_json::json!({
            "customer_id": Uuid::new_v4(),
            "invoiceNo": "INV-CUSTOM-1",
            "extraDiscount": "5",
            "finalTotal": 999,
            "items": [{"itemCode": "A1", "unit_price": "10.00", "quantity": 2}]
        });
        let request: CreateCustomerBillRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.invoice_no.as_deref(), Some("INV-CUSTOM-1"));
        assert_eq!(request.extra_discount, Some(dec("5")));
        assert_eq!(request.items[0].item_code.as_deref(), Some("A1"));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_request_validation() {
        let mut request = CreateCustomerBillRequest {
            customer_id: Uuid::new_v4(),
            invoice_no: None,
            billing_date: None,
            payment_method: None,
            status: None,
            extra_discount: Some(dec("120")),
            extra_discount_amount: None,
            notes: None,
            location_id: None,
            items: vec![],
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("items"));
        assert!(fields.contains_key("extra_discount"));

        request.extra_discount = None;
        request.items = vec![line(1), line(0)];
        let errors = request.validate().unwrap_err();
        let message = errors.field_errors()["items"][0].message.clone().unwrap();
        assert_eq!(message, "Item 2: quantity: Quantity must be between 1 and 1000000");
    }

    #[test]
    fn test_oversized_quantities_rejected() {
        let mut huge = line(i32::MAX);
        huge.free_quantity = Some(1);
        assert_eq!(huge.stock_quantity(), None);

        let request = CreateCustomerBillRequest {
            customer_id: Uuid::new_v4(),
            invoice_no: None,
            billing_date: None,
            payment_method: None,
            status: None,
            extra_discount: None,
            extra_discount_amount: None,
            notes: None,
            location_id: None,
            items: vec![huge],
        };
        assert!(request.validate().is_err());

        let mut free_heavy = line(1);
        free_heavy.free_quantity = Some(i32::MAX);
        assert!(free_heavy.validate().is_err());

        let mut largest = line(1_000_000);
        largest.free_quantity = Some(1_000_000);
        assert!(largest.validate().is_ok());
        assert_eq!(largest.stock_quantity(), Some(2_000_000));
    }

    #[test]
    fn test_stock_quantity_includes_free_items() {
        let mut l = line(5);
        l.free_quantity = Some(2);
        assert_eq!(l.stock_quantity(), Some(7));
    }

    #[test]
    fn test_payment_rejects_sub_cent_amounts() {
        let err = apply_payment(BillStatus::Pending, Decimal::ZERO, dec("100"), dec("99.996")).unwrap_err();
        assert!(matches!(err, BillingError::InvalidPayment(_)));

        let outcome = apply_payment(BillStatus::Pending, Decimal::ZERO, dec("100"), dec("99.990")).unwrap();
        assert_eq!(outcome.balance_amount, dec("0.01"));
        assert_eq!(outcome.status, BillStatus::PartiallyPaid);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Totals stay consistent: total = max(subtotal - discount, 0), balance = total
        #[test]
        fn prop_bill_totals_consistent(
            prices in prop::collection::vec(0u32..100_000, 1..10),
            quantity in 1i32..50,
            pct in 0u32..=100,
        ) {
            let lines: Vec<LineAmounts> = prices
                .iter()
                .map(|p| calculate_line(Decimal::new(*p as i64, 2), quantity, Decimal::from(pct)))
                .collect();
            let totals = calculate_bill(&lines, Some(Decimal::from(pct)), None);
            prop_assert!(totals.total_amount >= Decimal::ZERO);
            prop_assert!(totals.total_amount <= totals.subtotal);
            prop_assert_eq!(totals.balance_amount, totals.total_amount);
            prop_assert_eq!(totals.total_amount, (totals.subtotal - totals.discount_amount).max(Decimal::ZERO));
            for l in &lines {
                prop_assert_eq!(l.total, l.subtotal - l.discount_amount);
                prop_assert!(l.total >= Decimal::ZERO);
            }
        }
    }
}
