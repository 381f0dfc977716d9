//! Invoice payloads as sent by the billing screen of the web client
//!
//! The client posts camelCase documents where customers come from a select
//! box and numbers are often strings. These are checked with
//! [`validate_frontend_data`] and turned into a [`CreateCustomerBillRequest`]
//! by [`normalize_frontend_invoice`].

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{BillStatus, CreateCustomerBillRequest, CustomerBillLine, PaymentMethod};

/// Keys only the client invoice screen sends
const FRONTEND_KEYS: &[&str] = &[
    "invoiceNo",
    "selectedCustomer",
    "selectedSupplier",
    "supplier",
    "extraDiscount",
    "finalTotal",
];

/// A JSON value that may be a number or a numeric string
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(serde_json::Number),
    Text(String),
}

impl NumberOrString {
    fn as_text(&self) -> String {
        match self {
            NumberOrString::Number(n) => n.to_string(),
            NumberOrString::Text(s) => s.trim().to_string(),
        }
    }

    /// Parsed decimal, `None` when unparsable
    pub fn to_decimal(&self) -> Option<Decimal> {
        Decimal::from_str(&self.as_text()).ok()
    }

    fn is_blank(&self) -> bool {
        match self {
            NumberOrString::Number(n) => n.as_f64().map_or(true, |v| v == 0.0),
            NumberOrString::Text(s) => s.trim().is_empty(),
        }
    }
}

/// `{value, label}` pair from a select box
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SelectValue {
    #[serde(default)]
    pub value: Option<NumberOrString>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PaymentMethodInput {
    Select {
        value: Option<String>,
        #[serde(default)]
        label: Option<String>,
    },
    Label(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FrontendInvoiceItem {
    #[serde(default)]
    pub id: Option<NumberOrString>,
    #[serde(default)]
    pub item_code: Option<String>,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub price: Option<NumberOrString>,
    #[serde(default)]
    pub quantity: Option<NumberOrString>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub discount: Option<NumberOrString>,
    #[serde(default)]
    pub free_item_quantity: Option<NumberOrString>,
    #[serde(default)]
    pub amount: Option<NumberOrString>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FrontendInvoiceData {
    #[serde(default)]
    pub invoice_no: Option<String>,
    #[serde(default)]
    pub customer: Option<SelectValue>,
    #[serde(default)]
    pub selected_customer: Option<NumberOrString>,
    #[serde(default)]
    pub supplier: Option<SelectValue>,
    #[serde(default)]
    pub selected_supplier: Option<NumberOrString>,
    #[serde(default)]
    pub billing_date: Option<String>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethodInput>,
    #[serde(default)]
    pub items: Vec<FrontendInvoiceItem>,
    #[serde(default)]
    pub subtotal: Option<NumberOrString>,
    #[serde(default)]
    pub extra_discount: Option<NumberOrString>,
    #[serde(default)]
    pub extra_discount_amount: Option<NumberOrString>,
    #[serde(default)]
    pub final_total: Option<NumberOrString>,
    #[serde(default)]
    pub total_items: Option<NumberOrString>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub location_id: Option<Uuid>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvoiceError {
    #[error("Customer ID is required")]
    MissingCustomer,
    #[error("Invalid customer ID format")]
    InvalidCustomer,
}

/// Result of checking a client invoice without saving it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrontendValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Whether a raw request body is in the client invoice shape
pub fn is_frontend_format(body: &serde_json::Value) -> bool {
    let Some(object) = body.as_object() else {
        return false;
    };
    if FRONTEND_KEYS.iter().any(|key| object.contains_key(*key)) {
        return true;
    }
    object
        .get("items")
        .and_then(|items| items.as_array())
        .and_then(|items| items.first())
        .map_or(false, |first| first.get("itemCode").is_some())
}

impl FrontendInvoiceData {
    /// The selected customer, looked up in the order the client may send it
    fn customer_reference(&self) -> Option<&NumberOrString> {
        fn from_select(select: &Option<SelectValue>) -> Option<&NumberOrString> {
            select
                .as_ref()
                .and_then(|s| s.value.as_ref())
                .filter(|v| !v.is_blank())
        }
        from_select(&self.customer)
            .or_else(|| self.selected_customer.as_ref().filter(|v| !v.is_blank()))
            .or_else(|| from_select(&self.supplier))
            .or_else(|| self.selected_supplier.as_ref().filter(|v| !v.is_blank()))
    }
}

fn positive(value: &Option<NumberOrString>) -> bool {
    value
        .as_ref()
        .and_then(NumberOrString::to_decimal)
        .map_or(false, |v| v > Decimal::ZERO)
}

fn decimal_or_zero(value: &Option<NumberOrString>) -> Decimal {
    value
        .as_ref()
        .and_then(NumberOrString::to_decimal)
        .unwrap_or(Decimal::ZERO)
}

fn whole_or_zero(value: &Option<NumberOrString>) -> i32 {
    decimal_or_zero(value).trunc().to_i32().unwrap_or(0)
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().map_or(false, |s| !s.trim().is_empty())
}

/// Check a client invoice, collecting every problem
pub fn validate_frontend_data(data: &FrontendInvoiceData) -> FrontendValidation {
    let mut errors = Vec::new();

    if data.customer_reference().is_none() {
        errors.push("Customer selection is required".to_string());
    }
    if data.items.is_empty() {
        errors.push("At least one item is required".to_string());
    }

    for (index, item) in data.items.iter().enumerate() {
        let n = index + 1;
        let has_id = item.id.as_ref().map_or(false, |id| !id.is_blank());
        if !non_empty(&item.item_code) && !has_id {
            errors.push(format!("Item {}: Item code or ID is required", n));
        }
        if !non_empty(&item.item_name) {
            errors.push(format!("Item {}: Item name is required", n));
        }
        if !positive(&item.price) {
            errors.push(format!("Item {}: Valid price is required", n));
        }
        if !positive(&item.quantity) {
            errors.push(format!("Item {}: Valid quantity is required", n));
        }
    }

    FrontendValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}

fn parse_billing_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Convert a client invoice into a bill request.
///
/// Client computed totals are dropped; the server recalculates them.
pub fn normalize_frontend_invoice(
    data: &FrontendInvoiceData,
) -> Result<CreateCustomerBillRequest, InvoiceError> {
    let customer_id = data
        .customer_reference()
        .ok_or(InvoiceError::MissingCustomer)
        .and_then(|reference| {
            Uuid::parse_str(&reference.as_text()).map_err(|_| InvoiceError::InvalidCustomer)
        })?;

    let payment_method = match &data.payment_method {
        Some(PaymentMethodInput::Select { value, .. }) => {
            PaymentMethod::from_label(value.as_deref().unwrap_or_default())
        }
        Some(PaymentMethodInput::Label(label)) => PaymentMethod::from_label(label),
        None => PaymentMethod::Cash,
    };

    let items = data
        .items
        .iter()
        .map(|item| CustomerBillLine {
            item_id: item
                .id
                .as_ref()
                .and_then(|id| Uuid::parse_str(&id.as_text()).ok()),
            item_code: item.item_code.clone().filter(|c| !c.trim().is_empty()),
            item_name: item.item_name.clone(),
            unit_price: decimal_or_zero(&item.price),
            quantity: whole_or_zero(&item.quantity),
            unit: item.unit.clone(),
            discount_percentage: Some(decimal_or_zero(&item.discount)),
            free_quantity: Some(whole_or_zero(&item.free_item_quantity)),
            notes: None,
        })
        .collect();

    Ok(CreateCustomerBillRequest {
        customer_id,
        invoice_no: data.invoice_no.clone().filter(|n| !n.trim().is_empty()),
        billing_date: data.billing_date.as_deref().and_then(parse_billing_date),
        payment_method: Some(payment_method),
        status: Some(BillStatus::Draft),
        extra_discount: Some(decimal_or_zero(&data.extra_discount)),
        extra_discount_amount: Some(decimal_or_zero(&data.extra_discount_amount)),
        notes: data.notes.clone(),
        location_id: data.location_id,
        items,
    })
}
