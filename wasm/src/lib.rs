//! WebAssembly module for the Inventory & Billing web client
//!
//! Lets the billing screen show the same totals and validation messages the
//! server will produce:
//! - Line and bill totals from the shared calculator
//! - Client invoice validation
//!
//! Values cross the boundary as JSON strings; money is serialized as decimal
//! strings so nothing is lost to floating point.

use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    calculate_bill, calculate_line, is_frontend_format, validate_frontend_data, BillTotals,
    FrontendInvoiceData, FrontendValidation, LineAmounts,
};
use wasm_bindgen::prelude::*;

#[derive(Debug, Deserialize)]
struct LineInput {
    unit_price: Decimal,
    quantity: i32,
    #[serde(default)]
    discount_percentage: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct BillInput {
    items: Vec<LineInput>,
    #[serde(default)]
    extra_discount: Option<Decimal>,
    #[serde(default)]
    extra_discount_amount: Option<Decimal>,
}

fn bill_totals(input_json: &str) -> Result<BillTotals, String> {
    let input: BillInput =
        serde_json::from_str(input_json).map_err(|e| format!("Invalid bill JSON: {}", e))?;

    let lines: Vec<LineAmounts> = input
        .items
        .iter()
        .map(|line| {
            calculate_line(
                line.unit_price,
                line.quantity,
                line.discount_percentage.unwrap_or(Decimal::ZERO),
            )
        })
        .collect();

    Ok(calculate_bill(
        &lines,
        input.extra_discount,
        input.extra_discount_amount,
    ))
}

fn invoice_validation(invoice_json: &str) -> Result<FrontendValidation, String> {
    let data: FrontendInvoiceData =
        serde_json::from_str(invoice_json).map_err(|e| format!("Invalid invoice JSON: {}", e))?;
    Ok(validate_frontend_data(&data))
}

/// Bill totals as JSON:
/// `{subtotal, discount_percentage, discount_amount, total_amount, paid_amount, balance_amount, total_items}`
#[wasm_bindgen]
pub fn calculate_bill_totals(input_json: &str) -> Result<String, JsValue> {
    let totals = bill_totals(input_json).map_err(|e| JsValue::from_str(&e))?;
    serde_json::to_string(&totals).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Line total after discount, as a decimal string
#[wasm_bindgen]
pub fn calculate_line_total(unit_price: &str, quantity: i32, discount_percentage: &str) -> Result<String, JsValue> {
    let parse = |value: &str| -> Result<Decimal, JsValue> {
        if value.trim().is_empty() {
            return Ok(Decimal::ZERO);
        }
        value
            .trim()
            .parse::<Decimal>()
            .map_err(|e| JsValue::from_str(&format!("Invalid number {}: {}", value, e)))
    };
    let line = calculate_line(parse(unit_price)?, quantity, parse(discount_percentage)?);
    Ok(line.total.to_string())
}

/// Validation errors for a client invoice, empty when it can be submitted
#[wasm_bindgen]
pub fn validate_invoice(invoice_json: &str) -> Result<js_sys::Array, JsValue> {
    let validation = invoice_validation(invoice_json).map_err(|e| JsValue::from_str(&e))?;
    Ok(validation
        .errors
        .iter()
        .map(|error| JsValue::from_str(error))
        .collect())
}

/// Whether the server will read this body as a client invoice
#[wasm_bindgen]
pub fn is_frontend_invoice(body_json: &str) -> bool {
    match serde_json::from_str::<serde_json::Value>(body_json) {
        Ok(body) => is_frontend_format(&body),
        Err(e) => {
            web_sys::console::warn_1(&JsValue::from_str(&format!("Invalid JSON: {}", e)));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bill_totals_from_json() {
        let totals = bill_totals(
            r#"{
                "items": [
                    {"unit_price": "250.00", "quantity": 2, "discount_percentage": "10"},
                    {"unit_price": 99.99, "quantity": 3}
                ],
                "extra_discount": "5"
            }"#,
        )
        .unwrap();
        assert_eq!(totals.subtotal.to_string(), "749.97");
        assert_eq!(totals.total_amount.to_string(), "712.47");
        assert_eq!(totals.total_items, 2);
    }

    #[test]
    fn test_bill_totals_rejects_bad_json() {
        assert!(bill_totals("{\"items\": 3}").is_err());
    }

    #[test]
    fn test_invoice_validation_messages() {
        let validation = invoice_validation(
            r#"{"items": [{"itemCode": "A", "itemName": "Soap", "price": "0", "quantity": 1}]}"#,
        )
        .unwrap();
        assert!(!validation.is_valid);
        assert_eq!(
            validation.errors,
            vec![
                "Customer selection is required",
                "Item 1: Valid price is required"
            ]
        );
    }
}
