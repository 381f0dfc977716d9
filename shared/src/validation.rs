//! Validation utilities for the Inventory & Billing platform
//!
//! The functions here plug into `validator` derives as `custom` validators
//! and are also used directly by the backend and the WASM bindings.

use std::borrow::Cow;

use rust_decimal::Decimal;
use serde::Serialize;
use validator::{Validate, ValidationError, ValidationErrors};

fn error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

// ============================================================================
// Account Validations
// ============================================================================

/// Password must be at least 8 characters with an upper case letter, a lower
/// case letter, and a digit or symbol
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < 8 {
        return Err(error("password_length", "Password must be at least 8 characters"));
    }
    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_digit_or_symbol = password.chars().any(|c| !c.is_alphabetic());
    if !(has_upper && has_lower && has_digit_or_symbol) {
        return Err(error(
            "password_strength",
            "Password must contain uppercase, lowercase and a number or special character",
        ));
    }
    Ok(())
}

/// International phone number: optional `+`, then 2-15 digits not starting with 0
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    let valid = (2..=15).contains(&digits.len())
        && digits.chars().all(|c| c.is_ascii_digit())
        && !digits.starts_with('0');
    if valid {
        Ok(())
    } else {
        Err(error("phone", "Please provide a valid phone number"))
    }
}

// ============================================================================
// Money Validations
// ============================================================================

/// Money amounts are non-negative with at most two decimal places
pub fn validate_money(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(error("money_negative", "Amount cannot be negative"));
    }
    if amount.normalize().scale() > 2 {
        return Err(error("money_scale", "Amount can have at most 2 decimal places"));
    }
    Ok(())
}

/// Discount percentages are between 0 and 100
pub fn validate_percentage(pct: &Decimal) -> Result<(), ValidationError> {
    if *pct < Decimal::ZERO || *pct > Decimal::ONE_HUNDRED {
        return Err(error("percentage", "Percentage must be between 0 and 100"));
    }
    Ok(())
}

/// Validate each line of a bill or transfer, reporting the first failing
/// field as `Item N: field: message`
pub fn validate_lines<L: Validate>(lines: &[L]) -> Result<(), ValidationError> {
    for (index, line) in lines.iter().enumerate() {
        if let Err(errors) = line.validate() {
            let detail = collect_field_errors(&errors)
                .into_iter()
                .next()
                .map(|f| format!("{}: {}", f.field, f.errors.join(", ")))
                .unwrap_or_else(|| "invalid".to_string());
            return Err(error("line", format!("Item {}: {}", index + 1, detail)));
        }
    }
    Ok(())
}

// ============================================================================
// Error Reporting
// ============================================================================

/// Field-level validation failure reported to clients
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub errors: Vec<String>,
}

/// Flatten `validator` errors into a stable, field-sorted list
pub fn collect_field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| FieldError {
            field: field.to_string(),
            errors: errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
                .collect(),
        })
        .collect();
    fields.sort_by(|a, b| a.field.cmp(&b.field));
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[derive(Validate)]
    struct Line {
        #[validate(length(min = 1, message = "Item code is required"))]
        item_code: String,
        #[validate(custom = "validate_money")]
        price: Decimal,
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("Password1").is_ok());
        assert!(validate_password("Pass word!").is_ok());
        assert!(validate_password("Sh0rt").is_err());
        assert!(validate_password("alllowercase1").is_err());
        assert!(validate_password("NoDigitsHere").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+94771234567").is_ok());
        assert!(validate_phone("94771234567").is_ok());
        assert!(validate_phone("0771234567").is_err());
        assert!(validate_phone("+1").is_err());
        assert!(validate_phone("077-123-4567").is_err());
        assert!(validate_phone("1234567890123456").is_err());
    }

    #[test]
    fn test_validate_money() {
        assert!(validate_money(&Decimal::from_str("10.50").unwrap()).is_ok());
        assert!(validate_money(&Decimal::from_str("10.500").unwrap()).is_ok());
        assert!(validate_money(&Decimal::ZERO).is_ok());
        assert!(validate_money(&Decimal::from_str("-1").unwrap()).is_err());
        assert!(validate_money(&Decimal::from_str("1.001").unwrap()).is_err());
    }

    #[test]
    fn test_validate_percentage() {
        assert!(validate_percentage(&Decimal::from(0)).is_ok());
        assert!(validate_percentage(&Decimal::from(100)).is_ok());
        assert!(validate_percentage(&Decimal::from(101)).is_err());
        assert!(validate_percentage(&Decimal::from(-5)).is_err());
    }

    #[test]
    fn test_validate_lines_reports_position() {
        let lines = vec![
            Line {
                item_code: "A1".into(),
                price: Decimal::ONE,
            },
            Line {
                item_code: String::new(),
                price: Decimal::ONE,
            },
        ];
        let err = validate_lines(&lines).unwrap_err();
        assert_eq!(
            err.message.unwrap(),
            "Item 2: item_code: Item code is required"
        );
    }

    #[test]
    fn test_collect_field_errors_sorted() {
        let line = Line {
            item_code: String::new(),
            price: Decimal::from(-3),
        };
        let errors = line.validate().unwrap_err();
        let fields = collect_field_errors(&errors);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field, "item_code");
        assert_eq!(fields[1].field, "price");
        assert_eq!(fields[1].errors, vec!["Amount cannot be negative".to_string()]);
    }
}
