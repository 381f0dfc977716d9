//! Supplier bills: goods received from a supplier into a stock location

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    calculate_bill, calculate_line, units_with_free, validate_lines, validate_money,
    validate_percentage, LineAmounts,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::services::location::main_location_id;
use crate::services::stock::increment_stock;

#[derive(Clone)]
pub struct SupplierBillService {
    db: PgPool,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SupplierBillLineInput {
    #[serde(alias = "itemCode")]
    #[validate(length(min = 1, message = "Item code is required"))]
    pub item_code: String,

    #[validate(custom = "validate_money")]
    pub price: Decimal,

    #[validate(range(min = 1, max = 1_000_000, message = "Quantity must be between 1 and 1000000"))]
    pub quantity: i32,

    #[validate(custom = "validate_percentage")]
    pub discount: Option<Decimal>,

    #[serde(default, alias = "freeItemQuantity")]
    #[validate(range(
        min = 0,
        max = 1_000_000,
        message = "Free item quantity must be between 0 and 1000000"
    ))]
    pub free_item_quantity: Option<i32>,
}

impl SupplierBillLineInput {
    fn amounts(&self) -> LineAmounts {
        calculate_line(self.price, self.quantity, self.discount.unwrap_or(Decimal::ZERO))
    }

    /// Units entering stock, free items included
    fn received_quantity(&self) -> AppResult<i32> {
        units_with_free(self.quantity, self.free_item_quantity)
            .ok_or_else(|| AppError::field("free_item_quantity", "Received quantity is too large"))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSupplierBillInput {
    #[serde(alias = "supplierId")]
    pub supplier_id: Uuid,

    #[serde(alias = "billNo")]
    #[validate(length(min = 1, max = 50, message = "Bill number must be 1-50 characters"))]
    pub bill_no: String,

    #[serde(alias = "billingDate")]
    pub billing_date: NaiveDate,

    #[serde(alias = "receivedDate")]
    pub received_date: NaiveDate,

    #[serde(default, alias = "locationId")]
    pub location_id: Option<Uuid>,

    #[serde(default, alias = "extraDiscount")]
    #[validate(custom = "validate_percentage")]
    pub extra_discount: Option<Decimal>,

    #[serde(default, alias = "extraDiscountAmount")]
    #[validate(custom = "validate_money")]
    pub extra_discount_amount: Option<Decimal>,

    pub notes: Option<String>,

    #[validate(
        length(min = 1, message = "At least one item is required"),
        custom = "validate_lines"
    )]
    pub items: Vec<SupplierBillLineInput>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SupplierBill {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub bill_no: String,
    pub billing_date: NaiveDate,
    pub received_date: NaiveDate,
    pub location_id: Uuid,
    pub location_name: String,
    pub subtotal: Decimal,
    pub discount_percentage: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
    pub total_items: i32,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SupplierBillLine {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_code: String,
    pub item_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub discount_percentage: Decimal,
    pub free_item_quantity: i32,
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct SupplierBillDetail {
    #[serde(flatten)]
    pub bill: SupplierBill,
    pub items: Vec<SupplierBillLine>,
}

#[derive(Debug, FromRow)]
struct ItemRef {
    id: Uuid,
    item_code: String,
    item_name: String,
}

const SUPPLIER_BILL_SELECT: &str = r#"
    SELECT b.id, b.supplier_id, s.supplier_name, b.bill_no, b.billing_date,
           b.received_date, b.location_id, l.location_name, b.subtotal,
           b.discount_percentage, b.discount_amount, b.total_amount,
           b.total_items, b.notes, b.created_by, b.created_at
    FROM supplier_bills b
    JOIN suppliers s ON s.id = b.supplier_id
    JOIN stock_locations l ON l.id = b.location_id
"#;

/// Codes from `requested` that are absent in `found`, in request order
fn missing_codes<'a>(requested: &'a [SupplierBillLineInput], found: &HashMap<String, ItemRef>) -> Vec<&'a str> {
    let mut missing: Vec<&str> = requested
        .iter()
        .map(|line| line.item_code.as_str())
        .filter(|code| !found.contains_key(*code))
        .collect();
    missing.dedup();
    missing
}

impl SupplierBillService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a supplier bill and receive its goods into stock
    pub async fn create_supplier_bill(
        &self,
        input: CreateSupplierBillInput,
        user: &AuthUser,
    ) -> AppResult<SupplierBillDetail> {
        let mut tx = self.db.begin().await?;

        let supplier_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM suppliers WHERE id = $1)",
        )
        .bind(input.supplier_id)
        .fetch_one(&mut *tx)
        .await?;
        if !supplier_exists {
            return Err(AppError::NotFound("Supplier".to_string()));
        }

        let codes: Vec<&str> = input.items.iter().map(|line| line.item_code.as_str()).collect();
        let items: HashMap<String, ItemRef> = sqlx::query_as::<_, ItemRef>(
            "SELECT id, item_code, item_name FROM items WHERE item_code = ANY($1)",
        )
        .bind(&codes)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|item| (item.item_code.clone(), item))
        .collect();

        let missing = missing_codes(&input.items, &items);
        if !missing.is_empty() {
            return Err(AppError::NotFound(format!("Items with codes {}", missing.join(", "))));
        }

        let location_id = match input.location_id {
            Some(id) => id,
            None => main_location_id(&mut *tx, user.business()?)
                .await?
                .ok_or_else(|| {
                    AppError::InvalidStateTransition(
                        "No main location configured for this business".to_string(),
                    )
                })?,
        };

        let line_amounts: Vec<LineAmounts> = input.items.iter().map(|line| line.amounts()).collect();
        let totals = calculate_bill(&line_amounts, input.extra_discount, input.extra_discount_amount);

        let bill_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO supplier_bills (
                supplier_id, bill_no, billing_date, received_date, location_id,
                subtotal, discount_percentage, discount_amount, total_amount,
                total_items, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            "#,
        )
        .bind(input.supplier_id)
        .bind(input.bill_no.trim())
        .bind(input.billing_date)
        .bind(input.received_date)
        .bind(location_id)
        .bind(totals.subtotal)
        .bind(totals.discount_percentage)
        .bind(totals.discount_amount)
        .bind(totals.total_amount)
        .bind(totals.total_items)
        .bind(&input.notes)
        .bind(user.user_id)
        .fetch_one(&mut *tx)
        .await?;

        for (line, amounts) in input.items.iter().zip(&line_amounts) {
            let item = items
                .get(&line.item_code)
                .ok_or_else(|| AppError::NotFound(format!("Item with code {}", line.item_code)))?;

            sqlx::query(
                r#"
                INSERT INTO supplier_bill_items (
                    supplier_bill_id, item_id, item_code, item_name, unit_price,
                    quantity, discount_percentage, free_item_quantity, amount
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(bill_id)
            .bind(item.id)
            .bind(&item.item_code)
            .bind(&item.item_name)
            .bind(line.price)
            .bind(line.quantity)
            .bind(line.discount.unwrap_or(Decimal::ZERO))
            .bind(line.free_item_quantity.unwrap_or(0))
            .bind(amounts.total)
            .execute(&mut *tx)
            .await?;

            increment_stock(&mut tx, item.id, location_id, line.received_quantity()?).await?;
        }

        tx.commit().await?;

        tracing::info!(
            %bill_id,
            supplier_id = %input.supplier_id,
            %location_id,
            total_amount = %totals.total_amount,
            "supplier bill recorded"
        );

        self.get_supplier_bill(bill_id).await
    }

    pub async fn list_supplier_bills(&self) -> AppResult<Vec<SupplierBill>> {
        let bills = sqlx::query_as::<_, SupplierBill>(&format!(
            "{} ORDER BY b.created_at DESC",
            SUPPLIER_BILL_SELECT
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(bills)
    }

    pub async fn get_supplier_bill(&self, bill_id: Uuid) -> AppResult<SupplierBillDetail> {
        let bill = sqlx::query_as::<_, SupplierBill>(&format!("{} WHERE b.id = $1", SUPPLIER_BILL_SELECT))
            .bind(bill_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Supplier bill".to_string()))?;

        let items = sqlx::query_as::<_, SupplierBillLine>(
            r#"
            SELECT id, item_id, item_code, item_name, unit_price, quantity,
                   discount_percentage, free_item_quantity, amount
            FROM supplier_bill_items
            WHERE supplier_bill_id = $1
            "#,
        )
        .bind(bill_id)
        .fetch_all(&self.db)
        .await?;

        Ok(SupplierBillDetail { bill, items })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn line(code: &str, price: Decimal, quantity: i32, discount: Option<Decimal>) -> SupplierBillLineInput {
        SupplierBillLineInput {
            item_code: code.to_string(),
            price,
            quantity,
            discount,
            free_item_quantity: Some(2),
        }
    }

    #[test]
    fn test_line_amount_applies_discount() {
        let amounts = line("A", dec("250.00"), 4, Some(dec("10"))).amounts();
        assert_eq!(amounts.subtotal, dec("1000.00"));
        assert_eq!(amounts.total, dec("900.00"));
    }

    #[test]
    fn test_free_items_enter_stock() {
        assert_eq!(line("A", dec("1"), 5, None).received_quantity().unwrap(), 7);
    }

    #[test]
    fn test_line_quantities_are_bounded() {
        let mut huge = line("A", dec("1"), i32::MAX, None);
        huge.free_item_quantity = Some(1);
        assert!(huge.validate().is_err());
        assert!(matches!(huge.received_quantity(), Err(AppError::Validation { .. })));

        let largest = line("A", dec("1"), 1_000_000, None);
        assert!(largest.validate().is_ok());
    }

    #[test]
    fn test_missing_codes_reported() {
        let mut found = HashMap::new();
        found.insert(
            "A".to_string(),
            ItemRef {
                id: Uuid::new_v4(),
                item_code: "A".into(),
                item_name: "Alpha".into(),
            },
        );
        let lines = vec![line("A", dec("1"), 1, None), line("B", dec("1"), 1, None), line("C", dec("1"), 1, None)];
        assert_eq!(missing_codes(&lines, &found), vec!["B", "C"]);
    }

    #[test]
    fn test_accepts_camel_case_payload() {
        let input: CreateSupplierBillInput = serde_json::from_value(serde_json::json!({
            "supplierId": Uuid::new_v4(),
            "billNo": "SB-001",
            "billingDate": "2024-03-01",
            "receivedDate": "2024-03-02",
            "extraDiscount": "5",
            "items": [{"itemCode": "A", "price": 10, "quantity": 2, "freeItemQuantity": 1}]
        }))
        .unwrap();
        assert!(input.validate().is_ok());
        assert_eq!(input.extra_discount, Some(dec("5")));
        assert_eq!(input.items[0].received_quantity().unwrap(), 3);
    }

    #[test]
    fn test_negative_price_rejected() {
        let input = CreateSupplierBillInput {
            supplier_id: Uuid::new_v4(),
            bill_no: "SB-002".into(),
            billing_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            received_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            location_id: None,
            extra_discount: None,
            extra_discount_amount: None,
            notes: None,
            items: vec![line("A", dec("-1"), 1, None)],
        };
        assert!(input.validate().is_err());
    }
}
