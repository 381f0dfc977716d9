//! Customer bills and representative orders
//!
//! A representative's bill is an order: it moves no stock until an admin
//! confirms it, then walks `confirmed -> checking -> delivered`. Bills from
//! every other role are invoices that deduct stock immediately.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{
    apply_payment, bill_number, bill_prefix, calculate_bill, is_frontend_format,
    next_sequence, normalize_frontend_invoice, summarize_dues, units_with_free,
    validate_frontend_data, validate_money, BillKind, BillStatus, CreateCustomerBillRequest,
    CustomerBillLine, CustomerDueSummary, FieldError, FrontendInvoiceData, FrontendValidation,
    OrderStatus, OutstandingBill, PaymentMethod, StockRequest, UnitType, UserRole,
    INVOICE_NUMBER_LOCK,
};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::services::location::main_location_id;
use crate::services::stock::deduct_stock;

#[derive(Clone)]
pub struct CustomerBillService {
    db: PgPool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordPaymentInput {
    #[validate(custom = "validate_money")]
    pub amount: Decimal,

    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BillCustomer {
    pub id: Uuid,
    pub customer_code: String,
    pub customer_name: String,
    pub shop_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BillLocation {
    pub id: Uuid,
    pub location_name: String,
}

/// User embedded in a bill; credentials are never selected
#[derive(Debug, Clone, Serialize)]
pub struct BillUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerBill {
    pub id: Uuid,
    pub invoice_no: String,
    pub customer: BillCustomer,
    pub location: BillLocation,
    pub billing_date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub status: BillStatus,
    pub is_order: bool,
    pub order_status: Option<OrderStatus>,
    pub subtotal: Decimal,
    pub discount_percentage: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub balance_amount: Decimal,
    pub total_items: i32,
    pub notes: Option<String>,
    pub created_by: BillUser,
    pub confirmed_by: Option<BillUser>,
    pub order_confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CustomerBillItem {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_code: String,
    pub item_name: String,
    pub unit: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub free_quantity: i32,
    pub discount_percentage: Decimal,
    pub discount_amount: Decimal,
    pub subtotal: Decimal,
    pub total_amount: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CustomerBillDetail {
    #[serde(flatten)]
    pub bill: CustomerBill,
    pub items: Vec<CustomerBillItem>,
}

#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: CustomerBillDetail,
    pub customer_summary: CustomerDueSummary,
}

#[derive(Debug, FromRow)]
struct BillRow {
    id: Uuid,
    invoice_no: String,
    customer_id: Uuid,
    customer_code: String,
    customer_name: String,
    shop_name: String,
    location_id: Uuid,
    location_name: String,
    billing_date: NaiveDate,
    payment_method: PaymentMethod,
    status: BillStatus,
    is_order: bool,
    order_status: Option<OrderStatus>,
    subtotal: Decimal,
    discount_percentage: Decimal,
    discount_amount: Decimal,
    total_amount: Decimal,
    paid_amount: Decimal,
    balance_amount: Decimal,
    total_items: i32,
    notes: Option<String>,
    created_by: Uuid,
    created_by_username: String,
    created_by_email: String,
    created_by_role: UserRole,
    confirmed_by: Option<Uuid>,
    confirmed_by_username: Option<String>,
    confirmed_by_email: Option<String>,
    confirmed_by_role: Option<UserRole>,
    order_confirmed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BillRow> for CustomerBill {
    fn from(row: BillRow) -> Self {
        let confirmed_by = match (
            row.confirmed_by,
            row.confirmed_by_username,
            row.confirmed_by_email,
            row.confirmed_by_role,
        ) {
            (Some(id), Some(username), Some(email), Some(role)) => Some(BillUser {
                id,
                username,
                email,
                role,
            }),
            _ => None,
        };

        CustomerBill {
            id: row.id,
            invoice_no: row.invoice_no,
            customer: BillCustomer {
                id: row.customer_id,
                customer_code: row.customer_code,
                customer_name: row.customer_name,
                shop_name: row.shop_name,
            },
            location: BillLocation {
                id: row.location_id,
                location_name: row.location_name,
            },
            billing_date: row.billing_date,
            payment_method: row.payment_method,
            status: row.status,
            is_order: row.is_order,
            order_status: row.order_status,
            subtotal: row.subtotal,
            discount_percentage: row.discount_percentage,
            discount_amount: row.discount_amount,
            total_amount: row.total_amount,
            paid_amount: row.paid_amount,
            balance_amount: row.balance_amount,
            total_items: row.total_items,
            notes: row.notes,
            created_by: BillUser {
                id: row.created_by,
                username: row.created_by_username,
                email: row.created_by_email,
                role: row.created_by_role,
            },
            confirmed_by,
            order_confirmed_at: row.order_confirmed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Workflow fields of a bill, read under `FOR UPDATE`
#[derive(Debug, FromRow)]
struct BillState {
    id: Uuid,
    location_id: Uuid,
    status: BillStatus,
    is_order: bool,
    order_status: Option<OrderStatus>,
    paid_amount: Decimal,
    balance_amount: Decimal,
    created_by: Uuid,
}

impl BillState {
    fn order_status(&self) -> AppResult<OrderStatus> {
        match (self.is_order, self.order_status) {
            (true, Some(status)) => Ok(status),
            _ => Err(AppError::ValidationError("This is not an order".to_string())),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct BillItemRef {
    id: Uuid,
    item_code: String,
    item_name: String,
    selling_price: Decimal,
    unit_type: UnitType,
}

const BILL_SELECT: &str = r#"
    SELECT b.id, b.invoice_no,
           b.customer_id, c.customer_code, c.customer_name, c.shop_name,
           b.location_id, l.location_name,
           b.billing_date, b.payment_method, b.status, b.is_order, b.order_status,
           b.subtotal, b.discount_percentage, b.discount_amount, b.total_amount,
           b.paid_amount, b.balance_amount, b.total_items, b.notes,
           b.created_by, cu.username AS created_by_username,
           cu.email AS created_by_email, cu.role AS created_by_role,
           b.confirmed_by, fu.username AS confirmed_by_username,
           fu.email AS confirmed_by_email, fu.role AS confirmed_by_role,
           b.order_confirmed_at, b.created_at, b.updated_at
    FROM customer_bills b
    JOIN customers c ON c.id = b.customer_id
    JOIN stock_locations l ON l.id = b.location_id
    JOIN users cu ON cu.id = b.created_by
    LEFT JOIN users fu ON fu.id = b.confirmed_by
"#;

const BILL_STATE_SELECT: &str = r#"
    SELECT id, location_id, status, is_order, order_status, paid_amount,
           balance_amount, created_by
    FROM customer_bills
    WHERE id = $1
    FOR UPDATE
"#;

/// Bill kind decided by who creates it
pub fn bill_kind_for(role: UserRole) -> BillKind {
    if role.creates_orders() {
        BillKind::Order
    } else {
        BillKind::Invoice
    }
}

/// Turn client invoice validation failures into a 400
fn frontend_rejection(validation: FrontendValidation) -> AppError {
    let message = validation
        .errors
        .first()
        .cloned()
        .unwrap_or_else(|| "Invalid invoice data".to_string());
    AppError::Validation {
        message,
        field: None,
        details: vec![FieldError {
            field: "invoice".to_string(),
            errors: validation.errors,
        }],
    }
}

fn quantity_too_large() -> AppError {
    AppError::field("quantity", "Quantity including free items is too large")
}

async fn resolve_item(conn: &mut PgConnection, line: &CustomerBillLine) -> AppResult<BillItemRef> {
    const ITEM_COLUMNS: &str = "id, item_code, item_name, selling_price, unit_type";

    if let Some(item_id) = line.item_id {
        let found = sqlx::query_as::<_, BillItemRef>(&format!(
            "SELECT {} FROM items WHERE id = $1",
            ITEM_COLUMNS
        ))
        .bind(item_id)
        .fetch_optional(&mut *conn)
        .await?;
        if let Some(item) = found {
            return Ok(item);
        }
    }

    if let Some(code) = line.item_code.as_deref().filter(|c| !c.trim().is_empty()) {
        let found = sqlx::query_as::<_, BillItemRef>(&format!(
            "SELECT {} FROM items WHERE item_code = $1",
            ITEM_COLUMNS
        ))
        .bind(code.trim())
        .fetch_optional(&mut *conn)
        .await?;
        if let Some(item) = found {
            return Ok(item);
        }
        return Err(AppError::NotFound(format!("Item with code {}", code)));
    }

    match line.item_id {
        Some(item_id) => Err(AppError::NotFound(format!("Item with ID {}", item_id))),
        None => Err(AppError::field("items", "Item code or ID is required")),
    }
}

async fn generate_invoice_number(conn: &mut PgConnection, kind: BillKind) -> AppResult<String> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(INVOICE_NUMBER_LOCK)
        .execute(&mut *conn)
        .await?;

    let today = Utc::now().date_naive();
    let prefix = bill_prefix(kind, today);
    let existing = sqlx::query_scalar::<_, String>(
        "SELECT invoice_no FROM customer_bills WHERE invoice_no LIKE $1",
    )
    .bind(format!("{}%", prefix))
    .fetch_all(&mut *conn)
    .await?;

    Ok(bill_number(
        kind,
        today,
        next_sequence(existing.iter().map(String::as_str), &prefix),
    ))
}

impl CustomerBillService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a bill, or an order when the user is a representative
    pub async fn create_customer_bill(
        &self,
        request: CreateCustomerBillRequest,
        user: &AuthUser,
    ) -> AppResult<CustomerBillDetail> {
        let kind = bill_kind_for(user.role);
        let mut tx = self.db.begin().await?;

        let customer_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1)",
        )
        .bind(request.customer_id)
        .fetch_one(&mut *tx)
        .await?;
        if !customer_exists {
            return Err(AppError::NotFound("Customer".to_string()));
        }

        let location_id = match request.location_id {
            Some(location_id) => {
                let exists = sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM stock_locations WHERE id = $1)",
                )
                .bind(location_id)
                .fetch_one(&mut *tx)
                .await?;
                if !exists {
                    return Err(AppError::NotFound("Stock location".to_string()));
                }
                location_id
            }
            None => main_location_id(&mut *tx, user.business()?)
                .await?
                .ok_or_else(|| {
                    AppError::InvalidStateTransition(
                        "No main location configured for this business".to_string(),
                    )
                })?,
        };

        let mut items = Vec::with_capacity(request.items.len());
        for line in &request.items {
            items.push(resolve_item(&mut tx, line).await?);
        }

        let unit_prices: Vec<Decimal> = request
            .items
            .iter()
            .zip(&items)
            .map(|(line, item)| {
                if line.unit_price.is_zero() {
                    item.selling_price
                } else {
                    line.unit_price
                }
            })
            .collect();
        let line_amounts = request.line_amounts(&unit_prices);
        let totals = calculate_bill(
            &line_amounts,
            request.extra_discount,
            request.extra_discount_amount,
        );

        let invoice_no = match request.invoice_no.as_deref().map(str::trim) {
            Some(given) if !given.is_empty() => {
                let taken = sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM customer_bills WHERE invoice_no = $1)",
                )
                .bind(given)
                .fetch_one(&mut *tx)
                .await?;
                if taken {
                    return Err(AppError::DuplicateEntry(format!(
                        "Invoice number {} already exists",
                        given
                    )));
                }
                given.to_string()
            }
            _ => generate_invoice_number(&mut tx, kind).await?,
        };

        let (is_order, status, order_status) = match kind {
            BillKind::Order => (true, BillStatus::Pending, Some(OrderStatus::Pending)),
            BillKind::Invoice => (false, request.status.unwrap_or_default(), None),
        };

        if kind == BillKind::Invoice {
            let requests = request
                .items
                .iter()
                .zip(&items)
                .map(|(line, item)| {
                    Ok(StockRequest {
                        item_id: item.id,
                        item_label: item.item_name.clone(),
                        quantity: line.stock_quantity().ok_or_else(quantity_too_large)?,
                    })
                })
                .collect::<AppResult<Vec<_>>>()?;
            deduct_stock(&mut tx, location_id, &requests).await?;
        }

        let bill_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO customer_bills (
                invoice_no, customer_id, location_id, billing_date, payment_method,
                status, is_order, order_status, subtotal, discount_percentage,
                discount_amount, total_amount, paid_amount, balance_amount,
                total_items, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING id
            "#,
        )
        .bind(&invoice_no)
        .bind(request.customer_id)
        .bind(location_id)
        .bind(request.billing_date.unwrap_or_else(|| Utc::now().date_naive()))
        .bind(request.payment_method.unwrap_or_default())
        .bind(status)
        .bind(is_order)
        .bind(order_status)
        .bind(totals.subtotal)
        .bind(totals.discount_percentage)
        .bind(totals.discount_amount)
        .bind(totals.total_amount)
        .bind(totals.paid_amount)
        .bind(totals.balance_amount)
        .bind(totals.total_items)
        .bind(&request.notes)
        .bind(user.user_id)
        .fetch_one(&mut *tx)
        .await?;

        for ((line, item), (unit_price, amounts)) in request
            .items
            .iter()
            .zip(&items)
            .zip(unit_prices.iter().zip(&line_amounts))
        {
            let unit = line
                .unit
                .clone()
                .unwrap_or_else(|| item.unit_type.as_str().to_string());

            sqlx::query(
                r#"
                INSERT INTO customer_bill_items (
                    bill_id, item_id, item_code, item_name, unit, unit_price, quantity,
                    free_quantity, discount_percentage, discount_amount, subtotal,
                    total_amount, notes
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                "#,
            )
            .bind(bill_id)
            .bind(item.id)
            .bind(&item.item_code)
            .bind(&item.item_name)
            .bind(unit)
            .bind(*unit_price)
            .bind(line.quantity)
            .bind(line.free_quantity.unwrap_or(0))
            .bind(line.discount_percentage.unwrap_or(Decimal::ZERO))
            .bind(amounts.discount_amount)
            .bind(amounts.subtotal)
            .bind(amounts.total)
            .bind(&line.notes)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            %bill_id,
            invoice_no = %invoice_no,
            is_order,
            user_id = %user.user_id,
            total_amount = %totals.total_amount,
            "customer bill created"
        );

        self.get_bill(bill_id).await
    }

    /// Create from either accepted body shape
    pub async fn create_from_json(&self, body: Value, user: &AuthUser) -> AppResult<CustomerBillDetail> {
        if is_frontend_format(&body) {
            let data: FrontendInvoiceData = serde_json::from_value(body)
                .map_err(|e| AppError::ValidationError(format!("Invalid invoice data: {}", e)))?;
            return self.create_from_frontend(data, user).await;
        }

        let request: CreateCustomerBillRequest = serde_json::from_value(body)
            .map_err(|e| AppError::ValidationError(format!("Invalid request body: {}", e)))?;
        request.validate()?;
        self.create_customer_bill(request, user).await
    }

    pub async fn create_from_frontend(
        &self,
        data: FrontendInvoiceData,
        user: &AuthUser,
    ) -> AppResult<CustomerBillDetail> {
        let validation = validate_frontend_data(&data);
        if !validation.is_valid {
            return Err(frontend_rejection(validation));
        }

        let request = normalize_frontend_invoice(&data)
            .map_err(|e| AppError::field("customer", e.to_string()))?;
        request.validate()?;
        self.create_customer_bill(request, user).await
    }

    /// Check client invoice data without saving it
    pub fn validate_frontend(&self, data: &FrontendInvoiceData) -> FrontendValidation {
        validate_frontend_data(data)
    }

    /// Admin confirmation of a pending order; stock leaves the order's
    /// location exactly once
    pub async fn confirm_order(&self, bill_id: Uuid, user: &AuthUser) -> AppResult<CustomerBillDetail> {
        user.require(UserRole::can_confirm_orders, "confirm orders")?;

        let mut tx = self.db.begin().await?;
        let bill = self.lock_bill(&mut tx, bill_id).await?;
        let next = bill.order_status()?.transition_to(OrderStatus::Confirmed)?;

        let requests = sqlx::query_as::<_, (Uuid, String, i32, i32)>(
            "SELECT item_id, item_name, quantity, free_quantity FROM customer_bill_items WHERE bill_id = $1",
        )
        .bind(bill_id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|(item_id, item_name, quantity, free_quantity)| {
            Ok(StockRequest {
                item_id,
                item_label: item_name,
                quantity: units_with_free(quantity, Some(free_quantity))
                    .ok_or_else(quantity_too_large)?,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

        deduct_stock(&mut tx, bill.location_id, &requests).await?;

        sqlx::query(
            r#"
            UPDATE customer_bills
            SET order_status = $2, status = $3, order_confirmed_at = NOW(),
                confirmed_by = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(bill_id)
        .bind(next)
        .bind(BillStatus::Pending)
        .bind(user.user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(%bill_id, confirmed_by = %user.user_id, "order confirmed");
        self.get_bill(bill_id).await
    }

    pub async fn move_to_checking(&self, bill_id: Uuid, user: &AuthUser) -> AppResult<CustomerBillDetail> {
        user.require(UserRole::can_progress_orders, "move orders to checking")?;
        self.advance_order(bill_id, OrderStatus::Checking).await
    }

    pub async fn mark_delivered(&self, bill_id: Uuid, user: &AuthUser) -> AppResult<CustomerBillDetail> {
        user.require(UserRole::can_progress_orders, "mark orders delivered")?;
        self.advance_order(bill_id, OrderStatus::Delivered).await
    }

    async fn advance_order(&self, bill_id: Uuid, target: OrderStatus) -> AppResult<CustomerBillDetail> {
        let mut tx = self.db.begin().await?;
        let bill = self.lock_bill(&mut tx, bill_id).await?;
        let next = bill.order_status()?.transition_to(target)?;

        sqlx::query("UPDATE customer_bills SET order_status = $2, updated_at = NOW() WHERE id = $1")
            .bind(bill_id)
            .bind(next)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(%bill_id, order_status = next.as_str(), "order status changed");
        self.get_bill(bill_id).await
    }

    /// Cancel a pending order; nothing was deducted yet so stock is untouched
    pub async fn cancel_order(&self, bill_id: Uuid, user: &AuthUser) -> AppResult<CustomerBillDetail> {
        let mut tx = self.db.begin().await?;
        let bill = self.lock_bill(&mut tx, bill_id).await?;

        let is_creator = user.role == UserRole::Representative && bill.created_by == user.user_id;
        if user.role != UserRole::Admin && !is_creator {
            return Err(AppError::Forbidden(
                "Only an admin or the representative who created the order can cancel it"
                    .to_string(),
            ));
        }

        let next = bill.order_status()?.transition_to(OrderStatus::Cancelled)?;

        sqlx::query(
            "UPDATE customer_bills SET order_status = $2, status = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(bill_id)
        .bind(next)
        .bind(BillStatus::Cancelled)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(%bill_id, cancelled_by = %user.user_id, "order cancelled");
        self.get_bill(bill_id).await
    }

    pub async fn record_payment(
        &self,
        bill_id: Uuid,
        input: RecordPaymentInput,
        user: &AuthUser,
    ) -> AppResult<CustomerBillDetail> {
        user.require(UserRole::can_record_payments, "record payments")?;

        let mut tx = self.db.begin().await?;
        let bill = self.lock_bill(&mut tx, bill_id).await?;
        let outcome = apply_payment(bill.status, bill.paid_amount, bill.balance_amount, input.amount)?;

        sqlx::query(
            r#"
            UPDATE customer_bills
            SET paid_amount = $2, balance_amount = $3, status = $4,
                payment_method = COALESCE($5, payment_method), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(bill.id)
        .bind(outcome.paid_amount)
        .bind(outcome.balance_amount)
        .bind(outcome.status)
        .bind(input.payment_method)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            %bill_id,
            amount = %input.amount,
            balance = %outcome.balance_amount,
            "payment recorded"
        );
        self.get_bill(bill_id).await
    }

    async fn lock_bill(&self, conn: &mut PgConnection, bill_id: Uuid) -> AppResult<BillState> {
        sqlx::query_as::<_, BillState>(BILL_STATE_SELECT)
            .bind(bill_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Bill".to_string()))
    }

    pub async fn list_orders(
        &self,
        status: Option<OrderStatus>,
        user: &AuthUser,
    ) -> AppResult<Vec<CustomerBill>> {
        user.require(UserRole::can_view_all_orders, "view all orders")?;

        let rows = sqlx::query_as::<_, BillRow>(&format!(
            "{} WHERE b.is_order AND ($1::order_status IS NULL OR b.order_status = $1) ORDER BY b.created_at DESC",
            BILL_SELECT
        ))
        .bind(status)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(CustomerBill::from).collect())
    }

    pub async fn my_orders(
        &self,
        status: Option<OrderStatus>,
        user: &AuthUser,
    ) -> AppResult<Vec<CustomerBill>> {
        let rows = sqlx::query_as::<_, BillRow>(&format!(
            r#"{} WHERE b.is_order AND b.created_by = $1
                 AND ($2::order_status IS NULL OR b.order_status = $2)
               ORDER BY b.created_at DESC"#,
            BILL_SELECT
        ))
        .bind(user.user_id)
        .bind(status)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(CustomerBill::from).collect())
    }

    pub async fn list_bills(&self, user: &AuthUser) -> AppResult<Vec<CustomerBill>> {
        let rows = sqlx::query_as::<_, BillRow>(&format!(
            "{} WHERE ($1 OR b.created_by = $2) ORDER BY b.created_at DESC",
            BILL_SELECT
        ))
        .bind(user.role.can_view_all_orders())
        .bind(user.user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(CustomerBill::from).collect())
    }

    pub async fn get_bill(&self, bill_id: Uuid) -> AppResult<CustomerBillDetail> {
        let row = sqlx::query_as::<_, BillRow>(&format!("{} WHERE b.id = $1", BILL_SELECT))
            .bind(bill_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Bill".to_string()))?;

        let items = sqlx::query_as::<_, CustomerBillItem>(
            r#"
            SELECT id, item_id, item_code, item_name, unit, unit_price, quantity,
                   free_quantity, discount_percentage, discount_amount, subtotal,
                   total_amount, notes
            FROM customer_bill_items
            WHERE bill_id = $1
            "#,
        )
        .bind(bill_id)
        .fetch_all(&self.db)
        .await?;

        Ok(CustomerBillDetail {
            bill: row.into(),
            items,
        })
    }

    /// Bill visible to `user`; representatives only see their own
    pub async fn get_bill_for(&self, bill_id: Uuid, user: &AuthUser) -> AppResult<CustomerBillDetail> {
        let detail = self.get_bill(bill_id).await?;
        if !user.role.can_view_all_orders() && detail.bill.created_by.id != user.user_id {
            return Err(AppError::NotFound("Bill".to_string()));
        }
        Ok(detail)
    }

    /// An order with its customer's outstanding delivered bills summarized
    pub async fn get_order(&self, bill_id: Uuid, user: &AuthUser) -> AppResult<OrderDetail> {
        let order = self.get_bill_for(bill_id, user).await?;
        if !order.bill.is_order {
            return Err(AppError::ValidationError("This is not an order".to_string()));
        }

        let outstanding: Vec<OutstandingBill> = sqlx::query_as::<_, (Decimal, NaiveDate)>(
            r#"
            SELECT balance_amount, billing_date
            FROM customer_bills
            WHERE customer_id = $1
              AND id <> $2
              AND order_status = 'delivered'
              AND status NOT IN ('paid', 'cancelled')
            "#,
        )
        .bind(order.bill.customer.id)
        .bind(bill_id)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(|(balance_amount, billing_date)| OutstandingBill {
            balance_amount,
            billing_date,
        })
        .collect();

        let customer_summary = summarize_dues(&outstanding, Utc::now().date_naive());
        Ok(OrderDetail {
            order,
            customer_summary,
        })
    }
}
