//! Stock levels and stock transfers between locations
//!
//! All stock mutations go through [`deduct_stock`] and [`increment_stock`],
//! which the bill services share. Deductions lock the affected rows
//! `FOR UPDATE` in item-id order so concurrent workflows cannot oversell or
//! deadlock.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    next_sequence, plan_deductions, round_money, transfer_number, transfer_prefix, transfer_totals,
    validate_lines, validate_money, StockRequest, TransferStatus, TRANSFER_NUMBER_LOCK,
};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// A stock row joined with its item, supplier and location
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockRow {
    pub stock_id: Uuid,
    pub item_id: Uuid,
    pub item_code: String,
    pub item_name: String,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub location_id: Uuid,
    pub location_code: String,
    pub location_name: String,
    pub quantity: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddStockInput {
    pub item_id: Uuid,

    pub location_id: Uuid,

    #[validate(range(min = 1, max = 1_000_000, message = "Quantity must be between 1 and 1000000"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Stock {
    pub id: Uuid,
    pub item_id: Uuid,
    pub location_id: Uuid,
    pub quantity: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TransferLineInput {
    pub item_id: Uuid,

    #[validate(range(
        min = 1,
        max = 1_000_000,
        message = "Requested quantity must be between 1 and 1000000"
    ))]
    pub requested_quantity: i32,

    #[validate(custom = "validate_money")]
    pub unit_cost: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTransferInput {
    pub source_location_id: Uuid,

    pub destination_location_id: Uuid,

    pub transfer_date: Option<NaiveDate>,

    pub notes: Option<String>,

    #[validate(
        length(min = 1, message = "At least one item is required"),
        custom = "validate_lines"
    )]
    pub items: Vec<TransferLineInput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferCreated {
    pub transfer_id: Uuid,
    pub transfer_number: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockTransfer {
    pub id: Uuid,
    pub transfer_number: String,
    pub source_location_id: Uuid,
    pub source_location_name: String,
    pub destination_location_id: Uuid,
    pub destination_location_name: String,
    pub transfer_date: NaiveDate,
    pub status: TransferStatus,
    pub total_items: i32,
    pub total_quantity: i64,
    pub total_value: Decimal,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockTransferLine {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_code: String,
    pub item_name: String,
    pub supplier_name: Option<String>,
    pub requested_quantity: i32,
    pub shipped_quantity: i32,
    pub received_quantity: i32,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
}

#[derive(Debug, Serialize)]
pub struct StockTransferDetail {
    #[serde(flatten)]
    pub transfer: StockTransfer,
    pub items: Vec<StockTransferLine>,
}

#[derive(Debug, FromRow)]
struct TransferItemRow {
    id: Uuid,
    item_code: String,
    item_name: String,
    supplier_name: Option<String>,
    cost_price: Decimal,
}

const STOCK_ROW_SELECT: &str = r#"
    SELECT s.id AS stock_id, s.item_id, i.item_code, i.item_name,
           i.supplier_id, sp.supplier_name, s.location_id,
           l.location_code, l.location_name, s.quantity, s.updated_at
    FROM stocks s
    JOIN items i ON i.id = s.item_id
    JOIN suppliers sp ON sp.id = i.supplier_id
    JOIN stock_locations l ON l.id = s.location_id
"#;

const TRANSFER_SELECT: &str = r#"
    SELECT t.id, t.transfer_number,
           t.source_location_id, src.location_name AS source_location_name,
           t.destination_location_id, dst.location_name AS destination_location_name,
           t.transfer_date, t.status, t.total_items, t.total_quantity, t.total_value,
           t.notes, t.created_by, t.created_at
    FROM stock_transfers t
    JOIN stock_locations src ON src.id = t.source_location_id
    JOIN stock_locations dst ON dst.id = t.destination_location_id
"#;

/// Check and remove stock at a location inside the caller's transaction.
///
/// Rows are locked before availability is read; a shortfall returns
/// `InsufficientStock` and leaves every row untouched.
pub async fn deduct_stock(
    conn: &mut PgConnection,
    location_id: Uuid,
    requests: &[StockRequest],
) -> AppResult<()> {
    if requests.is_empty() {
        return Ok(());
    }

    let mut item_ids: Vec<Uuid> = requests.iter().map(|r| r.item_id).collect();
    item_ids.sort();
    item_ids.dedup();

    let locked = sqlx::query_as::<_, (Uuid, i32)>(
        r#"
        SELECT item_id, quantity FROM stocks
        WHERE location_id = $1 AND item_id = ANY($2)
        ORDER BY item_id
        FOR UPDATE
        "#,
    )
    .bind(location_id)
    .bind(&item_ids)
    .fetch_all(&mut *conn)
    .await?;

    let available: HashMap<Uuid, i32> = locked.into_iter().collect();
    let plan = plan_deductions(requests, &available)?;

    for (item_id, quantity) in plan {
        sqlx::query(
            r#"
            UPDATE stocks SET quantity = quantity - $3, updated_at = NOW()
            WHERE item_id = $1 AND location_id = $2
            "#,
        )
        .bind(item_id)
        .bind(location_id)
        .bind(quantity)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Add quantity to the `(item, location)` row, creating it when missing
pub async fn increment_stock(
    conn: &mut PgConnection,
    item_id: Uuid,
    location_id: Uuid,
    quantity: i32,
) -> AppResult<Stock> {
    let stock = sqlx::query_as::<_, Stock>(
        r#"
        INSERT INTO stocks (item_id, location_id, quantity)
        VALUES ($1, $2, $3)
        ON CONFLICT (item_id, location_id)
        DO UPDATE SET quantity = stocks.quantity + EXCLUDED.quantity, updated_at = NOW()
        RETURNING id, item_id, location_id, quantity, updated_at
        "#,
    )
    .bind(item_id)
    .bind(location_id)
    .bind(quantity)
    .fetch_one(&mut *conn)
    .await?;

    Ok(stock)
}

impl StockService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list_stocks(&self, location_id: Option<Uuid>) -> AppResult<Vec<StockRow>> {
        let rows = sqlx::query_as::<_, StockRow>(&format!(
            "{} WHERE ($1::uuid IS NULL OR s.location_id = $1) ORDER BY s.updated_at DESC",
            STOCK_ROW_SELECT
        ))
        .bind(location_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// All stock rows as CSV with a header line
    pub async fn export_stocks_csv(&self) -> AppResult<String> {
        let rows = self.list_stocks(None).await?;
        stock_rows_to_csv(&rows)
    }

    pub async fn add_stock(&self, input: AddStockInput) -> AppResult<Stock> {
        let mut tx = self.db.begin().await?;

        let item_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM items WHERE id = $1)")
                .bind(input.item_id)
                .fetch_one(&mut *tx)
                .await?;
        if !item_exists {
            return Err(AppError::NotFound("Item".to_string()));
        }

        let location_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM stock_locations WHERE id = $1)",
        )
        .bind(input.location_id)
        .fetch_one(&mut *tx)
        .await?;
        if !location_exists {
            return Err(AppError::NotFound("Stock location".to_string()));
        }

        let stock = increment_stock(&mut tx, input.item_id, input.location_id, input.quantity).await?;
        tx.commit().await?;

        tracing::info!(
            item_id = %stock.item_id,
            location_id = %stock.location_id,
            added = input.quantity,
            quantity = stock.quantity,
            "stock added"
        );
        Ok(stock)
    }

    /// Move stock between two locations in one transaction
    pub async fn create_stock_transfer(
        &self,
        input: CreateTransferInput,
        created_by: Uuid,
    ) -> AppResult<TransferCreated> {
        if input.source_location_id == input.destination_location_id {
            return Err(AppError::field(
                "destination_location_id",
                "Source and destination locations must be different",
            ));
        }

        let mut tx = self.db.begin().await?;

        let found = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM stock_locations WHERE id = $1 OR id = $2",
        )
        .bind(input.source_location_id)
        .bind(input.destination_location_id)
        .fetch_one(&mut *tx)
        .await?;
        if found != 2 {
            return Err(AppError::NotFound("Stock location".to_string()));
        }

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(TRANSFER_NUMBER_LOCK)
            .execute(&mut *tx)
            .await?;

        let today = Utc::now().date_naive();
        let prefix = transfer_prefix(today);
        let existing = sqlx::query_scalar::<_, String>(
            "SELECT transfer_number FROM stock_transfers WHERE transfer_number LIKE $1",
        )
        .bind(format!("{}%", prefix))
        .fetch_all(&mut *tx)
        .await?;
        let number = transfer_number(today, next_sequence(existing.iter().map(String::as_str), &prefix));

        let item_ids: Vec<Uuid> = input.items.iter().map(|line| line.item_id).collect();
        let items: HashMap<Uuid, TransferItemRow> = sqlx::query_as::<_, TransferItemRow>(
            r#"
            SELECT i.id, i.item_code, i.item_name, sp.supplier_name, i.cost_price
            FROM items i
            LEFT JOIN suppliers sp ON sp.id = i.supplier_id
            WHERE i.id = ANY($1)
            "#,
        )
        .bind(&item_ids)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|row| (row.id, row))
        .collect();

        let mut lines = Vec::with_capacity(input.items.len());
        for line in &input.items {
            let item = items
                .get(&line.item_id)
                .ok_or_else(|| AppError::NotFound(format!("Item {}", line.item_id)))?;
            lines.push((item, line.requested_quantity, line.unit_cost.unwrap_or(item.cost_price)));
        }

        let requests: Vec<StockRequest> = lines
            .iter()
            .map(|(item, quantity, _)| StockRequest {
                item_id: item.id,
                item_label: item.item_code.clone(),
                quantity: *quantity,
            })
            .collect();
        let costed: Vec<(i32, Decimal)> = lines.iter().map(|(_, q, cost)| (*q, *cost)).collect();

        deduct_stock(&mut tx, input.source_location_id, &requests).await?;

        let totals = transfer_totals(&costed);
        let transfer_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO stock_transfers (
                transfer_number, source_location_id, destination_location_id,
                transfer_date, status, total_items, total_quantity, total_value,
                notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(&number)
        .bind(input.source_location_id)
        .bind(input.destination_location_id)
        .bind(input.transfer_date.unwrap_or(today))
        .bind(TransferStatus::Completed)
        .bind(totals.total_items)
        .bind(totals.total_quantity)
        .bind(totals.total_value)
        .bind(&input.notes)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        for (item, quantity, unit_cost) in &lines {
            sqlx::query(
                r#"
                INSERT INTO stock_transfer_items (
                    transfer_id, item_id, item_code, item_name, supplier_name,
                    requested_quantity, shipped_quantity, received_quantity,
                    unit_cost, total_cost
                )
                VALUES ($1, $2, $3, $4, $5, $6, $6, $6, $7, $8)
                "#,
            )
            .bind(transfer_id)
            .bind(item.id)
            .bind(&item.item_code)
            .bind(&item.item_name)
            .bind(&item.supplier_name)
            .bind(*quantity)
            .bind(*unit_cost)
            .bind(round_money(Decimal::from(*quantity) * *unit_cost))
            .execute(&mut *tx)
            .await?;
        }

        for request in &requests {
            increment_stock(&mut tx, request.item_id, input.destination_location_id, request.quantity)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            %transfer_id,
            transfer_number = %number,
            source = %input.source_location_id,
            destination = %input.destination_location_id,
            total_quantity = totals.total_quantity,
            "stock transfer completed"
        );

        Ok(TransferCreated {
            transfer_id,
            transfer_number: number,
        })
    }

    pub async fn list_transfers(&self) -> AppResult<Vec<StockTransfer>> {
        let transfers = sqlx::query_as::<_, StockTransfer>(&format!(
            "{} ORDER BY t.created_at DESC",
            TRANSFER_SELECT
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(transfers)
    }

    pub async fn get_transfer(&self, transfer_id: Uuid) -> AppResult<StockTransferDetail> {
        let transfer = sqlx::query_as::<_, StockTransfer>(&format!("{} WHERE t.id = $1", TRANSFER_SELECT))
            .bind(transfer_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Stock transfer".to_string()))?;

        let items = sqlx::query_as::<_, StockTransferLine>(
            r#"
            SELECT id, item_id, item_code, item_name, supplier_name, requested_quantity,
                   shipped_quantity, received_quantity, unit_cost, total_cost
            FROM stock_transfer_items
            WHERE transfer_id = $1
            ORDER BY item_code
            "#,
        )
        .bind(transfer_id)
        .fetch_all(&self.db)
        .await?;

        Ok(StockTransferDetail { transfer, items })
    }
}

const STOCK_CSV_HEADER: [&str; 11] = [
    "stock_id",
    "item_id",
    "item_code",
    "item_name",
    "supplier_id",
    "supplier_name",
    "location_id",
    "location_code",
    "location_name",
    "quantity",
    "updated_at",
];

fn stock_rows_to_csv(rows: &[StockRow]) -> AppResult<String> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(vec![]);
    wtr.write_record(STOCK_CSV_HEADER)
        .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    for row in rows {
        wtr.serialize(row)
            .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
}
