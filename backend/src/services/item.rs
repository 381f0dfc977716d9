//! Item catalog service

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{validate_money, UnitType};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct ItemService {
    db: PgPool,
}

/// Item with its supplier and category names
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ItemDetail {
    pub id: Uuid,
    pub item_code: String,
    pub item_name: String,
    pub description: Option<String>,
    pub cost_price: Decimal,
    pub mrp: Decimal,
    pub selling_price: Decimal,
    pub minimum_selling_price: Option<Decimal>,
    pub rep_commission: Option<Decimal>,
    pub unit_type: UnitType,
    pub unit_quantity: Option<i32>,
    pub sku: Option<String>,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub category_id: Uuid,
    pub category_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemInput {
    #[validate(length(min = 1, max = 50, message = "Item code must be 1-50 characters"))]
    pub item_code: String,

    #[validate(length(min = 1, max = 100, message = "Item name must be 1-100 characters"))]
    pub item_name: String,

    pub description: Option<String>,

    #[validate(custom = "validate_money")]
    pub cost_price: Decimal,

    #[validate(custom = "validate_money")]
    pub mrp: Decimal,

    #[validate(custom = "validate_money")]
    pub selling_price: Decimal,

    #[validate(custom = "validate_money")]
    pub minimum_selling_price: Option<Decimal>,

    #[validate(custom = "validate_money")]
    pub rep_commission: Option<Decimal>,

    pub unit_type: UnitType,

    #[validate(range(min = 1, message = "Unit quantity must be at least 1"))]
    pub unit_quantity: Option<i32>,

    #[validate(length(max = 100, message = "SKU must be at most 100 characters"))]
    pub sku: Option<String>,

    pub supplier_id: Uuid,

    pub category_id: Uuid,
}

const ITEM_DETAIL_SELECT: &str = r#"
    SELECT i.id, i.item_code, i.item_name, i.description, i.cost_price, i.mrp,
           i.selling_price, i.minimum_selling_price, i.rep_commission, i.unit_type,
           i.unit_quantity, i.sku, i.supplier_id, s.supplier_name, i.category_id,
           c.category_name, i.created_at, i.updated_at
    FROM items i
    JOIN suppliers s ON s.id = i.supplier_id
    JOIN categories c ON c.id = i.category_id
"#;

impl ItemService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_item(&self, input: CreateItemInput) -> AppResult<ItemDetail> {
        let code_taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM items WHERE item_code = $1)",
        )
        .bind(input.item_code.trim())
        .fetch_one(&self.db)
        .await?;

        if code_taken {
            return Err(AppError::DuplicateEntry(
                "Item with this code already exists".to_string(),
            ));
        }

        let supplier_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM suppliers WHERE id = $1)",
        )
        .bind(input.supplier_id)
        .fetch_one(&self.db)
        .await?;

        if !supplier_exists {
            return Err(AppError::NotFound("Supplier".to_string()));
        }

        let category_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)",
        )
        .bind(input.category_id)
        .fetch_one(&self.db)
        .await?;

        if !category_exists {
            return Err(AppError::NotFound("Category".to_string()));
        }

        let item_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO items (
                item_code, item_name, description, cost_price, mrp, selling_price,
                minimum_selling_price, rep_commission, unit_type, unit_quantity, sku,
                supplier_id, category_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id
            "#,
        )
        .bind(input.item_code.trim())
        .bind(input.item_name.trim())
        .bind(&input.description)
        .bind(input.cost_price)
        .bind(input.mrp)
        .bind(input.selling_price)
        .bind(input.minimum_selling_price)
        .bind(input.rep_commission)
        .bind(input.unit_type)
        .bind(input.unit_quantity)
        .bind(&input.sku)
        .bind(input.supplier_id)
        .bind(input.category_id)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(%item_id, item_code = %input.item_code, "item created");
        self.get_item(item_id).await
    }

    pub async fn list_items(&self) -> AppResult<Vec<ItemDetail>> {
        let items = sqlx::query_as::<_, ItemDetail>(&format!(
            "{} ORDER BY i.created_at DESC",
            ITEM_DETAIL_SELECT
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(items)
    }

    pub async fn get_item(&self, item_id: Uuid) -> AppResult<ItemDetail> {
        sqlx::query_as::<_, ItemDetail>(&format!("{} WHERE i.id = $1", ITEM_DETAIL_SELECT))
            .bind(item_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Item".to_string()))
    }
}
