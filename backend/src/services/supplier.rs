//! Supplier management service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct SupplierService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Supplier {
    pub id: Uuid,
    pub supplier_code: String,
    pub supplier_name: String,
    pub address: String,
    pub phone_number: String,
    pub contact_person: String,
    pub email: Option<String>,
    pub credit_days: i32,
    pub category_id: Option<Uuid>,
    pub additional_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Dropdown entry for supplier selection
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SupplierOption {
    pub id: Uuid,
    pub supplier_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSupplierInput {
    #[validate(length(min = 2, max = 12, message = "Supplier code must be 2-12 characters"))]
    pub supplier_code: String,

    #[validate(length(min = 2, max = 100, message = "Supplier name must be 2-100 characters"))]
    pub supplier_name: String,

    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,

    #[validate(length(min = 1, max = 20, message = "Phone number is required"))]
    pub phone_number: String,

    #[validate(length(min = 1, max = 100, message = "Contact person is required"))]
    pub contact_person: String,

    #[validate(email(message = "Please provide a valid email address"))]
    pub email: Option<String>,

    #[serde(default)]
    #[validate(range(min = 0, message = "Credit days cannot be negative"))]
    pub credit_days: i32,

    pub category_id: Option<Uuid>,

    pub additional_notes: Option<String>,
}

/// Partial update; absent fields keep their value
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateSupplierInput {
    #[validate(length(min = 2, max = 12, message = "Supplier code must be 2-12 characters"))]
    pub supplier_code: Option<String>,

    #[validate(length(min = 2, max = 100, message = "Supplier name must be 2-100 characters"))]
    pub supplier_name: Option<String>,

    #[validate(length(min = 1, message = "Address cannot be empty"))]
    pub address: Option<String>,

    #[validate(length(min = 1, max = 20, message = "Phone number cannot be empty"))]
    pub phone_number: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Contact person cannot be empty"))]
    pub contact_person: Option<String>,

    #[validate(email(message = "Please provide a valid email address"))]
    pub email: Option<String>,

    #[validate(range(min = 0, message = "Credit days cannot be negative"))]
    pub credit_days: Option<i32>,

    pub category_id: Option<Uuid>,

    pub additional_notes: Option<String>,
}

const SUPPLIER_COLUMNS: &str = r#"
    id, supplier_code, supplier_name, address, phone_number, contact_person,
    email, credit_days, category_id, additional_notes, created_at, updated_at
"#;

impl SupplierService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Suppliers are unique by name and by phone number
    pub async fn create_supplier(&self, input: CreateSupplierInput) -> AppResult<Supplier> {
        let duplicate = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM suppliers WHERE supplier_name = $1 OR phone_number = $2)",
        )
        .bind(input.supplier_name.trim())
        .bind(input.phone_number.trim())
        .fetch_one(&self.db)
        .await?;

        if duplicate {
            return Err(AppError::DuplicateEntry(
                "Supplier with this name or phone number already exists".to_string(),
            ));
        }

        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            r#"
            INSERT INTO suppliers (
                supplier_code, supplier_name, address, phone_number, contact_person,
                email, credit_days, category_id, additional_notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            SUPPLIER_COLUMNS
        ))
        .bind(input.supplier_code.trim())
        .bind(input.supplier_name.trim())
        .bind(&input.address)
        .bind(input.phone_number.trim())
        .bind(&input.contact_person)
        .bind(&input.email)
        .bind(input.credit_days)
        .bind(input.category_id)
        .bind(&input.additional_notes)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(supplier_id = %supplier.id, "supplier created");
        Ok(supplier)
    }

    pub async fn list_suppliers(&self) -> AppResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {} FROM suppliers ORDER BY created_at DESC",
            SUPPLIER_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(suppliers)
    }

    pub async fn supplier_dropdown(&self) -> AppResult<Vec<SupplierOption>> {
        let options = sqlx::query_as::<_, SupplierOption>(
            "SELECT id, supplier_name FROM suppliers ORDER BY supplier_name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(options)
    }

    pub async fn get_supplier(&self, supplier_id: Uuid) -> AppResult<Supplier> {
        sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {} FROM suppliers WHERE id = $1",
            SUPPLIER_COLUMNS
        ))
        .bind(supplier_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplier".to_string()))
    }

    pub async fn update_supplier(
        &self,
        supplier_id: Uuid,
        input: UpdateSupplierInput,
    ) -> AppResult<Supplier> {
        sqlx::query_as::<_, Supplier>(&format!(
            r#"
            UPDATE suppliers SET
                supplier_code = COALESCE($2, supplier_code),
                supplier_name = COALESCE($3, supplier_name),
                address = COALESCE($4, address),
                phone_number = COALESCE($5, phone_number),
                contact_person = COALESCE($6, contact_person),
                email = COALESCE($7, email),
                credit_days = COALESCE($8, credit_days),
                category_id = COALESCE($9, category_id),
                additional_notes = COALESCE($10, additional_notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SUPPLIER_COLUMNS
        ))
        .bind(supplier_id)
        .bind(&input.supplier_code)
        .bind(&input.supplier_name)
        .bind(&input.address)
        .bind(&input.phone_number)
        .bind(&input.contact_person)
        .bind(&input.email)
        .bind(input.credit_days)
        .bind(input.category_id)
        .bind(&input.additional_notes)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplier".to_string()))
    }

    /// Suppliers still referenced by items or bills cannot be deleted
    pub async fn delete_supplier(&self, supplier_id: Uuid) -> AppResult<()> {
        let in_use = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM items WHERE supplier_id = $1)
                OR EXISTS(SELECT 1 FROM supplier_bills WHERE supplier_id = $1)
            "#,
        )
        .bind(supplier_id)
        .fetch_one(&self.db)
        .await?;

        if in_use {
            return Err(AppError::Conflict(
                "Supplier is still referenced by items or bills".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(supplier_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Supplier".to_string()));
        }

        Ok(())
    }
}
