//! Customer management service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{customer_code, next_sequence, CustomerType, CUSTOMER_CODE_LOCK, CUSTOMER_CODE_PREFIX};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct CustomerService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub customer_code: String,
    pub customer_name: String,
    pub shop_name: String,
    pub customer_type: CustomerType,
    pub area_id: Option<Uuid>,
    pub address: Option<String>,
    pub contact_number: String,
    pub assigned_rep_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerInput {
    #[validate(length(min = 2, max = 255, message = "Customer name must be 2-255 characters"))]
    pub customer_name: String,

    #[validate(length(min = 2, max = 255, message = "Shop name must be 2-255 characters"))]
    pub shop_name: String,

    #[serde(default)]
    pub customer_type: CustomerType,

    pub area_id: Option<Uuid>,

    pub address: Option<String>,

    #[validate(length(min = 7, max = 20, message = "Contact number must be 7-20 characters"))]
    pub contact_number: String,

    pub assigned_rep_id: Option<Uuid>,

    pub notes: Option<String>,
}

const CUSTOMER_COLUMNS: &str = r#"
    id, customer_code, customer_name, shop_name, customer_type, area_id, address,
    contact_number, assigned_rep_id, notes, created_at, updated_at
"#;

impl CustomerService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a customer with the next `CUSTnnnn` code. Code generation is
    /// serialized by a transaction scoped advisory lock.
    pub async fn create_customer(&self, input: CreateCustomerInput) -> AppResult<Customer> {
        let contact_number = input.contact_number.trim();

        let mut tx = self.db.begin().await?;

        let duplicate = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM customers WHERE contact_number = $1)",
        )
        .bind(contact_number)
        .fetch_one(&mut *tx)
        .await?;

        if duplicate {
            return Err(AppError::DuplicateEntry(
                "A customer with this contact number already exists".to_string(),
            ));
        }

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(CUSTOMER_CODE_LOCK)
            .execute(&mut *tx)
            .await?;

        let existing = sqlx::query_scalar::<_, String>(
            "SELECT customer_code FROM customers WHERE customer_code LIKE $1",
        )
        .bind(format!("{}%", CUSTOMER_CODE_PREFIX))
        .fetch_all(&mut *tx)
        .await?;

        let code = customer_code(next_sequence(
            existing.iter().map(String::as_str),
            CUSTOMER_CODE_PREFIX,
        ));

        let customer = sqlx::query_as::<_, Customer>(&format!(
            r#"
            INSERT INTO customers (
                customer_code, customer_name, shop_name, customer_type, area_id,
                address, contact_number, assigned_rep_id, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        ))
        .bind(&code)
        .bind(input.customer_name.trim())
        .bind(input.shop_name.trim())
        .bind(input.customer_type)
        .bind(input.area_id)
        .bind(&input.address)
        .bind(contact_number)
        .bind(input.assigned_rep_id)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(customer_id = %customer.id, customer_code = %code, "customer created");
        Ok(customer)
    }

    pub async fn list_customers(&self) -> AppResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers ORDER BY created_at DESC",
            CUSTOMER_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(customers)
    }

    pub async fn get_customer(&self, customer_id: Uuid) -> AppResult<Customer> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers WHERE id = $1",
            CUSTOMER_COLUMNS
        ))
        .bind(customer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))
    }
}
