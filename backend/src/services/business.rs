//! Business registry service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::BusinessType;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct BusinessService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Business {
    pub id: Uuid,
    pub name: String,
    pub business_type: BusinessType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBusinessInput {
    #[validate(length(min = 1, max = 100, message = "Business name must be 1-100 characters"))]
    pub business_name: String,
    pub business_type: BusinessType,
}

impl BusinessService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_business(&self, input: CreateBusinessInput) -> AppResult<Business> {
        let name = input.business_name.trim();

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM businesses WHERE name = $1)",
        )
        .bind(name)
        .fetch_one(&self.db)
        .await?;

        if exists {
            return Err(AppError::DuplicateEntry(
                "Business with this name already exists".to_string(),
            ));
        }

        let business = sqlx::query_as::<_, Business>(
            r#"
            INSERT INTO businesses (name, business_type)
            VALUES ($1, $2)
            RETURNING id, name, business_type, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(input.business_type)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(business_id = %business.id, "business created");
        Ok(business)
    }

    pub async fn list_businesses(&self) -> AppResult<Vec<Business>> {
        let businesses = sqlx::query_as::<_, Business>(
            "SELECT id, name, business_type, created_at, updated_at FROM businesses ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(businesses)
    }
}
