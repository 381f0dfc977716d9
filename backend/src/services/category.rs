//! Item category service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::CategoryType;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppResult;

#[derive(Clone)]
pub struct CategoryService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub category_name: String,
    pub category_code: String,
    pub category_type: CategoryType,
    pub created_at: DateTime<Utc>,
}

/// Ids are always generated server side; an `id` in the body is ignored
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryInput {
    #[validate(length(min = 1, max = 100, message = "Category name must be 1-100 characters"))]
    pub category_name: String,

    #[validate(length(min = 1, max = 20, message = "Category code must be 1-20 characters"))]
    pub category_code: String,

    pub category_type: CategoryType,
}

impl CategoryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_category(&self, input: CreateCategoryInput) -> AppResult<Category> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (id, category_name, category_code, category_type)
            VALUES ($1, $2, $3, $4)
            RETURNING id, category_name, category_code, category_type, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.category_name.trim())
        .bind(input.category_code.trim())
        .bind(input.category_type)
        .fetch_one(&self.db)
        .await?;

        Ok(category)
    }

    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, category_name, category_code, category_type, created_at
            FROM categories
            ORDER BY category_name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(categories)
    }
}
