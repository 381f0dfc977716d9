//! Stock location service
//!
//! Every business has exactly one main location, used whenever a bill or
//! order does not name a location. The first location created for a business
//! becomes its main location.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct LocationService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockLocation {
    pub id: Uuid,
    pub location_code: String,
    pub location_name: String,
    pub business_id: Uuid,
    pub responsible_user_id: Option<Uuid>,
    pub parent_location_id: Option<Uuid>,
    pub is_main: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LocationOption {
    pub id: Uuid,
    pub location_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLocationInput {
    #[validate(length(min = 1, max = 50, message = "Location code must be 1-50 characters"))]
    pub location_code: String,

    #[validate(length(min = 1, max = 100, message = "Location name must be 1-100 characters"))]
    pub location_name: String,

    pub business_id: Uuid,

    pub responsible_user_id: Option<Uuid>,

    pub parent_location_id: Option<Uuid>,

    #[serde(default, alias = "is_main")]
    pub main: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateLocationInput {
    #[validate(length(min = 1, max = 50, message = "Location code must be 1-50 characters"))]
    pub location_code: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Location name must be 1-100 characters"))]
    pub location_name: Option<String>,

    pub responsible_user_id: Option<Uuid>,

    pub parent_location_id: Option<Uuid>,

    /// Rejected when present
    #[serde(default, alias = "is_main")]
    pub main: Option<bool>,
}

const LOCATION_COLUMNS: &str = r#"
    id, location_code, location_name, business_id, responsible_user_id,
    parent_location_id, is_main, created_at, updated_at
"#;

/// Lock key serializing location changes of one business
fn business_lock_key(business_id: Uuid) -> String {
    format!("stock_location:{}", business_id)
}

/// The business's main location, if it has one
pub async fn main_location_id<'e, E>(executor: E, business_id: Uuid) -> AppResult<Option<Uuid>>
where
    E: PgExecutor<'e>,
{
    let id = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM stock_locations WHERE business_id = $1 AND is_main",
    )
    .bind(business_id)
    .fetch_optional(executor)
    .await?;

    Ok(id)
}

impl LocationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_location(&self, input: CreateLocationInput) -> AppResult<StockLocation> {
        let mut tx = self.db.begin().await?;

        let business_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM businesses WHERE id = $1)",
        )
        .bind(input.business_id)
        .fetch_one(&mut *tx)
        .await?;

        if !business_exists {
            return Err(AppError::NotFound("Business".to_string()));
        }

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(business_lock_key(input.business_id))
            .execute(&mut *tx)
            .await?;

        if let Some(parent_id) = input.parent_location_id {
            let parent_business = sqlx::query_scalar::<_, Uuid>(
                "SELECT business_id FROM stock_locations WHERE id = $1",
            )
            .bind(parent_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Parent location".to_string()))?;

            if parent_business != input.business_id {
                return Err(AppError::field(
                    "parent_location_id",
                    "Parent location must belong to the same business",
                ));
            }
        }

        let location_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM stock_locations WHERE business_id = $1",
        )
        .bind(input.business_id)
        .fetch_one(&mut *tx)
        .await?;

        let is_main = if location_count == 0 {
            true
        } else if input.main == Some(true) {
            if main_location_id(&mut *tx, input.business_id).await?.is_some() {
                return Err(AppError::Conflict(
                    "Business already has a main location".to_string(),
                ));
            }
            true
        } else {
            false
        };

        let location = sqlx::query_as::<_, StockLocation>(&format!(
            r#"
            INSERT INTO stock_locations (
                location_code, location_name, business_id, responsible_user_id,
                parent_location_id, is_main
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            LOCATION_COLUMNS
        ))
        .bind(input.location_code.trim())
        .bind(input.location_name.trim())
        .bind(input.business_id)
        .bind(input.responsible_user_id)
        .bind(input.parent_location_id)
        .bind(is_main)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            location_id = %location.id,
            business_id = %location.business_id,
            is_main,
            "stock location created"
        );
        Ok(location)
    }

    pub async fn list_locations(&self) -> AppResult<Vec<StockLocation>> {
        let locations = sqlx::query_as::<_, StockLocation>(&format!(
            "SELECT {} FROM stock_locations ORDER BY is_main DESC, location_name",
            LOCATION_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(locations)
    }

    pub async fn location_dropdown(&self) -> AppResult<Vec<LocationOption>> {
        let options = sqlx::query_as::<_, LocationOption>(
            "SELECT id, location_name FROM stock_locations ORDER BY location_name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(options)
    }

    pub async fn list_main_locations(&self) -> AppResult<Vec<StockLocation>> {
        let locations = sqlx::query_as::<_, StockLocation>(&format!(
            "SELECT {} FROM stock_locations WHERE is_main ORDER BY location_name",
            LOCATION_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(locations)
    }

    pub async fn main_location_for_business(&self, business_id: Uuid) -> AppResult<StockLocation> {
        sqlx::query_as::<_, StockLocation>(&format!(
            "SELECT {} FROM stock_locations WHERE business_id = $1 AND is_main",
            LOCATION_COLUMNS
        ))
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Main location".to_string()))
    }

    pub async fn get_location(&self, location_id: Uuid) -> AppResult<StockLocation> {
        sqlx::query_as::<_, StockLocation>(&format!(
            "SELECT {} FROM stock_locations WHERE id = $1",
            LOCATION_COLUMNS
        ))
        .bind(location_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock location".to_string()))
    }

    pub async fn update_location(
        &self,
        location_id: Uuid,
        input: UpdateLocationInput,
    ) -> AppResult<StockLocation> {
        if input.main.is_some() {
            return Err(AppError::field(
                "main",
                "The main location cannot be changed through an update",
            ));
        }
        if input.parent_location_id == Some(location_id) {
            return Err(AppError::field(
                "parent_location_id",
                "A location cannot be its own parent",
            ));
        }

        let current = self.get_location(location_id).await?;

        if let Some(parent_id) = input.parent_location_id {
            let parent = self.get_location(parent_id).await.map_err(|err| match err {
                AppError::NotFound(_) => AppError::NotFound("Parent location".to_string()),
                other => other,
            })?;
            if parent.business_id != current.business_id {
                return Err(AppError::field(
                    "parent_location_id",
                    "Parent location must belong to the same business",
                ));
            }
        }

        let location = sqlx::query_as::<_, StockLocation>(&format!(
            r#"
            UPDATE stock_locations SET
                location_code = COALESCE($2, location_code),
                location_name = COALESCE($3, location_name),
                responsible_user_id = COALESCE($4, responsible_user_id),
                parent_location_id = COALESCE($5, parent_location_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            LOCATION_COLUMNS
        ))
        .bind(location_id)
        .bind(&input.location_code)
        .bind(&input.location_name)
        .bind(input.responsible_user_id)
        .bind(input.parent_location_id)
        .fetch_one(&self.db)
        .await?;

        Ok(location)
    }

    pub async fn delete_location(&self, location_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let location = sqlx::query_as::<_, StockLocation>(&format!(
            "SELECT {} FROM stock_locations WHERE id = $1 FOR UPDATE",
            LOCATION_COLUMNS
        ))
        .bind(location_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock location".to_string()))?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(business_lock_key(location.business_id))
            .execute(&mut *tx)
            .await?;

        if location.is_main {
            let others = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM stock_locations WHERE business_id = $1 AND id <> $2",
            )
            .bind(location.business_id)
            .bind(location_id)
            .fetch_one(&mut *tx)
            .await?;

            if others > 0 {
                return Err(AppError::InvalidStateTransition(
                    "The main location cannot be deleted while the business has other locations"
                        .to_string(),
                ));
            }
        }

        let stocked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM stocks WHERE location_id = $1 AND quantity <> 0)",
        )
        .bind(location_id)
        .fetch_one(&mut *tx)
        .await?;

        if stocked {
            return Err(AppError::InvalidStateTransition(
                "Location still holds stock".to_string(),
            ));
        }

        let referenced = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM stock_locations WHERE parent_location_id = $1)
                OR EXISTS(SELECT 1 FROM stock_transfers
                          WHERE source_location_id = $1 OR destination_location_id = $1)
                OR EXISTS(SELECT 1 FROM customer_bills WHERE location_id = $1)
                OR EXISTS(SELECT 1 FROM supplier_bills WHERE location_id = $1)
            "#,
        )
        .bind(location_id)
        .fetch_one(&mut *tx)
        .await?;

        if referenced {
            return Err(AppError::Conflict(
                "Location is referenced by other locations, transfers or bills".to_string(),
            ));
        }

        sqlx::query("DELETE FROM stocks WHERE location_id = $1")
            .bind(location_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM stock_locations WHERE id = $1")
            .bind(location_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(%location_id, "stock location deleted");
        Ok(())
    }
}
