//! Sales area service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppResult;

#[derive(Clone)]
pub struct AreaService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Area {
    pub id: Uuid,
    pub area_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAreaInput {
    #[validate(length(min = 1, max = 100, message = "Area name must be 1-100 characters"))]
    pub area_name: String,
}

impl AreaService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_area(&self, input: CreateAreaInput) -> AppResult<Area> {
        let area = sqlx::query_as::<_, Area>(
            "INSERT INTO areas (area_name) VALUES ($1) RETURNING id, area_name, created_at",
        )
        .bind(input.area_name.trim())
        .fetch_one(&self.db)
        .await?;

        Ok(area)
    }

    pub async fn list_areas(&self) -> AppResult<Vec<Area>> {
        let areas = sqlx::query_as::<_, Area>(
            "SELECT id, area_name, created_at FROM areas ORDER BY area_name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(areas)
    }
}
