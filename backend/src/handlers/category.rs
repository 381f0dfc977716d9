//! Category handlers

use axum::{extract::State, http::StatusCode, Json};
use shared::ApiResponse;

use crate::error::AppResult;
use crate::middleware::{CurrentUser, ValidatedJson};
use crate::services::category::{Category, CreateCategoryInput};
use crate::services::CategoryService;
use crate::AppState;

pub async fn create_category(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    ValidatedJson(input): ValidatedJson<CreateCategoryInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Category>>)> {
    let category = CategoryService::new(state.db).create_category(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Category created successfully", category)),
    ))
}

pub async fn list_categories(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<Category>>>> {
    let categories = CategoryService::new(state.db).list_categories().await?;
    Ok(Json(ApiResponse::list(categories)))
}
