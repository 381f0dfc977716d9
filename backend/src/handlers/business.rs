//! Business handlers

use axum::{extract::State, http::StatusCode, Json};
use shared::ApiResponse;

use crate::error::AppResult;
use crate::middleware::{CurrentUser, ValidatedJson};
use crate::services::business::{Business, CreateBusinessInput};
use crate::services::BusinessService;
use crate::AppState;

pub async fn create_business(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    ValidatedJson(input): ValidatedJson<CreateBusinessInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Business>>)> {
    let service = BusinessService::new(state.db);
    let business = service.create_business(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Business created successfully", business)),
    ))
}

pub async fn list_businesses(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<Business>>>> {
    let service = BusinessService::new(state.db);
    Ok(Json(ApiResponse::list(service.list_businesses().await?)))
}
