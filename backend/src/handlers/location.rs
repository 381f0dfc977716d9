//! Stock location handlers

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use shared::ApiResponse;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{CurrentUser, Path, ValidatedJson};
use crate::services::location::{
    CreateLocationInput, LocationOption, StockLocation, UpdateLocationInput,
};
use crate::services::LocationService;
use crate::AppState;

pub async fn create_location(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    ValidatedJson(input): ValidatedJson<CreateLocationInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<StockLocation>>)> {
    let location = LocationService::new(state.db).create_location(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Stock location created successfully", location)),
    ))
}

pub async fn list_locations(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<StockLocation>>>> {
    let locations = LocationService::new(state.db).list_locations().await?;
    Ok(Json(ApiResponse::list(locations)))
}

pub async fn location_dropdown(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<LocationOption>>>> {
    let options = LocationService::new(state.db).location_dropdown().await?;
    Ok(Json(ApiResponse::new(options)))
}

pub async fn list_main_locations(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<StockLocation>>>> {
    let locations = LocationService::new(state.db).list_main_locations().await?;
    Ok(Json(ApiResponse::list(locations)))
}

pub async fn main_location_for_business(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(business_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<StockLocation>>> {
    let location = LocationService::new(state.db)
        .main_location_for_business(business_id)
        .await?;
    Ok(Json(ApiResponse::new(location)))
}

pub async fn get_location(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(location_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<StockLocation>>> {
    let location = LocationService::new(state.db).get_location(location_id).await?;
    Ok(Json(ApiResponse::new(location)))
}

pub async fn update_location(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(location_id): Path<Uuid>,
    ValidatedJson(input): ValidatedJson<UpdateLocationInput>,
) -> AppResult<Json<ApiResponse<StockLocation>>> {
    let location = LocationService::new(state.db)
        .update_location(location_id, input)
        .await?;
    Ok(Json(ApiResponse::with_message("Stock location updated successfully", location)))
}

pub async fn delete_location(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(location_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    LocationService::new(state.db).delete_location(location_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
