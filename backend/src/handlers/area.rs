//! Sales area handlers

use axum::{extract::State, http::StatusCode, Json};
use shared::ApiResponse;

use crate::error::AppResult;
use crate::middleware::{CurrentUser, ValidatedJson};
use crate::services::area::{Area, CreateAreaInput};
use crate::services::AreaService;
use crate::AppState;

pub async fn create_area(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    ValidatedJson(input): ValidatedJson<CreateAreaInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Area>>)> {
    let area = AreaService::new(state.db).create_area(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Area created successfully", area)),
    ))
}

pub async fn list_areas(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<Area>>>> {
    let areas = AreaService::new(state.db).list_areas().await?;
    Ok(Json(ApiResponse::list(areas)))
}
