//! Item handlers

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use shared::ApiResponse;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{CurrentUser, Path, ValidatedJson};
use crate::services::item::{CreateItemInput, ItemDetail};
use crate::services::ItemService;
use crate::AppState;

pub async fn create_item(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    ValidatedJson(input): ValidatedJson<CreateItemInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<ItemDetail>>)> {
    let item = ItemService::new(state.db).create_item(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Item created successfully", item)),
    ))
}

pub async fn list_items(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<ItemDetail>>>> {
    let items = ItemService::new(state.db).list_items().await?;
    Ok(Json(ApiResponse::list(items)))
}

pub async fn get_item(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ItemDetail>>> {
    let item = ItemService::new(state.db).get_item(item_id).await?;
    Ok(Json(ApiResponse::new(item)))
}
