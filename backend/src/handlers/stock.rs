//! Stock level and stock transfer handlers

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use shared::{ApiResponse, UserRole};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{CurrentUser, Path, Query, ValidatedJson};
use crate::services::stock::{
    AddStockInput, CreateTransferInput, Stock, StockRow, StockTransfer, StockTransferDetail,
    TransferCreated,
};
use crate::services::StockService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StockQuery {
    pub location_id: Option<Uuid>,
}

pub async fn list_stocks(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<StockQuery>,
) -> AppResult<Json<ApiResponse<Vec<StockRow>>>> {
    let stocks = StockService::new(state.db).list_stocks(query.location_id).await?;
    Ok(Json(ApiResponse::list(stocks)))
}

/// Download every stock row as CSV
pub async fn export_stocks_csv(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<impl IntoResponse> {
    let csv = StockService::new(state.db).export_stocks_csv().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"stocks.csv\""),
        ],
        csv,
    ))
}

pub async fn add_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ValidatedJson(input): ValidatedJson<AddStockInput>,
) -> AppResult<Json<ApiResponse<Stock>>> {
    current_user.0.require(UserRole::can_manage_stock, "add stock")?;
    let stock = StockService::new(state.db).add_stock(input).await?;
    Ok(Json(ApiResponse::with_message("Stock added successfully", stock)))
}

pub async fn create_stock_transfer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ValidatedJson(input): ValidatedJson<CreateTransferInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<TransferCreated>>)> {
    current_user.0.require(UserRole::can_manage_stock, "transfer stock")?;
    let created = StockService::new(state.db)
        .create_stock_transfer(input, current_user.0.user_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Stock transfer completed successfully", created)),
    ))
}

pub async fn list_transfers(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<StockTransfer>>>> {
    let transfers = StockService::new(state.db).list_transfers().await?;
    Ok(Json(ApiResponse::list(transfers)))
}

pub async fn get_transfer(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(transfer_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<StockTransferDetail>>> {
    let transfer = StockService::new(state.db).get_transfer(transfer_id).await?;
    Ok(Json(ApiResponse::new(transfer)))
}
