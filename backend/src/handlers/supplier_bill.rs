//! Supplier bill handlers

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use shared::{ApiResponse, UserRole};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{CurrentUser, Path, ValidatedJson};
use crate::services::supplier_bill::{CreateSupplierBillInput, SupplierBill, SupplierBillDetail};
use crate::services::SupplierBillService;
use crate::AppState;

pub async fn create_supplier_bill(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ValidatedJson(input): ValidatedJson<CreateSupplierBillInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<SupplierBillDetail>>)> {
    let user = current_user.0;
    user.require(UserRole::can_manage_stock, "record supplier bills")?;
    let bill = SupplierBillService::new(state.db)
        .create_supplier_bill(input, &user)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Supplier bill created successfully", bill)),
    ))
}

pub async fn list_supplier_bills(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<SupplierBill>>>> {
    let bills = SupplierBillService::new(state.db).list_supplier_bills().await?;
    Ok(Json(ApiResponse::list(bills)))
}

pub async fn get_supplier_bill(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(bill_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SupplierBillDetail>>> {
    let bill = SupplierBillService::new(state.db).get_supplier_bill(bill_id).await?;
    Ok(Json(ApiResponse::new(bill)))
}
