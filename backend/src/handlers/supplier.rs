//! Supplier handlers

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use shared::ApiResponse;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{CurrentUser, Path, ValidatedJson};
use crate::services::supplier::{
    CreateSupplierInput, Supplier, SupplierOption, UpdateSupplierInput,
};
use crate::services::SupplierService;
use crate::AppState;

pub async fn create_supplier(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    ValidatedJson(input): ValidatedJson<CreateSupplierInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Supplier>>)> {
    let supplier = SupplierService::new(state.db).create_supplier(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Supplier created successfully", supplier)),
    ))
}

pub async fn list_suppliers(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<Supplier>>>> {
    let suppliers = SupplierService::new(state.db).list_suppliers().await?;
    Ok(Json(ApiResponse::list(suppliers)))
}

/// `{id, supplier_name}` pairs for select inputs
pub async fn supplier_dropdown(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<SupplierOption>>>> {
    let options = SupplierService::new(state.db).supplier_dropdown().await?;
    Ok(Json(ApiResponse::new(options)))
}

pub async fn get_supplier(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(supplier_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Supplier>>> {
    let supplier = SupplierService::new(state.db).get_supplier(supplier_id).await?;
    Ok(Json(ApiResponse::new(supplier)))
}

pub async fn update_supplier(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(supplier_id): Path<Uuid>,
    ValidatedJson(input): ValidatedJson<UpdateSupplierInput>,
) -> AppResult<Json<ApiResponse<Supplier>>> {
    let supplier = SupplierService::new(state.db)
        .update_supplier(supplier_id, input)
        .await?;
    Ok(Json(ApiResponse::with_message("Supplier updated successfully", supplier)))
}

pub async fn delete_supplier(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(supplier_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    SupplierService::new(state.db).delete_supplier(supplier_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
