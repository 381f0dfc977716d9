//! Customer bill and order handlers

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use shared::{ApiResponse, FrontendInvoiceData, FrontendValidation, OrderStatus};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{CurrentUser, JsonBody, Path, Query, ValidatedJson};
use crate::services::customer_bill::{
    CustomerBill, CustomerBillDetail, OrderDetail, RecordPaymentInput,
};
use crate::services::CustomerBillService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
}

fn created(detail: CustomerBillDetail) -> (StatusCode, Json<ApiResponse<CustomerBillDetail>>) {
    let message = if detail.bill.is_order {
        "Order created successfully"
    } else {
        "Customer bill created successfully"
    };
    (StatusCode::CREATED, Json(ApiResponse::with_message(message, detail)))
}

/// Accepts both the API shape and the client invoice shape
pub async fn create_customer_bill(
    State(state): State<AppState>,
    current_user: CurrentUser,
    JsonBody(body): JsonBody<Value>,
) -> AppResult<(StatusCode, Json<ApiResponse<CustomerBillDetail>>)> {
    let detail = CustomerBillService::new(state.db)
        .create_from_json(body, &current_user.0)
        .await?;
    Ok(created(detail))
}

pub async fn create_customer_bill_from_frontend(
    State(state): State<AppState>,
    current_user: CurrentUser,
    JsonBody(data): JsonBody<FrontendInvoiceData>,
) -> AppResult<(StatusCode, Json<ApiResponse<CustomerBillDetail>>)> {
    let detail = CustomerBillService::new(state.db)
        .create_from_frontend(data, &current_user.0)
        .await?;
    Ok(created(detail))
}

/// Check client invoice data without saving
pub async fn validate_customer_bill(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    JsonBody(data): JsonBody<FrontendInvoiceData>,
) -> AppResult<Json<ApiResponse<FrontendValidation>>> {
    let validation = CustomerBillService::new(state.db).validate_frontend(&data);
    Ok(Json(ApiResponse::new(validation)))
}

pub async fn list_customer_bills(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<CustomerBill>>>> {
    let bills = CustomerBillService::new(state.db)
        .list_bills(&current_user.0)
        .await?;
    Ok(Json(ApiResponse::list(bills)))
}

pub async fn get_customer_bill(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(bill_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CustomerBillDetail>>> {
    let bill = CustomerBillService::new(state.db)
        .get_bill_for(bill_id, &current_user.0)
        .await?;
    Ok(Json(ApiResponse::new(bill)))
}

pub async fn record_payment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(bill_id): Path<Uuid>,
    ValidatedJson(input): ValidatedJson<RecordPaymentInput>,
) -> AppResult<Json<ApiResponse<CustomerBillDetail>>> {
    let bill = CustomerBillService::new(state.db)
        .record_payment(bill_id, input, &current_user.0)
        .await?;
    Ok(Json(ApiResponse::with_message("Payment recorded successfully", bill)))
}

pub async fn list_orders(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<OrderQuery>,
) -> AppResult<Json<ApiResponse<Vec<CustomerBill>>>> {
    let orders = CustomerBillService::new(state.db)
        .list_orders(query.status, &current_user.0)
        .await?;
    Ok(Json(ApiResponse::list(orders)))
}

/// Orders created by the caller
pub async fn my_orders(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<OrderQuery>,
) -> AppResult<Json<ApiResponse<Vec<CustomerBill>>>> {
    let orders = CustomerBillService::new(state.db)
        .my_orders(query.status, &current_user.0)
        .await?;
    Ok(Json(ApiResponse::list(orders)))
}

pub async fn get_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(bill_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let order = CustomerBillService::new(state.db)
        .get_order(bill_id, &current_user.0)
        .await?;
    Ok(Json(ApiResponse::new(order)))
}

pub async fn confirm_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(bill_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CustomerBillDetail>>> {
    let order = CustomerBillService::new(state.db)
        .confirm_order(bill_id, &current_user.0)
        .await?;
    Ok(Json(ApiResponse::with_message("Order confirmed successfully", order)))
}

pub async fn move_to_checking(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(bill_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CustomerBillDetail>>> {
    let order = CustomerBillService::new(state.db)
        .move_to_checking(bill_id, &current_user.0)
        .await?;
    Ok(Json(ApiResponse::with_message("Order moved to checking", order)))
}

pub async fn mark_delivered(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(bill_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CustomerBillDetail>>> {
    let order = CustomerBillService::new(state.db)
        .mark_delivered(bill_id, &current_user.0)
        .await?;
    Ok(Json(ApiResponse::with_message("Order marked as delivered", order)))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(bill_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CustomerBillDetail>>> {
    let order = CustomerBillService::new(state.db)
        .cancel_order(bill_id, &current_user.0)
        .await?;
    Ok(Json(ApiResponse::with_message("Order cancelled", order)))
}
