//! Customer handlers

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use shared::ApiResponse;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{CurrentUser, Path, ValidatedJson};
use crate::services::customer::{CreateCustomerInput, Customer};
use crate::services::CustomerService;
use crate::AppState;

pub async fn create_customer(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    ValidatedJson(input): ValidatedJson<CreateCustomerInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Customer>>)> {
    let customer = CustomerService::new(state.db).create_customer(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Customer created successfully", customer)),
    ))
}

pub async fn list_customers(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<Customer>>>> {
    let customers = CustomerService::new(state.db).list_customers().await?;
    Ok(Json(ApiResponse::list(customers)))
}

pub async fn get_customer(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(customer_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Customer>>> {
    let customer = CustomerService::new(state.db).get_customer(customer_id).await?;
    Ok(Json(ApiResponse::new(customer)))
}
