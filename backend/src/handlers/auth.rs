//! Authentication handlers

use axum::{extract::State, http::StatusCode, Json};
use shared::ApiResponse;

use crate::error::AppResult;
use crate::middleware::{CurrentUser, ValidatedJson};
use crate::services::auth::{LoginInput, LoginResponse, ProfileResponse, RegisterInput, UserProfile};
use crate::services::AuthService;
use crate::AppState;

/// Register a user account
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<RegisterInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserProfile>>)> {
    let service = AuthService::new(state.db, &state.config);
    let user = service.register(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("User registered successfully", user)),
    ))
}

/// Exchange credentials for an access token
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<LoginInput>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let service = AuthService::new(state.db, &state.config);
    let tokens = service.login(input).await?;
    Ok(Json(ApiResponse::with_message("Login successful", tokens)))
}

pub async fn profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<ProfileResponse>>> {
    let service = AuthService::new(state.db, &state.config);
    let profile = service.profile(current_user.0.user_id).await?;
    Ok(Json(ApiResponse::new(profile)))
}
