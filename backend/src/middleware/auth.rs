//! Authentication middleware
//!
//! JWT authentication and role checks

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::UserRole;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::auth::decode_token;
use crate::AppState;

/// Authenticated user information
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub business_id: Option<Uuid>,
}

impl AuthUser {
    /// Fail with 403 unless the user's role passes `allowed`
    pub fn require(&self, allowed: impl Fn(&UserRole) -> bool, action: &str) -> AppResult<()> {
        if allowed(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Role {} is not allowed to {}",
                self.role, action
            )))
        }
    }

    /// The user's business, required for operations that fall back to its
    /// main location
    pub fn business(&self) -> AppResult<Uuid> {
        self.business_id.ok_or_else(|| {
            AppError::InvalidStateTransition("User is not associated with a business".to_string())
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ActiveUserRow {
    email: String,
    role: UserRole,
    business_id: Option<Uuid>,
    is_active: bool,
}

/// Validates the bearer token and loads the user it names; users that were
/// deleted or deactivated after the token was issued are rejected
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, request.headers()).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> AppResult<AuthUser> {
    let token = bearer_token(headers)?;
    let claims = decode_token(token, &state.config.jwt.secret)?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user ID in token".to_string()))?;

    let row = sqlx::query_as::<_, ActiveUserRow>(
        "SELECT email, role, business_id, is_active FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

    if !row.is_active {
        return Err(AppError::Unauthorized("Account is disabled".to_string()));
    }

    Ok(AuthUser {
        user_id,
        email: row.email,
        role: row.role,
        business_id: row.business_id,
    })
}

fn bearer_token(headers: &HeaderMap) -> AppResult<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Missing or invalid Authorization header".to_string()))
}

/// Extractor for the authenticated user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}
