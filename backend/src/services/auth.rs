//! Authentication service for user registration, login, and token management

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::{validate_password, validate_phone, BusinessType, UserRole};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
}

/// Input for registering a user account
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 3, max = 100, message = "Username must be at least 3 characters"))]
    pub username: String,

    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,

    #[validate(custom = "validate_password")]
    pub password: String,

    pub role: UserRole,

    #[validate(custom = "validate_phone")]
    pub phone_number: Option<String>,

    pub business_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub email: String,
    pub role: UserRole,
    pub business_id: Option<Uuid>,
    pub exp: i64,
    pub iat: i64,
}

/// A user as returned to clients, never carrying the password hash
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub phone_number: Option<String>,
    pub business_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BusinessSummary {
    pub id: Uuid,
    pub name: String,
    pub business_type: BusinessType,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: UserProfile,
    pub business: Option<BusinessSummary>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserProfile,
}

/// User info from database
#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    id: Uuid,
    password_hash: String,
    is_active: bool,
}

const USER_COLUMNS: &str =
    "id, username, email, role, phone_number, business_id, is_active, created_at";

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
        }
    }

    /// Register a new user account
    pub async fn register(&self, input: RegisterInput) -> AppResult<UserProfile> {
        if let Some(business_id) = input.business_id {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM businesses WHERE id = $1)",
            )
            .bind(business_id)
            .fetch_one(&self.db)
            .await?;

            if !exists {
                return Err(AppError::field("business_id", "Business does not exist"));
            }
        }

        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))",
        )
        .bind(&input.email)
        .fetch_one(&self.db)
        .await?;

        if taken {
            return Err(AppError::DuplicateEntry(
                "User with this email already exists".to_string(),
            ));
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let user = sqlx::query_as::<_, UserProfile>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, role, phone_number, business_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&input.username)
        .bind(&input.email)
        .bind(&password_hash)
        .bind(input.role)
        .bind(&input.phone_number)
        .bind(input.business_id)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "user registered");

        Ok(user)
    }

    /// Authenticate user with email and password
    pub async fn login(&self, input: LoginInput) -> AppResult<LoginResponse> {
        let credentials = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, password_hash, is_active FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(&input.email)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        let valid = verify(&input.password, &credentials.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        if !credentials.is_active {
            return Err(AppError::Unauthorized("Account is disabled".to_string()));
        }

        let user = self.find_user(credentials.id).await?;
        let access_token = self.issue_token(&user)?;

        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
            user,
        })
    }

    /// Current user with their business
    pub async fn profile(&self, user_id: Uuid) -> AppResult<ProfileResponse> {
        let user = self.find_user(user_id).await?;

        let business = match user.business_id {
            Some(business_id) => {
                sqlx::query_as::<_, BusinessSummary>(
                    "SELECT id, name, business_type FROM businesses WHERE id = $1",
                )
                .bind(business_id)
                .fetch_optional(&self.db)
                .await?
            }
            None => None,
        };

        Ok(ProfileResponse { user, business })
    }

    async fn find_user(&self, user_id: Uuid) -> AppResult<UserProfile> {
        sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    /// Sign an access token for the user
    pub fn issue_token(&self, user: &UserProfile) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            business_id: user.business_id,
            exp: (now + Duration::seconds(self.access_token_expiry)).timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }
}

/// Decode and validate an HS256 access token
pub fn decode_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}
