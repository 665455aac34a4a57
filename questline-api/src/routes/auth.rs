//! Authentication endpoints.
//!
//! # Endpoints
//!
//! - `POST /v1/auth/register` - Register new user
//! - `POST /v1/auth/login` - Login and get tokens
//! - `POST /v1/auth/refresh` - Refresh access token
//! - `GET /v1/auth/me` - Current user's private profile

use axum::{extract::State, http::StatusCode, Json};
use questline_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::user::{CreateUser, PrivateProfile, User},
};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Public handle, 3-30 chars of letters, digits, and underscores
    #[validate(
        length(min = 3, max = 30, message = "Username must be 3-30 characters"),
        custom(function = "validate_username_charset")
    )]
    pub username: String,

    /// Password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(max = 50, message = "First name must be at most 50 characters"))]
    #[serde(default, rename = "firstName")]
    pub first_name: Option<String>,

    #[validate(length(max = 50, message = "Last name must be at most 50 characters"))]
    #[serde(default, rename = "lastName")]
    pub last_name: Option<String>,
}

/// Usernames are a URL-safe charset; length is validated separately.
pub(crate) fn validate_username_charset(username: &str) -> Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Ok(())
    } else {
        Err(ValidationError::new("username_charset")
            .with_message("Username may only contain letters, digits, and underscores".into()))
    }
}

/// Registration / login response: the profile plus a token pair.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: PrivateProfile,
    #[serde(flatten)]
    pub tokens: jwt::TokenPair,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,
}

/// Registers a new user.
///
/// Creates the account with default role, zero balances, and level 1, then
/// issues a token pair.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: request shape invalid
/// - `409 Conflict`: email or username already taken
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    // Friendly pre-check; the unique constraints stay authoritative under
    // concurrent registration and map to the same conflict.
    if User::email_or_username_exists(state.store.pool(), &req.email, &req.username).await? {
        return Err(ApiError::Conflict(
            "Email or username already exists".to_string(),
        ));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        state.store.pool(),
        CreateUser {
            email: req.email,
            username: req.username,
            password_hash,
            first_name: req.first_name,
            last_name: req.last_name,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    let tokens = jwt::issue_token_pair(user.id, user.role, state.jwt_secret())?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: PrivateProfile::from(user),
            tokens,
        }),
    ))
}

/// Logs a user in.
///
/// A wrong email and a wrong password produce the same 401 so the response
/// never reveals which part failed.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let user = User::find_by_email(state.store.pool(), &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    tracing::info!(user_id = %user.id, "User logged in");

    let tokens = jwt::issue_token_pair(user.id, user.role, state.jwt_secret())?;

    Ok(Json(AuthResponse {
        user: PrivateProfile::from(user),
        tokens,
    }))
}

/// Exchanges a refresh token for a new access token.
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access_token }))
}

/// The authenticated user's own (private) profile.
pub async fn me(State(state): State<AppState>, auth: AuthContext) -> ApiResult<Json<PrivateProfile>> {
    let user = User::find_by_id(state.store.pool(), auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(PrivateProfile::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let req = RegisterRequest {
            email: "ada@example.com".to_string(),
            username: "ada_lovelace".to_string(),
            password: "longenough".to_string(),
            first_name: None,
            last_name: None,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_register_rejects_bad_email() {
        let req = RegisterRequest {
            email: "not-an-email".to_string(),
            username: "ada".to_string(),
            password: "longenough".to_string(),
            first_name: None,
            last_name: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_register_rejects_short_password() {
        let req = RegisterRequest {
            email: "ada@example.com".to_string(),
            username: "ada".to_string(),
            password: "short".to_string(),
            first_name: None,
            last_name: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_username_charset() {
        assert!(validate_username_charset("ada_lovelace42").is_ok());
        assert!(validate_username_charset("ada lovelace").is_err());
        assert!(validate_username_charset("ada-lovelace").is_err());
        assert!(validate_username_charset("ada@home").is_err());
    }

    #[test]
    fn test_username_length_bounds() {
        let mut req = RegisterRequest {
            email: "ada@example.com".to_string(),
            username: "ab".to_string(),
            password: "longenough".to_string(),
            first_name: None,
            last_name: None,
        };
        assert!(req.validate().is_err());

        req.username = "a".repeat(31);
        assert!(req.validate().is_err());
    }
}
