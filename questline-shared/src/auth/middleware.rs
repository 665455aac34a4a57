//! Authentication plumbing for Axum.
//!
//! The API layer validates the bearer token in a middleware layer and
//! inserts an [`AuthContext`] into the request extensions; handlers then
//! take `auth: AuthContext` as an extractor argument. Role checks happen at
//! the router boundary with an exhaustive match on [`Role`], never inside
//! business logic.
//!
//! # Example
//!
//! ```no_run
//! use questline_shared::auth::middleware::AuthContext;
//!
//! async fn protected_handler(auth: AuthContext) -> String {
//!     format!("Hello, user {}!", auth.user_id)
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::Role;

use super::jwt::Claims;

/// Authenticated identity attached to a request.
///
/// Built from validated access-token claims; everything downstream of the
/// auth layer can rely on it being present and verified.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Account role, as carried in the token
    pub role: Role,
}

impl AuthContext {
    /// Builds the context from validated token claims.
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
        }
    }

    /// True when the context belongs to an admin account.
    pub fn is_admin(&self) -> bool {
        match self.role {
            Role::Admin => true,
            Role::User => false,
        }
    }
}

/// Extracts the [`AuthContext`] placed in extensions by the auth layer.
///
/// Reaching a handler without one means the route was wired outside the
/// auth layer; that surfaces as 401 rather than a panic.
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .ok_or(AuthError::MissingCredentials)
    }
}

/// Error type for authentication failures
#[derive(Debug)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Invalid authorization header format
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Missing credentials").into_response()
            }
            AuthError::InvalidFormat(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
        }
    }
}

/// Pulls the bearer token out of the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}
