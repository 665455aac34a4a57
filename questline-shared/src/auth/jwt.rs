//! JWT token generation and validation.
//!
//! Tokens are signed with HS256 and carry the user's identity and role.
//! Validation checks the signature, expiration, not-before time, and that
//! the issuer is `questline`.
//!
//! # Token Types
//!
//! - **Access token**: short-lived (24h), used to authenticate API requests
//! - **Refresh token**: long-lived (30d), exchanged for new access tokens
//!
//! # Example
//!
//! ```
//! use questline_shared::auth::jwt::{create_token, validate_token, Claims, TokenType};
//! use questline_shared::models::user::Role;
//! use uuid::Uuid;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let user_id = Uuid::new_v4();
//!
//! let claims = Claims::new(user_id, Role::User, TokenType::Access);
//! let token = create_token(&claims, "your-secret-key-at-least-32-bytes")?;
//!
//! let validated = validate_token(&token, "your-secret-key-at-least-32-bytes")?;
//! assert_eq!(validated.sub, user_id);
//! # Ok(())
//! # }
//! ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::Role;

/// The `iss` claim every Questline token carries.
pub const ISSUER: &str = "questline";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Invalid issuer
    #[error("Invalid issuer: expected {ISSUER}")]
    InvalidIssuer,
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Access token (short-lived, 24 hours)
    Access,

    /// Refresh token (long-lived, 30 days)
    Refresh,
}

impl TokenType {
    /// Default expiration duration for this token type.
    pub fn default_expiration(&self) -> Duration {
        match self {
            TokenType::Access => Duration::hours(24),
            TokenType::Refresh => Duration::days(30),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// JWT claims.
///
/// Standard claims (`sub`, `iss`, `iat`, `exp`, `nbf`) plus the Questline
/// claims: the user's role at issue time and the token type. The role
/// travels in the token so the admin gate needs no database round trip; a
/// role change takes effect when the user's tokens rotate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: Uuid,

    /// Issuer - always "questline"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Account role at issue time (custom claim)
    pub role: Role,

    /// Token type (custom claim)
    pub token_type: TokenType,
}

impl Claims {
    /// Creates claims with the default expiration for the token type.
    pub fn new(user_id: Uuid, role: Role, token_type: TokenType) -> Self {
        Self::with_expiration(user_id, role, token_type, token_type.default_expiration())
    }

    /// Creates claims with a custom expiration.
    pub fn with_expiration(
        user_id: Uuid,
        role: Role,
        token_type: TokenType,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
            role,
            token_type,
        }
    }

    /// Checks if the token has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// An access/refresh token pair, issued at registration and login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues a fresh access/refresh pair for a user.
pub fn issue_token_pair(user_id: Uuid, role: Role, secret: &str) -> Result<TokenPair, JwtError> {
    let access = Claims::new(user_id, role, TokenType::Access);
    let refresh = Claims::new(user_id, role, TokenType::Refresh);

    Ok(TokenPair {
        access_token: create_token(&access, secret)?,
        refresh_token: create_token(&refresh, secret)?,
    })
}

/// Creates a JWT token from claims, signed with HS256.
///
/// The secret should be at least 32 bytes; the server refuses to start with
/// a shorter one.
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a JWT token and extracts its claims.
///
/// Verifies the signature, expiration, not-before time, and issuer.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Validates a token and checks it's an access token.
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != TokenType::Access {
        return Err(JwtError::ValidationError(
            "Expected access token, got refresh token".to_string(),
        ));
    }

    Ok(claims)
}

/// Validates a token and checks it's a refresh token.
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != TokenType::Refresh {
        return Err(JwtError::ValidationError(
            "Expected refresh token, got access token".to_string(),
        ));
    }

    Ok(claims)
}

/// Exchanges a valid refresh token for a new access token.
///
/// The new token carries the same user id and role as the refresh token.
pub fn refresh_access_token(refresh_token: &str, secret: &str) -> Result<String, JwtError> {
    let refresh_claims = validate_refresh_token(refresh_token, secret)?;

    let access_claims = Claims::new(refresh_claims.sub, refresh_claims.role, TokenType::Access);

    create_token(&access_claims, secret)
}
