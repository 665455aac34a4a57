//! Error handling for the API server.
//!
//! [`ApiError`] is the single error type handlers return; it maps every
//! business-error kind from the shared crate plus HTTP-boundary failures to
//! a status code and JSON body. All handlers return
//! `Result<T, ApiError>`, which converts automatically via `IntoResponse`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use questline_shared::auth::jwt::JwtError;
use questline_shared::auth::middleware::AuthError;
use questline_shared::auth::password::PasswordError;
use questline_shared::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400) - business rule violations
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - e.g., duplicate email or friendship
    Conflict(String),

    /// Unprocessable entity (422) - request-shape validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Business-error kinds from the shared components map one-to-one onto
/// HTTP statuses; this is the whole mapping.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(_) => ApiError::NotFound(err.to_string()),
            CoreError::Conflict(msg) => ApiError::Conflict(msg),
            CoreError::Validation(msg) => ApiError::BadRequest(msg),
            CoreError::Storage(e) => ApiError::from(e),
        }
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                // Unique constraint violations surface as conflicts
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("email") || constraint.contains("username") {
                        return ApiError::Conflict("Email or username already exists".to_string());
                    }
                    return ApiError::Conflict(format!("Constraint violation: {}", constraint));
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert request-shape validation failures to 422 with field details
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();

        ApiError::ValidationError(details)
    }
}

/// Convert auth errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => {
                ApiError::Unauthorized("Missing credentials".to_string())
            }
            AuthError::InvalidFormat(msg) => ApiError::BadRequest(msg),
            AuthError::InvalidToken(msg) => ApiError::Unauthorized(msg),
        }
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer => ApiError::Unauthorized("Invalid token issuer".to_string()),
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("User not found".to_string());
        assert_eq!(err.to_string(), "Not found: User not found");
    }

    #[test]
    fn test_core_error_mapping() {
        let err = ApiError::from(CoreError::NotFound("Habit"));
        assert!(matches!(err, ApiError::NotFound(ref msg) if msg == "Habit not found"));

        let err = ApiError::from(CoreError::Conflict("Friendship request already exists".into()));
        assert!(matches!(err, ApiError::Conflict(_)));

        let err = ApiError::from(CoreError::Validation("insufficient balance".into()));
        assert!(matches!(err, ApiError::BadRequest(ref msg) if msg == "insufficient balance"));

        let err = ApiError::from(CoreError::Storage(sqlx::Error::PoolClosed));
        assert!(matches!(err, ApiError::InternalError(_)));
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                ApiError::ValidationError(vec![]),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::InternalError("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_validation_error_details() {
        let errors = vec![
            ValidationErrorDetail {
                field: "email".to_string(),
                message: "Invalid email format".to_string(),
            },
            ValidationErrorDetail {
                field: "password".to_string(),
                message: "Password too short".to_string(),
            },
        ];

        let err = ApiError::ValidationError(errors);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");
    }
}
