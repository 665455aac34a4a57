//! Error types shared by the business-logic components.
//!
//! Every fallible operation in `ledger`, `exchange`, `friends`, and
//! `progress` returns [`CoreError`]. The API layer maps each kind to an
//! HTTP status; the kinds themselves are transport-agnostic.

use thiserror::Error;

/// Business-logic error kinds.
///
/// `NotFound` carries the resource noun ("Habit", "Task", ...) so callers
/// can render "Habit not found" without owning the phrasing. `Storage`
/// wraps unexpected database failures and is deliberately opaque to
/// clients.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Resource missing, inactive, or not visible to the caller.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// State already exists or contradicts the requested change.
    #[error("{0}")]
    Conflict(String),

    /// Request is well-formed but violates a business rule.
    #[error("{0}")]
    Validation(String),

    /// Unexpected storage failure.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl CoreError {
    /// True for the kinds a client can act on (as opposed to `Storage`).
    pub fn is_business(&self) -> bool {
        !matches!(self, CoreError::Storage(_))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
