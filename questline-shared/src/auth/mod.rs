//! Authentication utilities.
//!
//! # Modules
//!
//! - [`password`]: Argon2id password hashing and verification
//! - [`jwt`]: JWT token generation and validation
//! - [`middleware`]: the authenticated-request context for Axum
//!
//! # Security Features
//!
//! - **Password hashing**: Argon2id with 64 MB memory, 3 iterations
//! - **JWT tokens**: HS256 signing, issuer-checked, 24h access / 30d refresh
//! - **Constant-time comparison**: password verification never short-circuits
//!
//! # Example
//!
//! ```
//! use questline_shared::auth::jwt::{issue_token_pair, validate_access_token};
//! use questline_shared::auth::password::{hash_password, verify_password};
//! use questline_shared::models::user::Role;
//! use uuid::Uuid;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let hash = hash_password("user_password")?;
//! assert!(verify_password("user_password", &hash)?);
//!
//! let secret = "secret-key-that-is-at-least-32-bytes";
//! let pair = issue_token_pair(Uuid::new_v4(), Role::User, secret)?;
//! let claims = validate_access_token(&pair.access_token, secret)?;
//! assert_eq!(claims.role, Role::User);
//! # Ok(())
//! # }
//! ```

pub mod jwt;
pub mod middleware;
pub mod password;
