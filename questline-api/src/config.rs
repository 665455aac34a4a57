//! Configuration management for the API server.
//!
//! Loads configuration from environment variables into a typed struct and
//! fails fast on anything missing or malformed.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
//! - `API_HOST`: host to bind to (default: 0.0.0.0)
//! - `API_PORT`: port to bind to (default: 8080)
//! - `JWT_SECRET`: secret key for JWT signing, at least 32 bytes (required)
//! - `CORS_ORIGINS`: comma-separated allowed origins, or `*` (default: `*`)
//! - `RUST_LOG`: log filter (default: info)
//!
//! # Example
//!
//! ```no_run
//! use questline_api::config::Config;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! println!("Server will listen on {}", config.bind_address());
//! # Ok(())
//! # }
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `["*"]` means permissive (development)
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Must be kept secret and at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a numeric value
    /// doesn't parse, or the JWT secret is shorter than 32 bytes.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("API_PORT must be a valid port number")?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a number")?;

        let jwt_secret =
            env::var("JWT_SECRET").context("JWT_SECRET environment variable is required")?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
