//! Database migration runner.
//!
//! Migrations live in the `migrations/` directory at the workspace root and
//! are embedded into the binary at compile time via [`sqlx::migrate!`], so a
//! deployed server can bring its schema up to date without shipping SQL
//! files alongside it.
//!
//! # Example
//!
//! ```no_run
//! use questline_shared::db::migrations::run_migrations;
//! use questline_shared::db::pool::{create_pool, DatabaseConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(DatabaseConfig {
//!     url: std::env::var("DATABASE_URL")?,
//!     ..Default::default()
//! })
//! .await?;
//!
//! run_migrations(&pool).await?;
//! # Ok(())
//! # }
//! ```

use sqlx::{migrate::MigrateDatabase, postgres::PgPool, Postgres};
use tracing::{debug, info, warn};

/// Runs all pending database migrations.
///
/// Each migration runs inside a transaction where Postgres allows it; a
/// failing migration is rolled back and reported.
///
/// # Errors
///
/// Returns an error if a migration fails to execute or the connection is
/// lost mid-run.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Starting database migrations");

    let migrations = sqlx::migrate!("../migrations");

    match migrations.run(pool).await {
        Ok(()) => {
            info!("All database migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}

/// Creates the database if it doesn't exist.
///
/// Useful for development and test setups; production databases should be
/// provisioned ahead of time.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if !Postgres::database_exists(database_url).await? {
        info!("Database does not exist, creating it");
        Postgres::create_database(database_url).await?;
        info!("Database created successfully");
    } else {
        debug!("Database already exists");
    }

    Ok(())
}
