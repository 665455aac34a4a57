//! # Questline API Server
//!
//! REST backend for the Questline habit and task tracker: habits and tasks
//! earn points and coins through the ledger, coins buy rewards through the
//! exchange, and friends compare progress.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p questline-api
//! ```

use questline_api::app::{build_router, AppState};
use questline_api::config::Config;
use questline_shared::db::migrations::run_migrations;
use questline_shared::db::pool::{create_pool, DatabaseConfig};
use questline_shared::db::store::Store;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "questline_api=info,questline_shared=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Questline API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    run_migrations(&pool).await?;

    let state = AppState::new(Store::new(pool), config.clone());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!("Server listening on http://{}", config.bind_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received, exiting...");
        })
        .await?;

    Ok(())
}
