use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tastemap::api;
use tastemap::config::{Config, DatabaseBackend};
use tastemap::seed;
use tastemap::storage::{CachedStorage, PostgresStorage, SqliteStorage, Storage};
use tastemap::VisitLedger;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tastemap=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize storage
    let backend: Arc<dyn Storage> = match config.database.backend {
        DatabaseBackend::Sqlite => {
            info!("Using SQLite storage: {}", config.database.url);
            Arc::new(
                SqliteStorage::new(&config.database.url, config.database.max_connections).await?,
            )
        }
        DatabaseBackend::Postgres => {
            info!("Using PostgreSQL storage: {}", config.database.url);
            Arc::new(
                PostgresStorage::new(&config.database.url, config.database.max_connections)
                    .await?,
            )
        }
    };

    let storage: Arc<dyn Storage> = Arc::new(CachedStorage::new(
        backend,
        config.cache.max_entries,
        config.cache.ttl_secs,
    ));

    info!("Initializing database...");
    storage.init().await?;
    info!("Database initialized successfully");

    if config.seed_on_startup {
        match seed::seed_if_empty(storage.as_ref()).await? {
            Some(count) => info!("Seeded {} countries into empty database", count),
            None => info!("Country reference data already present"),
        }
    }

    let ledger = Arc::new(VisitLedger::new(storage));
    let app = api::create_api_router(ledger, &config.cors);

    let addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 API server listening on http://{}/api", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
