use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use grouptrek_api::app::{create_app, AppState};
use grouptrek_api::config::{Config, StorageBackend};
use grouptrek_api::jobs::{ExpiredGroupSweepJob, JobScheduler};
use grouptrek_api::middleware::{init_metrics, logging::init_logging};
use persistence::{MemoryStore, PgStore, RecordStore};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load()?;

    // Initialize logging and metrics
    init_logging(&config.logging)?;
    init_metrics()?;

    info!("Starting Group Trek API v{}", env!("CARGO_PKG_VERSION"));

    let store = build_store(&config).await?;
    info!(backend = store.backend_name(), "Record store ready");

    let addr = config.socket_addr()?;
    let state = AppState::new(config, store);

    // Background jobs
    let mut scheduler = JobScheduler::new();
    scheduler.register(ExpiredGroupSweepJob::new(
        state.sessions.clone(),
        state.config.groups.sweep_interval_minutes,
    ));
    scheduler.start();

    let app = create_app(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;

    info!("Server stopped");
    Ok(())
}

async fn build_store(config: &Config) -> Result<Arc<dyn RecordStore>> {
    match config.storage.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StorageBackend::Postgres => {
            let db_config: persistence::db::DatabaseConfig = (&config.database).into();
            let pool = persistence::db::create_pool(&db_config).await?;

            info!("Running database migrations...");
            persistence::db::run_migrations(&pool).await?;
            info!("Migrations completed");

            Ok(Arc::new(PgStore::new(pool)))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}
