//! Application setup and initialization
//!
//! All startup wiring lives here so main.rs stays a thin entry point and
//! integration tests can assemble the same router with swapped backends.

pub mod database;
pub mod routes;
pub mod server;

use anyhow::{Context, Result};
use folklore_core::Config;
use folklore_events::create_publisher;
use folklore_storage::create_storage;
use std::sync::Arc;

use crate::state::AppState;

/// Initialize the entire application: config validation, telemetry,
/// database, storage, queue, state and routes.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.is_production())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment,
        storage_backend = ?config.storage_backend,
        queue_backend = ?config.queue_backend,
        "Configuration loaded and validated"
    );

    let pool = database::setup_database(&config).await?;

    let storage = create_storage(&config)
        .await
        .context("Failed to initialize blob storage")?;
    let publisher = create_publisher(&config)
        .await
        .context("Failed to initialize event publisher")?;

    let state = Arc::new(AppState::new(config.clone(), pool, storage, publisher));
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
