//! Murmur server: chat, presence, and call signalling.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use murmur_api::{AppState, build_app};
use murmur_core::config::{AppConfig, DatabaseBackend};
use murmur_core::error::AppError;
use murmur_database::repositories::postgres_stores;
use murmur_database::{DatabasePool, MemoryStore, Stores};
use murmur_realtime::MemoryPubSub;

#[tokio::main]
async fn main() {
    let env = std::env::var("MURMUR_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Murmur v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Stores ───────────────────────────────────────────
    let (stores, db_pool) = match config.database.backend {
        DatabaseBackend::Postgres => {
            let pool = DatabasePool::connect(&config.database).await?;
            if config.database.run_migrations {
                tracing::info!("Running database migrations...");
                murmur_database::migration::run_migrations(pool.pool()).await?;
            }
            (postgres_stores(pool.pool().clone()), Some(pool))
        }
        DatabaseBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            (Stores::from_single(Arc::new(MemoryStore::new())), None)
        }
    };

    // ── Step 2: Realtime engine and services ─────────────────────
    let pubsub = Arc::new(MemoryPubSub::new(config.realtime.channel_buffer_size));
    let mut state = AppState::new(config.clone(), stores, pubsub);
    if let Some(pool) = &db_pool {
        state = state.with_database(pool.clone());
    }
    let engine = state.realtime.clone();

    // ── Step 3: HTTP server ──────────────────────────────────────
    let app = build_app(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(addr = %addr, "Murmur server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 4: Drain background work ────────────────────────────
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    if tokio::time::timeout(grace, engine.shutdown()).await.is_err() {
        tracing::warn!(grace_seconds = grace.as_secs(), "Background tasks still running at shutdown");
    }
    if let Some(pool) = db_pool {
        pool.close().await;
    }

    tracing::info!("Murmur server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
