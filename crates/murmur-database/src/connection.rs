//! PostgreSQL pool for the Postgres store backend.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::{info, warn};

use murmur_core::config::DatabaseConfig;
use murmur_core::error::{AppError, ErrorKind};
use murmur_core::result::AppResult;

/// Shared handle to the Postgres pool backing the repositories.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Open the pool described by `config`.
    ///
    /// Only the server address and database name are logged; credentials
    /// in the URL never reach the logs.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let options = connect_options(&config.url)?;
        info!(
            host = options.get_host(),
            port = options.get_port(),
            database = options.get_database().unwrap_or("<default>"),
            max_connections = config.max_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect_with(options)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to connect to database", e))?;

        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Wrap a pool opened elsewhere.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The sqlx pool the repositories run on.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round-trip a trivial query. Fails with `ServiceUnavailable` when the
    /// database cannot answer.
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| {
                warn!(error = %e, "Database ping failed");
                AppError::with_source(ErrorKind::ServiceUnavailable, "Database unavailable", e)
            })
    }

    /// Close every connection; later queries fail.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}

fn connect_options(url: &str) -> AppResult<PgConnectOptions> {
    PgConnectOptions::from_str(url)
        .map_err(|e| AppError::with_source(ErrorKind::Configuration, "Invalid database URL", e))
}
