//! PostgreSQL pool for the TMS record tables.

use std::time::Duration;

use sqlx::Executor;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::{info, warn};

use tms_core::config::DatabaseConfig;
use tms_core::error::{AppError, ErrorKind};
use tms_core::result::AppResult;

/// Shared handle to the PostgreSQL pool. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Open the pool described by `config`.
    ///
    /// Every connection gets the configured `statement_timeout` so a
    /// runaway query cannot outlive the request that issued it.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let options: PgConnectOptions = config.url.parse().map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, "Invalid database URL", e)
        })?;
        let options = options.application_name(&config.application_name);

        info!(
            host = options.get_host(),
            database = options.get_database().unwrap_or("<default>"),
            max_connections = config.max_connections,
            statement_timeout_ms = config.statement_timeout_ms,
            "Opening PostgreSQL pool"
        );

        let statement_timeout = config.statement_timeout_ms;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections.min(config.max_connections))
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    if statement_timeout > 0 {
                        conn.execute(
                            format!("SET statement_timeout = {statement_timeout}").as_str(),
                        )
                        .await?;
                    }
                    Ok(())
                })
            })
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to connect to database: {e}"),
                    e,
                )
            })?;

        Ok(Self { pool })
    }

    /// Open the pool, verify it answers, and apply pending migrations when
    /// the configuration asks for it.
    pub async fn connect_and_migrate(config: &DatabaseConfig) -> AppResult<Self> {
        let db = Self::connect(config).await?;
        db.ping().await?;
        if config.run_migrations {
            crate::migration::run_migrations(db.pool()).await?;
        } else {
            warn!("Skipping migrations; schema is assumed to be current");
        }
        info!("PostgreSQL ready");
        Ok(db)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round-trip a trivial query.
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Database ping failed", e))
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}
