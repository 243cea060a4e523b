//! TMS service host.
//!
//! Loads configuration, connects to PostgreSQL, wires the service catalog
//! and keeps it alive until a shutdown signal arrives.

use tracing_subscriber::{EnvFilter, fmt};

use tms_core::config::AppConfig;
use tms_core::error::AppError;
use tms_database::DatabasePool;
use tms_service::{Repositories, ServiceCatalog};

#[tokio::main]
async fn main() {
    let env = std::env::var("TMS_ENV").unwrap_or_else(|_| "development".to_string());
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

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting TMS services v{}", env!("CARGO_PKG_VERSION"));

    tracing::info!("Connecting to database...");
    let db = DatabasePool::connect_and_migrate(&config.database).await?;

    let catalog = ServiceCatalog::new(
        Repositories::postgres(&db, &config.validation),
        config.audit.clone(),
        &config.validation,
    )?;
    tracing::info!(
        audit_enabled = config.audit.enabled,
        fail_fast = config.validation.fail_fast,
        "Services initialized"
    );

    shutdown_signal().await;
    tracing::info!("Shutdown signal received");

    drop(catalog);
    db.close().await;
    tracing::info!("TMS services shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
