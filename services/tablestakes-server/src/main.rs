//! Tablestakes API Server
//!
//! # Usage
//!
//! ```bash
//! # Against PostgreSQL
//! DATABASE_URL=postgresql://localhost/tablestakes tablestakes-server
//!
//! # Fully in-memory, no database required
//! tablestakes-server --in-memory
//! ```

mod config;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tablestakes_api::{create_router, AppState};
use tablestakes_store::{Database, Store};

use crate::config::ServerConfig;

/// Tablestakes API Server - poker session tracking backend
#[derive(Parser, Debug)]
#[command(name = "tablestakes-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Host to bind to
    #[arg(long, env = "TABLESTAKES_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "TABLESTAKES_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TABLESTAKES_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log format (json, pretty)
    #[arg(long, env = "TABLESTAKES_LOG_FORMAT", default_value = "pretty")]
    log_format: String,

    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Run against the in-memory store instead of PostgreSQL
    #[arg(long, env = "TABLESTAKES_IN_MEMORY")]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut server_config = ServerConfig::default();
    if let Some(host) = args.host {
        server_config.server.host = host;
    }
    if let Some(port) = args.port {
        server_config.server.port = port;
    }
    if let Some(db_url) = args.database_url {
        server_config.database.postgres_url = db_url;
    }
    server_config.logging.level = args.log_level;
    server_config.logging.format = args.log_format;

    init_logging(&server_config.logging);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Tablestakes API Server"
    );

    let store = if args.in_memory {
        tracing::warn!("Running with in-memory store; nothing will be persisted");
        Store::memory()
    } else {
        let db = Database::connect(&server_config.database).await?;
        db.migrate().await?;
        if !db.health_check().await {
            anyhow::bail!("Database health check failed");
        }
        Store::postgres(db.pool)
    };

    let state = Arc::new(AppState::new(store));
    let app = create_router(state);

    let addr = server_config.server.socket_addr();
    tracing::info!(
        host = %server_config.server.host,
        port = %server_config.server.port,
        "Server listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(server_config.server.shutdown_timeout()))
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn init_logging(config: &config::LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            subscriber.with(fmt::layer().json().with_target(true)).init();
        }
        _ => {
            subscriber
                .with(fmt::layer().pretty().with_target(true))
                .init();
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal(timeout: Duration) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    tracing::info!(
        timeout_secs = timeout.as_secs(),
        "Waiting for in-flight requests to complete..."
    );
    tokio::time::sleep(timeout).await;
}
