//! # Inventory Server
//!
//! ```text
//! load config ─► tracing ─► open store ─► probe ─► users ─► bind ─► serve
//!                                           │                 │
//!                                           └──── fail ───────┴──► exit 1
//! ```
//!
//! Ctrl-C or SIGTERM drains in-flight requests, closes the pool and
//! exits 0.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use ferreteria_db::Database;
use inventory_server::services::{load_authenticator, HealthService};
use inventory_server::telemetry::init_tracing;
use inventory_server::{build_router, AppState, ServerConfig};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // tracing may not be up yet
            eprintln!("inventory-server: {e:#}");
            error!(error = %format!("{e:#}"), "Startup failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = ServerConfig::load().context("loading configuration")?;
    init_tracing(config.log.format);

    info!(
        bind = %config.bind_address(),
        path = %config.server.path,
        database = %config.database.url,
        "Starting inventory server"
    );
    if config.has_unused_db_credentials() {
        warn!("database.user / database.password are set but SQLite ignores them");
    }

    let db = Database::new(config.db_config())
        .await
        .context("opening database")?;

    HealthService::new(db.clone())
        .check()
        .await
        .context("database health probe")?;
    info!("Database probe passed");

    let authenticator = load_authenticator(&db, config.auth.seed_dev_users)
        .await
        .context("loading users")?;

    let listener = TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("binding {}", config.bind_address()))?;
    info!(addr = %config.bind_address(), "Listening");

    let state = AppState::new(db.clone(), Arc::new(authenticator), config);
    let app = build_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;

    db.close().await;
    info!("Inventory server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, starting graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, starting graceful shutdown"),
    }
}
