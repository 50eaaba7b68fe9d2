//! # Resto Server Entry Point
//!
//! ## Startup Sequence
//! 1. Initialize tracing
//! 2. Load configuration (defaults → `config/<env>.toml` → `RESTO__*`)
//! 3. Open the database and run migrations
//! 4. Create the settings row with the configured exchange rate
//! 5. Purge expired sessions
//! 6. Serve until Ctrl+C / SIGTERM

use std::net::SocketAddr;

use anyhow::Context;
use tracing::{info, warn};

use resto_core::ExchangeRate;
use resto_db::{Database, DbConfig};
use resto_server::{build_router, init_tracing, AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load().context("loading configuration")?;
    info!(
        environment = %config.environment,
        address = %config.bind_address(),
        database = %config.database.path,
        "Configuration loaded"
    );

    let db_config =
        DbConfig::new(&config.database.path).max_connections(config.database.max_connections);
    let db = Database::new(db_config)
        .await
        .context("opening database")?;

    let rate = ExchangeRate::new(config.currency.exchange_rate).unwrap_or_else(|e| {
        warn!(error = %e, "Invalid configured exchange rate, using default");
        ExchangeRate::default()
    });
    let settings = db.settings().init(rate).await?;
    info!(restaurant = %settings.name, rate = settings.exchange_rate, "Settings ready");

    let purged = db.sessions().purge_expired().await?;
    if purged > 0 {
        info!(purged = purged, "Expired sessions removed");
    }

    let addr = config.bind_address();
    let app = build_router(AppState::new(db.clone(), config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
