//! Dexter REST API Server
//!
//! This binary exposes the ingestion controller over HTTP so a UI layer can
//! start, stop and reset runs and read the stored records.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use dexter_client::PokeApiClient;
use dexter_core::{DbConfig, HttpConfig, IngestConfig};
use dexter_db::RecordRepository;

use dexter_server::{AppState, Controller, ServerConfig, create_router};

/// How long shutdown waits for the active run to commit its current page.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let config = ServerConfig::parse();

    info!("Opening database...");
    let repo = RecordRepository::connect(&config.database_url, &DbConfig::default())
        .await
        .context("Failed to open database")?;
    repo.migrate().await.context("Failed to apply schema")?;
    info!("Database ready");

    let ingest_config = IngestConfig::default()
        .with_start_url(config.start_url.clone())
        .with_max_pages(config.max_pages)
        .with_concurrency(config.concurrency);
    ingest_config
        .validate()
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    let http_config = HttpConfig::default().with_timeout(Duration::from_secs(config.http_timeout));
    let client = PokeApiClient::with_config(&ingest_config.start_url, &http_config)
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    let app_state = AppState::new(client, repo, ingest_config);
    let controller = app_state.controller.clone();
    let app = create_router(app_state, &config.cors_origins);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid address")?;

    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("Starting Dexter API server on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(controller))
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM, then stop the active run and let it finish
/// its current page.
async fn shutdown_signal(controller: std::sync::Arc<Controller>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");

    if controller.stop() {
        match tokio::time::timeout(SHUTDOWN_GRACE, controller.wait()).await {
            Ok(Some(summary)) => info!(
                status = %summary.status,
                pages = summary.pages_processed,
                "Ingestion stopped"
            ),
            Ok(None) => {}
            Err(_) => warn!("Ingestion did not stop within {:?}", SHUTDOWN_GRACE),
        }
    }
}
