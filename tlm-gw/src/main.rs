//! tlm-gw - search gateway for the tier list maker
//!
//! Holds the upstream API credentials so clients never see them.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};

use tlm_common::config::load_config;
use tlm_common::logging::init_tracing;
use tlm_gw::config::{Args, GatewaySettings};
use tlm_gw::sources::SourceRegistry;
use tlm_gw::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let loaded = load_config(args.config.as_deref()).context("Failed to load configuration")?;

    init_tracing(&format!("{},tower_http=info", loaded.config.logging.level));

    info!(
        "Starting tlm-gw v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    loaded.log_source();
    let toml = loaded.config;

    let settings = GatewaySettings::resolve(args, &toml);
    info!("Credentials: {:?}", settings.credentials);
    if settings.credentials.igdb_client_id.is_none()
        || settings.credentials.igdb_client_secret.is_none()
    {
        warn!("IGDB credentials missing; game searches will fail");
    }
    if settings.credentials.google_books_api_key.is_none() {
        warn!("Google Books API key missing; book searches will fail");
    }

    let registry =
        SourceRegistry::from_settings(&settings).context("Failed to build HTTP client")?;
    let app = build_router(AppState::new(registry));

    let addr = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("tlm-gw listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
