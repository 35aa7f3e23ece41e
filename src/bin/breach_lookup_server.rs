//! Breach Lookup Server
//!
//! Main entry point for the breach lookup HTTP service.

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use breach_lookup::{
    api::{router, AppState},
    BreachLookupConfig, SearchOrchestrator,
};

/// Default configuration path
const DEFAULT_CONFIG_PATH: &str = "config/breach_lookup.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    // API keys usually come from .env during development
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "breach_lookup=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting breach lookup server");

    // Load configuration
    let config_path =
        std::env::var("BREACH_LOOKUP_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    tracing::info!(path = %config_path, "Loading configuration");

    let config = BreachLookupConfig::load_or_default(&config_path)?;
    let addr = std::env::var("BREACH_LOOKUP_ADDR").unwrap_or_else(|_| config.server.addr.clone());

    let orchestrator = SearchOrchestrator::from_config(&config)?;
    tracing::info!(
        sources = ?orchestrator.source_names(),
        "Configuration loaded"
    );

    let app = router(AppState::new(orchestrator.clone()));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(addr = %addr, "Listening");
    tracing::info!("  POST /api/search  - Search all sources");
    tracing::info!("  GET  /health      - Liveness and configured sources");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    orchestrator.flush_sinks().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
