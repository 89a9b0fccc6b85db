//! Carbon server - latency-constrained datacenter recommendations over HTTP

use anyhow::{Context, Result};
use carbon_lib::{
    dataset::JsonFileSource,
    observability::{CarbonMetrics, StructuredLogger},
    HealthRegistry, Session,
};
use carbon_server::{api, config::ServerConfig};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = ServerConfig::load()?;
    info!(node_name = %config.node_name, dataset = %config.dataset_path, "Server configured");

    let logger = StructuredLogger::new(&config.node_name);
    logger.log_startup(SERVER_VERSION, &config.dataset_path);

    let state = Arc::new(api::AppState::new(
        HealthRegistry::new(),
        CarbonMetrics::new(),
        logger.clone(),
    ));
    state.register_components().await;

    // Build the session off the async runtime; health endpoints answer meanwhile
    let loader_state = state.clone();
    let source = JsonFileSource::new(&config.dataset_path);
    let model = config.distance_model();
    let loader = tokio::spawn(async move {
        let built = tokio::task::spawn_blocking(move || Session::load(&source, model))
            .await
            .context("Session builder panicked")?;
        match built {
            Ok(session) => {
                loader_state.install_session(session).await;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to load dataset");
                Err(anyhow::Error::new(e).context("Failed to load dataset"))
            }
        }
    });

    let server = tokio::spawn(api::serve(config.api_port, state, shutdown_signal()));

    match loader.await.context("Dataset loader task failed")? {
        Ok(()) => {}
        Err(e) => {
            logger.log_shutdown("dataset load failed");
            return Err(e);
        }
    }

    server.await.context("API server task failed")??;
    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}
