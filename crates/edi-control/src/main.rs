//! EDI control service binary.
//!
//! Runs the control plane for model deployments in enclaves.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use edi_control::probe::create_probe;
use edi_control::registry::create_registry;
use edi_control::resolver::create_resolver;
use edi_control::{api, ControlConfig, DeploymentService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("edi_control=info".parse()?))
        .init();

    info!("EDI control service starting");

    // Load configuration
    let config = ControlConfig::load().unwrap_or_else(|e| {
        info!(error = %e, "failed to load config, using defaults");
        ControlConfig::default()
    });

    info!(
        listen_addr = %config.server.listen_addr,
        registry = ?config.registry.backend,
        resolver = %config.resolver.url,
        "configuration loaded"
    );

    let registry = create_registry(&config.registry).await?;
    info!("deployment registry initialised");

    let resolver = create_resolver(&config.resolver)?;
    let probe = create_probe(&config.probe)?;
    info!("collaborator clients initialised");

    let service = Arc::new(DeploymentService::new(
        registry,
        resolver,
        probe,
        config.service_timeouts(),
    ));

    let state = api::AppState {
        service,
        request_timeout: Duration::from_secs(config.server.request_timeout_secs),
    };
    let app = api::router(state);

    let listener = TcpListener::bind(config.server.listen_addr).await?;
    info!(listen_addr = %config.server.listen_addr, "API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("EDI control service stopped");

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
