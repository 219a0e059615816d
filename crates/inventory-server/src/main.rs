//! Pod inventory service
//!
//! Periodically scans the configured cluster instances and serves the latest
//! pod snapshot to the dashboard.

use anyhow::{Context, Result};
use inventory_lib::{
    health::{components, HealthRegistry},
    InstanceScanner, KubeConnectorFactory, RefreshCoordinator, SnapshotStore, StructuredLogger,
};
use inventory_server::{
    api, config::ServerConfig, scheduler::RefreshScheduler, SERVICE_NAME, SERVICE_VERSION,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting pod inventory service");

    let config = ServerConfig::load().context("failed to load configuration")?;
    let instances = config.instance_configs();
    info!(
        instances = instances.len(),
        listen_port = config.listen_port,
        "Service configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::REFRESH_COORDINATOR).await;
    health_registry.register(components::SCHEDULER).await;

    let logger = StructuredLogger::new(SERVICE_NAME);
    logger.log_startup(SERVICE_VERSION, instances.len());

    let scanner_config = config.scanner_config();
    let factory = Arc::new(KubeConnectorFactory::new(
        scanner_config.connect_timeout,
        scanner_config.list_timeout,
    ));
    let scanner = Arc::new(InstanceScanner::new(factory, scanner_config));

    let coordinator = Arc::new(
        RefreshCoordinator::builder()
            .scanner(scanner)
            .store(SnapshotStore::new())
            .instances(instances)
            .max_concurrent_instances(config.max_concurrent_instances)
            .health(health_registry.clone())
            .logger(logger.clone())
            .build()
            .context("failed to build refresh coordinator")?,
    );

    let app_state = Arc::new(api::AppState::new(
        coordinator.clone(),
        health_registry.clone(),
    ));

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let scheduler = RefreshScheduler::new(
        coordinator,
        health_registry.clone(),
        config.refresh_interval(),
        config.refresh_on_startup,
    );
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_tx.subscribe()));

    health_registry.set_ready(true).await;

    let api_handle = tokio::spawn(api::serve(
        config.listen_port,
        app_state,
        shutdown_tx.subscribe(),
    ));

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for shutdown signal")?;
            logger.log_shutdown("SIGINT received");
        }
        result = api_handle => {
            logger.log_shutdown("API server stopped");
            let _ = shutdown_tx.send(());
            let _ = scheduler_handle.await;
            return result
                .context("API server task panicked")?
                .context("API server failed");
        }
    }

    let _ = shutdown_tx.send(());
    let _ = scheduler_handle.await;
    info!("Shutdown complete");

    Ok(())
}
