//! footprintd - job footprint service for cluster monitoring views

use anyhow::{Context, Result};
use footprint_lib::{
    health::{components, HealthRegistry},
    observability::{FootprintMetrics, StructuredLogger},
    ClusterRegistry, FootprintRefresherBuilder,
};
use footprintd::{api, config::DaemonConfig};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = DaemonConfig::load()?;
    info!(
        node_name = %config.node_name,
        cluster_config = %config.cluster_config.display(),
        "footprintd configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::CLUSTER_CONFIG).await;
    health_registry.register(components::REFRESHER).await;
    health_registry.register(components::API).await;

    let clusters = match ClusterRegistry::load(&config.cluster_config) {
        Ok(clusters) if clusters.is_empty() => {
            health_registry
                .set_degraded(components::CLUSTER_CONFIG, "No cluster documents found")
                .await;
            clusters
        }
        Ok(clusters) => clusters,
        Err(e) => {
            health_registry
                .set_unhealthy(components::CLUSTER_CONFIG, e.to_string())
                .await;
            return Err(e).with_context(|| {
                format!(
                    "Failed to load cluster configuration from {}",
                    config.cluster_config.display()
                )
            });
        }
    };
    let clusters = Arc::new(clusters);

    let metrics = FootprintMetrics::new();
    let logger = StructuredLogger::new(&config.node_name);
    logger.log_startup(SERVICE_VERSION, clusters.len());

    let (refresher, updates_tx, report_rx) = FootprintRefresherBuilder::new()
        .registry(clusters.clone())
        .buffer_size(config.update_buffer)
        .node_name(&config.node_name)
        .health(health_registry.clone())
        .build()?;

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let refresher_handle = tokio::spawn(refresher.run(shutdown_rx));

    let app_state = Arc::new(
        api::AppState::new(health_registry.clone(), metrics, logger.clone(), clusters)
            .with_default_bins(config.default_bins)
            .with_refresher(updates_tx, report_rx),
    );

    health_registry.set_ready(true).await;

    let api_health = health_registry.clone();
    let port = config.port;
    tokio::spawn(async move {
        if let Err(e) = api::serve(port, app_state).await {
            error!(error = %e, "API server stopped");
            api_health.set_unhealthy(components::API, e.to_string()).await;
        }
    });

    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");

    let _ = shutdown_tx.send(());
    refresher_handle.await?;

    Ok(())
}
