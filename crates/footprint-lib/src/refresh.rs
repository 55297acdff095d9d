//! Event-driven footprint recomputation
//!
//! Each completed statistics fetch is sent as a [`StatsUpdate`]; the
//! refresher recomputes that job's footprint and publishes the latest
//! [`FootprintReport`] on a watch channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

use crate::cluster::ClusterRegistry;
use crate::error::{FootprintError, Result};
use crate::footprint::{classify_job, footprint_metrics, job_samples, FootprintEntry};
use crate::health::{components, HealthRegistry};
use crate::models::{JobMetric, JobShape};
use crate::observability::{FootprintMetrics, StructuredLogger};
use crate::roofline::{job_roofline, RooflinePoint};

/// Freshly fetched node-scope statistics of one job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsUpdate {
    #[serde(default)]
    pub job_id: String,
    pub cluster: String,
    pub sub_cluster: String,
    #[serde(default)]
    pub job: JobShape,
    pub metrics: HashMap<String, JobMetric>,
}

/// Footprint of one job as of its latest statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FootprintReport {
    pub job_id: String,
    pub cluster: String,
    pub entries: Vec<FootprintEntry>,
    /// Present when the subcluster has roofline ceilings and the job
    /// reported both `flops_any` and `mem_bw`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roofline: Option<RooflinePoint>,
    pub updated_at: DateTime<Utc>,
}

/// Recomputes footprints as statistics arrive
pub struct FootprintRefresher {
    registry: Arc<ClusterRegistry>,
    updates_rx: mpsc::Receiver<StatsUpdate>,
    report_tx: watch::Sender<Option<FootprintReport>>,
    logger: StructuredLogger,
    metrics: FootprintMetrics,
    health: Option<HealthRegistry>,
}

impl FootprintRefresher {
    /// Process updates until shutdown or until every sender is dropped
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        info!(clusters = self.registry.len(), "Starting footprint refresher");

        loop {
            tokio::select! {
                update = self.updates_rx.recv() => {
                    let Some(update) = update else {
                        debug!("All update senders dropped");
                        break;
                    };
                    self.handle(update).await;
                }
                _ = shutdown.recv() => {
                    info!("Shutting down footprint refresher");
                    break;
                }
            }
        }
    }

    async fn handle(&self, update: StatsUpdate) {
        let job_id = update.job_id.clone();
        match self.recompute(update) {
            Ok(report) => {
                debug!(
                    job_id = %report.job_id,
                    entries = report.entries.len(),
                    "Published footprint report"
                );
                self.report_tx.send_replace(Some(report));
                if let Some(health) = &self.health {
                    health.set_healthy(components::REFRESHER).await;
                }
            }
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Failed to recompute footprint");
                if let Some(health) = &self.health {
                    health
                        .set_degraded(components::REFRESHER, e.to_string())
                        .await;
                }
            }
        }
    }

    /// Compute the footprint report for one update
    pub fn recompute(&self, update: StatsUpdate) -> Result<FootprintReport> {
        compute_report(&self.registry, &self.logger, &self.metrics, update)
    }
}

/// Classify the footprint metrics of one job against its cluster thresholds
pub fn compute_report(
    registry: &ClusterRegistry,
    logger: &StructuredLogger,
    metrics: &FootprintMetrics,
    update: StatsUpdate,
) -> Result<FootprintReport> {
    let names = footprint_metrics(&update.job);
    let profiles = registry.profiles(&update.cluster, &update.sub_cluster, names, &update.job)?;

    for name in names.iter().filter(|n| !profiles.contains_key(**n)) {
        logger.log_thresholds_missing(&update.cluster, &update.sub_cluster, name);
    }

    let samples = job_samples(&update.metrics, names, update.job.num_nodes);
    let entries = classify_job(&samples, &profiles);
    for entry in &entries {
        logger.log_classification(&update.cluster, entry);
    }
    metrics.record_entries(&entries);

    let roofline = registry
        .cluster(&update.cluster)?
        .sub_cluster(&update.sub_cluster)
        .and_then(|sc| job_roofline(sc, &update.metrics, update.job.num_nodes));

    Ok(FootprintReport {
        job_id: update.job_id,
        cluster: update.cluster,
        entries,
        roofline,
        updated_at: Utc::now(),
    })
}

/// Channel ends returned alongside a refresher
pub type RefresherHandles = (
    FootprintRefresher,
    mpsc::Sender<StatsUpdate>,
    watch::Receiver<Option<FootprintReport>>,
);

/// Builder for [`FootprintRefresher`]
pub struct FootprintRefresherBuilder {
    registry: Option<Arc<ClusterRegistry>>,
    buffer_size: usize,
    node_name: String,
    health: Option<HealthRegistry>,
}

impl Default for FootprintRefresherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FootprintRefresherBuilder {
    pub fn new() -> Self {
        Self {
            registry: None,
            buffer_size: 64,
            node_name: "localhost".to_string(),
            health: None,
        }
    }

    pub fn registry(mut self, registry: Arc<ClusterRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Capacity of the update channel
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    pub fn node_name(mut self, node_name: impl Into<String>) -> Self {
        self.node_name = node_name.into();
        self
    }

    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn build(self) -> Result<RefresherHandles> {
        let registry = self.registry.ok_or_else(|| {
            FootprintError::InvalidInput("refresher needs a cluster registry".to_string())
        })?;
        if self.buffer_size == 0 {
            return Err(FootprintError::InvalidInput(
                "update buffer size must be positive".to_string(),
            ));
        }

        let (updates_tx, updates_rx) = mpsc::channel(self.buffer_size);
        let (report_tx, report_rx) = watch::channel(None);

        let refresher = FootprintRefresher {
            registry,
            updates_rx,
            report_tx,
            logger: StructuredLogger::new(self.node_name),
            metrics: FootprintMetrics::new(),
            health: self.health,
        };

        Ok((refresher, updates_tx, report_rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::footprint::Severity;
    use crate::models::{MetricStatistics, Series};

    const CLUSTER: &str = r#"{
        "name": "fritz",
        "metricConfig": [
            {"name": "mem_bw", "unit": {"prefix": "G", "base": "B/s"}, "aggregation": "sum",
             "peak": 100, "normal": 60, "caution": 30, "alert": 10},
            {"name": "flops_any", "unit": {"prefix": "G", "base": "F/s"}, "aggregation": "sum",
             "peak": 100, "normal": 50, "caution": 20, "alert": 5}
        ],
        "subClusters": [{"name": "main", "topology": {"node": [0, 1, 2, 3]}}]
    }"#;

    fn registry() -> Arc<ClusterRegistry> {
        Arc::new(ClusterRegistry::from_json(CLUSTER).unwrap())
    }

    fn metric(avg: f64) -> JobMetric {
        JobMetric {
            series: vec![Series {
                hostname: "f0101".to_string(),
                statistics: Some(MetricStatistics {
                    avg,
                    min: 0.0,
                    max: avg,
                }),
                data: vec![],
            }],
            ..JobMetric::default()
        }
    }

    fn update(cluster: &str) -> StatsUpdate {
        let mut metrics = HashMap::new();
        metrics.insert("mem_bw".to_string(), metric(45.0));
        metrics.insert("flops_any".to_string(), metric(2.0));
        StatsUpdate {
            job_id: "4711".to_string(),
            cluster: cluster.to_string(),
            sub_cluster: "main".to_string(),
            job: JobShape::default(),
            metrics,
        }
    }

    #[test]
    fn test_builder_requires_registry() {
        assert!(FootprintRefresherBuilder::new().build().is_err());
        assert!(FootprintRefresherBuilder::new()
            .registry(registry())
            .buffer_size(0)
            .build()
            .is_err());
    }

    #[test]
    fn test_recompute() {
        let (refresher, _tx, _rx) = FootprintRefresherBuilder::new()
            .registry(registry())
            .build()
            .unwrap();

        let report = refresher.recompute(update("fritz")).unwrap();
        assert_eq!(report.job_id, "4711");
        // cpu_load and mem_used are not configured
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries[0].name, "flops_any");
        assert_eq!(report.entries[0].classification.color, Severity::Danger);
        assert_eq!(report.entries[1].name, "mem_bw");
        assert_eq!(report.entries[1].classification.color, Severity::Success);
        // No ceilings configured for the subcluster
        assert!(report.roofline.is_none());
    }

    #[test]
    fn test_recompute_unknown_cluster() {
        let (refresher, _tx, _rx) = FootprintRefresherBuilder::new()
            .registry(registry())
            .build()
            .unwrap();
        let err = refresher.recompute(update("woody")).unwrap_err();
        assert!(matches!(err, FootprintError::UnknownCluster(_)));
    }

    #[tokio::test]
    async fn test_publishes_reports() {
        let (refresher, tx, mut rx) = FootprintRefresherBuilder::new()
            .registry(registry())
            .build()
            .unwrap();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = tokio::spawn(refresher.run(shutdown_rx));

        tx.send(update("fritz")).await.unwrap();
        rx.changed().await.unwrap();
        let report = rx.borrow_and_update().clone().unwrap();
        assert_eq!(report.entries.len(), 2);

        shutdown_tx.send(()).unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_update_degrades_health() {
        let health = HealthRegistry::new();
        let (refresher, tx, rx) = FootprintRefresherBuilder::new()
            .registry(registry())
            .health(health.clone())
            .build()
            .unwrap();
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = tokio::spawn(refresher.run(shutdown_rx));

        tx.send(update("woody")).await.unwrap();
        drop(tx);
        task.await.unwrap();

        assert!(rx.borrow().is_none());
        let status = health.health().await.components[components::REFRESHER].status;
        assert_eq!(status, crate::health::ComponentStatus::Degraded);
    }

    #[test]
    fn test_stops_when_senders_dropped() {
        let (refresher, tx, _rx) = FootprintRefresherBuilder::new()
            .registry(registry())
            .build()
            .unwrap();
        let (_shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        drop(tx);
        tokio_test::block_on(refresher.run(shutdown_rx));
    }
}
