//! Observability infrastructure for the footprint service
//!
//! Provides:
//! - Prometheus metrics (classifications by color, artifact suspicions, histograms, request latency)
//! - Structured JSON logging of footprint events with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::footprint::{FootprintEntry, Severity};

/// Latency buckets in seconds; footprint requests are pure computation
const LATENCY_BUCKETS: &[f64] = &[
    0.00005, 0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1,
];

static GLOBAL_METRICS: OnceLock<FootprintMetricsInner> = OnceLock::new();

struct FootprintMetricsInner {
    classifications_total: IntCounterVec,
    artifacts_total: IntCounter,
    histograms_total: IntCounter,
    request_latency_seconds: Histogram,
}

impl FootprintMetricsInner {
    fn new() -> Self {
        Self {
            classifications_total: register_int_counter_vec!(
                "footprint_classifications_total",
                "Footprint metrics classified, by severity color",
                &["color"]
            )
            .expect("Failed to register classifications_total"),

            artifacts_total: register_int_counter!(
                "footprint_artifacts_total",
                "Averages above peak flagged as likely measurement artifacts"
            )
            .expect("Failed to register artifacts_total"),

            histograms_total: register_int_counter!(
                "footprint_histograms_total",
                "Histograms computed"
            )
            .expect("Failed to register histograms_total"),

            request_latency_seconds: register_histogram!(
                "footprint_request_latency_seconds",
                "Time spent serving footprint API requests",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register request_latency_seconds"),
        }
    }
}

/// Handle to the process-wide footprint metrics.
///
/// Clones share the same underlying collectors.
#[derive(Clone)]
pub struct FootprintMetrics {
    _private: (),
}

impl Default for FootprintMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl FootprintMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(FootprintMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &FootprintMetricsInner {
        GLOBAL_METRICS.get_or_init(FootprintMetricsInner::new)
    }

    pub fn inc_classification(&self, color: Severity) {
        self.inner()
            .classifications_total
            .with_label_values(&[color.as_str()])
            .inc();
    }

    pub fn inc_artifacts(&self) {
        self.inner().artifacts_total.inc();
    }

    pub fn inc_histograms(&self) {
        self.inner().histograms_total.inc();
    }

    pub fn observe_request_latency(&self, duration_secs: f64) {
        self.inner().request_latency_seconds.observe(duration_secs);
    }

    /// Count a batch of classified entries
    pub fn record_entries(&self, entries: &[FootprintEntry]) {
        for entry in entries {
            self.inc_classification(entry.classification.color);
            if entry.classification.is_artifact_suspect() {
                self.inc_artifacts();
            }
        }
    }
}

/// Structured logger for footprint events
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    node_name: String,
}

impl StructuredLogger {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
        }
    }

    /// Log one classified footprint metric; suspected artifacts go out at warn
    pub fn log_classification(&self, cluster: &str, entry: &FootprintEntry) {
        let c = &entry.classification;
        if c.is_artifact_suspect() {
            warn!(
                event = "artifact_suspected",
                node = %self.node_name,
                cluster = %cluster,
                metric = %entry.name,
                avg = entry.avg,
                peak = entry.max,
                impact = c.impact,
                "Footprint average exceeds peak"
            );
        } else {
            info!(
                event = "footprint_classified",
                node = %self.node_name,
                cluster = %cluster,
                metric = %entry.name,
                avg = entry.avg,
                color = %c.color,
                impact = c.impact,
                "Classified footprint metric"
            );
        }
    }

    pub fn log_histogram(&self, kind: &str, values: usize, bins: usize) {
        info!(
            event = "histogram_computed",
            node = %self.node_name,
            kind = %kind,
            values = values,
            bins = bins,
            "Computed histogram"
        );
    }

    pub fn log_thresholds_missing(&self, cluster: &str, sub_cluster: &str, metric: &str) {
        warn!(
            event = "thresholds_missing",
            node = %self.node_name,
            cluster = %cluster,
            sub_cluster = %sub_cluster,
            metric = %metric,
            "No thresholds configured for footprint metric"
        );
    }

    pub fn log_startup(&self, version: &str, clusters: usize) {
        info!(
            event = "service_started",
            node = %self.node_name,
            version = %version,
            clusters = clusters,
            "Footprint service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            node = %self.node_name,
            reason = %reason,
            "Footprint service shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::footprint::{classify, FootprintEntry};

    #[test]
    fn test_metrics_handle() {
        let metrics = FootprintMetrics::new();
        let before = metrics.inner().artifacts_total.get();

        let entry = FootprintEntry {
            name: "mem_bw".to_string(),
            unit: "GB/s".to_string(),
            avg: 200.0,
            max: 100.0,
            classification: classify("mem_bw", 200.0, 60.0, 30.0, 10.0, 100.0).unwrap(),
        };
        metrics.record_entries(&[entry]);
        metrics.inc_histograms();
        metrics.observe_request_latency(0.0004);

        assert_eq!(metrics.inner().artifacts_total.get(), before + 1);
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-node");
        assert_eq!(logger.node_name, "test-node");
    }
}
