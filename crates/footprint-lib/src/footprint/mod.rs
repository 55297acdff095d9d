//! Job footprint evaluation
//!
//! This module provides:
//! - Threshold profile resolution per cluster/subcluster and job shape
//! - Derivation of per-metric averages from job metric data
//! - Severity classification of those averages

mod classifier;
mod sample;
mod thresholds;

pub use classifier::{
    classify, classify_profile, FootprintClassification, MetricThresholdProfile, Severity,
    ARTIFACT_MILD_FACTOR, ARTIFACT_SEVERE_FACTOR,
};
pub use sample::{aggregate_host_stats, job_samples, FootprintSample};
pub use thresholds::{resolve_profiles, resolve_thresholds};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::models::JobShape;

/// Derating applied to flop-rate peaks, which are never reached in practice
pub const FLOP_RATE_PEAK_FACTOR: f64 = 0.85;

/// Metrics where a high value is the bad case
const LOWER_IS_BETTER_METRICS: &[&str] = &["mem_used"];

/// Metrics whose peak is derated by [`FLOP_RATE_PEAK_FACTOR`]
const FLOP_RATE_METRICS: &[&str] = &["flops_any", "flops_dp", "flops_sp"];

/// Footprint of exclusive CPU jobs
pub const CPU_EXCLUSIVE_METRICS: &[&str] = &["cpu_load", "flops_any", "mem_used", "mem_bw"];

/// Footprint of CPU jobs sharing their nodes
pub const CPU_SHARED_METRICS: &[&str] = &["flops_any", "mem_used"];

/// Footprint of accelerator jobs
pub const ACCELERATOR_METRICS: &[&str] =
    &["acc_utilization", "acc_mem_used", "nv_sm_clock", "nv_mem_util"];

/// Direction in which a metric improves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricPolarity {
    /// Thresholds are minimum acceptable levels (flop rate, bandwidth, load)
    #[default]
    HigherIsBetter,
    /// Thresholds are maximum acceptable levels (memory used)
    LowerIsBetter,
}

impl MetricPolarity {
    pub fn from_lower_is_better(lower_is_better: bool) -> Self {
        if lower_is_better {
            MetricPolarity::LowerIsBetter
        } else {
            MetricPolarity::HigherIsBetter
        }
    }
}

/// Built-in classification traits of a metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricTraits {
    pub polarity: MetricPolarity,
    pub peak_factor: f64,
}

/// Built-in traits for a metric name; unknown metrics get standard polarity
/// and no derating.
pub fn metric_traits(metric: &str) -> MetricTraits {
    let polarity = if LOWER_IS_BETTER_METRICS.contains(&metric) {
        MetricPolarity::LowerIsBetter
    } else {
        MetricPolarity::HigherIsBetter
    };
    let peak_factor = if FLOP_RATE_METRICS.contains(&metric) {
        FLOP_RATE_PEAK_FACTOR
    } else {
        1.0
    };

    MetricTraits {
        polarity,
        peak_factor,
    }
}

/// Metrics shown in the footprint of a job with the given shape
pub fn footprint_metrics(job: &JobShape) -> &'static [&'static str] {
    if job.has_accelerators() {
        ACCELERATOR_METRICS
    } else if job.is_exclusive() {
        CPU_EXCLUSIVE_METRICS
    } else {
        CPU_SHARED_METRICS
    }
}

/// One classified footprint metric, ready for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintEntry {
    pub name: String,
    pub unit: String,
    pub avg: f64,
    /// Effective peak the average was compared against
    pub max: f64,
    #[serde(flatten)]
    pub classification: FootprintClassification,
}

/// Classify every sample that has both an average and a threshold profile.
///
/// Samples without data or without a profile are skipped; output order
/// follows the input order.
pub fn classify_job(
    samples: &[FootprintSample],
    profiles: &HashMap<String, MetricThresholdProfile>,
) -> Vec<FootprintEntry> {
    let mut entries = Vec::with_capacity(samples.len());

    for sample in samples {
        let Some(avg) = sample.avg else {
            debug!(metric = %sample.name, "No average available, skipping metric");
            continue;
        };
        let Some(profile) = profiles.get(&sample.name) else {
            debug!(metric = %sample.name, "No threshold profile, skipping metric");
            continue;
        };

        match classify_profile(avg, profile) {
            Ok(classification) => entries.push(FootprintEntry {
                name: sample.name.clone(),
                unit: sample.unit.clone(),
                avg,
                max: profile.effective_peak(),
                classification,
            }),
            Err(e) => {
                warn!(metric = %sample.name, error = %e, "Skipping unclassifiable metric");
            }
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str, avg: Option<f64>) -> FootprintSample {
        FootprintSample {
            name: name.to_string(),
            avg,
            unit: "GB/s".to_string(),
        }
    }

    #[test]
    fn test_metric_traits() {
        assert_eq!(metric_traits("mem_used").polarity, MetricPolarity::LowerIsBetter);
        assert_eq!(metric_traits("mem_bw").polarity, MetricPolarity::HigherIsBetter);
        assert_eq!(metric_traits("flops_any").peak_factor, FLOP_RATE_PEAK_FACTOR);
        assert_eq!(metric_traits("cpu_load").peak_factor, 1.0);
        assert_eq!(metric_traits("unknown").polarity, MetricPolarity::HigherIsBetter);
    }

    #[test]
    fn test_footprint_metrics_by_job_shape() {
        let exclusive = JobShape::default();
        assert_eq!(footprint_metrics(&exclusive), CPU_EXCLUSIVE_METRICS);

        let shared = JobShape {
            exclusive: 0,
            ..JobShape::default()
        };
        assert_eq!(footprint_metrics(&shared), CPU_SHARED_METRICS);

        let gpu = JobShape {
            num_acc: 4,
            ..JobShape::default()
        };
        assert_eq!(footprint_metrics(&gpu), ACCELERATOR_METRICS);
    }

    #[test]
    fn test_classify_job_skips_missing_data() {
        let mut profiles = HashMap::new();
        profiles.insert(
            "mem_bw".to_string(),
            MetricThresholdProfile::for_metric("mem_bw", 60.0, 30.0, 10.0, 100.0),
        );
        profiles.insert(
            "flops_any".to_string(),
            MetricThresholdProfile::for_metric("flops_any", 50.0, 20.0, 5.0, 100.0),
        );

        let samples = vec![
            sample("mem_bw", Some(45.0)),
            sample("flops_any", None),
            sample("cpu_load", Some(12.0)),
            sample("mem_bw", Some(f64::NAN)),
        ];

        let entries = classify_job(&samples, &profiles);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "mem_bw");
        assert_eq!(entries[0].max, 100.0);
        assert_eq!(entries[0].classification.color, Severity::Success);
    }

    #[test]
    fn test_entry_json_is_flat() {
        let mut profiles = HashMap::new();
        profiles.insert(
            "flops_any".to_string(),
            MetricThresholdProfile::for_metric("flops_any", 50.0, 20.0, 5.0, 100.0),
        );
        let entries = classify_job(&[sample("flops_any", Some(10.0))], &profiles);

        let json = serde_json::to_value(&entries[0]).unwrap();
        assert_eq!(json["name"], "flops_any");
        assert_eq!(json["color"], "warning");
        assert_eq!(json["impact"], 2);
        assert!((json["max"].as_f64().unwrap() - 85.0).abs() < 1e-9);
    }
}
