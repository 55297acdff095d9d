//! Per-metric averages derived from job metric data

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{JobMetric, JobStatistics, MetricStatistics};
use crate::units::{round2, Unit};

/// Observed node-scope average of one metric for a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintSample {
    pub name: String,
    /// `None` when the job has no usable data for the metric
    pub avg: Option<f64>,
    pub unit: String,
}

impl FootprintSample {
    /// Derive the footprint average of a job metric.
    ///
    /// Prefers the mean of the statistics series (rounded to two decimals)
    /// and falls back to aggregating the per-host statistics over the job's
    /// `num_nodes`.
    pub fn from_job_metric(name: &str, metric: &JobMetric, num_nodes: u32) -> Self {
        let from_stats_series = metric
            .statistics_series
            .as_ref()
            .and_then(|stats| finite_mean(&stats.mean))
            .map(round2);
        let avg = from_stats_series.or_else(|| {
            let hosts: Vec<MetricStatistics> = metric
                .series
                .iter()
                .filter_map(|series| series.statistics)
                .filter(|stats| stats.avg.is_finite())
                .collect();
            aggregate_host_stats(&hosts, num_nodes, metric.unit.clone()).map(|stats| stats.avg)
        });

        Self {
            name: name.to_string(),
            avg,
            unit: metric.unit.to_string(),
        }
    }

    /// Sample for a metric the job has no data for
    pub fn missing(name: &str) -> Self {
        Self {
            name: name.to_string(),
            avg: None,
            unit: String::new(),
        }
    }
}

/// Samples for `names`, in that order, from a job's node-scope metrics
pub fn job_samples(
    metrics: &HashMap<String, JobMetric>,
    names: &[&str],
    num_nodes: u32,
) -> Vec<FootprintSample> {
    names
        .iter()
        .map(|name| match metrics.get(*name) {
            Some(metric) => FootprintSample::from_job_metric(name, metric, num_nodes),
            None => FootprintSample::missing(name),
        })
        .collect()
}

fn finite_mean(values: &[f64]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Combine per-host statistics into job statistics.
///
/// The average is the sum of host averages divided by the job's node count;
/// min and max are taken across hosts. All values are rounded to two
/// decimals. Returns `None` when no host reported data.
pub fn aggregate_host_stats(
    hosts: &[MetricStatistics],
    num_nodes: u32,
    unit: Unit,
) -> Option<JobStatistics> {
    if hosts.is_empty() {
        return None;
    }

    let divisor = if num_nodes == 0 {
        hosts.len() as f64
    } else {
        num_nodes as f64
    };

    let (sum, min, max) = hosts.iter().fold(
        (0.0, f64::INFINITY, f64::NEG_INFINITY),
        |(sum, min, max), host| (sum + host.avg, min.min(host.min), max.max(host.max)),
    );

    Some(JobStatistics {
        unit,
        avg: round2(sum / divisor),
        min: round2(min),
        max: round2(max),
    })
}
