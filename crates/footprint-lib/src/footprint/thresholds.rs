//! Threshold profile resolution
//!
//! Picks the threshold values that apply to a job: cluster-level metric
//! configuration, overridden per subcluster, scaled down for jobs that
//! share a node when the metric is summed across the node.

use std::collections::HashMap;
use tracing::debug;

use crate::error::{FootprintError, Result};
use crate::models::{Aggregation, Cluster, JobShape, MetricConfig};

use super::{metric_traits, MetricPolarity, MetricThresholdProfile};

/// Resolve the threshold profile of `metric` for a job on `sub_cluster`.
pub fn resolve_thresholds(
    cluster: &Cluster,
    sub_cluster: &str,
    metric: &str,
    job: &JobShape,
) -> Result<MetricThresholdProfile> {
    let config = cluster
        .metric(metric)
        .ok_or_else(|| FootprintError::UnknownMetric {
            cluster: cluster.name.clone(),
            metric: metric.to_string(),
        })?;

    let mut profile = base_profile(config, sub_cluster);

    if config.aggregation == Some(Aggregation::Sum) && !job.is_exclusive() {
        let threads_per_node = cluster
            .sub_cluster(sub_cluster)
            .map(|sc| sc.topology.node.len())
            .unwrap_or(0);
        let fraction = job_fraction(job.num_hwthreads, threads_per_node);
        debug!(
            cluster = %cluster.name,
            sub_cluster = %sub_cluster,
            metric = %metric,
            fraction = fraction,
            "Scaling thresholds to job share of node"
        );
        profile.peak = (profile.peak * fraction).round();
        profile.normal = (profile.normal * fraction).round();
        profile.caution = (profile.caution * fraction).round();
        profile.alert = (profile.alert * fraction).round();
    }

    Ok(profile)
}

/// Resolve profiles for several metrics, leaving out the unconfigured ones
pub fn resolve_profiles(
    cluster: &Cluster,
    sub_cluster: &str,
    metrics: &[&str],
    job: &JobShape,
) -> HashMap<String, MetricThresholdProfile> {
    metrics
        .iter()
        .filter_map(|metric| match resolve_thresholds(cluster, sub_cluster, metric, job) {
            Ok(profile) => Some((metric.to_string(), profile)),
            Err(e) => {
                debug!(error = %e, "No thresholds for footprint metric");
                None
            }
        })
        .collect()
}

fn base_profile(config: &MetricConfig, sub_cluster: &str) -> MetricThresholdProfile {
    let traits = metric_traits(&config.name);
    let polarity = config
        .lower_is_better
        .map(MetricPolarity::from_lower_is_better)
        .unwrap_or(traits.polarity);

    let (normal, caution, alert, peak) = match config.sub_cluster(sub_cluster) {
        Some(sc) => (sc.normal, sc.caution, sc.alert, sc.peak),
        None => (config.normal, config.caution, config.alert, config.peak),
    };

    MetricThresholdProfile {
        normal,
        caution,
        alert,
        peak,
        unit: config.unit.clone(),
        polarity,
        peak_factor: traits.peak_factor,
    }
}

/// Share of a node's hardware threads held by a job, within (0, 1]
fn job_fraction(num_hwthreads: u32, threads_per_node: usize) -> f64 {
    if num_hwthreads == 0 || threads_per_node == 0 {
        return 1.0;
    }
    (num_hwthreads as f64 / threads_per_node as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SubCluster, SubClusterThresholds, Topology};
    use crate::units::Unit;

    fn metric(name: &str, aggregation: Option<Aggregation>) -> MetricConfig {
        MetricConfig {
            name: name.to_string(),
            unit: Unit::parse("GB/s").unwrap(),
            scope: Default::default(),
            aggregation,
            timestep: 60,
            peak: 400.0,
            normal: 100.0,
            caution: 50.0,
            alert: 10.0,
            lower_is_better: None,
            sub_clusters: vec![SubClusterThresholds {
                name: "spr".to_string(),
                peak: 800.0,
                normal: 200.0,
                caution: 100.0,
                alert: 20.0,
            }],
        }
    }

    fn cluster() -> Cluster {
        Cluster {
            name: "fritz".to_string(),
            metric_config: vec![
                metric("mem_bw", Some(Aggregation::Sum)),
                metric("cpu_load", Some(Aggregation::Avg)),
                MetricConfig {
                    lower_is_better: Some(true),
                    ..metric("acc_mem_used", None)
                },
            ],
            sub_clusters: vec![SubCluster {
                name: "main".to_string(),
                topology: Topology {
                    node: (0..72).collect(),
                    ..Topology::default()
                },
                ..SubCluster::default()
            }],
        }
    }

    fn shared(num_hwthreads: u32) -> JobShape {
        JobShape {
            num_hwthreads,
            exclusive: 0,
            ..JobShape::default()
        }
    }

    #[test]
    fn test_cluster_level_thresholds() {
        let profile =
            resolve_thresholds(&cluster(), "main", "cpu_load", &JobShape::default()).unwrap();
        assert_eq!(profile.peak, 400.0);
        assert_eq!(profile.normal, 100.0);
        assert_eq!(profile.unit.to_string(), "GB/s");
    }

    #[test]
    fn test_sub_cluster_override() {
        let profile =
            resolve_thresholds(&cluster(), "spr", "cpu_load", &JobShape::default()).unwrap();
        assert_eq!(profile.peak, 800.0);
        assert_eq!(profile.alert, 20.0);
    }

    #[test]
    fn test_sum_metric_scaled_for_shared_job() {
        let profile = resolve_thresholds(&cluster(), "main", "mem_bw", &shared(18)).unwrap();
        assert_eq!(profile.peak, 100.0);
        assert_eq!(profile.normal, 25.0);
        assert_eq!(profile.caution, 13.0);
        assert_eq!(profile.alert, 3.0);
    }

    #[test]
    fn test_avg_metric_not_scaled_for_shared_job() {
        let profile = resolve_thresholds(&cluster(), "main", "cpu_load", &shared(18)).unwrap();
        assert_eq!(profile.peak, 400.0);
    }

    #[test]
    fn test_exclusive_job_not_scaled() {
        let job = JobShape {
            num_hwthreads: 144,
            num_nodes: 2,
            ..JobShape::default()
        };
        let profile = resolve_thresholds(&cluster(), "main", "mem_bw", &job).unwrap();
        assert_eq!(profile.peak, 400.0);
    }

    #[test]
    fn test_configured_polarity_wins() {
        let profile =
            resolve_thresholds(&cluster(), "main", "acc_mem_used", &JobShape::default()).unwrap();
        assert_eq!(profile.polarity, MetricPolarity::LowerIsBetter);
    }

    #[test]
    fn test_unknown_metric() {
        let err = resolve_thresholds(&cluster(), "main", "ib_bw", &JobShape::default())
            .unwrap_err();
        assert!(matches!(err, FootprintError::UnknownMetric { .. }));
    }

    #[test]
    fn test_resolve_profiles_skips_unconfigured() {
        let profiles = resolve_profiles(
            &cluster(),
            "main",
            &["cpu_load", "flops_any", "mem_bw"],
            &JobShape::default(),
        );
        assert_eq!(profiles.len(), 2);
        assert!(profiles.contains_key("mem_bw"));
        assert!(!profiles.contains_key("flops_any"));
    }
}
