//! Cluster configuration registry
//!
//! Loads `cluster.json` documents, either a single file or every `*.json`
//! file in a directory, and answers threshold lookups against them.

use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{FootprintError, Result};
use crate::footprint::{resolve_profiles, MetricThresholdProfile};
use crate::models::{Cluster, JobShape};
use crate::units::Unit;

/// Loaded cluster configurations, keyed by cluster name
#[derive(Debug, Clone, Default)]
pub struct ClusterRegistry {
    clusters: HashMap<String, Cluster>,
}

impl ClusterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a single cluster file or a directory of them
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut registry = Self::new();

        if path.is_dir() {
            let mut files: Vec<_> = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.extension().map_or(false, |ext| ext == "json"))
                .collect();
            files.sort();
            for file in files {
                registry.insert(Self::read_cluster(&file)?);
            }
        } else {
            registry.insert(Self::read_cluster(path)?);
        }

        info!(
            path = %path.display(),
            clusters = registry.clusters.len(),
            "Loaded cluster configuration"
        );
        Ok(registry)
    }

    /// Parse one cluster document
    pub fn from_json(json: &str) -> Result<Self> {
        let mut registry = Self::new();
        registry.insert(serde_json::from_str(json)?);
        Ok(registry)
    }

    fn read_cluster(path: &Path) -> Result<Cluster> {
        let contents = std::fs::read_to_string(path)?;
        let cluster: Cluster = serde_json::from_str(&contents)?;
        debug!(
            cluster = %cluster.name,
            metrics = cluster.metric_config.len(),
            "Parsed cluster document"
        );
        Ok(cluster)
    }

    /// Add or replace a cluster
    pub fn insert(&mut self, cluster: Cluster) {
        self.clusters.insert(cluster.name.clone(), cluster);
    }

    pub fn cluster(&self, name: &str) -> Result<&Cluster> {
        self.clusters
            .get(name)
            .ok_or_else(|| FootprintError::UnknownCluster(name.to_string()))
    }

    /// Cluster names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.clusters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Threshold profiles of `metrics` for a job on the given cluster
    pub fn profiles(
        &self,
        cluster: &str,
        sub_cluster: &str,
        metrics: &[&str],
        job: &JobShape,
    ) -> Result<HashMap<String, MetricThresholdProfile>> {
        let cluster = self.cluster(cluster)?;
        Ok(resolve_profiles(cluster, sub_cluster, metrics, job))
    }

    /// Peak of a metric on one cluster, or the largest across all clusters.
    ///
    /// Subcluster overrides count as candidates.
    pub fn peak(&self, cluster: Option<&str>, metric: &str) -> Result<(f64, Unit)> {
        let candidates: Vec<&Cluster> = match cluster {
            Some(name) => vec![self.cluster(name)?],
            None => self.clusters.values().collect(),
        };

        candidates
            .into_iter()
            .filter_map(|c| c.metric(metric))
            .flat_map(|config| {
                std::iter::once(config.peak)
                    .chain(config.sub_clusters.iter().map(|sc| sc.peak))
                    .map(move |peak| (peak, config.unit.clone()))
            })
            .fold(None, |best: Option<(f64, Unit)>, (peak, unit)| match best {
                Some((best_peak, _)) if best_peak >= peak => best,
                _ => Some((peak, unit)),
            })
            .ok_or_else(|| FootprintError::UnknownMetric {
                cluster: cluster.unwrap_or("*").to_string(),
                metric: metric.to_string(),
            })
    }
}
