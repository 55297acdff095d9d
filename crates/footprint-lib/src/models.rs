//! Core data models shared with the monitoring backend
//!
//! These mirror the JSON documents served by the backend: cluster metric
//! configuration (`cluster.json`) and per-job metric data.

use serde::{Deserialize, Serialize};

use crate::units::Unit;

/// Granularity at which a metric is aggregated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricScope {
    #[default]
    #[serde(rename = "node")]
    Node,
    #[serde(rename = "socket")]
    Socket,
    #[serde(rename = "memoryDomain")]
    MemoryDomain,
    #[serde(rename = "core")]
    Core,
    #[serde(rename = "hwthread")]
    HwThread,
    #[serde(rename = "accelerator")]
    Accelerator,
}

/// How node-level values combine across the scope below them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Avg,
    Sum,
}

/// Threshold overrides for one hardware class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubClusterThresholds {
    pub name: String,
    pub peak: f64,
    pub normal: f64,
    pub caution: f64,
    pub alert: f64,
}

/// Per-metric configuration of a cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricConfig {
    pub name: String,
    #[serde(default)]
    pub unit: Unit,
    #[serde(default)]
    pub scope: MetricScope,
    #[serde(default)]
    pub aggregation: Option<Aggregation>,
    #[serde(default)]
    pub timestep: u32,
    pub peak: f64,
    pub normal: f64,
    pub caution: f64,
    pub alert: f64,
    #[serde(default)]
    pub lower_is_better: Option<bool>,
    #[serde(default)]
    pub sub_clusters: Vec<SubClusterThresholds>,
}

impl MetricConfig {
    /// Threshold override for a subcluster, if one is configured
    pub fn sub_cluster(&self, name: &str) -> Option<&SubClusterThresholds> {
        self.sub_clusters.iter().find(|sc| sc.name == name)
    }
}

/// Hardware thread layout of a node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topology {
    #[serde(default)]
    pub node: Vec<u32>,
    #[serde(default)]
    pub socket: Vec<Vec<u32>>,
    #[serde(default)]
    pub core: Vec<Vec<u32>>,
}

/// Homogeneous partition of a cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCluster {
    pub name: String,
    #[serde(default)]
    pub nodes: String,
    #[serde(default)]
    pub processor_type: String,
    #[serde(default)]
    pub sockets_per_node: u32,
    #[serde(default)]
    pub cores_per_socket: u32,
    #[serde(default)]
    pub threads_per_core: u32,
    /// Peak scalar flop rate per node (GF/s)
    #[serde(default)]
    pub flop_rate_scalar: f64,
    /// Peak SIMD flop rate per node (GF/s)
    #[serde(default)]
    pub flop_rate_simd: f64,
    /// Peak memory bandwidth per node (GB/s)
    #[serde(default)]
    pub memory_bandwidth: f64,
    #[serde(default)]
    pub topology: Topology,
}

/// Cluster description as served by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub name: String,
    #[serde(default)]
    pub metric_config: Vec<MetricConfig>,
    #[serde(default)]
    pub sub_clusters: Vec<SubCluster>,
}

impl Cluster {
    pub fn metric(&self, name: &str) -> Option<&MetricConfig> {
        self.metric_config.iter().find(|m| m.name == name)
    }

    pub fn sub_cluster(&self, name: &str) -> Option<&SubCluster> {
        self.sub_clusters.iter().find(|sc| sc.name == name)
    }
}

/// Job resource shape, enough to pick footprint metrics and scale thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobShape {
    #[serde(default = "default_one")]
    pub num_nodes: u32,
    #[serde(default, rename = "numHWThreads")]
    pub num_hwthreads: u32,
    #[serde(default)]
    pub num_acc: u32,
    /// 0 = shared, 1 = exclusive, 2 = shared node but exclusive resources
    #[serde(default = "default_exclusive")]
    pub exclusive: u8,
}

fn default_one() -> u32 {
    1
}

fn default_exclusive() -> u8 {
    1
}

impl JobShape {
    pub fn is_exclusive(&self) -> bool {
        self.exclusive == 1
    }

    pub fn has_accelerators(&self) -> bool {
        self.num_acc > 0
    }
}

impl Default for JobShape {
    fn default() -> Self {
        Self {
            num_nodes: 1,
            num_hwthreads: 0,
            num_acc: 0,
            exclusive: 1,
        }
    }
}

/// Summary statistics of one series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricStatistics {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

/// One host's time series for a metric
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub statistics: Option<MetricStatistics>,
    #[serde(default)]
    pub data: Vec<f64>,
}

/// Min/mean/max envelope across all series of a job metric
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSeries {
    #[serde(default)]
    pub mean: Vec<f64>,
    #[serde(default)]
    pub min: Vec<f64>,
    #[serde(default)]
    pub max: Vec<f64>,
}

/// Metric data of one job at node scope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMetric {
    #[serde(default)]
    pub unit: Unit,
    #[serde(default)]
    pub timestep: u32,
    #[serde(default)]
    pub series: Vec<Series>,
    #[serde(default)]
    pub statistics_series: Option<StatsSeries>,
}

/// Job-wide statistics of a metric after host aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatistics {
    pub unit: Unit,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}
