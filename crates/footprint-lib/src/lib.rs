//! Job footprint library for cluster monitoring views
//!
//! This crate provides the core functionality for:
//! - Classifying per-metric job averages against cluster thresholds
//! - Weighted and peak-anchored histograms of footprint values
//! - Roofline placement of a job on its node type
//! - Metric unit parsing and prefix-aware number formatting
//! - Cluster configuration loading and threshold resolution
//! - Event-driven footprint recomputation
//! - Health checks and observability

pub mod cluster;
pub mod error;
pub mod footprint;
pub mod health;
pub mod histogram;
pub mod models;
pub mod observability;
pub mod refresh;
pub mod roofline;
pub mod units;

pub use cluster::ClusterRegistry;
pub use error::{FootprintError, Result};
pub use footprint::{
    classify, classify_job, classify_profile, FootprintClassification, FootprintEntry,
    MetricPolarity, MetricThresholdProfile, Severity,
};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use histogram::{
    bin_values, peak_histogram, select_weights, FootprintWeights, Histogram, HistogramBin,
    PeakHistogramPoint, Scope,
};
pub use models::*;
pub use observability::{FootprintMetrics, StructuredLogger};
pub use refresh::{
    compute_report, FootprintRefresher, FootprintRefresherBuilder, FootprintReport, StatsUpdate,
};
pub use units::{format_number, scale_numbers, Prefix, Unit};
