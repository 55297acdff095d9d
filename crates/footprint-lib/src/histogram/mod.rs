//! Footprint histograms
//!
//! This module provides:
//! - Weighted fixed-count histograms of job footprint values
//! - Peak-anchored histograms for cluster status views
//! - Per-job weights for node, core and accelerator hour scopes

mod binner;
mod peak;

pub use binner::{bin_values, Histogram, HistogramBin, MAX_BINS, MIN_BINS};
pub use peak::{peak_histogram, MetricHistogram, PeakHistogramPoint, DEFAULT_PEAK_BINS};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{FootprintError, Result};

/// Resource scope a footprint histogram is weighted by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Node,
    Core,
    Accelerator,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Node => "node",
            Scope::Core => "core",
            Scope::Accelerator => "accelerator",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = FootprintError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "node" => Ok(Scope::Node),
            "core" => Ok(Scope::Core),
            "accelerator" | "acc" => Ok(Scope::Accelerator),
            other => Err(FootprintError::InvalidInput(format!(
                "unknown histogram scope '{}'",
                other
            ))),
        }
    }
}

/// Resource hours a job accumulated, used as histogram weights
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FootprintWeights {
    pub node_hours: f64,
    pub core_hours: f64,
    #[serde(default)]
    pub acc_hours: f64,
}

impl FootprintWeights {
    /// Weight of a job for the given scope
    pub fn for_scope(&self, scope: Scope) -> f64 {
        match scope {
            Scope::Node => self.node_hours,
            Scope::Core => self.core_hours,
            Scope::Accelerator => self.acc_hours,
        }
    }
}

/// Pick the weights of `scope` out of per-job resource hours
pub fn scope_weights(jobs: &[FootprintWeights], scope: Scope) -> Vec<f64> {
    jobs.iter().map(|w| w.for_scope(scope)).collect()
}

/// Histogram weights from explicit values or from per-job resource hours.
///
/// Giving both is an error; giving neither weights every sample once.
pub fn select_weights(
    weights: Option<Vec<f64>>,
    jobs: Option<&[FootprintWeights]>,
    scope: Scope,
) -> Result<Option<Vec<f64>>> {
    match (weights, jobs) {
        (Some(_), Some(_)) => Err(FootprintError::InvalidInput(
            "give either weights or per-job hours, not both".to_string(),
        )),
        (Some(weights), None) => Ok(Some(weights)),
        (None, Some(jobs)) => Ok(Some(scope_weights(jobs, scope))),
        (None, None) => Ok(None),
    }
}
