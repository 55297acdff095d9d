//! Roofline model helpers
//!
//! Arithmetic intensity of a job and the attainable flop rate of the node
//! it ran on, taken from the subcluster's peak flop rate and memory
//! bandwidth.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{FootprintError, Result};
use crate::footprint::FootprintSample;
use crate::models::{JobMetric, SubCluster};

/// Flops per byte moved; `None` without memory traffic or with bad inputs
pub fn intensity(flops: f64, mem_bw: f64) -> Option<f64> {
    if !flops.is_finite() || !mem_bw.is_finite() || mem_bw <= 0.0 {
        return None;
    }
    Some(flops / mem_bw)
}

/// Ceilings of one node type (GF/s and GB/s)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roofline {
    pub peak_flops: f64,
    pub memory_bandwidth: f64,
}

impl Roofline {
    pub fn new(peak_flops: f64, memory_bandwidth: f64) -> Result<Self> {
        if !(peak_flops > 0.0 && peak_flops.is_finite())
            || !(memory_bandwidth > 0.0 && memory_bandwidth.is_finite())
        {
            return Err(FootprintError::InvalidInput(format!(
                "roofline ceilings must be positive, got {} GF/s and {} GB/s",
                peak_flops, memory_bandwidth
            )));
        }
        Ok(Self {
            peak_flops,
            memory_bandwidth,
        })
    }

    /// Roofline of a subcluster, using its SIMD peak
    pub fn from_sub_cluster(sub_cluster: &SubCluster) -> Result<Self> {
        Self::new(sub_cluster.flop_rate_simd, sub_cluster.memory_bandwidth)
    }

    /// Intensity at which a job stops being memory bound
    pub fn ridge_point(&self) -> f64 {
        self.peak_flops / self.memory_bandwidth
    }

    /// Highest flop rate reachable at `intensity`
    pub fn attainable(&self, intensity: f64) -> f64 {
        (intensity * self.memory_bandwidth).min(self.peak_flops)
    }

    pub fn is_memory_bound(&self, intensity: f64) -> bool {
        intensity < self.ridge_point()
    }

    /// Place a measured flop rate and bandwidth under this roofline
    pub fn point(&self, flops: f64, mem_bw: f64) -> Option<RooflinePoint> {
        let intensity = intensity(flops, mem_bw)?;
        Some(RooflinePoint {
            intensity,
            flops,
            attainable: self.attainable(intensity),
            memory_bound: self.is_memory_bound(intensity),
        })
    }
}

/// A job's position under its node roofline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RooflinePoint {
    pub intensity: f64,
    /// Measured flop rate per node
    pub flops: f64,
    pub attainable: f64,
    pub memory_bound: bool,
}

/// Roofline position of a job from its `flops_any` and `mem_bw` averages.
///
/// `None` when the subcluster lacks ceilings or the job lacks either metric.
pub fn job_roofline(
    sub_cluster: &SubCluster,
    metrics: &HashMap<String, JobMetric>,
    num_nodes: u32,
) -> Option<RooflinePoint> {
    let roofline = Roofline::from_sub_cluster(sub_cluster).ok()?;
    let average = |name: &str| {
        metrics
            .get(name)
            .and_then(|m| FootprintSample::from_job_metric(name, m, num_nodes).avg)
    };
    roofline.point(average("flops_any")?, average("mem_bw")?)
}
