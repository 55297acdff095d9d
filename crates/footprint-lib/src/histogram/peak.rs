//! Peak-anchored metric histograms for status dashboards
//!
//! Unlike [`super::bin_values`], the range is fixed by the metric's configured
//! peak, so histograms of different job sets line up bin for bin.

use serde::{Deserialize, Serialize};

use super::MAX_BINS;
use crate::error::{FootprintError, Result};

/// Bin count used when the caller does not ask for one
pub const DEFAULT_PEAK_BINS: usize = 10;

/// One bin of a peak-anchored histogram; `min` inclusive, `max` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakHistogramPoint {
    /// 1-based bin number
    pub bin: usize,
    pub count: u64,
    pub min: i64,
    pub max: i64,
}

/// Peak-anchored histogram of one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricHistogram {
    pub metric: String,
    pub unit: String,
    pub data: Vec<PeakHistogramPoint>,
}

/// Count `values` into `bins` slices of `[0, peak)` with rounded edges.
///
/// Values outside the rounded range, including anything at or above the
/// peak, are not counted. More than [`MAX_BINS`] bins is an error.
pub fn peak_histogram(
    values: &[f64],
    peak: f64,
    bins: Option<usize>,
) -> Result<Vec<PeakHistogramPoint>> {
    if !peak.is_finite() || peak <= 0.0 {
        return Err(FootprintError::InvalidInput(format!(
            "peak must be a positive number, got {}",
            peak
        )));
    }
    let bins = bins.unwrap_or(DEFAULT_PEAK_BINS).max(1);
    if bins > MAX_BINS {
        return Err(FootprintError::InvalidInput(format!(
            "at most {} bins are supported, got {}",
            MAX_BINS, bins
        )));
    }
    let width = peak / bins as f64;

    let points = (0..bins)
        .map(|b| {
            let min = (width * b as f64).round();
            let max = (width * (b + 1) as f64).round();
            let count = values.iter().filter(|&&v| v >= min && v < max).count() as u64;
            PeakHistogramPoint {
                bin: b + 1,
                count,
                min: min as i64,
                max: max as i64,
            }
        })
        .collect();

    Ok(points)
}
