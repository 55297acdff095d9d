//! Weighted fixed-count histograms over job footprint values

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FootprintError, Result};

/// Smallest number of bins a histogram is built with
pub const MIN_BINS: usize = 3;

/// Largest number of bins a caller may ask for
pub const MAX_BINS: usize = 1000;

/// One histogram bin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    /// Upper boundary of the bin, floored to an integer
    pub value: f64,
    /// Sum of the weights of all samples in the bin
    pub count: f64,
}

/// Histogram in ascending bin order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    /// Sum of all bin counts
    pub fn total(&self) -> f64 {
        self.bins.iter().map(|b| b.count).sum()
    }
}

/// Bin `values` into `num_bins` equally wide bins, weighting each sample.
///
/// The range always includes zero and is extended by one past the largest
/// value so the maximum falls inside the last bin. `num_bins` below
/// [`MIN_BINS`] (or absent) is raised to it; above [`MAX_BINS`] is an error.
/// Without weights every sample counts once. Empty input yields all-zero
/// bins; non-finite samples and samples with a non-finite or negative
/// weight are ignored.
pub fn bin_values(
    weights: Option<&[f64]>,
    values: &[f64],
    num_bins: Option<usize>,
) -> Result<Histogram> {
    if let Some(weights) = weights {
        if weights.len() != values.len() {
            return Err(FootprintError::InvalidInput(format!(
                "expected {} weights, got {}",
                values.len(),
                weights.len()
            )));
        }
    }

    let num_bins = num_bins.unwrap_or(MIN_BINS).max(MIN_BINS);
    if num_bins > MAX_BINS {
        return Err(FootprintError::InvalidInput(format!(
            "at most {} bins are supported, got {}",
            MAX_BINS, num_bins
        )));
    }

    let finite = values.iter().copied().filter(|v| v.is_finite());
    let (min, max) = finite.fold(None, |range: Option<(f64, f64)>, v| match range {
        Some((min, max)) => Some((min.min(v), max.max(v))),
        None => Some((v.min(0.0), v.max(0.0))),
    })
    .map_or((0.0, 0.0), |(min, max)| (min, max + 1.0));

    let span = max - min;
    let mut counts = vec![0.0; num_bins];

    if span > 0.0 {
        for (i, &value) in values.iter().enumerate() {
            if !value.is_finite() {
                debug!(index = i, "Ignoring non-finite histogram sample");
                continue;
            }
            let weight = weights.map_or(1.0, |w| w[i]);
            if !weight.is_finite() || weight < 0.0 {
                debug!(index = i, weight, "Ignoring histogram sample with invalid weight");
                continue;
            }
            // Clamp guards against `max + 1.0` being absorbed at huge magnitudes
            let idx = (((value - min) / span) * num_bins as f64).floor() as usize;
            counts[idx.min(num_bins - 1)] += weight;
        }
    }

    let bins = counts
        .into_iter()
        .enumerate()
        .map(|(idx, count)| HistogramBin {
            value: (min + ((idx + 1) as f64 / num_bins as f64) * span).floor(),
            count,
        })
        .collect();

    Ok(Histogram { bins })
}
