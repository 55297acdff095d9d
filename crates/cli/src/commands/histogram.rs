//! Histogram commands

use anyhow::{Context, Result};
use footprint_lib::{bin_values, peak_histogram, select_weights, FootprintWeights, Scope};
use tabled::Tabled;

use super::{parse_values, read_input};
use crate::output::{bar, print_rows, OutputFormat};

const BAR_WIDTH: usize = 30;

#[derive(Tabled)]
struct BinRow {
    #[tabled(rename = "Up to")]
    value: String,
    #[tabled(rename = "Count")]
    count: String,
    #[tabled(rename = "Distribution")]
    bar: String,
}

#[derive(Tabled)]
struct PeakBinRow {
    #[tabled(rename = "Bin")]
    bin: usize,
    #[tabled(rename = "Range")]
    range: String,
    #[tabled(rename = "Count")]
    count: u64,
    #[tabled(rename = "Distribution")]
    bar: String,
}

/// Bin values from a file, weighted per value or by per-job resource hours
pub fn show_histogram(
    values_path: &str,
    weights_path: Option<&str>,
    jobs_path: Option<&str>,
    scope: Scope,
    bins: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let values = parse_values(&read_input(values_path)?)
        .with_context(|| format!("Invalid values in {}", values_path))?;
    let weights = match weights_path {
        Some(path) => Some(
            parse_values(&read_input(path)?)
                .with_context(|| format!("Invalid weights in {}", path))?,
        ),
        None => None,
    };
    let jobs: Option<Vec<FootprintWeights>> = match jobs_path {
        Some(path) => Some(
            serde_json::from_str(&read_input(path)?)
                .with_context(|| format!("Invalid job hours in {}", path))?,
        ),
        None => None,
    };

    let weights = select_weights(weights, jobs.as_deref(), scope)?;
    let histogram = bin_values(weights.as_deref(), &values, bins)?;

    let max = histogram.bins.iter().map(|b| b.count).fold(0.0, f64::max);
    let rows: Vec<BinRow> = histogram
        .bins
        .iter()
        .map(|b| BinRow {
            value: b.value.to_string(),
            count: b.count.to_string(),
            bar: bar(b.count, max, BAR_WIDTH),
        })
        .collect();

    print_rows(&rows, &histogram, format)
}

/// Bin values from a file into slices of `[0, peak)`
pub fn show_peak_histogram(
    values_path: &str,
    peak: f64,
    bins: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let values = parse_values(&read_input(values_path)?)
        .with_context(|| format!("Invalid values in {}", values_path))?;

    let points = peak_histogram(&values, peak, bins)?;

    let max = points.iter().map(|p| p.count).max().unwrap_or(0) as f64;
    let rows: Vec<PeakBinRow> = points
        .iter()
        .map(|p| PeakBinRow {
            bin: p.bin,
            range: format!("{} - {}", p.min, p.max),
            count: p.count,
            bar: bar(p.count as f64, max, BAR_WIDTH),
        })
        .collect();

    print_rows(&rows, &points, format)
}
