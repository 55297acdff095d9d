//! Job footprint classification from local JSON files

use anyhow::{Context, Result};
use footprint_lib::{
    compute_report, ClusterRegistry, FootprintEntry, FootprintMetrics, StatsUpdate,
    StructuredLogger,
};
use std::path::Path;
use tabled::Tabled;
use tracing::debug;

use super::read_input;
use crate::output::{color_severity, print_info, print_rows, print_warning, OutputFormat};

#[derive(Tabled)]
struct FootprintRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Average")]
    avg: String,
    #[tabled(rename = "Peak")]
    peak: String,
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&FootprintEntry> for FootprintRow {
    fn from(entry: &FootprintEntry) -> Self {
        let c = &entry.classification;
        Self {
            metric: entry.name.clone(),
            avg: format!("{:.2}", entry.avg),
            peak: format!("{:.2}", entry.max),
            unit: entry.unit.clone(),
            status: color_severity(c.color, &c.message),
        }
    }
}

/// Classify the job in `job_path` against the clusters in `cluster_config`
pub fn show_footprint(cluster_config: &Path, job_path: &str, format: OutputFormat) -> Result<()> {
    let registry = ClusterRegistry::load(cluster_config).with_context(|| {
        format!(
            "Failed to load cluster configuration from {}",
            cluster_config.display()
        )
    })?;

    let update: StatsUpdate = serde_json::from_str(&read_input(job_path)?)
        .with_context(|| format!("Invalid job statistics in {}", job_path))?;
    let cluster = update.cluster.clone();
    debug!(
        clusters = ?registry.names(),
        job_id = %update.job_id,
        metrics = update.metrics.len(),
        "Classifying job footprint"
    );

    let report = compute_report(
        &registry,
        &StructuredLogger::new("ccfp"),
        &FootprintMetrics::new(),
        update,
    )?;

    let rows: Vec<FootprintRow> = report.entries.iter().map(FootprintRow::from).collect();
    print_rows(&rows, &report, format)?;

    if matches!(format, OutputFormat::Table) {
        if report
            .entries
            .iter()
            .any(|e| e.classification.is_artifact_suspect())
        {
            print_warning("Some averages exceed the peak; check for measurement artifacts");
        }
        print_info(&format!(
            "{} of the footprint metrics classified on cluster {}",
            report.entries.len(),
            cluster
        ));
    }

    Ok(())
}
