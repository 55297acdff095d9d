//! ccfp - job footprint command-line tool
//!
//! Classifies job footprints, bins footprint values and formats metric
//! numbers offline, from local cluster and job JSON files.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{footprint, histogram, units};
use footprint_lib::Scope;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Job footprint classification for cluster monitoring
#[derive(Parser)]
#[command(name = "ccfp")]
#[command(author, version, about = "Job footprint classification for cluster monitoring", long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify a job's footprint metrics against cluster thresholds
    Footprint {
        /// cluster.json file or directory of them
        #[arg(long, env = "CCFP_CLUSTER_CONFIG")]
        cluster_config: Option<PathBuf>,

        /// Job statistics JSON (cluster, subCluster, job, metrics); `-` reads stdin
        #[arg(long)]
        job: String,
    },

    /// Bin values into equally wide, optionally weighted bins
    Histogram {
        /// Values as a JSON array or whitespace separated; `-` reads stdin
        #[arg(long)]
        values: String,

        /// Per-value weights, same format as values
        #[arg(long)]
        weights: Option<String>,

        /// Per-job resource hours as a JSON array of {nodeHours, coreHours, accHours}
        #[arg(long, conflicts_with = "weights")]
        jobs: Option<String>,

        /// Resource hours to weight by with --jobs (node, core, accelerator)
        #[arg(long, default_value = "node")]
        scope: Scope,

        /// Number of bins (3 to 1000)
        #[arg(long)]
        bins: Option<usize>,
    },

    /// Bin values into slices of [0, peak)
    PeakHistogram {
        /// Values as a JSON array or whitespace separated; `-` reads stdin
        #[arg(long)]
        values: String,

        /// Metric peak
        #[arg(long)]
        peak: f64,

        /// Number of bins
        #[arg(long)]
        bins: Option<usize>,
    },

    /// Format numbers with decimal prefixes
    Format {
        /// Numbers or labels
        #[arg(required = true, allow_hyphen_values = true)]
        values: Vec<String>,
    },

    /// Render "x / y" with a shared prefix
    Scale {
        #[arg(allow_hyphen_values = true)]
        x: f64,

        #[arg(allow_hyphen_values = true)]
        y: f64,

        /// Prefix the inputs are already scaled by (K, M, G, T, P, E)
        #[arg(long, default_value = "")]
        prefix: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    if let Err(e) = run(cli) {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = config::Config::load()?;

    match cli.command {
        Commands::Footprint {
            cluster_config,
            job,
        } => {
            let cluster_config = cluster_config.or(config.cluster_config).context(
                "No cluster configuration given (--cluster-config or CCFP_CLUSTER_CONFIG)",
            )?;
            footprint::show_footprint(&cluster_config, &job, cli.format)?;
        }
        Commands::Histogram {
            values,
            weights,
            jobs,
            scope,
            bins,
        } => {
            histogram::show_histogram(
                &values,
                weights.as_deref(),
                jobs.as_deref(),
                scope,
                bins.or(config.default_bins),
                cli.format,
            )?;
        }
        Commands::PeakHistogram { values, peak, bins } => {
            histogram::show_peak_histogram(&values, peak, bins, cli.format)?;
        }
        Commands::Format { values } => {
            units::format_values(&values, cli.format)?;
        }
        Commands::Scale { x, y, prefix } => {
            units::scale(x, y, &prefix, cli.format)?;
        }
    }

    Ok(())
}
