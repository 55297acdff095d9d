//! Error types for footprint computations

use thiserror::Error;

/// Errors raised while resolving configuration or validating inputs.
#[derive(Debug, Error)]
pub enum FootprintError {
    /// Input violates a precondition (non-finite average, mismatched weights).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No metric configuration exists for this cluster.
    #[error("Metric '{metric}' is not configured for cluster '{cluster}'")]
    UnknownMetric { cluster: String, metric: String },

    /// Cluster is not part of the loaded configuration.
    #[error("Unknown cluster: {0}")]
    UnknownCluster(String),

    /// Unit string could not be parsed.
    #[error("Invalid unit: {0}")]
    InvalidUnit(String),

    /// Malformed JSON document.
    #[error("Failed to parse document: {0}")]
    Parse(#[from] serde_json::Error),

    /// Reading a configuration file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FootprintError {
    /// True when the error stems from caller-supplied data rather than
    /// missing configuration.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FootprintError::InvalidInput(_)
                | FootprintError::InvalidUnit(_)
                | FootprintError::Parse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FootprintError>;
