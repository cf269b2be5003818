//! Error types for monitoring setup.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while configuring the monitoring stack.
#[derive(Debug, Error)]
pub enum MonitoringError {
    /// A configuration file exists but could not be read.
    #[error("failed to read config file '{path}': {source}")]
    ReadConfig {
        /// The file that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration document is not valid YAML for its section.
    #[error("invalid config in '{path}': {source}")]
    ParseConfig {
        /// The file that failed.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_yaml::Error,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Reason for invalidity.
        reason: String,
    },

    /// Metrics configuration was rejected.
    #[error(transparent)]
    Metrics(#[from] selam_metrics::MetricsError),

    /// Alert configuration was rejected.
    #[error(transparent)]
    Alerts(#[from] selam_alerts::AlertError),

    /// The tracing subscriber could not be installed.
    #[error("failed to initialize logging: {reason}")]
    Logging {
        /// Reason for the failure.
        reason: String,
    },
}

/// Result type for monitoring operations.
pub type Result<T> = std::result::Result<T, MonitoringError>;
