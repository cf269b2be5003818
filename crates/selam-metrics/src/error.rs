//! Error types for the selam-metrics crate.

use thiserror::Error;

/// Errors that can occur in the metrics system.
///
/// Store reads and writes never fail; these errors only cover setup
/// problems such as registering an exporter metric under a bad name.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// The metric name is invalid (empty or contains invalid characters).
    #[error("invalid metric name: {reason}")]
    InvalidMetricName {
        /// The reason the name is invalid.
        reason: String,
    },

    /// The metrics configuration is invalid.
    #[error("invalid metrics configuration: {reason}")]
    InvalidConfig {
        /// The reason the configuration was rejected.
        reason: String,
    },
}

/// Result type for metrics operations.
pub type Result<T> = std::result::Result<T, MetricsError>;
