//! Core types for the metrics system.
//!
//! - [`MetricPoint`]: a single observation with timestamp, value, labels and unit
//! - [`MetricName`]: a validated metric name, required by the exporter
//! - [`PointView`]: the serializable view of a point returned by
//!   [`MetricsStore::get_all_metrics`](crate::MetricsStore::get_all_metrics)

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, Result};

/// Dimensional labels attached to a point (e.g. `method`, `path`).
pub type Labels = HashMap<String, String>;

/// Builds a [`Labels`] map from key/value pairs.
///
/// ```rust
/// let labels = selam_metrics::labels([("method", "GET"), ("path", "/api/trades")]);
/// assert_eq!(labels["method"], "GET");
/// ```
pub fn labels<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Labels
where
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// A single metric data point.
///
/// Points are immutable once recorded; the builder methods below consume
/// and return the point so they can only be used while constructing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
    /// The measured value.
    pub value: f64,
    /// Optional dimensional labels.
    pub labels: Labels,
    /// Optional unit of measurement (e.g. `seconds`).
    pub unit: Option<String>,
}

impl MetricPoint {
    /// Creates a new metric point with the given timestamp and value.
    #[must_use]
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self {
            timestamp,
            value,
            labels: Labels::new(),
            unit: None,
        }
    }

    /// Creates a new metric point with the current timestamp.
    #[must_use]
    pub fn now(value: f64) -> Self {
        Self::new(Self::now_timestamp(), value)
    }

    /// Returns the current timestamp in milliseconds.
    #[must_use]
    pub fn now_timestamp() -> i64 {
        Utc::now().timestamp_millis()
    }

    /// Adds a label to this metric point and returns self for chaining.
    #[must_use]
    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Replaces the label set.
    #[must_use]
    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    /// Sets the unit of measurement.
    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// The point's timestamp as a UTC datetime.
    #[must_use]
    pub fn datetime(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.timestamp)
            .single()
            .unwrap_or_default()
    }
}

/// Serializable view of a stored point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointView {
    /// The measured value.
    pub value: f64,
    /// When the value was observed.
    pub timestamp: DateTime<Utc>,
    /// Dimensional labels.
    pub labels: Labels,
    /// Unit of measurement, if any.
    pub unit: Option<String>,
}

impl From<&MetricPoint> for PointView {
    fn from(point: &MetricPoint) -> Self {
        Self {
            value: point.value,
            timestamp: point.datetime(),
            labels: point.labels.clone(),
            unit: point.unit.clone(),
        }
    }
}

/// A validated metric name.
///
/// Metric names must:
/// - Be non-empty
/// - Contain only alphanumeric characters, underscores, and colons
/// - Start with a letter or underscore
/// - Be at most 256 characters long
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricName(String);

impl MetricName {
    /// Maximum allowed length for a metric name.
    pub const MAX_LENGTH: usize = 256;

    /// Creates a new validated metric name.
    ///
    /// # Errors
    ///
    /// Returns `MetricsError::InvalidMetricName` if the name is invalid.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();

        let Some(first) = name.chars().next() else {
            return Err(MetricsError::InvalidMetricName {
                reason: "metric name cannot be empty".to_string(),
            });
        };

        if name.len() > Self::MAX_LENGTH {
            return Err(MetricsError::InvalidMetricName {
                reason: format!(
                    "metric name exceeds maximum length of {} characters",
                    Self::MAX_LENGTH
                ),
            });
        }

        if !first.is_ascii_alphabetic() && first != '_' {
            return Err(MetricsError::InvalidMetricName {
                reason: "metric name must start with a letter or underscore".to_string(),
            });
        }

        if let Some(c) = name
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && *c != '_' && *c != ':')
        {
            return Err(MetricsError::InvalidMetricName {
                reason: format!("invalid character '{c}' in metric name"),
            });
        }

        Ok(Self(name))
    }

    /// Returns the metric name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MetricName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MetricName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
