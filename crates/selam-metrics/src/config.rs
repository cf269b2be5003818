//! Metrics store configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, Result};

/// Default retention window for stored points (one week).
pub const DEFAULT_RETENTION_HOURS: u64 = 168;

/// Default cap on the number of points kept per series.
pub const DEFAULT_MAX_POINTS_PER_SERIES: usize = 10_000;

/// Configuration for the metrics subsystem (`metrics.yaml`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Whether metrics collection is enabled.
    pub enabled: bool,
    /// Storage limits.
    pub storage: StorageConfig,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            storage: StorageConfig::default(),
        }
    }
}

/// Retention limits for the in-memory store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Points older than this many hours are purged.
    pub retention_hours: u64,
    /// Maximum number of points kept per series; the oldest are evicted first.
    pub max_points_per_series: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            retention_hours: DEFAULT_RETENTION_HOURS,
            max_points_per_series: DEFAULT_MAX_POINTS_PER_SERIES,
        }
    }
}

impl MetricsConfig {
    /// Set the retention window in hours.
    #[must_use]
    pub const fn with_retention_hours(mut self, hours: u64) -> Self {
        self.storage.retention_hours = hours;
        self
    }

    /// Set the per-series point cap.
    #[must_use]
    pub const fn with_max_points_per_series(mut self, max: usize) -> Self {
        self.storage.max_points_per_series = max;
        self
    }

    /// Retention window as a [`Duration`].
    #[must_use]
    pub const fn retention(&self) -> Duration {
        Duration::from_secs(self.storage.retention_hours.saturating_mul(3600))
    }

    /// Checks that the limits are usable.
    ///
    /// # Errors
    ///
    /// Returns `MetricsError::InvalidConfig` when the retention window or the
    /// point cap is zero.
    pub fn validate(&self) -> Result<()> {
        if self.storage.retention_hours == 0 {
            return Err(MetricsError::InvalidConfig {
                reason: "retention_hours must be positive".to_string(),
            });
        }
        if self.storage.max_points_per_series == 0 {
            return Err(MetricsError::InvalidConfig {
                reason: "max_points_per_series must be positive".to_string(),
            });
        }
        Ok(())
    }
}
