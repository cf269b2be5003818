//! Statistical summaries over a snapshot of metric values.

use serde::{Deserialize, Serialize};

/// Minimum number of samples for a median.
pub const MIN_SAMPLES_FOR_MEDIAN: usize = 2;

/// Minimum number of samples for p95/p99.
pub const MIN_SAMPLES_FOR_PERCENTILES: usize = 20;

/// Derived statistics for one metric series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    /// Number of samples.
    pub count: usize,
    /// Sum of all samples.
    pub sum: f64,
    /// Smallest sample.
    pub min: f64,
    /// Largest sample.
    pub max: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Median, present with at least two samples.
    pub median: Option<f64>,
    /// 95th percentile, present with at least twenty samples.
    pub p95: Option<f64>,
    /// 99th percentile, present with at least twenty samples.
    pub p99: Option<f64>,
}

impl MetricsSummary {
    /// Computes a summary over `values`. Returns `None` when `values` is empty.
    ///
    /// Percentiles use nearest-rank selection on the sorted samples:
    /// `p95 = sorted[floor(0.95 * n)]`.
    #[must_use]
    pub fn from_values(mut values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        values.sort_by(f64::total_cmp);

        let count = values.len();
        let sum: f64 = values.iter().sum();
        let min = values[0];
        let max = values[count - 1];
        let mean = sum / count as f64;

        let median = (count >= MIN_SAMPLES_FOR_MEDIAN).then(|| {
            let mid = count / 2;
            if count % 2 == 0 {
                (values[mid - 1] + values[mid]) / 2.0
            } else {
                values[mid]
            }
        });

        let (p95, p99) = if count >= MIN_SAMPLES_FOR_PERCENTILES {
            (
                Some(percentile(&values, 0.95)),
                Some(percentile(&values, 0.99)),
            )
        } else {
            (None, None)
        };

        Some(Self {
            count,
            sum,
            min,
            max,
            mean,
            median,
            p95,
            p99,
        })
    }
}

/// Nearest-rank percentile over already sorted, non-empty samples.
fn percentile(sorted: &[f64], quantile: f64) -> f64 {
    let index = ((sorted.len() as f64) * quantile).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}
