//! In-process metrics for the SelamAI trading backend.
#![forbid(unsafe_code)]
//!
//! `selam-metrics` accumulates counters, gauges and bounded time series in
//! memory and derives statistics, dashboard snapshots and Prometheus text
//! output from them on demand.
//!
//! # Features
//!
//! - **Single lock boundary**: every mutation happens under one write lock
//!   per store; statistics are computed on a copy outside the lock
//! - **Retention**: points older than the retention window are purged
//!   lazily, and each series is capped (oldest points evicted first)
//! - **Timers**: RAII [`Timer`] and async [`timed`] record durations exactly once
//! - **Export**: [`PrometheusExporter`] renders registered metrics as text
//!
//! # Example
//!
//! ```rust
//! use selam_metrics::{labels, Labels, MetricsStore};
//!
//! let store = MetricsStore::default();
//! store.increment_counter("trades_total", 1.0, labels([("symbol", "BTC-USD")]));
//! store.set_gauge("portfolio_value", 10_000.0, Labels::new());
//!
//! assert_eq!(store.get_counter("trades_total"), 1.0);
//! assert_eq!(store.get_gauge("portfolio_value"), Some(10_000.0));
//! assert!(store.get_metric_summary("unknown", None).is_none());
//! ```

#![doc(html_root_url = "https://docs.rs/selam-metrics/0.1.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod dashboard;
pub mod error;
pub mod names;
pub mod prometheus;
pub mod storage;
pub mod summary;
pub mod timer;
pub mod types;

// Re-export main types at crate root
pub use config::{MetricsConfig, StorageConfig};
pub use dashboard::{AgentMetrics, DashboardData, RiskMetrics, SystemMetrics, TradingMetrics};
pub use error::{MetricsError, Result};
pub use prometheus::{MetricKind, PrometheusExporter};
pub use storage::MetricsStore;
pub use summary::MetricsSummary;
pub use timer::{timed, Timer};
pub use types::{labels, Labels, MetricName, MetricPoint, PointView};
