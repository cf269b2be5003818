//! Prometheus text exposition of registered metrics.
//!
//! Metrics are registered once with a description and a kind; rendering
//! reads current values straight from a [`MetricsStore`]:
//!
//! ```text
//! # HELP api_requests_total Total API requests
//! # TYPE api_requests_total counter
//! api_requests_total 42
//! # HELP api_request_duration_seconds API request latency
//! # TYPE api_request_duration_seconds histogram
//! api_request_duration_seconds_count 3
//! api_request_duration_seconds_sum 0.75
//! ```
//!
//! The text is written directly rather than through `prometheus-client`,
//! whose encoder appends `_total` to counters and emits bucket lines for
//! histograms.
//!
//! # Example
//!
//! ```rust
//! use selam_metrics::{Labels, MetricsStore, PrometheusExporter};
//!
//! let store = MetricsStore::default();
//! let exporter = PrometheusExporter::new();
//! exporter.register_counter("trades_total", "Trades attempted").unwrap();
//!
//! store.increment_counter("trades_total", 1.0, Labels::new());
//! assert!(exporter.render(&store).contains("trades_total 1"));
//! ```

use std::fmt::Write as _;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::names;
use crate::storage::MetricsStore;
use crate::types::MetricName;

/// Exposition type of a registered metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Rendered from the store's counter value.
    Counter,
    /// Rendered from the store's gauge value; zero when never set.
    Gauge,
    /// Rendered as `_count`/`_sum` over the stored series.
    Histogram,
}

impl MetricKind {
    /// The `# TYPE` keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Histogram => "histogram",
        }
    }
}

#[derive(Debug, Clone)]
struct Registration {
    name: MetricName,
    help: String,
    kind: MetricKind,
}

/// Registry of exported metrics, rendered in registration order.
///
/// Cloning shares the registry.
#[derive(Debug, Clone, Default)]
pub struct PrometheusExporter {
    registrations: Arc<RwLock<Vec<Registration>>>,
}

impl PrometheusExporter {
    /// Creates an empty exporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an exporter with the platform's standard metrics registered.
    #[must_use]
    pub fn with_platform_defaults() -> Self {
        let exporter = Self::new();
        let defaults = [
            (names::API_REQUESTS_TOTAL, "Total API requests", MetricKind::Counter),
            (names::API_ERRORS_TOTAL, "Total API requests answered with a server error", MetricKind::Counter),
            (names::API_REQUEST_DURATION_SECONDS, "API request latency in seconds", MetricKind::Histogram),
            (names::AGENT_REQUESTS_TOTAL, "Total agent requests", MetricKind::Counter),
            (names::AGENT_DECISIONS_TOTAL, "Total agent decisions", MetricKind::Counter),
            (names::AGENT_ERRORS_TOTAL, "Total agent errors", MetricKind::Counter),
            (names::AGENT_REQUEST_DURATION_SECONDS, "Agent request latency in seconds", MetricKind::Histogram),
            (names::TRADES_TOTAL, "Total trades attempted", MetricKind::Counter),
            (names::TRADES_SUCCESSFUL, "Total successful trades", MetricKind::Counter),
            (names::TRADES_FAILED, "Total failed trades", MetricKind::Counter),
            (names::PROFIT_LOSS_TOTAL, "Realised profit and loss", MetricKind::Gauge),
            (names::WEBSOCKET_CONNECTIONS, "Open websocket connections", MetricKind::Gauge),
            (names::RISK_EXPOSURE_PERCENT, "Portfolio share currently at risk", MetricKind::Gauge),
            (names::DRAWDOWN_PERCENT, "Drawdown from peak portfolio value", MetricKind::Gauge),
            (names::PORTFOLIO_VALUE, "Current portfolio value", MetricKind::Gauge),
            (names::CIRCUIT_BREAKERS_TRIGGERED, "Total circuit breakers triggered", MetricKind::Counter),
        ];

        for (name, help, kind) in defaults {
            if let Ok(name) = MetricName::new(name) {
                exporter.insert(Registration {
                    name,
                    help: help.to_string(),
                    kind,
                });
            }
        }
        exporter
    }

    /// Registers a counter.
    ///
    /// # Errors
    ///
    /// Returns `MetricsError::InvalidMetricName` if `name` is not a valid metric name.
    pub fn register_counter(&self, name: &str, help: &str) -> Result<()> {
        self.register(name, help, MetricKind::Counter)
    }

    /// Registers a gauge.
    ///
    /// # Errors
    ///
    /// Returns `MetricsError::InvalidMetricName` if `name` is not a valid metric name.
    pub fn register_gauge(&self, name: &str, help: &str) -> Result<()> {
        self.register(name, help, MetricKind::Gauge)
    }

    /// Registers a histogram.
    ///
    /// # Errors
    ///
    /// Returns `MetricsError::InvalidMetricName` if `name` is not a valid metric name.
    pub fn register_histogram(&self, name: &str, help: &str) -> Result<()> {
        self.register(name, help, MetricKind::Histogram)
    }

    /// Registers `name` with the given kind, replacing an earlier registration.
    ///
    /// # Errors
    ///
    /// Returns `MetricsError::InvalidMetricName` if `name` is not a valid metric name.
    pub fn register(&self, name: &str, help: &str, kind: MetricKind) -> Result<()> {
        let name = MetricName::new(name)?;
        debug!(metric = %name, kind = kind.as_str(), "registered exported metric");
        self.insert(Registration {
            name,
            help: help.to_string(),
            kind,
        });
        Ok(())
    }

    fn insert(&self, registration: Registration) {
        let mut registrations = self.registrations.write();
        if let Some(existing) = registrations
            .iter_mut()
            .find(|r| r.name == registration.name)
        {
            *existing = registration;
        } else {
            registrations.push(registration);
        }
    }

    /// Number of registered metrics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registrations.read().len()
    }

    /// Whether nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registrations.read().is_empty()
    }

    /// Renders every registered metric using the values in `store`.
    #[must_use]
    pub fn render(&self, store: &MetricsStore) -> String {
        let registrations = self.registrations.read().clone();
        let mut out = String::new();

        for Registration { name, help, kind } in &registrations {
            // Writing into a String cannot fail.
            let _ = writeln!(out, "# HELP {name} {help}");
            let _ = writeln!(out, "# TYPE {name} {}", kind.as_str());

            match kind {
                MetricKind::Counter => {
                    let _ = writeln!(out, "{name} {}", store.get_counter(name.as_str()));
                }
                MetricKind::Gauge => {
                    let value = store.get_gauge(name.as_str()).unwrap_or(0.0);
                    let _ = writeln!(out, "{name} {value}");
                }
                MetricKind::Histogram => {
                    if let Some(summary) = store.get_metric_summary(name.as_str(), None) {
                        let _ = writeln!(out, "{name}_count {}", summary.count);
                        let _ = writeln!(out, "{name}_sum {}", summary.sum);
                    }
                }
            }
        }

        out
    }

    /// Returns the Content-Type header value for the text format.
    #[must_use]
    pub const fn content_type() -> &'static str {
        "text/plain; version=0.0.4; charset=utf-8"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetricsError;
    use crate::types::Labels;

    mod registration_tests {
        use super::*;

        #[test]
        fn rejects_invalid_names() {
            let exporter = PrometheusExporter::new();
            assert!(matches!(
                exporter.register_counter("api-requests", "bad"),
                Err(MetricsError::InvalidMetricName { .. })
            ));
            assert!(exporter.is_empty());
        }

        #[test]
        fn reregistration_replaces_in_place() {
            let exporter = PrometheusExporter::new();
            exporter.register_counter("a_total", "first").unwrap();
            exporter.register_gauge("b", "gauge").unwrap();
            exporter.register_counter("a_total", "second").unwrap();

            assert_eq!(exporter.len(), 2);
            let out = exporter.render(&MetricsStore::default());
            assert!(out.starts_with("# HELP a_total second\n"));
        }

        #[test]
        fn platform_defaults_are_registered() {
            let exporter = PrometheusExporter::with_platform_defaults();
            assert_eq!(exporter.len(), 16);

            let out = exporter.render(&MetricsStore::default());
            assert!(out.contains("# TYPE api_requests_total counter"));
            assert!(out.contains("# TYPE api_request_duration_seconds histogram"));
            assert!(out.contains("# TYPE portfolio_value gauge"));
        }

        #[test]
        fn clones_share_registry() {
            let exporter = PrometheusExporter::new();
            let clone = exporter.clone();
            exporter.register_gauge("g", "gauge").unwrap();
            assert_eq!(clone.len(), 1);
        }
    }

    mod render_tests {
        use super::*;

        #[test]
        fn counter_and_gauge_lines() {
            let store = MetricsStore::default();
            let exporter = PrometheusExporter::new();
            exporter.register_counter("trades_total", "Trades attempted").unwrap();
            exporter.register_gauge("portfolio_value", "Portfolio value").unwrap();

            store.increment_counter("trades_total", 3.0, Labels::new());
            store.set_gauge("portfolio_value", 10_250.5, Labels::new());

            assert_eq!(
                exporter.render(&store),
                "# HELP trades_total Trades attempted\n\
                 # TYPE trades_total counter\n\
                 trades_total 3\n\
                 # HELP portfolio_value Portfolio value\n\
                 # TYPE portfolio_value gauge\n\
                 portfolio_value 10250.5\n"
            );
        }

        #[test]
        fn unset_gauge_renders_zero() {
            let exporter = PrometheusExporter::new();
            exporter.register_gauge("websocket_connections", "Open sockets").unwrap();
            assert!(exporter
                .render(&MetricsStore::default())
                .contains("\nwebsocket_connections 0\n"));
        }

        #[test]
        fn histogram_count_and_sum() {
            let store = MetricsStore::default();
            let exporter = PrometheusExporter::new();
            exporter.register_histogram("latency_seconds", "Latency").unwrap();

            store.record_duration("latency_seconds", 0.25, Labels::new());
            store.record_duration("latency_seconds", 0.5, Labels::new());

            let out = exporter.render(&store);
            assert!(out.contains("latency_seconds_count 2\n"));
            assert!(out.contains("latency_seconds_sum 0.75\n"));
        }

        #[test]
        fn empty_histogram_has_only_header() {
            let exporter = PrometheusExporter::new();
            exporter.register_histogram("latency_seconds", "Latency").unwrap();

            let out = exporter.render(&MetricsStore::default());
            assert_eq!(
                out,
                "# HELP latency_seconds Latency\n# TYPE latency_seconds histogram\n"
            );
        }

        #[test]
        fn content_type_is_text_format() {
            assert_eq!(
                PrometheusExporter::content_type(),
                "text/plain; version=0.0.4; charset=utf-8"
            );
        }
    }
}
