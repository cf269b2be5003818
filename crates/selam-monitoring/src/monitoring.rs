//! The monitoring root: one metrics store, exporter and alert manager built
//! at startup and handed to every component that needs them.

use std::sync::Arc;

use selam_alerts::{context, AlertManager};
use selam_metrics::{MetricsStore, PrometheusExporter};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{LogFormat, MonitoringConfig};
use crate::error::Result;

/// Rule fired by [`Monitoring::circuit_breaker_triggered`].
pub const CIRCUIT_BREAKER_TRIGGERED: &str = "circuit_breaker_triggered";
/// Rule fired by [`Monitoring::trade_failed`].
pub const TRADE_FAILED: &str = "trade_failed";
/// Rule fired by [`Monitoring::high_drawdown`].
pub const DRAWDOWN_EXCEEDED: &str = "drawdown_exceeded";

/// Logging part of [`MonitoringStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingStatus {
    /// Always true once the root exists.
    pub enabled: bool,
    /// Configured filter directive.
    pub level: String,
    /// Configured encoding.
    pub format: LogFormat,
}

/// Metrics part of [`MonitoringStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsStatus {
    /// Whether request metrics are recorded.
    pub enabled: bool,
    /// Whether any series holds data.
    pub data_available: bool,
    /// Number of series in the store.
    pub series: usize,
}

/// Alerting part of [`MonitoringStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertsStatus {
    /// Whether alerting is configured on.
    pub enabled: bool,
    /// Registered rules.
    pub rules: usize,
    /// Registered channels.
    pub channels: usize,
}

/// Snapshot returned by [`Monitoring::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringStatus {
    /// Logging setup.
    pub logging: LoggingStatus,
    /// Metrics store state.
    pub metrics: MetricsStatus,
    /// Alert manager state.
    pub alerts: AlertsStatus,
}

/// Shared handles to the observability components.
///
/// Cloning is cheap; every clone sees the same store and manager.
#[derive(Debug, Clone)]
pub struct Monitoring {
    config: Arc<MonitoringConfig>,
    metrics: MetricsStore,
    exporter: PrometheusExporter,
    alerts: AlertManager,
}

impl Monitoring {
    /// Builds every component from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn from_config(config: &MonitoringConfig) -> Result<Self> {
        config.validate()?;

        let monitoring = Self::with_components(
            config.clone(),
            MetricsStore::from_config(&config.metrics),
            PrometheusExporter::with_platform_defaults(),
            AlertManager::from_config(&config.alerts),
        );

        info!(
            metrics_enabled = config.metrics.enabled,
            alerts_enabled = config.alerts.enabled,
            rules = monitoring.alerts.rule_count(),
            channels = monitoring.alerts.channel_count(),
            "monitoring initialized"
        );
        Ok(monitoring)
    }

    /// Assembles a root from existing components.
    #[must_use]
    pub fn with_components(
        config: MonitoringConfig,
        metrics: MetricsStore,
        exporter: PrometheusExporter,
        alerts: AlertManager,
    ) -> Self {
        Self {
            config: Arc::new(config),
            metrics,
            exporter,
            alerts,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &MonitoringConfig {
        &self.config
    }

    /// Returns the metrics store.
    #[must_use]
    pub const fn metrics(&self) -> &MetricsStore {
        &self.metrics
    }

    /// Returns the Prometheus exporter.
    #[must_use]
    pub const fn exporter(&self) -> &PrometheusExporter {
        &self.exporter
    }

    /// Returns the alert manager.
    #[must_use]
    pub const fn alerts(&self) -> &AlertManager {
        &self.alerts
    }

    /// Whether request metrics are recorded.
    #[must_use]
    pub fn metrics_enabled(&self) -> bool {
        self.config.metrics.enabled
    }

    /// Reports what is configured and whether data is flowing.
    #[must_use]
    pub fn status(&self) -> MonitoringStatus {
        let series = self.metrics.metric_names().len();
        MonitoringStatus {
            logging: LoggingStatus {
                enabled: true,
                level: self.config.logging.level.clone(),
                format: self.config.logging.format,
            },
            metrics: MetricsStatus {
                enabled: self.config.metrics.enabled,
                data_available: series > 0,
                series,
            },
            alerts: AlertsStatus {
                enabled: self.config.alerts.enabled,
                rules: self.alerts.rule_count(),
                channels: self.alerts.channel_count(),
            },
        }
    }

    // ============ Trading Alerts ============

    /// Fires `circuit_breaker_triggered` with `{symbol, reason}`.
    pub async fn circuit_breaker_triggered(&self, symbol: &str, reason: &str) -> bool {
        self.alerts
            .trigger(
                CIRCUIT_BREAKER_TRIGGERED,
                context([("symbol", symbol), ("reason", reason)]),
            )
            .await
    }

    /// Fires `trade_failed` with `{error_message, trade_id}`.
    pub async fn trade_failed(&self, error_message: &str, trade_id: &str) -> bool {
        self.alerts
            .trigger(
                TRADE_FAILED,
                context([("error_message", error_message), ("trade_id", trade_id)]),
            )
            .await
    }

    /// Fires `drawdown_exceeded` with the drawdown formatted to two decimals.
    pub async fn high_drawdown(&self, drawdown: f64) -> bool {
        self.alerts
            .trigger(DRAWDOWN_EXCEEDED, context([("drawdown", format!("{drawdown:.2}"))]))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use selam_alerts::{Alert, AlertChannel, AlertRule, AlertSeverity};
    use selam_metrics::Labels;

    #[derive(Debug, Default)]
    struct Capture(std::sync::Mutex<Vec<Alert>>);

    #[async_trait::async_trait]
    impl AlertChannel for Capture {
        fn name(&self) -> &str {
            "capture"
        }

        async fn try_send(&self, alert: &Alert) -> selam_alerts::Result<()> {
            self.0.lock().unwrap().push(alert.clone());
            Ok(())
        }
    }

    fn monitoring_with_capture() -> (Monitoring, Arc<Capture>) {
        let monitoring = Monitoring::from_config(&MonitoringConfig::default()).unwrap();
        let capture = Arc::new(Capture::default());
        monitoring
            .alerts()
            .add_channel("capture", Arc::clone(&capture) as Arc<dyn AlertChannel>);
        for (name, template) in [
            (CIRCUIT_BREAKER_TRIGGERED, "Circuit breaker triggered for {symbol}: {reason}"),
            (TRADE_FAILED, "Trade {trade_id} failed: {error_message}"),
            (DRAWDOWN_EXCEEDED, "Drawdown at {drawdown}%"),
        ] {
            monitoring.alerts().add_rule(
                AlertRule::builder(name, template)
                    .severity(AlertSeverity::Critical)
                    .channel("capture")
                    .build()
                    .unwrap(),
            );
        }
        (monitoring, capture)
    }

    mod status_tests {
        use super::*;

        #[test]
        fn default_config_status() {
            let monitoring = Monitoring::from_config(&MonitoringConfig::default()).unwrap();
            let status = monitoring.status();

            assert!(status.logging.enabled);
            assert_eq!(status.logging.level, "info");
            assert!(status.metrics.enabled);
            assert!(!status.metrics.data_available);
            assert!(status.alerts.enabled);
            assert_eq!(status.alerts.rules, 0);
            assert_eq!(status.alerts.channels, 1);
        }

        #[test]
        fn data_available_after_first_write() {
            let monitoring = Monitoring::from_config(&MonitoringConfig::default()).unwrap();
            monitoring.metrics().set_gauge("portfolio_value", 1.0, Labels::new());

            let status = monitoring.status();
            assert!(status.metrics.data_available);
            assert_eq!(status.metrics.series, 1);
        }

        #[test]
        fn clones_share_components() {
            let monitoring = Monitoring::from_config(&MonitoringConfig::default()).unwrap();
            let clone = monitoring.clone();
            clone.metrics().increment_counter("trades_total", 1.0, Labels::new());
            assert_eq!(monitoring.metrics().get_counter("trades_total"), 1.0);
        }

        #[test]
        fn invalid_config_is_rejected() {
            let mut config = MonitoringConfig::default();
            config.metrics.storage.max_points_per_series = 0;
            assert!(Monitoring::from_config(&config).is_err());
        }
    }

    mod trading_alert_tests {
        use super::*;

        #[tokio::test]
        async fn circuit_breaker_alert() {
            let (monitoring, capture) = monitoring_with_capture();
            assert!(monitoring.circuit_breaker_triggered("BTC-USD", "volatility spike").await);

            let alerts = capture.0.lock().unwrap();
            assert_eq!(alerts[0].message, "Circuit breaker triggered for BTC-USD: volatility spike");
        }

        #[tokio::test]
        async fn trade_failed_alert() {
            let (monitoring, capture) = monitoring_with_capture();
            assert!(monitoring.trade_failed("insufficient margin", "T-42").await);

            let alerts = capture.0.lock().unwrap();
            assert_eq!(alerts[0].message, "Trade T-42 failed: insufficient margin");
        }

        #[tokio::test]
        async fn drawdown_is_rounded_to_two_decimals() {
            let (monitoring, capture) = monitoring_with_capture();
            assert!(monitoring.high_drawdown(12.3456).await);

            let alerts = capture.0.lock().unwrap();
            assert_eq!(alerts[0].message, "Drawdown at 12.35%");
            assert_eq!(alerts[0].context["drawdown"], "12.35");
        }

        #[tokio::test]
        async fn missing_rule_returns_false() {
            let monitoring = Monitoring::from_config(&MonitoringConfig::default()).unwrap();
            assert!(!monitoring.high_drawdown(50.0).await);
        }
    }
}
