//! Grouped snapshot consumed by the dashboard UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::names;
use crate::storage::MetricsStore;

/// Window used for the agent's average request duration.
pub const AGENT_DURATION_WINDOW_MINUTES: u32 = 60;

/// Agent activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMetrics {
    /// Requests handled.
    pub requests_total: f64,
    /// Decisions produced.
    pub decisions_total: f64,
    /// Errors raised.
    pub errors_total: f64,
    /// Mean request duration over the last hour, in seconds.
    pub avg_duration: Option<f64>,
}

/// Trading outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingMetrics {
    /// Trades attempted.
    pub trades_total: f64,
    /// Trades that succeeded.
    pub trades_successful: f64,
    /// Trades that failed.
    pub trades_failed: f64,
    /// Realised profit and loss.
    pub profit_loss_total: Option<f64>,
    /// Percentage of successful trades; zero when no trades were made.
    pub win_rate: f64,
}

/// Platform health.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    /// HTTP requests served.
    pub api_requests_total: f64,
    /// HTTP 5xx responses.
    pub api_errors_total: f64,
    /// Open websocket connections.
    pub websocket_connections: Option<f64>,
    /// Memory usage.
    pub memory_usage_percent: Option<f64>,
    /// CPU usage.
    pub cpu_usage_percent: Option<f64>,
}

/// Risk exposure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Share of the portfolio at risk.
    pub risk_exposure_percent: Option<f64>,
    /// Drawdown from peak.
    pub drawdown_percent: Option<f64>,
    /// Portfolio value.
    pub portfolio_value: Option<f64>,
    /// Circuit breakers tripped.
    pub circuit_breakers_triggered: f64,
}

/// Point-in-time snapshot grouped into `agent`, `trading`, `system` and `risk`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    /// When the snapshot was taken.
    pub timestamp: DateTime<Utc>,
    /// Agent group.
    pub agent: AgentMetrics,
    /// Trading group.
    pub trading: TradingMetrics,
    /// System group.
    pub system: SystemMetrics,
    /// Risk group.
    pub risk: RiskMetrics,
}

impl DashboardData {
    /// Reads the dashboard groups from `store`.
    #[must_use]
    pub fn collect(store: &MetricsStore) -> Self {
        let avg_duration = store
            .get_metric_summary(
                names::AGENT_REQUEST_DURATION_SECONDS,
                Some(AGENT_DURATION_WINDOW_MINUTES),
            )
            .map(|summary| summary.mean);

        let trades_total = store.get_counter(names::TRADES_TOTAL);
        let trades_successful = store.get_counter(names::TRADES_SUCCESSFUL);

        Self {
            timestamp: Utc::now(),
            agent: AgentMetrics {
                requests_total: store.get_counter(names::AGENT_REQUESTS_TOTAL),
                decisions_total: store.get_counter(names::AGENT_DECISIONS_TOTAL),
                errors_total: store.get_counter(names::AGENT_ERRORS_TOTAL),
                avg_duration,
            },
            trading: TradingMetrics {
                trades_total,
                trades_successful,
                trades_failed: store.get_counter(names::TRADES_FAILED),
                profit_loss_total: store.get_gauge(names::PROFIT_LOSS_TOTAL),
                win_rate: win_rate(trades_successful, trades_total),
            },
            system: SystemMetrics {
                api_requests_total: store.get_counter(names::API_REQUESTS_TOTAL),
                api_errors_total: store.get_counter(names::API_ERRORS_TOTAL),
                websocket_connections: store.get_gauge(names::WEBSOCKET_CONNECTIONS),
                memory_usage_percent: store.get_gauge(names::MEMORY_USAGE_PERCENT),
                cpu_usage_percent: store.get_gauge(names::CPU_USAGE_PERCENT),
            },
            risk: RiskMetrics {
                risk_exposure_percent: store.get_gauge(names::RISK_EXPOSURE_PERCENT),
                drawdown_percent: store.get_gauge(names::DRAWDOWN_PERCENT),
                portfolio_value: store.get_gauge(names::PORTFOLIO_VALUE),
                circuit_breakers_triggered: store.get_counter(names::CIRCUIT_BREAKERS_TRIGGERED),
            },
        }
    }
}

fn win_rate(successful: f64, total: f64) -> f64 {
    if total > 0.0 {
        successful / total * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Labels;

    #[test]
    fn win_rate_from_counters() {
        let store = MetricsStore::default();
        for _ in 0..10 {
            store.increment_counter(names::TRADES_TOTAL, 1.0, Labels::new());
        }
        for _ in 0..8 {
            store.increment_counter(names::TRADES_SUCCESSFUL, 1.0, Labels::new());
        }

        let data = store.get_dashboard_data();
        assert!((data.trading.win_rate - 80.0).abs() < f64::EPSILON);
        assert!((data.trading.trades_total - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn win_rate_without_trades_is_zero() {
        let data = MetricsStore::default().get_dashboard_data();
        assert!(data.trading.win_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn empty_store_reports_absent_gauges() {
        let data = DashboardData::collect(&MetricsStore::default());
        assert!(data.agent.avg_duration.is_none());
        assert!(data.trading.profit_loss_total.is_none());
        assert!(data.system.websocket_connections.is_none());
        assert!(data.risk.portfolio_value.is_none());
    }

    #[test]
    fn groups_read_named_metrics() {
        let store = MetricsStore::default();
        store.record_duration(names::AGENT_REQUEST_DURATION_SECONDS, 0.2, Labels::new());
        store.record_duration(names::AGENT_REQUEST_DURATION_SECONDS, 0.4, Labels::new());
        store.increment_counter(names::API_ERRORS_TOTAL, 2.0, Labels::new());
        store.set_gauge(names::DRAWDOWN_PERCENT, 12.5, Labels::new());
        store.increment_counter(names::CIRCUIT_BREAKERS_TRIGGERED, 1.0, Labels::new());

        let data = store.get_dashboard_data();
        assert!((data.agent.avg_duration.unwrap() - 0.3).abs() < 1e-9);
        assert!((data.system.api_errors_total - 2.0).abs() < f64::EPSILON);
        assert_eq!(data.risk.drawdown_percent, Some(12.5));
        assert!((data.risk.circuit_breakers_triggered - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn serializes_grouped_layout() {
        let json = serde_json::to_value(MetricsStore::default().get_dashboard_data()).unwrap();
        for group in ["timestamp", "agent", "trading", "system", "risk"] {
            assert!(json.get(group).is_some(), "missing {group}");
        }
        assert_eq!(json["trading"]["win_rate"], 0.0);
    }
}
