//! Well-known metric names emitted by the platform.

/// Requests handled by the trading agent.
pub const AGENT_REQUESTS_TOTAL: &str = "agent_requests_total";
/// Decisions produced by the trading agent.
pub const AGENT_DECISIONS_TOTAL: &str = "agent_decisions_total";
/// Errors raised by the trading agent.
pub const AGENT_ERRORS_TOTAL: &str = "agent_errors_total";
/// Agent request latency in seconds.
pub const AGENT_REQUEST_DURATION_SECONDS: &str = "agent_requests_duration_seconds";

/// Trades attempted.
pub const TRADES_TOTAL: &str = "trades_total";
/// Trades that completed successfully.
pub const TRADES_SUCCESSFUL: &str = "trades_successful";
/// Trades that failed.
pub const TRADES_FAILED: &str = "trades_failed";
/// Realised profit and loss.
pub const PROFIT_LOSS_TOTAL: &str = "profit_loss_total";

/// HTTP requests served.
pub const API_REQUESTS_TOTAL: &str = "api_requests_total";
/// HTTP requests answered with a 5xx status.
pub const API_ERRORS_TOTAL: &str = "api_errors_total";
/// HTTP request latency in seconds.
pub const API_REQUEST_DURATION_SECONDS: &str = "api_request_duration_seconds";
/// Open websocket connections.
pub const WEBSOCKET_CONNECTIONS: &str = "websocket_connections";
/// Process memory usage.
pub const MEMORY_USAGE_PERCENT: &str = "memory_usage_percent";
/// Process CPU usage.
pub const CPU_USAGE_PERCENT: &str = "cpu_usage_percent";

/// Share of the portfolio currently at risk.
pub const RISK_EXPOSURE_PERCENT: &str = "risk_exposure_percent";
/// Current drawdown from peak.
pub const DRAWDOWN_PERCENT: &str = "drawdown_percent";
/// Portfolio value.
pub const PORTFOLIO_VALUE: &str = "portfolio_value";
/// Circuit breakers tripped.
pub const CIRCUIT_BREAKERS_TRIGGERED: &str = "circuit_breakers_triggered";
