//! Read-only monitoring API.

use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::{get, Router};
use axum::Json;
use selam_alerts::{Alert, AlertStats};
use selam_metrics::{DashboardData, PrometheusExporter};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::middleware::{instrument, METRICS_PATH};
use crate::monitoring::{Monitoring, MonitoringStatus};

/// Default number of alerts returned by `/api/alerts/recent`.
pub const DEFAULT_RECENT_LIMIT: usize = 50;

/// Query parameters for `/api/alerts/recent`.
#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    /// Maximum number of alerts to return.
    pub limit: Option<usize>,
}

/// Creates the monitoring router with request tracking applied.
pub fn create_router(monitoring: Monitoring) -> Router {
    let router = Router::new()
        .route(METRICS_PATH, get(get_metrics))
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/alerts/stats", get(get_alert_stats))
        .route("/api/alerts/recent", get(get_recent_alerts))
        .route("/api/monitoring/status", get(get_status))
        .with_state(monitoring.clone());

    instrument(router, monitoring).layer(TraceLayer::new_for_http())
}

/// Handle GET /api/metrics - Prometheus text exposition.
pub async fn get_metrics(State(monitoring): State<Monitoring>) -> impl IntoResponse {
    let body = monitoring.exporter().render(monitoring.metrics());
    ([(CONTENT_TYPE, PrometheusExporter::content_type())], body)
}

/// Handle GET /api/dashboard - aggregated trading dashboard.
pub async fn get_dashboard(State(monitoring): State<Monitoring>) -> Json<DashboardData> {
    Json(monitoring.metrics().get_dashboard_data())
}

/// Handle GET /api/alerts/stats - alert counters.
pub async fn get_alert_stats(State(monitoring): State<Monitoring>) -> Json<AlertStats> {
    Json(monitoring.alerts().get_alert_stats())
}

/// Handle GET /api/alerts/recent - newest alerts first.
pub async fn get_recent_alerts(
    State(monitoring): State<Monitoring>,
    Query(query): Query<RecentQuery>,
) -> Json<Vec<Alert>> {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    Json(monitoring.alerts().recent_alerts(limit))
}

/// Handle GET /api/monitoring/status - component overview.
pub async fn get_status(State(monitoring): State<Monitoring>) -> Json<MonitoringStatus> {
    Json(monitoring.status())
}
