//! Request middleware: correlation ids, request metrics and slow-request
//! logging.

use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use selam_context::CorrelationId;
use selam_metrics::names::{API_ERRORS_TOTAL, API_REQUESTS_TOTAL, API_REQUEST_DURATION_SECONDS};
use selam_metrics::{labels, Labels};
use tracing::{debug, info_span, warn, Instrument};

use crate::monitoring::Monitoring;

/// Header carrying the request correlation id in both directions.
pub static CORRELATION_ID_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");

/// Path of the Prometheus endpoint, which is never counted itself.
pub const METRICS_PATH: &str = "/api/metrics";

/// Wraps `router` with [`track_requests`].
pub fn instrument<S>(router: Router<S>, monitoring: Monitoring) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(monitoring, track_requests))
}

/// Runs the request inside a correlation scope and a tracing span, records
/// request metrics and echoes the correlation id on the response.
///
/// The id is taken from `X-Correlation-ID` when present and generated
/// otherwise.
pub async fn track_requests(
    State(monitoring): State<Monitoring>,
    request: Request,
    next: Next,
) -> Response {
    let correlation_id = request
        .headers()
        .get(&CORRELATION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map_or_else(CorrelationId::generate, CorrelationId::from);

    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let span = info_span!(
        "http_request",
        correlation_id = %correlation_id,
        method = %method,
        path = %path,
    );

    let tracked = monitoring.metrics_enabled() && path != METRICS_PATH;
    let store = monitoring.metrics();
    if tracked {
        store.increment_counter(API_REQUESTS_TOTAL, 1.0, request_labels(&method, &path));
    }

    let started = Instant::now();
    let mut response = selam_context::scope(Some(correlation_id.clone()), next.run(request))
        .instrument(span.clone())
        .await;
    let elapsed = started.elapsed();
    let status = response.status();

    if tracked {
        let mut duration_labels = request_labels(&method, &path);
        duration_labels.insert("status_code".to_string(), status.as_u16().to_string());
        store.record_duration(API_REQUEST_DURATION_SECONDS, elapsed.as_secs_f64(), duration_labels.clone());
        if status.is_server_error() {
            store.increment_counter(API_ERRORS_TOTAL, 1.0, duration_labels);
        }
    }

    let performance = &monitoring.config().logging.performance;
    let slow_threshold = Duration::from_millis(performance.slow_threshold_ms);
    span.in_scope(|| {
        let duration_ms = elapsed.as_secs_f64() * 1000.0;
        if performance.log_slow_requests && elapsed > slow_threshold {
            warn!(status = status.as_u16(), duration_ms, "slow request");
        } else {
            debug!(status = status.as_u16(), duration_ms, "request completed");
        }
    });

    if let Ok(value) = HeaderValue::from_str(correlation_id.as_str()) {
        response.headers_mut().insert(CORRELATION_ID_HEADER.clone(), value);
    }
    response
}

fn request_labels(method: &str, path: &str) -> Labels {
    labels([("method", method), ("path", path)])
}
