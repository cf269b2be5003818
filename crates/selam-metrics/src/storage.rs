//! In-memory metric storage with retention policies.
//!
//! [`MetricsStore`] keeps counters, gauges and one bounded time series per
//! metric name behind a single lock. Every mutation (counter increment,
//! gauge set, series append and the retention sweep it triggers) happens
//! while holding the write lock; statistics are computed on a copy taken
//! under the read lock so sorting never blocks writers.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::debug;

use crate::config::{MetricsConfig, DEFAULT_MAX_POINTS_PER_SERIES, DEFAULT_RETENTION_HOURS};
use crate::dashboard::DashboardData;
use crate::summary::MetricsSummary;
use crate::types::{Labels, MetricPoint, PointView};

/// Unit recorded on duration points.
pub const SECONDS_UNIT: &str = "seconds";

#[derive(Debug, Default)]
struct StoreState {
    series: HashMap<String, VecDeque<MetricPoint>>,
    counters: HashMap<String, f64>,
    gauges: HashMap<String, f64>,
}

impl StoreState {
    /// Appends `point` and applies retention to that series only.
    fn append(&mut self, name: &str, point: MetricPoint, cutoff: i64, max_points: usize) -> usize {
        let points = self.series.entry(name.to_string()).or_default();
        points.push_back(point);

        points.retain(|p| p.timestamp >= cutoff);
        while points.len() > max_points {
            points.pop_front();
        }

        points.len()
    }
}

/// Thread-safe in-memory storage for counters, gauges and time series.
///
/// Cloning is cheap and every clone shares the same underlying state, so a
/// single store can be constructed at startup and handed to each component
/// that records or reads metrics.
#[derive(Debug)]
pub struct MetricsStore {
    /// The retention duration for points (in milliseconds).
    retention_millis: i64,
    /// Maximum points kept per series.
    max_points: usize,
    state: Arc<RwLock<StoreState>>,
}

impl MetricsStore {
    /// Creates a new store with the given retention and per-series cap.
    #[must_use]
    pub fn new(retention: Duration, max_points: usize) -> Self {
        Self {
            retention_millis: i64::try_from(retention.as_millis()).unwrap_or(i64::MAX),
            max_points: max_points.max(1),
            state: Arc::new(RwLock::new(StoreState::default())),
        }
    }

    /// Creates a store using the limits from `config`.
    #[must_use]
    pub fn from_config(config: &MetricsConfig) -> Self {
        Self::new(config.retention(), config.storage.max_points_per_series)
    }

    /// Returns the retention duration in milliseconds.
    #[must_use]
    pub const fn retention_millis(&self) -> i64 {
        self.retention_millis
    }

    /// Returns the per-series point cap.
    #[must_use]
    pub const fn max_points(&self) -> usize {
        self.max_points
    }

    fn cutoff(&self) -> i64 {
        MetricPoint::now_timestamp().saturating_sub(self.retention_millis)
    }

    // ============ Writes ============

    /// Appends a fully built point to the named series.
    ///
    /// Points older than the retention window are purged from that series
    /// and the oldest points are evicted once the cap is exceeded.
    pub fn record_point(&self, name: &str, point: MetricPoint) {
        let cutoff = self.cutoff();
        let len = self.state.write().append(name, point, cutoff, self.max_points);
        debug!(metric = %name, points_count = len, "recorded metric point");
    }

    /// Records `value` now, with optional labels and unit.
    pub fn record_metric(&self, name: &str, value: f64, labels: Labels, unit: Option<&str>) {
        let mut point = MetricPoint::now(value).with_labels(labels);
        point.unit = unit.map(str::to_string);
        self.record_point(name, point);
    }

    /// Adds `delta` to the named counter and records the delta in its series.
    ///
    /// Returns the counter's new value.
    pub fn increment_counter(&self, name: &str, delta: f64, labels: Labels) -> f64 {
        let cutoff = self.cutoff();
        let point = MetricPoint::now(delta).with_labels(labels);

        let mut state = self.state.write();
        let counter = state.counters.entry(name.to_string()).or_insert(0.0);
        *counter += delta;
        let total = *counter;
        state.append(name, point, cutoff, self.max_points);
        drop(state);

        debug!(metric = %name, delta, total, "incremented counter");
        total
    }

    /// Overwrites the named gauge and records the value in its series.
    pub fn set_gauge(&self, name: &str, value: f64, labels: Labels) {
        let cutoff = self.cutoff();
        let point = MetricPoint::now(value).with_labels(labels);

        let mut state = self.state.write();
        state.gauges.insert(name.to_string(), value);
        state.append(name, point, cutoff, self.max_points);
        drop(state);

        debug!(metric = %name, value, "set gauge");
    }

    /// Records a duration in seconds (unit `seconds`).
    pub fn record_duration(&self, name: &str, seconds: f64, labels: Labels) {
        self.record_metric(name, seconds, labels, Some(SECONDS_UNIT));
    }

    // ============ Reads ============

    /// Current value of the named counter; zero if never incremented.
    #[must_use]
    pub fn get_counter(&self, name: &str) -> f64 {
        self.state.read().counters.get(name).copied().unwrap_or(0.0)
    }

    /// Last value set on the named gauge.
    #[must_use]
    pub fn get_gauge(&self, name: &str) -> Option<f64> {
        self.state.read().gauges.get(name).copied()
    }

    /// Value of the most recently recorded point in the named series.
    #[must_use]
    pub fn get_latest(&self, name: &str) -> Option<f64> {
        self.state
            .read()
            .series
            .get(name)
            .and_then(VecDeque::back)
            .map(|p| p.value)
    }

    /// Statistics over the named series, optionally restricted to the last
    /// `window_minutes`. Returns `None` when there are no matching points.
    #[must_use]
    pub fn get_metric_summary(&self, name: &str, window_minutes: Option<u32>) -> Option<MetricsSummary> {
        let since = window_start(window_minutes);

        let values: Vec<f64> = {
            let state = self.state.read();
            state
                .series
                .get(name)?
                .iter()
                .filter(|p| since.is_none_or(|since| p.timestamp >= since))
                .map(|p| p.value)
                .collect()
        };

        MetricsSummary::from_values(values)
    }

    /// Every series as serializable point views, optionally restricted to the
    /// last `window_minutes`.
    #[must_use]
    pub fn get_all_metrics(&self, window_minutes: Option<u32>) -> BTreeMap<String, Vec<PointView>> {
        let since = window_start(window_minutes);
        let state = self.state.read();

        state
            .series
            .iter()
            .map(|(name, points)| {
                let views = points
                    .iter()
                    .filter(|p| since.is_none_or(|since| p.timestamp >= since))
                    .map(PointView::from)
                    .collect();
                (name.clone(), views)
            })
            .collect()
    }

    /// Grouped snapshot for the dashboard.
    #[must_use]
    pub fn get_dashboard_data(&self) -> DashboardData {
        DashboardData::collect(self)
    }

    /// Names of all series, sorted.
    #[must_use]
    pub fn metric_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.read().series.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of points stored for the named series; zero if unknown.
    #[must_use]
    pub fn series_len(&self, name: &str) -> usize {
        self.state.read().series.get(name).map_or(0, VecDeque::len)
    }

    // ============ Maintenance ============

    /// Applies the retention window to every series and drops empty ones.
    ///
    /// Writes already purge their own series lazily; this sweeps series that
    /// are no longer written to.
    pub fn expire_old_data(&self) {
        let cutoff = self.cutoff();
        let mut state = self.state.write();

        for points in state.series.values_mut() {
            points.retain(|p| p.timestamp >= cutoff);
        }
        state.series.retain(|_, points| !points.is_empty());
    }

    /// Clears all counters, gauges and series.
    pub fn reset(&self) {
        let mut state = self.state.write();
        state.series.clear();
        state.counters.clear();
        state.gauges.clear();
        drop(state);

        debug!("metrics store reset");
    }
}

/// Millisecond timestamp at the start of a trailing window.
fn window_start(window_minutes: Option<u32>) -> Option<i64> {
    window_minutes.map(|minutes| MetricPoint::now_timestamp() - i64::from(minutes) * 60_000)
}

impl Clone for MetricsStore {
    fn clone(&self) -> Self {
        Self {
            retention_millis: self.retention_millis,
            max_points: self.max_points,
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(DEFAULT_RETENTION_HOURS * 3600),
            DEFAULT_MAX_POINTS_PER_SERIES,
        )
    }
}
