//! Scoped duration measurement.
//!
//! A [`Timer`] records the elapsed wall-clock time into a [`MetricsStore`]
//! exactly once: either when [`Timer::stop`] is called or when the timer is
//! dropped, whichever comes first. Early returns, `?` and unwinding all
//! still record the duration.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::storage::MetricsStore;
use crate::types::Labels;

/// RAII guard that records its lifetime as a duration metric.
#[derive(Debug)]
#[must_use = "the duration is recorded as soon as the timer is dropped"]
pub struct Timer {
    store: MetricsStore,
    name: String,
    labels: Labels,
    started: Instant,
    recorded: bool,
}

impl Timer {
    /// Starts timing `name`.
    pub fn start(store: &MetricsStore, name: impl Into<String>, labels: Labels) -> Self {
        Self {
            store: store.clone(),
            name: name.into(),
            labels,
            started: Instant::now(),
            recorded: false,
        }
    }

    /// Time elapsed since the timer started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Stops the timer, records the duration and returns it in seconds.
    pub fn stop(mut self) -> f64 {
        self.finish()
    }

    fn finish(&mut self) -> f64 {
        let seconds = self.elapsed().as_secs_f64();
        if !self.recorded {
            self.recorded = true;
            let labels = std::mem::take(&mut self.labels);
            self.store.record_duration(&self.name, seconds, labels);
        }
        seconds
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if !self.recorded {
            self.finish();
        }
    }
}

/// Awaits `future` and records how long it took under `name`.
pub async fn timed<F>(store: &MetricsStore, name: &str, labels: Labels, future: F) -> F::Output
where
    F: Future,
{
    let _timer = Timer::start(store, name, labels);
    future.await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::labels;

    fn store() -> MetricsStore {
        MetricsStore::new(Duration::from_secs(3600), 100)
    }

    #[test]
    fn drop_records_once() {
        let store = store();
        {
            let _timer = Timer::start(&store, "op_seconds", Labels::new());
            std::thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(store.series_len("op_seconds"), 1);
        let summary = store.get_metric_summary("op_seconds", None).unwrap();
        assert!(summary.max >= 0.005);
    }

    #[test]
    fn stop_records_once_and_returns_seconds() {
        let store = store();
        let timer = Timer::start(&store, "op_seconds", labels([("step", "fill")]));
        let seconds = timer.stop();

        assert!(seconds >= 0.0);
        assert_eq!(store.series_len("op_seconds"), 1);

        let points = &store.get_all_metrics(None)["op_seconds"];
        assert_eq!(points[0].unit.as_deref(), Some("seconds"));
        assert_eq!(points[0].labels["step"], "fill");
    }

    #[test]
    fn error_path_still_records() {
        fn fallible(store: &MetricsStore) -> Result<(), String> {
            let _timer = Timer::start(store, "fallible_seconds", Labels::new());
            Err("exchange rejected order".to_string())?;
            Ok(())
        }

        let store = store();
        assert!(fallible(&store).is_err());
        assert_eq!(store.series_len("fallible_seconds"), 1);
    }

    #[tokio::test]
    async fn timed_records_future_duration() {
        let store = store();
        let value = timed(&store, "async_seconds", Labels::new(), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            42
        })
        .await;

        assert_eq!(value, 42);
        assert_eq!(store.series_len("async_seconds"), 1);
    }
}
