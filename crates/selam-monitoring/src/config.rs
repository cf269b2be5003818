//! Monitoring configuration loaded from `logging.yaml`, `metrics.yaml` and
//! `alerts.yaml`.
//!
//! Each file holds one top-level key (`logging`, `metrics`, `alerts`). A
//! missing file yields that section's defaults. String values of the exact
//! form `${VAR}` or `${VAR:default}` are replaced from the environment
//! before deserialization; an unset variable without a default keeps the
//! literal text.

use std::fmt;
use std::path::Path;

use selam_alerts::AlertsConfig;
use selam_metrics::MetricsConfig;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::{debug, warn};

use crate::error::{MonitoringError, Result};

/// File holding the `logging` section.
pub const LOGGING_FILE: &str = "logging.yaml";
/// File holding the `metrics` section.
pub const METRICS_FILE: &str = "metrics.yaml";
/// File holding the `alerts` section.
pub const ALERTS_FILE: &str = "alerts.yaml";

/// Default slow-request threshold in milliseconds.
pub const DEFAULT_SLOW_THRESHOLD_MS: u64 = 1000;

/// Log line encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human readable text.
    Text,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// Request timing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Whether slow requests are logged.
    pub log_slow_requests: bool,
    /// Requests slower than this are logged as warnings.
    pub slow_threshold_ms: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            log_slow_requests: true,
            slow_threshold_ms: DEFAULT_SLOW_THRESHOLD_MS,
        }
    }
}

/// The `logging` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, e.g. `info` or `selam_alerts=debug,info`.
    pub level: String,
    /// Output encoding.
    pub format: LogFormat,
    /// Request timing settings.
    pub performance: PerformanceConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            performance: PerformanceConfig::default(),
        }
    }
}

impl LoggingConfig {
    /// Sets the filter directive.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Sets the output encoding.
    #[must_use]
    pub const fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the slow-request threshold.
    #[must_use]
    pub const fn with_slow_threshold_ms(mut self, ms: u64) -> Self {
        self.performance.slow_threshold_ms = ms;
        self
    }
}

/// Configuration for the whole monitoring stack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Logging setup.
    pub logging: LoggingConfig,
    /// Metrics store limits.
    pub metrics: MetricsConfig,
    /// Alert channels, rules and throttling.
    pub alerts: AlertsConfig,
}

impl MonitoringConfig {
    /// Loads the three configuration files from `dir`, substituting
    /// environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a file exists but cannot be read or parsed, or if
    /// the resulting configuration fails validation.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Self::load_dir_with(dir, |name| std::env::var(name).ok())
    }

    /// Like [`load_dir`](Self::load_dir) but resolves `${VAR}` references
    /// through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`load_dir`](Self::load_dir).
    pub fn load_dir_with<F>(dir: impl AsRef<Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let dir = dir.as_ref();
        let config = Self {
            logging: load_section(&dir.join(LOGGING_FILE), "logging", &lookup)?,
            metrics: load_section(&dir.join(METRICS_FILE), "metrics", &lookup)?,
            alerts: load_section(&dir.join(ALERTS_FILE), "alerts", &lookup)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics limits are unusable or the log level
    /// is empty.
    pub fn validate(&self) -> Result<()> {
        self.metrics.validate()?;
        if self.logging.level.trim().is_empty() {
            return Err(MonitoringError::InvalidConfig {
                reason: "logging level cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn load_section<T, F>(path: &Path, key: &str, lookup: &F) -> Result<T>
where
    T: DeserializeOwned + Default,
    F: Fn(&str) -> Option<String>,
{
    if !path.exists() {
        warn!(path = %path.display(), "config file not found, using defaults");
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| MonitoringError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    let parse_error = |source| MonitoringError::ParseConfig {
        path: path.to_path_buf(),
        source,
    };

    let mut document: Value = serde_yaml::from_str(&content).map_err(parse_error)?;
    substitute_env(&mut document, lookup);

    match document.get(key) {
        None | Some(Value::Null) => {
            debug!(path = %path.display(), section = %key, "section absent, using defaults");
            Ok(T::default())
        }
        Some(section) => serde_yaml::from_value(section.clone()).map_err(parse_error),
    }
}

/// Replaces `${VAR}` / `${VAR:default}` string values throughout `value`.
pub fn substitute_env<F>(value: &mut Value, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    match value {
        Value::String(s) => {
            if let Some(replaced) = resolve_reference(s, lookup) {
                *s = replaced;
            }
        }
        Value::Sequence(items) => {
            for item in items {
                substitute_env(item, lookup);
            }
        }
        Value::Mapping(map) => {
            for (_, item) in map.iter_mut() {
                substitute_env(item, lookup);
            }
        }
        Value::Tagged(tagged) => substitute_env(&mut tagged.value, lookup),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

fn resolve_reference<F>(text: &str, lookup: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let expr = text.strip_prefix("${")?.strip_suffix('}')?;
    match expr.split_once(':') {
        Some((name, default)) => Some(lookup(name).unwrap_or_else(|| default.to_string())),
        None => lookup(expr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use selam_alerts::AlertSeverity;
    use std::collections::HashMap;
    use test_case::test_case;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    fn write(dir: &Path, file: &str, content: &str) {
        std::fs::write(dir.join(file), content).unwrap();
    }

    mod substitution_tests {
        use super::*;
        use test_case::test_case;

        #[test_case("${SMTP_HOST}", "smtp.example.com" ; "set variable")]
        #[test_case("${SMTP_HOST:fallback}", "smtp.example.com" ; "set variable with default")]
        #[test_case("${MISSING:fallback}", "fallback" ; "unset variable with default")]
        #[test_case("${MISSING:}", "" ; "unset variable with empty default")]
        #[test_case("${MISSING}", "${MISSING}" ; "unset variable kept literally")]
        #[test_case("host-${SMTP_HOST}", "host-${SMTP_HOST}" ; "embedded reference untouched")]
        #[test_case("plain", "plain" ; "plain string")]
        fn resolves_references(input: &str, expected: &str) {
            let mut value = Value::String(input.to_string());
            substitute_env(&mut value, &env(&[("SMTP_HOST", "smtp.example.com")]));
            assert_eq!(value, Value::String(expected.to_string()));
        }

        #[test]
        fn default_may_contain_colons() {
            let mut value = Value::String("${URL:http://localhost:9000}".to_string());
            substitute_env(&mut value, &env(&[]));
            assert_eq!(value.as_str(), Some("http://localhost:9000"));
        }

        #[test]
        fn walks_nested_documents() {
            let mut doc: Value = serde_yaml::from_str(
                "a:\n  b: ${X}\n  list:\n    - ${Y:y}\n    - 3\n",
            )
            .unwrap();
            substitute_env(&mut doc, &env(&[("X", "x")]));
            assert_eq!(doc["a"]["b"].as_str(), Some("x"));
            assert_eq!(doc["a"]["list"][0].as_str(), Some("y"));
            assert_eq!(doc["a"]["list"][1].as_u64(), Some(3));
        }
    }

    mod load_tests {
        use super::*;

        #[test]
        fn empty_directory_yields_defaults() {
            let dir = tempfile::tempdir().unwrap();
            let config = MonitoringConfig::load_dir_with(dir.path(), env(&[])).unwrap();
            assert_eq!(config, MonitoringConfig::default());
            assert_eq!(config.logging.format, LogFormat::Json);
            assert_eq!(config.logging.performance.slow_threshold_ms, 1000);
        }

        #[test]
        fn loads_all_sections() {
            let dir = tempfile::tempdir().unwrap();
            write(
                dir.path(),
                LOGGING_FILE,
                "logging:\n  level: debug\n  format: text\n  performance:\n    slow_threshold_ms: 250\n",
            );
            write(
                dir.path(),
                METRICS_FILE,
                "metrics:\n  enabled: true\n  storage:\n    retention_hours: 24\n",
            );
            write(
                dir.path(),
                ALERTS_FILE,
                r##"
alerts:
  enabled: true
  channels:
    console:
      enabled: true
      colorize: false
    slack:
      enabled: true
      webhook_url: ${SLACK_WEBHOOK_URL}
      channel: "#trading-alerts"
  rules:
    circuit_breaker_triggered:
      severity: critical
      message: "Circuit breaker triggered for {symbol}: {reason}"
      channels: [console, slack]
      cooldown_minutes: 15
    high_latency:
      severity: warning
      message: "Latency {value:.2f}s over {threshold}s"
      threshold: 2.5
      window_minutes: 5
  settings:
    max_alerts_per_hour: 50
"##,
            );

            let config = MonitoringConfig::load_dir_with(
                dir.path(),
                env(&[("SLACK_WEBHOOK_URL", "https://hooks.slack.test/T000")]),
            )
            .unwrap();

            assert_eq!(config.logging.level, "debug");
            assert_eq!(config.logging.format, LogFormat::Text);
            assert_eq!(config.logging.performance.slow_threshold_ms, 250);
            assert!(config.logging.performance.log_slow_requests);

            assert_eq!(config.metrics.storage.retention_hours, 24);
            assert_eq!(config.metrics.storage.max_points_per_series, 10_000);

            let alerts = &config.alerts;
            assert!(!alerts.channels.console.colorize);
            assert!(alerts.channels.slack.enabled);
            assert_eq!(alerts.channels.slack.webhook_url, "https://hooks.slack.test/T000");
            assert_eq!(alerts.channels.slack.channel.as_deref(), Some("#trading-alerts"));
            assert!(!alerts.channels.email.enabled);
            assert_eq!(alerts.settings.max_alerts_per_hour, 50);
            assert!(alerts.settings.rate_limit_enabled);

            let breaker = alerts.rules["circuit_breaker_triggered"]
                .to_rule("circuit_breaker_triggered")
                .unwrap();
            assert_eq!(breaker.severity, AlertSeverity::Critical);
            assert_eq!(breaker.channels, vec!["console", "slack"]);
            assert_eq!(breaker.cooldown_minutes, 15);

            let latency = &alerts.rules["high_latency"];
            assert_eq!(latency.channels, vec!["console"]);
            assert_eq!(latency.threshold, Some(2.5));
            assert_eq!(latency.window_minutes, Some(5));
        }

        #[test]
        fn missing_top_level_key_yields_defaults() {
            let dir = tempfile::tempdir().unwrap();
            write(dir.path(), METRICS_FILE, "publishing:\n  interval: 60\n");
            write(dir.path(), ALERTS_FILE, "alerts:\n");

            let config = MonitoringConfig::load_dir_with(dir.path(), env(&[])).unwrap();
            assert_eq!(config.metrics, MetricsConfig::default());
            assert_eq!(config.alerts, AlertsConfig::default());
        }

        #[test]
        fn malformed_yaml_is_an_error() {
            let dir = tempfile::tempdir().unwrap();
            write(dir.path(), LOGGING_FILE, "logging: [unclosed\n");

            let err = MonitoringConfig::load_dir_with(dir.path(), env(&[])).unwrap_err();
            assert!(matches!(err, MonitoringError::ParseConfig { .. }));
            assert!(err.to_string().contains(LOGGING_FILE));
        }

        #[test]
        fn unknown_log_format_is_an_error() {
            let dir = tempfile::tempdir().unwrap();
            write(dir.path(), LOGGING_FILE, "logging:\n  format: xml\n");
            assert!(MonitoringConfig::load_dir_with(dir.path(), env(&[])).is_err());
        }

        #[test]
        fn zero_retention_fails_validation() {
            let dir = tempfile::tempdir().unwrap();
            write(dir.path(), METRICS_FILE, "metrics:\n  storage:\n    retention_hours: 0\n");

            let err = MonitoringConfig::load_dir_with(dir.path(), env(&[])).unwrap_err();
            assert!(matches!(err, MonitoringError::Metrics(_)));
        }

        #[test]
        fn load_dir_reads_process_environment() {
            let dir = tempfile::tempdir().unwrap();
            write(dir.path(), LOGGING_FILE, "logging:\n  level: ${SELAM_TEST_UNSET_LEVEL:warn}\n");

            let config = MonitoringConfig::load_dir(dir.path()).unwrap();
            assert_eq!(config.logging.level, "warn");
        }
    }

    #[test]
    fn logging_builder() {
        let config = LoggingConfig::default()
            .with_level("debug")
            .with_format(LogFormat::Text)
            .with_slow_threshold_ms(10);
        assert_eq!(config.level, "debug");
        assert_eq!(config.format.to_string(), "text");
        assert_eq!(config.performance.slow_threshold_ms, 10);
    }

    #[test]
    fn empty_level_fails_validation() {
        let mut config = MonitoringConfig::default();
        config.logging.level = " ".to_string();
        assert!(config.validate().is_err());
    }
}
