//! Core types for the alerting system.
//!
//! - [`AlertSeverity`]: how urgent an alert is
//! - [`AlertRule`]: static definition of an alertable condition
//! - [`Alert`]: one fired event, as handed to every channel

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use selam_context::CorrelationId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AlertError, Result};

/// Values available to a rule's message template, keyed by field name.
pub type AlertContext = BTreeMap<String, Value>;

/// Builds an [`AlertContext`] from key/value pairs.
///
/// ```rust
/// let ctx = selam_alerts::context([("symbol", "BTC-USD"), ("reason", "volatility")]);
/// assert_eq!(ctx["symbol"], "BTC-USD");
/// ```
pub fn context<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> AlertContext
where
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// The severity level of an alert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    /// Diagnostic detail.
    Debug,
    /// Informational alert, no action required.
    #[default]
    Info,
    /// Warning alert, should be investigated.
    Warning,
    /// Something failed.
    Error,
    /// Critical alert, requires immediate attention.
    Critical,
}

impl AlertSeverity {
    /// Returns the severity as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    /// Returns the severity in upper case, as shown in titles and subjects.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }

    /// Returns the priority of this severity (higher = more urgent).
    #[must_use]
    pub const fn priority(&self) -> u8 {
        match self {
            Self::Debug => 0,
            Self::Info => 1,
            Self::Warning => 2,
            Self::Error => 3,
            Self::Critical => 4,
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertSeverity {
    type Err = AlertError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            other => Err(AlertError::InvalidRule {
                reason: format!("unknown severity '{other}'"),
            }),
        }
    }
}

/// A rule that defines how to materialize and route an alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    /// Unique name of the rule within a manager.
    pub name: String,
    /// The severity of alerts generated by this rule.
    pub severity: AlertSeverity,
    /// Message template with `{field}` placeholders filled from the context.
    pub message_template: String,
    /// Names of the channels alerts are delivered to.
    pub channels: Vec<String>,
    /// Minimum minutes between two successful firings.
    pub cooldown_minutes: u64,
    /// Value above which [`evaluate_threshold`](crate::AlertManager::evaluate_threshold) fires.
    pub threshold: Option<f64>,
    /// Trailing window averaged by threshold evaluation; latest value when unset.
    pub window_minutes: Option<u32>,
}

impl AlertRule {
    /// Maximum allowed length for rule names.
    pub const MAX_NAME_LENGTH: usize = 256;

    /// Default cooldown between firings.
    pub const DEFAULT_COOLDOWN_MINUTES: u64 = 5;

    /// Creates a new alert rule builder.
    pub fn builder(name: impl Into<String>, message_template: impl Into<String>) -> AlertRuleBuilder {
        AlertRuleBuilder::new(name, message_template)
    }

    /// Returns the cooldown as a [`TimeDelta`].
    #[must_use]
    pub fn cooldown(&self) -> TimeDelta {
        i64::try_from(self.cooldown_minutes)
            .ok()
            .and_then(TimeDelta::try_minutes)
            .unwrap_or(TimeDelta::MAX)
    }
}

/// Builder for creating [`AlertRule`] instances.
#[derive(Debug)]
pub struct AlertRuleBuilder {
    name: String,
    message_template: String,
    severity: AlertSeverity,
    channels: Vec<String>,
    cooldown_minutes: u64,
    threshold: Option<f64>,
    window_minutes: Option<u32>,
}

impl AlertRuleBuilder {
    /// Creates a new builder with required fields.
    fn new(name: impl Into<String>, message_template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message_template: message_template.into(),
            severity: AlertSeverity::default(),
            channels: Vec::new(),
            cooldown_minutes: AlertRule::DEFAULT_COOLDOWN_MINUTES,
            threshold: None,
            window_minutes: None,
        }
    }

    /// Sets the severity level.
    #[must_use]
    pub const fn severity(mut self, severity: AlertSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Adds a delivery channel.
    #[must_use]
    pub fn channel(mut self, name: impl Into<String>) -> Self {
        self.channels.push(name.into());
        self
    }

    /// Adds several delivery channels.
    #[must_use]
    pub fn channels<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channels.extend(names.into_iter().map(Into::into));
        self
    }

    /// Sets the cooldown in minutes.
    #[must_use]
    pub const fn cooldown_minutes(mut self, minutes: u64) -> Self {
        self.cooldown_minutes = minutes;
        self
    }

    /// Sets the threshold used by threshold evaluation.
    #[must_use]
    pub const fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Sets the window averaged by threshold evaluation.
    #[must_use]
    pub const fn window_minutes(mut self, minutes: u32) -> Self {
        self.window_minutes = Some(minutes);
        self
    }

    /// Builds the [`AlertRule`].
    ///
    /// # Errors
    ///
    /// Returns `AlertError::InvalidRule` if:
    /// - The name is empty
    /// - The name exceeds the maximum length
    /// - The threshold is not a finite number
    /// - The window is zero minutes
    pub fn build(self) -> Result<AlertRule> {
        if self.name.is_empty() {
            return Err(AlertError::InvalidRule {
                reason: "rule name cannot be empty".to_string(),
            });
        }

        if self.name.len() > AlertRule::MAX_NAME_LENGTH {
            return Err(AlertError::InvalidRule {
                reason: format!(
                    "rule name exceeds maximum length of {} characters",
                    AlertRule::MAX_NAME_LENGTH
                ),
            });
        }

        if self.threshold.is_some_and(|t| !t.is_finite()) {
            return Err(AlertError::InvalidRule {
                reason: format!("threshold for rule '{}' must be finite", self.name),
            });
        }

        if self.window_minutes == Some(0) {
            return Err(AlertError::InvalidRule {
                reason: format!("window for rule '{}' must be at least one minute", self.name),
            });
        }

        Ok(AlertRule {
            name: self.name,
            severity: self.severity,
            message_template: self.message_template,
            channels: self.channels,
            cooldown_minutes: self.cooldown_minutes,
            threshold: self.threshold,
            window_minutes: self.window_minutes,
        })
    }
}

/// One fired alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// The name of the rule that generated this alert.
    pub rule_name: String,
    /// Severity copied from the rule.
    pub severity: AlertSeverity,
    /// The rendered message.
    pub message: String,
    /// When the alert was triggered.
    pub timestamp: DateTime<Utc>,
    /// Context supplied by the caller.
    pub context: AlertContext,
    /// Channels the alert is routed to.
    pub channels: Vec<String>,
    /// Correlation id bound when the alert was triggered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<CorrelationId>,
}
