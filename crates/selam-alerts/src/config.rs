//! Alerting configuration (`alerts.yaml`).
//!
//! Plain serde data: every section has defaults so partial documents load.
//! Turning this data into live channels and rules happens in
//! [`AlertManager::from_config`](crate::AlertManager::from_config).

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::types::{AlertRule, AlertSeverity};

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    10
}

/// Top-level alerting configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    /// Whether alerting is enabled at all.
    pub enabled: bool,
    /// Channel definitions.
    pub channels: ChannelsConfig,
    /// Rule definitions keyed by rule name.
    pub rules: BTreeMap<String, RuleConfig>,
    /// Throttling and history limits.
    pub settings: AlertSettings,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            channels: ChannelsConfig::default(),
            rules: BTreeMap::new(),
            settings: AlertSettings::default(),
        }
    }
}

/// Configuration for every supported channel type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelsConfig {
    /// Terminal output.
    pub console: ConsoleConfig,
    /// SMTP email.
    pub email: EmailConfig,
    /// Slack-style incoming webhook.
    pub slack: SlackConfig,
    /// Generic JSON webhook.
    pub webhook: WebhookConfig,
}

/// Console channel settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Whether the channel is registered.
    pub enabled: bool,
    /// Colorize output by severity using ANSI escapes.
    pub colorize: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            colorize: true,
        }
    }
}

/// Email channel settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Whether the channel is registered.
    pub enabled: bool,
    /// SMTP relay host.
    pub smtp_host: String,
    /// SMTP port.
    pub smtp_port: u16,
    /// SMTP user; authentication is skipped when empty.
    pub smtp_user: String,
    /// SMTP password.
    pub smtp_password: String,
    /// Sender address.
    pub from_address: String,
    /// Recipient addresses.
    pub to_addresses: Vec<String>,
    /// Prefix placed before the subject.
    pub subject_prefix: String,
    /// Upgrade the connection with STARTTLS.
    pub starttls: bool,
    /// Connection and command timeout.
    pub timeout_secs: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_user: String::new(),
            smtp_password: String::new(),
            from_address: String::new(),
            to_addresses: Vec::new(),
            subject_prefix: "[SelamAI Alert]".to_string(),
            starttls: true,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("enabled", &self.enabled)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_user", &self.smtp_user)
            .field("smtp_password", &"<redacted>")
            .field("from_address", &self.from_address)
            .field("to_addresses", &self.to_addresses)
            .field("starttls", &self.starttls)
            .finish_non_exhaustive()
    }
}

impl EmailConfig {
    /// Creates an enabled email configuration.
    pub fn new(
        smtp_host: impl Into<String>,
        from_address: impl Into<String>,
        to_addresses: Vec<String>,
    ) -> Self {
        Self {
            enabled: true,
            smtp_host: smtp_host.into(),
            from_address: from_address.into(),
            to_addresses,
            ..Self::default()
        }
    }

    /// Sets the SMTP port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.smtp_port = port;
        self
    }

    /// Sets the SMTP credentials.
    #[must_use]
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.smtp_user = user.into();
        self.smtp_password = password.into();
        self
    }

    /// Sets whether STARTTLS is used.
    #[must_use]
    pub const fn with_starttls(mut self, starttls: bool) -> Self {
        self.starttls = starttls;
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Slack-style webhook settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    /// Whether the channel is registered.
    pub enabled: bool,
    /// Incoming webhook URL.
    pub webhook_url: String,
    /// Channel override, e.g. `#alerts`.
    pub channel: Option<String>,
    /// Display name of the bot.
    pub username: String,
    /// Emoji avatar of the bot.
    pub icon_emoji: String,
    /// Request timeout.
    pub timeout_secs: u64,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_url: String::new(),
            channel: None,
            username: "SelamAI Alert Bot".to_string(),
            icon_emoji: ":warning:".to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SlackConfig {
    /// Creates an enabled Slack configuration.
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            enabled: true,
            webhook_url: webhook_url.into(),
            ..Self::default()
        }
    }

    /// Sets the channel override.
    #[must_use]
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Generic webhook settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Whether the channel is registered.
    pub enabled: bool,
    /// The URL to send alerts to.
    pub url: String,
    /// HTTP method.
    pub method: String,
    /// HTTP headers; `Content-Type: application/json` when empty.
    pub headers: HashMap<String, String>,
    /// Request timeout.
    pub timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            method: "POST".to_string(),
            headers: HashMap::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl WebhookConfig {
    /// Creates an enabled webhook configuration.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            enabled: true,
            url: url.into(),
            ..Self::default()
        }
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Adds a header to the configuration.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// One rule as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Severity name; unknown values fall back to `info`.
    #[serde(default)]
    pub severity: String,
    /// Message template.
    pub message: String,
    /// Channel names.
    #[serde(default = "default_rule_channels")]
    pub channels: Vec<String>,
    /// Minutes between firings.
    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: u64,
    /// Optional threshold.
    #[serde(default)]
    pub threshold: Option<f64>,
    /// Optional averaging window.
    #[serde(default)]
    pub window_minutes: Option<u32>,
}

fn default_rule_channels() -> Vec<String> {
    vec!["console".to_string()]
}

const fn default_cooldown_minutes() -> u64 {
    AlertRule::DEFAULT_COOLDOWN_MINUTES
}

impl RuleConfig {
    /// Builds the rule named `name`.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::InvalidRule` when the rule fails validation.
    pub fn to_rule(&self, name: &str) -> Result<AlertRule> {
        let severity = if self.severity.is_empty() {
            AlertSeverity::default()
        } else {
            self.severity.parse().unwrap_or_else(|_| {
                warn!(rule = %name, severity = %self.severity, "unknown severity, using info");
                AlertSeverity::Info
            })
        };

        let mut builder = AlertRule::builder(name, self.message.clone())
            .severity(severity)
            .channels(self.channels.iter().cloned())
            .cooldown_minutes(self.cooldown_minutes);
        if let Some(threshold) = self.threshold {
            builder = builder.threshold(threshold);
        }
        if let Some(window) = self.window_minutes {
            builder = builder.window_minutes(window);
        }
        builder.build()
    }
}

/// Throttling and history limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    /// Whether the global hourly cap applies.
    pub rate_limit_enabled: bool,
    /// Successful alerts allowed per rolling hour, across all rules.
    pub max_alerts_per_hour: usize,
    /// Maximum alerts kept in history.
    pub max_history: usize,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            rate_limit_enabled: default_true(),
            max_alerts_per_hour: 100,
            max_history: 10_000,
        }
    }
}

impl AlertSettings {
    /// Sets whether the hourly cap applies.
    #[must_use]
    pub const fn with_rate_limit(mut self, enabled: bool) -> Self {
        self.rate_limit_enabled = enabled;
        self
    }

    /// Sets the hourly cap.
    #[must_use]
    pub const fn with_max_alerts_per_hour(mut self, max: usize) -> Self {
        self.max_alerts_per_hour = max;
        self
    }

    /// Sets the history cap.
    #[must_use]
    pub const fn with_max_history(mut self, max: usize) -> Self {
        self.max_history = max;
        self
    }
}
