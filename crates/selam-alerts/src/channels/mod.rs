//! Alert delivery channels.
//!
//! Every channel implements [`AlertChannel`]. Implementations report
//! failures from [`try_send`](AlertChannel::try_send); the provided
//! [`deliver`](AlertChannel::deliver) turns that into a boolean and a log
//! line, which is all the manager ever sees.

mod console;
mod email;
mod slack;
mod webhook;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::config::ChannelsConfig;
use crate::error::Result;
use crate::types::{Alert, AlertSeverity};

pub use console::ConsoleChannel;
pub use email::EmailChannel;
pub use slack::SlackChannel;
pub use webhook::{WebhookChannel, WebhookPayload};

/// Trait for alert delivery channels.
///
/// Implement this trait to add a delivery target. Channels own their
/// timeouts and any retry policy; the manager calls each channel once per
/// alert.
#[async_trait]
pub trait AlertChannel: Send + Sync + fmt::Debug {
    /// Returns the channel type name, used in logs.
    fn name(&self) -> &str;

    /// Returns true if this channel is enabled.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Sends the alert.
    ///
    /// # Errors
    ///
    /// Returns an error describing why the alert was not delivered.
    async fn try_send(&self, alert: &Alert) -> Result<()>;

    /// Sends the alert and reports success as a boolean, logging failures.
    async fn deliver(&self, alert: &Alert) -> bool {
        match self.try_send(alert).await {
            Ok(()) => {
                info!(channel = %self.name(), rule = %alert.rule_name, "alert delivered");
                true
            }
            Err(e) => {
                error!(
                    channel = %self.name(),
                    rule = %alert.rule_name,
                    error = %e,
                    "alert delivery failed"
                );
                false
            }
        }
    }
}

/// Builds the enabled channels described by `config`, keyed by type name.
///
/// Channels that are enabled but cannot be constructed are skipped with a
/// warning so a single bad channel never prevents startup.
pub fn build_channels(config: &ChannelsConfig) -> Vec<(String, Arc<dyn AlertChannel>)> {
    let mut channels: Vec<(String, Arc<dyn AlertChannel>)> = Vec::new();

    if config.console.enabled {
        channels.push((
            "console".to_string(),
            Arc::new(ConsoleChannel::new(config.console.colorize)),
        ));
    }

    if config.email.enabled {
        match EmailChannel::new(config.email.clone()) {
            Ok(channel) => channels.push(("email".to_string(), Arc::new(channel))),
            Err(e) => warn!(channel = "email", error = %e, "skipping misconfigured channel"),
        }
    }

    if config.slack.enabled {
        match SlackChannel::new(config.slack.clone()) {
            Ok(channel) => channels.push(("slack".to_string(), Arc::new(channel))),
            Err(e) => warn!(channel = "slack", error = %e, "skipping misconfigured channel"),
        }
    }

    if config.webhook.enabled {
        match WebhookChannel::new(config.webhook.clone()) {
            Ok(channel) => channels.push(("webhook".to_string(), Arc::new(channel))),
            Err(e) => warn!(channel = "webhook", error = %e, "skipping misconfigured channel"),
        }
    }

    channels
}

/// Hex color used for a severity in chat attachments.
#[must_use]
pub const fn severity_color(severity: AlertSeverity) -> &'static str {
    match severity {
        AlertSeverity::Debug => "#36A2EB",
        AlertSeverity::Info => "#4BC0C0",
        AlertSeverity::Warning => "#FFCE56",
        AlertSeverity::Error => "#FF6384",
        AlertSeverity::Critical => "#FF4444",
    }
}
