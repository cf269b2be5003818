use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::{severity_color, AlertChannel};
use crate::config::SlackConfig;
use crate::error::{AlertError, Result};
use crate::template::display_value;
use crate::types::Alert;

/// Footer shown under every attachment.
pub const FOOTER: &str = "SelamAI Trading Platform";

/// Posts alerts to a Slack-style incoming webhook.
#[derive(Debug, Clone)]
pub struct SlackChannel {
    config: SlackConfig,
    client: reqwest::Client,
}

impl SlackChannel {
    /// Creates a Slack channel.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::InvalidChannel` if the webhook URL is empty and
    /// `AlertError::Http` if the HTTP client cannot be built.
    pub fn new(config: SlackConfig) -> Result<Self> {
        if config.webhook_url.is_empty() {
            return Err(AlertError::InvalidChannel {
                reason: "slack webhook_url cannot be empty".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Returns the webhook URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.config.webhook_url
    }

    /// Builds the attachment payload for `alert`.
    #[must_use]
    pub fn format_payload(&self, alert: &Alert) -> Value {
        let fields: Vec<Value> = alert
            .context
            .iter()
            .map(|(key, value)| {
                json!({
                    "title": key,
                    "value": display_value(value),
                    "short": true,
                })
            })
            .collect();

        let mut payload = json!({
            "username": self.config.username,
            "icon_emoji": self.config.icon_emoji,
            "attachments": [{
                "color": severity_color(alert.severity),
                "title": format!("{}: {}", alert.severity.label(), alert.rule_name),
                "text": alert.message,
                "fields": fields,
                "footer": FOOTER,
                "ts": alert.timestamp.timestamp(),
            }],
        });

        if let (Some(channel), Some(map)) = (&self.config.channel, payload.as_object_mut()) {
            map.insert("channel".to_string(), Value::from(channel.as_str()));
        }
        payload
    }
}

#[async_trait]
impl AlertChannel for SlackChannel {
    fn name(&self) -> &str {
        "slack"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    async fn try_send(&self, alert: &Alert) -> Result<()> {
        let payload = self.format_payload(alert);
        debug!(rule = %alert.rule_name, "posting slack alert");

        let response = self
            .client
            .post(&self.config.webhook_url)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(AlertError::HttpStatus {
                status: status.as_u16(),
            })
        }
    }
}
