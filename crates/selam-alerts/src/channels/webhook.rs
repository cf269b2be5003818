use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AlertChannel;
use crate::config::WebhookConfig;
use crate::error::{AlertError, Result};
use crate::types::{Alert, AlertContext, AlertSeverity};

/// JSON envelope posted by [`WebhookChannel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// Rule name.
    pub rule: String,
    /// Severity, lower case.
    pub severity: AlertSeverity,
    /// Rendered message.
    pub message: String,
    /// When the alert was triggered.
    pub timestamp: DateTime<Utc>,
    /// Caller supplied context.
    pub context: AlertContext,
}

impl From<&Alert> for WebhookPayload {
    fn from(alert: &Alert) -> Self {
        Self {
            rule: alert.rule_name.clone(),
            severity: alert.severity,
            message: alert.message.clone(),
            timestamp: alert.timestamp,
            context: alert.context.clone(),
        }
    }
}

/// Sends alerts as JSON to a configurable HTTP endpoint.
#[derive(Debug, Clone)]
pub struct WebhookChannel {
    config: WebhookConfig,
    method: Method,
    headers: HeaderMap,
    client: reqwest::Client,
}

impl WebhookChannel {
    /// Creates a webhook channel.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::InvalidChannel` if the URL is empty or the method
    /// or a header is not valid HTTP, and `AlertError::Http` if the client
    /// cannot be built.
    pub fn new(config: WebhookConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(AlertError::InvalidChannel {
                reason: "webhook URL cannot be empty".to_string(),
            });
        }

        let method = Method::from_bytes(config.method.to_ascii_uppercase().as_bytes()).map_err(|_| {
            AlertError::InvalidChannel {
                reason: format!("invalid HTTP method '{}'", config.method),
            }
        })?;

        // User headers may override the content type but never drop it.
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (key, value) in &config.headers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| AlertError::InvalidChannel {
                reason: format!("invalid header name '{key}'"),
            })?;
            let value = HeaderValue::from_str(value).map_err(|_| AlertError::InvalidChannel {
                reason: format!("invalid value for header '{key}'"),
            })?;
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config,
            method,
            headers,
            client,
        })
    }

    /// Returns the webhook URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Returns the HTTP method used.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }
}

#[async_trait]
impl AlertChannel for WebhookChannel {
    fn name(&self) -> &str {
        "webhook"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    async fn try_send(&self, alert: &Alert) -> Result<()> {
        let body = serde_json::to_vec(&WebhookPayload::from(alert))?;
        debug!(rule = %alert.rule_name, url = %self.config.url, "sending webhook alert");

        let response = self
            .client
            .request(self.method.clone(), &self.config.url)
            .headers(self.headers.clone())
            .body(body)
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
