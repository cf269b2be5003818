use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use super::AlertChannel;
use crate::config::EmailConfig;
use crate::error::{AlertError, Result};
use crate::types::Alert;

fn email_error(err: impl fmt::Display) -> AlertError {
    AlertError::Email {
        reason: err.to_string(),
    }
}

/// Sends alerts over authenticated SMTP to a fixed recipient list.
pub struct EmailChannel {
    config: EmailConfig,
    from: Mailbox,
    to: Vec<Mailbox>,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl fmt::Debug for EmailChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailChannel")
            .field("smtp_host", &self.config.smtp_host)
            .field("smtp_port", &self.config.smtp_port)
            .field("recipients", &self.to.len())
            .finish_non_exhaustive()
    }
}

impl EmailChannel {
    /// Creates an email channel. No connection is opened until an alert is sent.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::InvalidChannel` if the host is empty, an address
    /// does not parse, or there are no recipients.
    pub fn new(config: EmailConfig) -> Result<Self> {
        if config.smtp_host.is_empty() {
            return Err(AlertError::InvalidChannel {
                reason: "smtp_host cannot be empty".to_string(),
            });
        }

        let from: Mailbox = config.from_address.parse().map_err(|e| AlertError::InvalidChannel {
            reason: format!("invalid from_address '{}': {e}", config.from_address),
        })?;

        if config.to_addresses.is_empty() {
            return Err(AlertError::InvalidChannel {
                reason: "to_addresses cannot be empty".to_string(),
            });
        }
        let to = config
            .to_addresses
            .iter()
            .map(|addr| {
                addr.parse::<Mailbox>().map_err(|e| AlertError::InvalidChannel {
                    reason: format!("invalid recipient '{addr}': {e}"),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host).map_err(|e| {
                AlertError::InvalidChannel {
                    reason: format!("invalid smtp_host '{}': {e}", config.smtp_host),
                }
            })?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
        };

        let mut builder = builder
            .port(config.smtp_port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));
        if !config.smtp_user.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_user.clone(),
                config.smtp_password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            config,
            from,
            to,
        })
    }

    /// Subject line for `alert`.
    #[must_use]
    pub fn format_subject(&self, alert: &Alert) -> String {
        format!(
            "{} {}: {}",
            self.config.subject_prefix,
            alert.severity.label(),
            alert.rule_name
        )
    }

    /// Plain-text body for `alert`.
    #[must_use]
    pub fn format_body(&self, alert: &Alert) -> String {
        let context = serde_json::to_string_pretty(&alert.context).unwrap_or_default();
        let mut body = format!(
            "Alert: {}\nSeverity: {}\nTime: {}\n\nMessage:\n{}\n\nContext:\n{context}\n",
            alert.rule_name,
            alert.severity.label(),
            alert.timestamp.to_rfc3339(),
            alert.message,
        );
        if let Some(id) = &alert.correlation_id {
            body.push_str(&format!("\nCorrelation ID: {id}\n"));
        }
        body
    }

    fn build_message(&self, alert: &Alert) -> Result<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(self.format_subject(alert))
            .header(ContentType::TEXT_PLAIN);
        for recipient in &self.to {
            builder = builder.to(recipient.clone());
        }
        builder.body(self.format_body(alert)).map_err(email_error)
    }
}

#[async_trait]
impl AlertChannel for EmailChannel {
    fn name(&self) -> &str {
        "email"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    async fn try_send(&self, alert: &Alert) -> Result<()> {
        let message = self.build_message(alert)?;
        debug!(rule = %alert.rule_name, recipients = self.to.len(), "sending email alert");
        self.transport.send(message).await.map_err(email_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::test_support::sample_alert;
    use selam_context::CorrelationId;

    fn config() -> EmailConfig {
        EmailConfig::new(
            "127.0.0.1",
            "alerts@selam.example",
            vec!["oncall@selam.example".to_string(), "risk@selam.example".to_string()],
        )
        .with_starttls(false)
        .with_port(1)
        .with_timeout_secs(2)
    }

    mod config_tests {
        use super::*;

        #[test]
        fn valid_config_builds() {
            assert!(EmailChannel::new(config()).is_ok());
        }

        #[test]
        fn empty_host_is_rejected() {
            let mut config = config();
            config.smtp_host = String::new();
            assert!(EmailChannel::new(config).is_err());
        }

        #[test]
        fn bad_sender_is_rejected() {
            let mut config = config();
            config.from_address = "not an address".to_string();
            assert!(matches!(
                EmailChannel::new(config),
                Err(AlertError::InvalidChannel { .. })
            ));
        }

        #[test]
        fn missing_recipients_are_rejected() {
            let mut config = config();
            config.to_addresses.clear();
            assert!(EmailChannel::new(config).is_err());
        }

        #[test]
        fn debug_hides_credentials() {
            let channel = EmailChannel::new(config().with_credentials("bot", "hunter2")).unwrap();
            assert!(!format!("{channel:?}").contains("hunter2"));
        }
    }

    mod format_tests {
        use super::*;

        #[test]
        fn subject_has_prefix_severity_and_rule() {
            let channel = EmailChannel::new(config()).unwrap();
            assert_eq!(
                channel.format_subject(&sample_alert()),
                "[SelamAI Alert] CRITICAL: circuit_breaker_triggered"
            );
        }

        #[test]
        fn body_lists_details() {
            let channel = EmailChannel::new(config()).unwrap();
            let mut alert = sample_alert();
            alert.correlation_id = Some(CorrelationId::from("trade-123-456"));

            let body = channel.format_body(&alert);
            assert!(body.starts_with("Alert: circuit_breaker_triggered\nSeverity: CRITICAL\n"));
            assert!(body.contains("Time: 2024-03-01T12:00:00+00:00"));
            assert!(body.contains("Message:\nCircuit breaker triggered for BTC-USD: volatility"));
            assert!(body.contains("\"symbol\": \"BTC-USD\""));
            assert!(body.contains("Correlation ID: trade-123-456"));
        }

        #[test]
        fn message_addresses_every_recipient() {
            let channel = EmailChannel::new(config()).unwrap();
            let message = channel.build_message(&sample_alert()).unwrap();
            let formatted = String::from_utf8(message.formatted()).unwrap();
            assert!(formatted.contains("oncall@selam.example"));
            assert!(formatted.contains("risk@selam.example"));
        }
    }

    #[tokio::test]
    async fn unreachable_server_is_a_failure() {
        let channel = EmailChannel::new(config()).unwrap();
        assert!(!channel.deliver(&sample_alert()).await);
    }
}
