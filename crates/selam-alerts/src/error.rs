//! Error types for the selam-alerts crate.

use thiserror::Error;

/// Errors that can occur in the alerting system.
///
/// Triggering an alert never returns these: throttling, unknown rules and
/// delivery failures all resolve to `false`. Errors surface from rule and
/// channel construction, template validation, and from
/// [`AlertChannel::try_send`](crate::AlertChannel::try_send) before
/// [`deliver`](crate::AlertChannel::deliver) folds them into a boolean.
#[derive(Debug, Error)]
pub enum AlertError {
    /// Invalid alert rule configuration.
    #[error("invalid alert rule: {reason}")]
    InvalidRule {
        /// The reason the rule is invalid.
        reason: String,
    },

    /// Invalid channel configuration.
    #[error("invalid alert channel: {reason}")]
    InvalidChannel {
        /// The reason the channel is invalid.
        reason: String,
    },

    /// A message template is malformed.
    #[error("invalid message template: {reason}")]
    InvalidTemplate {
        /// The reason the template was rejected.
        reason: String,
    },

    /// A template references a field the context does not provide.
    #[error("missing field '{field}'")]
    MissingField {
        /// The missing field name.
        field: String,
    },

    /// The remote end answered with a non-success status.
    #[error("unexpected HTTP status {status}")]
    HttpStatus {
        /// The status code returned.
        status: u16,
    },

    /// HTTP request failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Email construction or SMTP delivery failed.
    #[error("email error: {reason}")]
    Email {
        /// The reason the email could not be sent.
        reason: String,
    },

    /// Writing to the terminal failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for AlertError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// Result type for alerting operations.
pub type Result<T> = std::result::Result<T, AlertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_invalid_rule() {
        let err = AlertError::InvalidRule {
            reason: "empty name".to_string(),
        };
        assert_eq!(err.to_string(), "invalid alert rule: empty name");
    }

    #[test]
    fn error_display_missing_field() {
        let err = AlertError::MissingField {
            field: "symbol".to_string(),
        };
        assert_eq!(err.to_string(), "missing field 'symbol'");
    }

    #[test]
    fn error_display_http_status() {
        let err = AlertError::HttpStatus { status: 503 };
        assert_eq!(err.to_string(), "unexpected HTTP status 503");
    }

    #[test]
    fn error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: AlertError = json_err.into();
        assert!(matches!(err, AlertError::SerializationError(_)));
    }

    #[test]
    fn error_from_io() {
        let err: AlertError = std::io::Error::other("broken pipe").into();
        assert_eq!(err.to_string(), "io error: broken pipe");
    }
}
