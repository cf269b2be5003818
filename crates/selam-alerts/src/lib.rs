//! Rule-based alerting for the SelamAI trading backend.
#![forbid(unsafe_code)]
//!
//! `selam-alerts` turns named rules into rendered alerts and delivers them
//! to console, email, Slack-style and generic webhook channels.
//!
//! # Features
//!
//! - **Throttling**: per-rule cooldown plus a global hourly cap
//! - **Templates**: `{field}` and `{field:.2f}` placeholders filled from the
//!   trigger context; incomplete context degrades the message instead of
//!   dropping the alert
//! - **Concurrent fan-out**: one slow or failing channel never blocks the others
//! - **Threshold rules**: fire when a metric's latest value or window mean
//!   exceeds a limit
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use selam_alerts::{context, AlertManager, AlertRule, AlertSeverity, ConsoleChannel};
//!
//! # async fn example() -> selam_alerts::Result<()> {
//! let manager = AlertManager::new();
//! manager.add_channel("console", Arc::new(ConsoleChannel::default()));
//! manager.add_rule(
//!     AlertRule::builder("trade_failed", "Trade failed: {error_message}")
//!         .severity(AlertSeverity::Error)
//!         .channel("console")
//!         .build()?,
//! );
//!
//! let fired = manager
//!     .trigger("trade_failed", context([("error_message", "insufficient margin")]))
//!     .await;
//! assert!(fired);
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/selam-alerts/0.1.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod channels;
pub mod config;
pub mod error;
pub mod manager;
pub mod template;
pub mod types;

// Re-export main types at crate root
pub use channels::{
    build_channels, AlertChannel, ConsoleChannel, EmailChannel, SlackChannel, WebhookChannel,
    WebhookPayload,
};
pub use config::{
    AlertSettings, AlertsConfig, ChannelsConfig, ConsoleConfig, EmailConfig, RuleConfig, SlackConfig,
    WebhookConfig,
};
pub use error::{AlertError, Result};
pub use manager::{AlertManager, AlertStats};
pub use types::{context, Alert, AlertContext, AlertRule, AlertRuleBuilder, AlertSeverity};
