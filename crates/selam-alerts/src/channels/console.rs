use std::io::Write;

use async_trait::async_trait;

use super::AlertChannel;
use crate::error::Result;
use crate::types::{Alert, AlertSeverity};

const RESET: &str = "\x1b[0m";

const fn ansi_color(severity: AlertSeverity) -> &'static str {
    match severity {
        AlertSeverity::Debug => "\x1b[36m",
        AlertSeverity::Info => "\x1b[32m",
        AlertSeverity::Warning => "\x1b[33m",
        AlertSeverity::Error => "\x1b[31m",
        AlertSeverity::Critical => "\x1b[35m",
    }
}

/// Prints alerts to standard output, optionally colorized by severity.
#[derive(Debug, Clone)]
pub struct ConsoleChannel {
    colorize: bool,
}

impl ConsoleChannel {
    /// Creates a console channel.
    #[must_use]
    pub const fn new(colorize: bool) -> Self {
        Self { colorize }
    }

    /// The exact text written for `alert`.
    #[must_use]
    pub fn format_alert(&self, alert: &Alert) -> String {
        let headline = format!("[ALERT {}] {}", alert.severity.label(), alert.message);
        let mut out = if self.colorize {
            format!("{}{headline}{RESET}\n", ansi_color(alert.severity))
        } else {
            format!("{headline}\n")
        };

        if !alert.context.is_empty() {
            let context = serde_json::to_string_pretty(&alert.context)
                .unwrap_or_else(|_| format!("{:?}", alert.context));
            out.push_str(&format!("  Context: {context}\n"));
        }
        out
    }
}

impl Default for ConsoleChannel {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl AlertChannel for ConsoleChannel {
    fn name(&self) -> &str {
        "console"
    }

    async fn try_send(&self, alert: &Alert) -> Result<()> {
        let text = self.format_alert(alert);
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}
