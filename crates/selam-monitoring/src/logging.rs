//! Tracing subscriber setup.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{MonitoringError, Result};

/// Builds the level filter. `RUST_LOG` wins over the configured level when
/// it is set and valid.
///
/// # Errors
///
/// Returns `MonitoringError::Logging` if the configured level does not parse.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|e| MonitoringError::Logging {
        reason: format!("invalid log level '{}': {e}", config.level),
    })
}

/// Installs the global tracing subscriber.
///
/// # Errors
///
/// Returns `MonitoringError::Logging` if the level does not parse or a
/// global subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true).with_span_list(false))
            .try_init(),
        LogFormat::Text => registry.with(fmt::layer().with_target(true)).try_init(),
    };

    installed.map_err(|e| MonitoringError::Logging {
        reason: e.to_string(),
    })
}
