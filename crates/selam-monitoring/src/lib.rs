//! Observability setup for the SelamAI trading backend.
#![forbid(unsafe_code)]
//!
//! `selam-monitoring` wires the correlation context, metrics store and alert
//! manager into one application root:
//!
//! - [`MonitoringConfig::load_dir`] reads `logging.yaml`, `metrics.yaml` and
//!   `alerts.yaml`, substituting `${VAR}` / `${VAR:default}` references
//! - [`init_tracing`] installs a JSON or text `tracing` subscriber
//! - [`Monitoring`] owns the store, exporter and alert manager; clone it into
//!   whatever needs them
//! - [`create_router`] serves the read-only monitoring API, and
//!   [`track_requests`] adds correlation ids and request metrics to any router
//!
//! # Example
//!
//! ```rust,no_run
//! use selam_monitoring::{create_router, init_tracing, Monitoring, MonitoringConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MonitoringConfig::load_dir("config/monitoring")?;
//! init_tracing(&config.logging)?;
//!
//! let monitoring = Monitoring::from_config(&config)?;
//! let app = create_router(monitoring.clone());
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/selam-monitoring/0.1.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod monitoring;
pub mod routes;

// Re-export main types at crate root
pub use config::{LogFormat, LoggingConfig, MonitoringConfig, PerformanceConfig};
pub use error::{MonitoringError, Result};
pub use logging::init_tracing;
pub use middleware::{instrument, track_requests, CORRELATION_ID_HEADER};
pub use monitoring::{AlertsStatus, LoggingStatus, MetricsStatus, Monitoring, MonitoringStatus};
pub use routes::create_router;
