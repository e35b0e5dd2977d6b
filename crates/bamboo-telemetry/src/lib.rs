//! Observability for Bamboo applications.
//!
//! - **Logging**: structured JSON or pretty logs through `tracing-subscriber`
//! - **Metrics**: Prometheus-format request metrics via the `metrics` crate
//!
//! The dispatcher always emits `tracing` events and `metrics` samples; this
//! crate decides where they go. Nothing is recorded until [`init_telemetry`]
//! (or the individual `init_*` functions) installs a subscriber and recorder.
//!
//! # Example
//!
//! ```rust,ignore
//! use bamboo_telemetry::{init_telemetry, LogConfig, TelemetryConfig};
//!
//! let config = TelemetryConfig {
//!     logging: LogConfig::development(),
//!     ..Default::default()
//! };
//! init_telemetry(&config)?;
//!
//! // ... later, from a metrics endpoint:
//! let text = bamboo_telemetry::metrics::render_metrics().unwrap_or_default();
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat};
pub use metrics::{init_metrics, render_metrics, InFlightGuard, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Combined telemetry configuration.
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    /// Logging configuration.
    pub logging: LogConfig,
    /// Metrics configuration.
    pub metrics: MetricsConfig,
}

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;
    Ok(())
}
