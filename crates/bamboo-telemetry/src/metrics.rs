//! Prometheus request metrics for Bamboo.
//!
//! Metrics are recorded through the `metrics` facade. [`init_metrics`]
//! installs a Prometheus recorder without an HTTP listener; the rendered text
//! exposition is available from [`render_metrics`] for whatever endpoint the
//! application chooses to expose it on. Recording before a recorder is
//! installed is a no-op.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `bamboo_requests_total` | Counter | `route`, `status` | Total requests |
//! | `bamboo_request_duration_seconds` | Histogram | `route` | Request latency |
//! | `bamboo_in_flight_requests` | Gauge | - | In-flight requests |
//! | `bamboo_handler_failures_total` | Counter | `route` | Unhandled handler failures |

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Request counter name.
pub const REQUESTS_TOTAL: &str = "bamboo_requests_total";
/// Request duration histogram name.
pub const REQUEST_DURATION_SECONDS: &str = "bamboo_request_duration_seconds";
/// In-flight gauge name.
pub const IN_FLIGHT_REQUESTS: &str = "bamboo_in_flight_requests";
/// Handler failure counter name.
pub const HANDLER_FAILURES_TOTAL: &str = "bamboo_handler_failures_total";

/// Route label used for requests that matched no pattern.
pub const UNMATCHED_ROUTE: &str = "<unmatched>";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Service name, attached as a global `service` label.
    pub service_name: String,

    /// Histogram buckets for request duration.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            service_name: "bamboo".to_string(),
            // 1ms .. 10s
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

/// Initializes the metrics subsystem.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if the buckets are invalid or a
/// global recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .add_global_label("service", config.service_name.clone())
        .set_buckets_for_metric(
            Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);
    register_metric_descriptions();

    Ok(())
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(REQUESTS_TOTAL, "Total number of requests dispatched");
    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        "Request dispatch duration in seconds"
    );
    describe_gauge!(
        IN_FLIGHT_REQUESTS,
        "Number of requests currently being dispatched"
    );
    describe_counter!(
        HANDLER_FAILURES_TOTAL,
        "Total number of unhandled endpoint failures"
    );
}

/// Records a completed request.
///
/// # Arguments
///
/// * `route` - The matched pattern, or [`UNMATCHED_ROUTE`]
/// * `status_code` - HTTP status code
/// * `duration` - Dispatch duration
pub fn record_request(route: &str, status_code: u16, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "route" => route.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(REQUEST_DURATION_SECONDS, "route" => route.to_string())
        .record(duration.as_secs_f64());
}

/// Records an unhandled failure.
pub fn record_failure(route: &str) {
    counter!(HANDLER_FAILURES_TOTAL, "route" => route.to_string()).increment(1);
}

/// Guard that tracks one in-flight request.
///
/// The gauge is incremented on creation and decremented on drop, so it stays
/// correct even if dispatch unwinds.
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Creates a new guard and increments the in-flight gauge.
    #[must_use]
    pub fn new() -> Self {
        gauge!(IN_FLIGHT_REQUESTS).increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!(IN_FLIGHT_REQUESTS).decrement(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert_eq!(config.service_name, "bamboo");
        assert_eq!(config.duration_buckets.len(), 12);
    }

    #[test]
    fn test_disabled_metrics() {
        let config = MetricsConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(init_metrics(&config).is_ok());
    }

    #[test]
    fn test_in_flight_guard() {
        let guard = InFlightGuard::new();
        drop(guard);
    }

    #[test]
    fn test_record_functions_without_recorder() {
        record_request("/users/{id:int}", 200, Duration::from_millis(10));
        record_request(UNMATCHED_ROUTE, 404, Duration::from_micros(50));
        record_failure("/users/{id:int}");
    }

    #[test]
    fn test_empty_buckets_rejected() {
        let config = MetricsConfig {
            duration_buckets: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(
            init_metrics(&config),
            Err(TelemetryError::MetricsInit(_))
        ));
    }
}
