//! Main configuration type.

use bamboo_telemetry::{LogConfig, MetricsConfig, TelemetryConfig};
use http::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::{AppConfig, ConfigError, LogFormat, LoggingConfig, MetricsSection};

/// Complete Bamboo application configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use bamboo_config::BambooConfig;
///
/// let config = BambooConfig::default();
/// assert!(!config.app.debug);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct BambooConfig {
    /// Application behaviour.
    #[serde(default)]
    pub app: AppConfig,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Request metrics.
    #[serde(default)]
    pub metrics: MetricsSection,
}

impl BambooConfig {
    /// Development preset: debug bodies, pretty debug-level logs.
    #[must_use]
    pub fn development() -> Self {
        Self {
            app: AppConfig {
                debug: true,
                ..AppConfig::default()
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                ansi_enabled: true,
                include_location: true,
                ..LoggingConfig::default()
            },
            metrics: MetricsSection::default(),
        }
    }

    /// Production preset: JSON info-level logs, no debug bodies.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - `app.version_tag` is empty
    /// - a default header name is not a valid HTTP token
    /// - a default header value contains CR, LF or other control characters
    /// - `logging.level` is not a valid filter directive
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app.version_tag.is_empty() {
            return Err(ConfigError::invalid_value(
                "app.version_tag",
                "must not be empty",
            ));
        }

        for header in &self.app.default_headers {
            if HeaderName::from_bytes(header.name.as_bytes()).is_err() {
                return Err(ConfigError::invalid_value(
                    "app.default_headers",
                    format!("invalid header name: {:?}", header.name),
                ));
            }
            if HeaderValue::from_str(&header.value).is_err() {
                return Err(ConfigError::invalid_value(
                    "app.default_headers",
                    format!("invalid value for header {}", header.name),
                ));
            }
        }

        if self.logging.enabled {
            bamboo_telemetry::logging::create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }

        Ok(())
    }

    /// Converts the logging section into a telemetry log configuration.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        let base = match self.logging.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty => LogConfig::development(),
        };
        LogConfig {
            enabled: self.logging.enabled,
            level: self.logging.level.clone(),
            format: self.logging.format,
            include_location: self.logging.include_location,
            ansi_enabled: self.logging.ansi_enabled,
            ..base
        }
    }

    /// Converts the metrics section into a telemetry metrics configuration.
    #[must_use]
    pub fn to_metrics_config(&self) -> MetricsConfig {
        MetricsConfig {
            enabled: self.metrics.enabled,
            service_name: self.metrics.service_name.clone(),
            ..MetricsConfig::default()
        }
    }

    /// Converts both telemetry sections.
    #[must_use]
    pub fn to_telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig {
            logging: self.to_log_config(),
            metrics: self.to_metrics_config(),
        }
    }
}
