//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use serde::{Deserialize, Serialize};

pub use bamboo_telemetry::LogFormat;

/// A header added to every response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HeaderEntry {
    /// Header name.
    pub name: String,
    /// Header value.
    pub value: String,
}

impl HeaderEntry {
    /// Creates a header entry.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Application section.
///
/// # Example
///
/// ```
/// use bamboo_config::{AppConfig, HeaderEntry};
///
/// let config = AppConfig {
///     default_headers: vec![HeaderEntry::new("Server", "bamboo")],
///     ..Default::default()
/// };
/// assert!(!config.debug);
/// assert_eq!(config.version_tag, "v");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Include the failure chain in 500 response bodies.
    #[serde(default)]
    pub debug: bool,

    /// Prefix versioned routes with `/{version_tag}{n}`.
    #[serde(default = "default_insert_version")]
    pub insert_version: bool,

    /// Tag placed before the version number, e.g. `v` in `/v2/users`.
    #[serde(default = "default_version_tag")]
    pub version_tag: String,

    /// Headers added to every response unless the handler set the same name.
    #[serde(default)]
    pub default_headers: Vec<HeaderEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            debug: false,
            insert_version: default_insert_version(),
            version_tag: default_version_tag(),
            default_headers: Vec::new(),
        }
    }
}

fn default_insert_version() -> bool {
    true
}

fn default_version_tag() -> String {
    "v".to_string()
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (e.g., "info", "bamboo=debug").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Emit ANSI colours (pretty format only).
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include file and line in events.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::Json,
            ansi_enabled: false,
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

/// Metrics section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Install the Prometheus recorder.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Value of the global `service` label.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            service_name: default_service_name(),
        }
    }
}

fn default_service_name() -> String {
    "bamboo".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_defaults_from_empty_table() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.insert_version);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<AppConfig, _> = toml::from_str("debgu = true");
        assert!(result.is_err());
    }

    #[test]
    fn test_default_headers_parse() {
        let config: AppConfig = toml::from_str(
            r#"
            default_headers = [
                { name = "Server", value = "bamboo" },
                { name = "X-Frame-Options", value = "DENY" },
            ]
            "#,
        )
        .unwrap();
        assert_eq!(config.default_headers.len(), 2);
        assert_eq!(config.default_headers[1], HeaderEntry::new("X-Frame-Options", "DENY"));
    }

    #[test]
    fn test_logging_format_parse() {
        let config: LoggingConfig = toml::from_str(r#"format = "pretty""#).unwrap();
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.enabled);

        let result: Result<LoggingConfig, _> = toml::from_str(r#"format = "xml""#);
        assert!(result.is_err());
    }
}
