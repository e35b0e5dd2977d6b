//! Typed configuration for Bamboo applications.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict parsing (unknown fields are errors)
//! - Layered loading (defaults → file → env)
//!
//! [`BambooConfig`] has three sections:
//!
//! - [`AppConfig`] - debug failure bodies, versioned-route prefixing, default headers
//! - [`LoggingConfig`] - filter level and output format
//! - [`MetricsSection`] - Prometheus recorder settings
//!
//! # Example
//!
//! ```no_run
//! use bamboo_config::ConfigLoader;
//!
//! # fn main() -> Result<(), bamboo_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("bamboo.toml")?
//!     .with_env_prefix("BAMBOO")
//!     .load()?;
//!
//! bamboo_telemetry::init_telemetry(&config.to_telemetry_config()).ok();
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [app]
//! debug = false
//! insert_version = true
//! version_tag = "v"
//! default_headers = [
//!     { name = "Server", value = "bamboo" },
//! ]
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [metrics]
//! enabled = true
//! service_name = "orders"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Scalar values can be overridden with `PREFIX__SECTION__KEY`:
//!
//! - `BAMBOO__APP__DEBUG=true`
//! - `BAMBOO__APP__VERSION_TAG=api`
//! - `BAMBOO__LOGGING__LEVEL=debug`
//! - `BAMBOO__LOGGING__FORMAT=pretty`
//! - `BAMBOO__METRICS__ENABLED=false`

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::BambooConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{AppConfig, HeaderEntry, LogFormat, LoggingConfig, MetricsSection};
