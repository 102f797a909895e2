//! # Configuration Module
//!
//! [`ApiConfig`] is read from YAML and then adjusted from the environment.
//!
//! ## File format
//!
//! ```yaml
//! webroot: /api
//! logging:
//!   level: debug
//!   format: pretty
//!   target_filter: "resapi::router=trace"
//!   include_location: false
//!   async_logging: true
//! ```
//!
//! Every key is optional.
//!
//! ## Environment Variables
//!
//! | Variable                       | Overrides                    |
//! |--------------------------------|------------------------------|
//! | `RESAPI_WEBROOT`               | `webroot`                    |
//! | `RESAPI_LOG_LEVEL`             | `logging.level`              |
//! | `RESAPI_LOG_FORMAT`            | `logging.format`             |
//! | `RESAPI_LOG_TARGET_FILTER`     | `logging.target_filter`      |
//! | `RESAPI_LOG_INCLUDE_LOCATION`  | `logging.include_location`   |
//! | `RESAPI_LOG_ASYNC`             | `logging.async_logging`      |
//!
//! ## Usage
//!
//! ```rust,no_run
//! use resapi::config::ApiConfig;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut config = ApiConfig::load("config.yaml")?;
//! config.apply_env();
//! resapi::telemetry::init_logging_with_config(&config.logging)?;
//! # Ok(())
//! # }
//! ```

use crate::telemetry::LogConfig;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;

/// Dispatch core configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Path prefix under which the API is mounted (e.g. `/api`); empty for `/`
    pub webroot: String,
    pub logging: LogConfig,
}

impl ApiConfig {
    /// Read a YAML configuration file.
    ///
    /// # Errors
    ///
    /// When the file cannot be read or is not valid configuration YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parse configuration from YAML text. An empty document yields defaults.
    ///
    /// # Errors
    ///
    /// When the text is not valid configuration YAML.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).context("Failed to parse config YAML")
    }

    /// Apply `RESAPI_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(&|key| env::var(key).ok());
    }

    /// Apply overrides, reading variables through `lookup`.
    pub fn apply_overrides(&mut self, lookup: &dyn Fn(&str) -> Option<String>) {
        if let Some(webroot) = lookup("RESAPI_WEBROOT") {
            self.webroot = webroot;
        }
        self.logging.apply_overrides(lookup);
    }

    /// Defaults with environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }
}
