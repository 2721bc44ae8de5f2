//! Shared configuration for the Weaver query engine.
//!
//! [`Config`] carries the logging settings consumed by telemetry
//! initialisation and the anchor capture used by transformations. It is
//! loaded through `ortho_config`, which layers built-in defaults, an
//! optional TOML file (`--config-path` or `WEAVER_QUERY_CONFIG_PATH`),
//! `WEAVER_QUERY_*` environment variables and command-line flags, in that
//! order of increasing precedence.

mod defaults;
mod logging;

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{
    DEFAULT_ANCHOR_CAPTURE, DEFAULT_LOG_FILTER, ENV_ANCHOR_CAPTURE, ENV_CONFIG_PATH,
    ENV_LOG_FILTER, ENV_LOG_FORMAT, default_anchor_capture, default_log_filter,
    default_log_filter_string, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Runtime configuration for the query engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "WEAVER_QUERY")]
pub struct Config {
    /// `tracing` filter expression, e.g. `info` or `weaver_query=debug`.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for log records.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Capture whose span a transformation replaces.
    #[serde(default = "default_anchor_capture")]
    #[ortho_config(default = default_anchor_capture())]
    pub anchor_capture: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            anchor_capture: default_anchor_capture(),
        }
    }
}

impl Config {
    /// Loads the layered configuration from `args` (program name first) and
    /// the process environment, then validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] when a layer cannot be read or merged,
    /// and [`ConfigError::Invalid`] when the merged values are inconsistent.
    pub fn load_validated<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let config = Self::load_from_iter(args).map_err(|source| ConfigError::Load { source })?;
        config.validated()
    }

    /// Checks a configuration assembled in code.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the anchor capture is empty.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let anchor = self.anchor_capture.trim_start_matches('@');
        if anchor.is_empty() {
            return Err(ConfigError::Invalid {
                message: "anchor_capture must not be empty".to_owned(),
            });
        }
        Ok(self)
    }

    /// Returns the configured log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns the configured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the anchor capture name as configured; a leading `@` is
    /// accepted and ignored by transformations.
    #[must_use]
    pub fn anchor_capture(&self) -> &str {
        &self.anchor_capture
    }
}

/// Errors raised while assembling a [`Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration layer could not be read, parsed or merged.
    #[error("failed to load configuration: {source}")]
    Load {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// The merged configuration is inconsistent.
    #[error("invalid configuration: {message}")]
    Invalid {
        /// Description of the problem.
        message: String,
    },
}

#[cfg(test)]
mod tests;
