//! Default values shared by the query engine and its hosts.

use crate::logging::LogFormat;

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Capture name marking the span a transformation replaces.
pub const DEFAULT_ANCHOR_CAPTURE: &str = "from";

/// Environment variable naming a TOML configuration file.
pub const ENV_CONFIG_PATH: &str = "WEAVER_QUERY_CONFIG_PATH";

/// Environment variable overriding the log filter.
pub const ENV_LOG_FILTER: &str = "WEAVER_QUERY_LOG_FILTER";

/// Environment variable overriding the log format.
pub const ENV_LOG_FORMAT: &str = "WEAVER_QUERY_LOG_FORMAT";

/// Environment variable overriding the anchor capture name.
pub const ENV_ANCHOR_CAPTURE: &str = "WEAVER_QUERY_ANCHOR_CAPTURE";

/// Default log filter expression.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Owned anchor capture name used by serde defaults.
#[must_use]
pub fn default_anchor_capture() -> String {
    DEFAULT_ANCHOR_CAPTURE.to_owned()
}
