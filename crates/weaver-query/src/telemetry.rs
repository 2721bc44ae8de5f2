//! `tracing` subscriber setup for hosts embedding the engine.
//!
//! The engine itself only emits events; installing a subscriber is left to
//! the host. [`initialise`] installs a process-wide `fmt` subscriber built
//! from a [`Config`], at most once per process.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use weaver_config::{Config, LogFormat};

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Proof that telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter expression is not a valid `EnvFilter`.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Another global subscriber is already installed.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global subscriber on first use.
///
/// Later calls return a handle without touching global state, even if
/// `config` differs from the first call.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an invalid filter expression and
/// [`TelemetryError::Subscriber`] if a different subscriber was installed
/// outside this function.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| {
            let subscriber = build_subscriber(config)?;
            tracing::subscriber::set_global_default(subscriber)
                .map_err(TelemetryError::Subscriber)?;
            tracing::debug!(
                filter = config.log_filter(),
                format = %config.log_format(),
                "telemetry initialised"
            );
            Ok(())
        })
        .map(|_| TelemetryHandle)
}

/// Builds, without installing, the subscriber [`initialise`] would install.
///
/// Useful with [`tracing::subscriber::with_default`] in tests.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an invalid filter expression.
pub fn build_subscriber(
    config: &Config,
) -> Result<Box<dyn Subscriber + Send + Sync>, TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(fmt::time::UtcTime::rfc_3339());

    Ok(match config.log_format() {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn config_with(filter: &str, format: LogFormat) -> Config {
        Config {
            log_filter: filter.to_owned(),
            log_format: format,
            ..Config::default()
        }
    }

    #[rstest]
    #[case(LogFormat::Json)]
    #[case(LogFormat::Compact)]
    fn builds_a_subscriber_for_each_format(#[case] format: LogFormat) {
        let subscriber =
            build_subscriber(&config_with("weaver_query=trace", format)).expect("subscriber");
        tracing::subscriber::with_default(subscriber, || {
            tracing::trace!("visible to the scoped subscriber");
        });
    }

    #[test]
    fn rejects_invalid_filters() {
        let error = build_subscriber(&config_with("weaver_query=loud", LogFormat::Json))
            .err()
            .expect("invalid filter");
        assert!(matches!(error, TelemetryError::Filter(_)));
    }
}
