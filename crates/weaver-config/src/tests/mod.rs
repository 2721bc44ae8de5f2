//! Unit tests for layered configuration loading.

use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;
use rstest::{fixture, rstest};
use tempfile::TempDir;

use crate::{
    Config, ConfigError, ENV_ANCHOR_CAPTURE, ENV_CONFIG_PATH, ENV_LOG_FILTER, ENV_LOG_FORMAT,
    LogFormat,
};

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

const KEYS: [&str; 4] = [
    ENV_CONFIG_PATH,
    ENV_LOG_FILTER,
    ENV_LOG_FORMAT,
    ENV_ANCHOR_CAPTURE,
];

/// Serialises access to the process environment and restores every
/// `WEAVER_QUERY_*` variable on drop.
struct Environment {
    previous: Vec<(&'static str, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl Environment {
    fn isolated() -> Self {
        let guard = ENV_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let previous = KEYS
            .iter()
            .map(|key| (*key, std::env::var_os(key)))
            .collect();
        for key in KEYS {
            // Environment mutation is unsafe in edition 2024; the mutex keeps
            // it single-threaded within this test binary.
            unsafe { std::env::remove_var(key) };
        }
        Self {
            previous,
            _guard: guard,
        }
    }

    fn set(&self, key: &str, value: impl Into<OsString>) {
        unsafe { std::env::set_var(key, value.into()) };
    }
}

impl Drop for Environment {
    fn drop(&mut self) {
        for (key, value) in self.previous.drain(..) {
            match value {
                Some(value) => unsafe { std::env::set_var(key, value) },
                None => unsafe { std::env::remove_var(key) },
            }
        }
    }
}

#[fixture]
fn env() -> Environment {
    Environment::isolated()
}

fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("weaver-query.toml");
    fs::write(&path, contents).expect("write configuration file");
    path
}

fn load(args: &[&str]) -> Result<Config, ConfigError> {
    Config::load_validated(std::iter::once("weaver-query").chain(args.iter().copied()))
}

#[test]
fn defaults_match_documented_values() {
    let config = Config::default();
    assert_eq!(config.log_filter(), "info");
    assert_eq!(config.log_format(), LogFormat::Json);
    assert_eq!(config.anchor_capture(), "from");
}

#[rstest]
fn loading_without_layers_yields_defaults(env: Environment) {
    let config = load(&[]).expect("defaults load");
    assert_eq!(config, Config::default());
    drop(env);
}

#[rstest]
fn file_values_fill_in_over_defaults(env: Environment) {
    let dir = TempDir::new().expect("temp dir");
    let path = write_config(&dir, "log_format = \"compact\"\n");
    env.set(ENV_CONFIG_PATH, path.as_os_str());

    let config = load(&[]).expect("file loads");
    assert_eq!(config.log_format(), LogFormat::Compact);
    assert_eq!(config.log_filter(), "info");
    assert_eq!(config.anchor_capture(), "from");
}

#[rstest]
fn environment_overrides_file_and_flags_override_environment(env: Environment) {
    let dir = TempDir::new().expect("temp dir");
    let path = write_config(
        &dir,
        "log_filter = \"warn\"\nanchor_capture = \"whole\"\n",
    );
    env.set(ENV_LOG_FILTER, "weaver_query=trace");
    env.set(ENV_ANCHOR_CAPTURE, "target");

    let path_arg = path.to_str().expect("utf-8 temp path");
    let config = load(&["--config-path", path_arg, "--anchor-capture", "replaced"])
        .expect("layers merge");

    assert_eq!(config.log_filter(), "weaver_query=trace");
    assert_eq!(config.anchor_capture(), "replaced");
}

#[rstest]
fn malformed_files_are_load_errors(env: Environment) {
    let dir = TempDir::new().expect("temp dir");
    let path = write_config(&dir, "log_format = \"pretty\"\n");
    env.set(ENV_CONFIG_PATH, path.as_os_str());

    let error = load(&[]).expect_err("unknown format is rejected");
    assert!(matches!(error, ConfigError::Load { .. }), "{error}");
}

#[rstest]
#[case("@")]
#[case("")]
fn empty_anchor_captures_are_invalid(#[case] anchor: &str) {
    let config = Config {
        anchor_capture: anchor.to_owned(),
        ..Config::default()
    };
    let error = config.validated().expect_err("anchor must not be empty");
    assert!(matches!(error, ConfigError::Invalid { .. }));
}

#[rstest]
fn empty_anchor_from_flags_is_invalid(env: Environment) {
    let error = load(&["--anchor-capture", "@"]).expect_err("anchor must not be empty");
    assert_eq!(
        error.to_string(),
        "invalid configuration: anchor_capture must not be empty"
    );
    drop(env);
}
