use crate::discovery::DEFAULT_EXTENSION;
use crate::error::{HarnessError, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default number of timed runs per benchmark
pub const DEFAULT_REPEAT_COUNT: usize = 5;

/// Default per-invocation deadline for test runs
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Benchmarks wait for the program unless a deadline is configured
pub const DEFAULT_BENCH_TIMEOUT: Option<Duration> = None;

/// Configuration for running tests and benchmarks
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Hide PASS lines but still count them
    pub suppress_passed_output: bool,
    /// Abort the run at the first FAIL or TIMEOUT
    pub stop_on_first_failure: bool,
    pub repeat_count: usize,
    /// `None` waits forever
    pub timeout: Option<Duration>,
    pub verbose: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            suppress_passed_output: false,
            stop_on_first_failure: false,
            repeat_count: DEFAULT_REPEAT_COUNT,
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            verbose: false,
        }
    }
}

/// Project settings loaded from `lox-test.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SuiteConfig {
    pub interpreter: Option<PathBuf>,
    pub tests_dir: PathBuf,
    pub benchmarks_dir: PathBuf,
    pub extension: String,
    pub timeout_secs: Option<u64>,
    pub repeat_count: Option<usize>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            interpreter: None,
            tests_dir: PathBuf::from("tests"),
            benchmarks_dir: PathBuf::from("benchmarks"),
            extension: DEFAULT_EXTENSION.to_string(),
            timeout_secs: None,
            repeat_count: None,
        }
    }
}

/// Load suite settings; a missing file means defaults
pub fn load_suite_config(path: &Path) -> Result<SuiteConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SuiteConfig::default()),
        Err(e) => {
            return Err(HarnessError::Config {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
    };

    let config: SuiteConfig =
        serde_json::from_str(&content).map_err(|e| HarnessError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    if config.repeat_count == Some(0) {
        return Err(HarnessError::Config {
            path: path.to_path_buf(),
            message: "repeat_count must be at least 1".to_string(),
        });
    }

    Ok(config)
}

/// Deadline from a configured number of seconds, where 0 disables it
pub fn resolve_timeout(
    configured_secs: Option<u64>,
    default: Option<Duration>,
) -> Option<Duration> {
    match configured_secs {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => default,
    }
}

/// A flag variable is set when present with a non-empty value
pub fn env_flag(value: Option<&OsStr>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}
