//! # Configuration
//!
//! Optional TOML file read by the `turnstile` binary. Every field may be
//! omitted; command-line flags win over file values and built-in defaults
//! fill whatever is left.
//!
//! ```toml
//! concurrency_limit = 4
//!
//! [workload]
//! jobs = 32
//! work_ms = 25
//! jitter_ms = 10
//! fail_every = 5
//! mode = "tasks"
//! ```
//!
//! The limit is validated while parsing, so a negative `concurrency_limit`
//! fails here rather than when the scheduler is built.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use turnstile_common::ConcurrencyLimit;

/// How the workload driver runs its jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadMode {
    /// One OS thread per job, scheduled by `FifoScheduler`.
    #[default]
    Threads,
    /// One tokio task per job, scheduled by `AsyncFifoScheduler`.
    Tasks,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TurnstileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency_limit: Option<ConcurrencyLimit>,
    #[serde(default)]
    pub workload: WorkloadConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkloadConfig {
    /// Number of jobs to submit
    pub jobs: Option<usize>,
    /// Base duration of each job in milliseconds
    pub work_ms: Option<u64>,
    /// Random extra duration added to each job, up to this many milliseconds
    pub jitter_ms: Option<u64>,
    /// Make every n-th job fail (0 or absent disables failures)
    pub fail_every: Option<usize>,
    pub mode: Option<WorkloadMode>,
}

impl TurnstileConfig {
    pub fn from_toml_str(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Loads a configuration file from disk.
pub fn load_from_file(path: &Path) -> Result<TurnstileConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = TurnstileConfig::from_toml_str(path, &contents)?;
    tracing::debug!(path = %path.display(), ?config, "loaded configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(contents: &str) -> Result<TurnstileConfig, ConfigError> {
        TurnstileConfig::from_toml_str(Path::new("test.toml"), contents)
    }

    #[test]
    fn test_empty_file_is_all_defaults() {
        assert_eq!(parse("").unwrap(), TurnstileConfig::default());
    }

    #[test]
    fn test_full_file() {
        let config = parse(
            r#"
concurrency_limit = 3

[workload]
jobs = 12
work_ms = 5
jitter_ms = 2
fail_every = 4
mode = "tasks"
"#,
        )
        .unwrap();

        assert_eq!(config.concurrency_limit.map(|l| l.get()), Some(3));
        assert_eq!(config.workload.jobs, Some(12));
        assert_eq!(config.workload.fail_every, Some(4));
        assert_eq!(config.workload.mode, Some(WorkloadMode::Tasks));
    }

    #[test]
    fn test_negative_limit_is_rejected() {
        let err = parse("concurrency_limit = -1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("non-negative"));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(parse("limit = 3").is_err());
        assert!(parse("[workload]\nthreads = 2").is_err());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
