//! # Turnstile CLI
//!
//! Command-line definition and main entry point of the `turnstile` binary.

use super::workload::{self, WorkloadReport, WorkloadSpec};
use crate::config::{self, TurnstileConfig, WorkloadMode};
use crate::utils::logging::init_logging;
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::{path::PathBuf, time::Duration};
use turnstile_common::ConcurrencyLimit;

const DEFAULT_LIMIT: ConcurrencyLimit = ConcurrencyLimit::clamped(2);
const DEFAULT_JOBS: usize = 8;
const DEFAULT_WORK_MS: u64 = 50;

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Turnstile: drive a synthetic workload through a FIFO admission controller.
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about,
    long_about = "turnstile submits a batch of sleeping jobs to a FIFO admission controller
and reports the start order, peak concurrency and failure count.

Examples:
   turnstile --limit 3 --jobs 20 --work-ms 40
   turnstile --mode tasks --fail-every 4 --format json
   turnstile --config turnstile.toml"
)]
pub struct Cli {
    /// Maximum number of jobs allowed to run at once
    #[arg(long, allow_negative_numbers = true)]
    pub limit: Option<ConcurrencyLimit>,

    /// Number of jobs to submit
    #[arg(long)]
    pub jobs: Option<usize>,

    /// Base duration of each job in milliseconds
    #[arg(long)]
    pub work_ms: Option<u64>,

    /// Random extra duration per job, up to this many milliseconds
    #[arg(long)]
    pub jitter_ms: Option<u64>,

    /// Make every n-th job fail (0 disables)
    #[arg(long)]
    pub fail_every: Option<usize>,

    /// Run jobs on threads or tokio tasks
    #[arg(long, value_enum)]
    pub mode: Option<WorkloadMode>,

    /// Report output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Path to a TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Log to stderr instead of file
    #[arg(long)]
    pub log_to_stderr: bool,
}

impl Cli {
    /// Merges flags over file values over built-in defaults.
    pub fn resolve(&self, file: &TurnstileConfig) -> WorkloadSpec {
        let workload = &file.workload;
        WorkloadSpec {
            limit: self
                .limit
                .or(file.concurrency_limit)
                .unwrap_or(DEFAULT_LIMIT),
            jobs: self.jobs.or(workload.jobs).unwrap_or(DEFAULT_JOBS),
            work: Duration::from_millis(
                self.work_ms.or(workload.work_ms).unwrap_or(DEFAULT_WORK_MS),
            ),
            jitter: Duration::from_millis(self.jitter_ms.or(workload.jitter_ms).unwrap_or(0)),
            fail_every: self.fail_every.or(workload.fail_every).unwrap_or(0),
            mode: self.mode.or(workload.mode).unwrap_or_default(),
        }
    }
}

/// Loads configuration, runs the workload and returns its report.
pub async fn execute(cli: &Cli) -> Result<WorkloadReport> {
    let file_config = match &cli.config {
        Some(path) => config::load_from_file(path)?,
        None => TurnstileConfig::default(),
    };
    let spec = cli.resolve(&file_config);

    if spec.limit.is_zero() && spec.jobs > 0 {
        bail!(
            "concurrency limit 0 admits no jobs; {} job(s) would wait forever",
            spec.jobs
        );
    }

    tracing::info!(
        limit = %spec.limit,
        jobs = spec.jobs,
        mode = ?spec.mode,
        "starting workload"
    );

    let report = match spec.mode {
        WorkloadMode::Threads => {
            let blocking_spec = spec.clone();
            tokio::task::spawn_blocking(move || workload::run_threads(&blocking_spec))
                .await
                .context("thread workload driver did not finish")??
        }
        WorkloadMode::Tasks => workload::run_tasks(&spec).await?,
    };

    tracing::info!(
        peak = report.peak_concurrency,
        failed = report.failed,
        elapsed_ms = report.elapsed_ms as u64,
        "workload finished"
    );
    Ok(report)
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug { "debug" } else { "info" };
    init_logging(log_level, !cli.log_to_stderr)?;

    let report = execute(&cli).await?;
    match cli.format {
        OutputFormat::Text => workload::print_text_report(&report),
        OutputFormat::Json => workload::print_json_report(&report)?,
    }
    Ok(())
}
