//! Synthetic workload driver.
//!
//! Submits `jobs` sleeping jobs to a scheduler, all at once, and reports what
//! the scheduler did with them: the order jobs started in, the highest number
//! running together, and how many failed. Failures are injected on every
//! `fail_every`-th job (1-based) and come back through the scheduler as plain
//! `Err` values.

use crate::config::WorkloadMode;
use crate::probe::ConcurrencyProbe;
use crate::scheduler::{AsyncFifoScheduler, FifoScheduler};
use anyhow::{Context, Result, anyhow};
use rand::Rng;
use serde::Serialize;
use std::thread;
use std::time::{Duration, Instant};
use turnstile_common::ConcurrencyLimit;

/// Fully resolved workload parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadSpec {
    pub limit: ConcurrencyLimit,
    pub jobs: usize,
    pub work: Duration,
    pub jitter: Duration,
    /// 0 disables failure injection
    pub fail_every: usize,
    pub mode: WorkloadMode,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("job {0} failed on purpose")]
pub struct JobFailed(pub usize);

/// What happened to a workload run.
#[derive(Debug, Clone, Serialize)]
pub struct WorkloadReport {
    pub limit: u32,
    pub mode: WorkloadMode,
    pub jobs: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub peak_concurrency: usize,
    pub start_order: Vec<usize>,
    pub elapsed_ms: u128,
}

impl WorkloadSpec {
    fn durations(&self) -> Vec<Duration> {
        let mut rng = rand::rng();
        let jitter_ms = self.jitter.as_millis() as u64;
        (0..self.jobs)
            .map(|_| {
                let extra = if jitter_ms == 0 {
                    0
                } else {
                    rng.random_range(0..=jitter_ms)
                };
                self.work + Duration::from_millis(extra)
            })
            .collect()
    }

    fn outcome(&self, id: usize) -> Result<usize, JobFailed> {
        if self.fail_every > 0 && (id + 1) % self.fail_every == 0 {
            Err(JobFailed(id))
        } else {
            Ok(id)
        }
    }

    fn report(
        &self,
        probe: &ConcurrencyProbe,
        outcomes: &[Result<usize, JobFailed>],
        started: Instant,
    ) -> WorkloadReport {
        let failed = outcomes.iter().filter(|o| o.is_err()).count();
        WorkloadReport {
            limit: self.limit.get(),
            mode: self.mode,
            jobs: self.jobs,
            succeeded: outcomes.len() - failed,
            failed,
            peak_concurrency: probe.peak(),
            start_order: probe.start_order(),
            elapsed_ms: started.elapsed().as_millis(),
        }
    }
}

/// Runs the workload on OS threads through a [`FifoScheduler`].
pub fn run_threads(spec: &WorkloadSpec) -> Result<WorkloadReport> {
    let scheduler = FifoScheduler::new(spec.limit);
    let probe = ConcurrencyProbe::new();
    let started = Instant::now();

    let handles: Vec<_> = spec
        .durations()
        .into_iter()
        .enumerate()
        .map(|(id, duration)| {
            let scheduler = scheduler.clone();
            let probe = probe.clone();
            let spec = spec.clone();
            thread::Builder::new()
                .name(format!("turnstile-job-{id}"))
                .spawn(move || {
                    scheduler.run(|| {
                        let _running = probe.enter(id);
                        thread::sleep(duration);
                        spec.outcome(id)
                    })
                })
                .with_context(|| format!("failed to spawn thread for job {id}"))
        })
        .collect::<Result<_>>()?;

    let mut outcomes = Vec::with_capacity(handles.len());
    for (id, handle) in handles.into_iter().enumerate() {
        let outcome = handle
            .join()
            .map_err(|_| anyhow!("job {id} panicked"))?;
        if let Err(e) = &outcome {
            tracing::debug!(error = %e, "job reported failure");
        }
        outcomes.push(outcome);
    }

    Ok(spec.report(&probe, &outcomes, started))
}

/// Runs the workload on tokio tasks through an [`AsyncFifoScheduler`].
pub async fn run_tasks(spec: &WorkloadSpec) -> Result<WorkloadReport> {
    let scheduler = AsyncFifoScheduler::new(spec.limit);
    let probe = ConcurrencyProbe::new();
    let started = Instant::now();

    let handles: Vec<_> = spec
        .durations()
        .into_iter()
        .enumerate()
        .map(|(id, duration)| {
            let scheduler = scheduler.clone();
            let probe = probe.clone();
            let spec = spec.clone();
            tokio::spawn(async move {
                scheduler
                    .run(async {
                        let _running = probe.enter(id);
                        tokio::time::sleep(duration).await;
                        spec.outcome(id)
                    })
                    .await
            })
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (id, handle) in handles.into_iter().enumerate() {
        let outcome = handle
            .await
            .with_context(|| format!("job {id} did not complete"))?;
        outcomes.push(outcome);
    }

    Ok(spec.report(&probe, &outcomes, started))
}

pub fn print_text_report(report: &WorkloadReport) {
    println!("mode:             {:?}", report.mode);
    println!("limit:            {}", report.limit);
    println!("jobs:             {}", report.jobs);
    println!("succeeded:        {}", report.succeeded);
    println!("failed:           {}", report.failed);
    println!("peak concurrency: {}", report.peak_concurrency);
    println!("elapsed:          {} ms", report.elapsed_ms);
    let order: Vec<String> = report.start_order.iter().map(usize::to_string).collect();
    println!("start order:      {}", order.join(" "));
}

pub fn print_json_report(report: &WorkloadReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    println!("{json}");
    Ok(())
}
