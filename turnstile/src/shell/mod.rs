//! # Shell Module
//!
//! Entry point and CLI logic for the `turnstile` binary.
//!
//! ## Sub-modules
//!
//! - **`cli`**: argument parsing, configuration merging and dispatch
//! - **`workload`**: the synthetic job driver and its reports

pub mod cli;
pub mod workload;

pub use cli::{Cli, OutputFormat, execute, run};
pub use workload::{JobFailed, WorkloadReport, WorkloadSpec, run_tasks, run_threads};
