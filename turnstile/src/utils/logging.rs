//! # Logging Initialization
//!
//! Sets up the `tracing` subscriber for the `turnstile` binary and for tests.
//!
//! - **Environment Filter (`EnvFilter`)**: `RUST_LOG` wins when set. Otherwise
//!   the given level applies everywhere, with `debug` for the `turnstile`
//!   crates so admission decisions are visible.
//! - **File Logging**: with `log_to_file = true` logs go to a daily rolling
//!   file in the user cache directory (via `directories`), without ANSI colors.
//! - **Stderr Logging**: with `log_to_file = false`, or when the cache
//!   directory cannot be written, logs go to stderr with ANSI colors.
//!
//! Initialization happens once per process; later calls are no-ops.

use anyhow::Result;
use directories::ProjectDirs;
use std::{io::stderr, path::Path, sync::Once};
use tracing_subscriber::{EnvFilter, fmt::layer, prelude::*};

static INIT: Once = Once::new();

/// Initialize verbose logging for tests.
///
/// This configures a `trace`-level subscriber that logs to stderr.
pub fn init_test_logging() {
    let _ = init_logging("trace", false);
}

/// Initializes the logging system.
///
/// # Errors
///
/// Currently infallible; the `Result` leaves room for sinks that can fail.
pub fn init_logging(log_level: &str, log_to_file: bool) -> Result<()> {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{log_level},turnstile=debug,turnstile_common=debug"
            ))
        });

        if log_to_file
            && let Some(proj_dirs) = ProjectDirs::from("com", "Turnstile", "turnstile")
        {
            let log_dir = proj_dirs.cache_dir();

            // tracing_appender::rolling::daily panics when the directory is not
            // writable, so check first and fall back to stderr.
            if can_write_to(log_dir) {
                let file_appender = tracing_appender::rolling::daily(log_dir, "turnstile.log");
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

                let installed = tracing_subscriber::registry()
                    .with(env_filter)
                    .with(layer().with_writer(non_blocking).with_ansi(false))
                    .try_init()
                    .is_ok();
                if installed {
                    // Leaked so buffered lines are flushed at process exit.
                    Box::leak(Box::new(guard));
                }
                return;
            }
        }

        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(layer().with_writer(stderr).with_ansi(true))
            .try_init();
    });

    Ok(())
}

/// Creates `dir` if needed and checks that a file can be written in it.
fn can_write_to(dir: &Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }

    let probe_file = dir.join(".turnstile_log_test");
    match std::fs::write(&probe_file, "test") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe_file);
            true
        }
        Err(_) => false,
    }
}
