use turnstile_common::LimitError;

/// Errors raised while constructing a scheduler.
///
/// Failures of the scheduled work are never wrapped in this type; `run`
/// hands back whatever the work produced.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("invalid scheduler configuration: {0}")]
    Configuration(#[from] LimitError),
}
