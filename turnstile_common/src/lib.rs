//! Shared primitives for the turnstile workspace.

pub mod limit;
pub mod state_machine;

pub use limit::{ConcurrencyLimit, LimitError};
pub use state_machine::StateMachine;
