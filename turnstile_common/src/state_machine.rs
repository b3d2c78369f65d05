use std::sync::{Mutex, MutexGuard, PoisonError};

/// A generic state machine wrapper ensuring thread-safe state transitions.
///
/// This struct wraps a state `S` in a `Mutex` and provides a `transition` method
/// to perform atomic state updates and return an action/result. Every read and
/// write of the wrapped state goes through the one lock.
///
/// Closures passed to `transition` must not panic halfway through a multi-step
/// update. If one does, the next caller still gets the guard back (the poison
/// flag is cleared), since the state owner is expected to keep its invariants
/// with plain arithmetic that cannot unwind.
///
/// # Example
///
/// ```rust
/// use turnstile_common::state_machine::StateMachine;
///
/// struct Ledger {
///     in_flight: u32,
///     limit: u32,
/// }
///
/// let machine = StateMachine::new(Ledger { in_flight: 0, limit: 1 });
///
/// let admitted = machine.transition(|ledger| {
///     if ledger.in_flight < ledger.limit {
///         ledger.in_flight += 1;
///         true
///     } else {
///         false
///     }
/// });
/// assert!(admitted);
/// ```
#[derive(Debug, Default)]
pub struct StateMachine<S> {
    state: Mutex<S>,
}

impl<S> StateMachine<S> {
    /// Creates a new `StateMachine` in the given initial state.
    pub fn new(initial_state: S) -> Self {
        Self {
            state: Mutex::new(initial_state),
        }
    }

    /// Access the underlying state directly via a MutexGuard.
    ///
    /// Use this for simple reads or checks that don't require complex transitions.
    /// For transitions, prefer `transition`.
    pub fn lock(&self) -> MutexGuard<'_, S> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Perform an atomic transition on the state.
    ///
    /// The closure `f` is called with a mutable reference to the current state.
    /// The lock is held for the duration of the closure.
    ///
    /// Returns the result of the closure.
    pub fn transition<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut state = self.lock();
        f(&mut *state)
    }

    /// Consumes the machine and returns the final state.
    pub fn into_inner(self) -> S {
        self.state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
