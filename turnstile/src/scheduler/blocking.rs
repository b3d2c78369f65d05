//! # Thread front end
//!
//! [`FifoScheduler`] parks OS threads. Each parked caller owns a `TurnSignal`
//! (a `Mutex<bool>` "granted" flag plus a `Condvar`), and a release signals
//! only the promoted caller's flag. A condvar wake without the flag set is
//! spurious and the caller goes back to sleep.

use super::admission::{AdmissionLedger, TicketId};
use crate::scheduler::ScheduleError;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use tracing::{debug, trace};
use turnstile_common::{ConcurrencyLimit, LimitError, StateMachine};

/// Single-use wake-up for one parked thread.
#[derive(Debug, Default)]
struct TurnSignal {
    granted: Mutex<bool>,
    cv: Condvar,
}

impl TurnSignal {
    fn grant(&self) {
        let mut granted = self.granted.lock().unwrap_or_else(PoisonError::into_inner);
        *granted = true;
        self.cv.notify_one();
    }

    /// Blocks until `grant` has been called, ignoring any other wake.
    fn wait(&self, ticket: TicketId) {
        let mut granted = self.granted.lock().unwrap_or_else(PoisonError::into_inner);
        while !*granted {
            granted = self
                .cv
                .wait(granted)
                .unwrap_or_else(PoisonError::into_inner);
            if !*granted {
                debug!(ticket, "spurious wake ignored, still queued");
            }
        }
    }
}

struct Shared {
    limit: ConcurrencyLimit,
    ledger: StateMachine<AdmissionLedger<Arc<TurnSignal>>>,
}

/// FIFO admission controller for threads.
///
/// At most `limit` closures passed to [`run`](Self::run) execute at once.
/// Callers that cannot start immediately wait in strict arrival order.
/// Cloning yields another handle to the same controller.
///
/// ```rust
/// use turnstile::FifoScheduler;
///
/// let scheduler = FifoScheduler::try_new(2).unwrap();
/// let answer = scheduler.run(|| 6 * 7);
/// assert_eq!(answer, 42);
/// ```
#[derive(Clone)]
pub struct FifoScheduler {
    inner: Arc<Shared>,
}

impl std::fmt::Debug for FifoScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FifoScheduler")
            .field("limit", &self.inner.limit)
            .finish_non_exhaustive()
    }
}

impl FifoScheduler {
    pub fn new(limit: ConcurrencyLimit) -> Self {
        Self {
            inner: Arc::new(Shared {
                limit,
                ledger: StateMachine::new(AdmissionLedger::new(limit)),
            }),
        }
    }

    /// Validates a raw limit and builds the scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::Configuration`] for negative or oversized limits.
    pub fn try_new<L>(limit: L) -> Result<Self, ScheduleError>
    where
        L: TryInto<ConcurrencyLimit, Error = LimitError>,
    {
        Ok(Self::new(limit.try_into()?))
    }

    pub fn limit(&self) -> ConcurrencyLimit {
        self.inner.limit
    }

    /// Runs `work` once a slot is available and returns its result.
    ///
    /// The calling thread blocks while queued. `work` runs without the
    /// controller lock held. The slot is released and the next waiter promoted
    /// before the result is returned, and also when `work` panics (the panic
    /// then resumes unwinding in the caller).
    ///
    /// Calling `run` again from inside `work` on the same scheduler is not
    /// supported and may deadlock.
    pub fn run<T, F>(&self, work: F) -> T
    where
        F: FnOnce() -> T,
    {
        self.acquire();
        let _slot = SlotGuard { shared: &self.inner };
        work()
    }

    fn acquire(&self) {
        let queued = self.inner.ledger.transition(|ledger| {
            if ledger.try_admit() {
                trace!(in_flight = ledger.in_flight(), "admitted immediately");
                return None;
            }
            let signal = Arc::new(TurnSignal::default());
            let ticket = ledger.enqueue(signal.clone());
            debug!(
                ticket,
                in_flight = ledger.in_flight(),
                waiting = ledger.waiting(),
                "no free slot, caller queued"
            );
            Some((ticket, signal))
        });

        if let Some((ticket, signal)) = queued {
            signal.wait(ticket);
            debug_assert!(
                !self.inner.ledger.lock().is_queued(ticket),
                "granted ticket still queued"
            );
            trace!(ticket, "promoted from queue");
        }
    }
}

/// Holds one slot; releasing it promotes the head waiter, if any.
struct SlotGuard<'a> {
    shared: &'a Shared,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        let promoted = self.shared.ledger.transition(|ledger| ledger.release());
        if let Some(promotion) = promoted {
            trace!(ticket = promotion.ticket, "slot handed to next waiter");
            promotion.waker.grant();
        }
    }
}
