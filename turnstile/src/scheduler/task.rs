//! # Task front end
//!
//! [`AsyncFifoScheduler`] parks tokio tasks instead of threads. Each queued
//! caller holds the receiving half of a `oneshot` channel; the ledger keeps
//! the sender next to the ticket, and a release sends on exactly that one.
//!
//! ## Dropped futures
//!
//! A `run` future can be dropped at any await point (for example by
//! `tokio::time::timeout` or `select!`). Its guards keep the ledger honest:
//!
//! - dropped while queued: the ticket is withdrawn by id; the rest of the
//!   queue keeps its order.
//! - dropped after promotion but before resuming: the slot it was handed is
//!   passed on to the next waiter.
//! - dropped while the work future is running: the slot is released like a
//!   normal completion.

use super::admission::{AdmissionLedger, TicketId};
use crate::scheduler::ScheduleError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, trace};
use turnstile_common::{ConcurrencyLimit, LimitError, StateMachine};

type Ledger = StateMachine<AdmissionLedger<oneshot::Sender<()>>>;

struct Shared {
    limit: ConcurrencyLimit,
    ledger: Ledger,
}

impl Shared {
    fn release(&self) {
        let promoted = self.ledger.transition(|ledger| ledger.release());
        if let Some(promotion) = promoted {
            trace!(ticket = promotion.ticket, "slot handed to next task");
            // A closed receiver means that waiter is being dropped; its guard
            // sees the ticket gone from the queue and passes the slot on.
            let _ = promotion.waker.send(());
        }
    }
}

/// FIFO admission controller for async tasks.
///
/// Same guarantees as [`FifoScheduler`](crate::FifoScheduler): at most
/// `limit` work futures are polled to completion concurrently, and queued
/// callers are admitted strictly in arrival order.
#[derive(Clone)]
pub struct AsyncFifoScheduler {
    inner: Arc<Shared>,
}

impl std::fmt::Debug for AsyncFifoScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncFifoScheduler")
            .field("limit", &self.inner.limit)
            .finish_non_exhaustive()
    }
}

impl AsyncFifoScheduler {
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

    /// Waits for a slot, then drives `work` to completion and returns its output.
    ///
    /// `work` is polled outside the controller lock. The slot is released and
    /// the next waiter promoted before this future resolves, and also if it is
    /// dropped early or `work` panics.
    pub async fn run<F>(&self, work: F) -> F::Output
    where
        F: Future,
    {
        let _slot = self.acquire().await;
        work.await
    }

    async fn acquire(&self) -> SlotPermit<'_> {
        let queued = self.inner.ledger.transition(|ledger| {
            if ledger.try_admit() {
                trace!(in_flight = ledger.in_flight(), "task admitted immediately");
                return None;
            }
            let (tx, rx) = oneshot::channel();
            let ticket = ledger.enqueue(tx);
            debug!(
                ticket,
                in_flight = ledger.in_flight(),
                waiting = ledger.waiting(),
                "no free slot, task queued"
            );
            Some((ticket, rx))
        });

        if let Some((ticket, rx)) = queued {
            let pending = PendingTicket {
                shared: &self.inner,
                ticket,
            };
            // The pop under the lock is what grants the slot. A sender dropped
            // without sending has also left the queue, so both outcomes mean
            // this ticket now owns a slot.
            let _ = rx.await;
            debug_assert!(
                !self.inner.ledger.lock().is_queued(ticket),
                "woken ticket still queued"
            );
            std::mem::forget(pending);
            trace!(ticket, "task promoted from queue");
        }

        SlotPermit {
            shared: &self.inner,
        }
    }
}

/// A queued ticket whose wait may be abandoned.
struct PendingTicket<'a> {
    shared: &'a Shared,
    ticket: TicketId,
}

impl Drop for PendingTicket<'_> {
    fn drop(&mut self) {
        let withdrawn = self
            .shared
            .ledger
            .transition(|ledger| ledger.withdraw(self.ticket));
        if withdrawn {
            debug!(ticket = self.ticket, "queued task dropped, ticket withdrawn");
        } else {
            debug!(
                ticket = self.ticket,
                "task dropped after promotion, passing slot on"
            );
            self.shared.release();
        }
    }
}

/// Holds one slot for the duration of the work future.
struct SlotPermit<'a> {
    shared: &'a Shared,
}

impl Drop for SlotPermit<'_> {
    fn drop(&mut self) {
        self.shared.release();
    }
}
