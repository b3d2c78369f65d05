//! # Admission ledger
//!
//! Bookkeeping shared by the thread and task front ends: the in-flight count,
//! the FIFO queue of waiting tickets and the ticket id counter. The ledger
//! knows nothing about how a waiter is parked; each front end stores its own
//! wake handle `W` alongside the ticket.
//!
//! ## Invariants
//! - `in_flight <= limit` after every operation.
//! - A newcomer is admitted only when the queue is empty *and* a slot is free.
//! - A release with waiters hands its slot to the head ticket; the count is
//!   unchanged and the ticket leaves the queue in the same step.
//! - A ticket that is no longer queued owns a slot. This is what lets a waiter
//!   that gives up decide whether it must pass a slot on.
//!
//! The ledger is always accessed through
//! [`StateMachine::transition`](turnstile_common::StateMachine::transition),
//! so every method here runs under the controller lock.

use std::collections::VecDeque;
use turnstile_common::ConcurrencyLimit;

/// Identifier of one parked caller. Never reused within a ledger.
pub(crate) type TicketId = u64;

struct Ticket<W> {
    id: TicketId,
    waker: W,
}

/// A ticket removed from the head of the queue, now owning a slot.
pub(crate) struct Promotion<W> {
    pub ticket: TicketId,
    pub waker: W,
}

pub(crate) struct AdmissionLedger<W> {
    limit: u32,
    in_flight: u32,
    waiting: VecDeque<Ticket<W>>,
    next_ticket: TicketId,
}

impl<W> AdmissionLedger<W> {
    pub fn new(limit: ConcurrencyLimit) -> Self {
        Self {
            limit: limit.get(),
            in_flight: 0,
            waiting: VecDeque::new(),
            next_ticket: 0,
        }
    }

    /// Takes a slot if nobody is queued and one is free.
    pub fn try_admit(&mut self) -> bool {
        if !self.waiting.is_empty() || self.in_flight >= self.limit {
            return false;
        }
        self.in_flight += 1;
        true
    }

    /// Appends a ticket to the tail of the queue.
    pub fn enqueue(&mut self, waker: W) -> TicketId {
        let id = self.next_ticket;
        self.next_ticket += 1;
        self.waiting.push_back(Ticket { id, waker });
        id
    }

    /// Gives back one slot.
    ///
    /// With a non-empty queue the slot goes straight to the head ticket, which
    /// is returned so the caller can signal it once the lock is dropped.
    pub fn release(&mut self) -> Option<Promotion<W>> {
        debug_assert!(self.in_flight > 0, "release without a held slot");
        match self.waiting.pop_front() {
            Some(Ticket { id, waker }) => Some(Promotion { ticket: id, waker }),
            None => {
                self.in_flight = self.in_flight.saturating_sub(1);
                None
            }
        }
    }

    /// Removes a ticket by identity without signalling it.
    ///
    /// Returns `false` when the ticket is no longer queued, i.e. it was already
    /// promoted and its owner now holds a slot.
    pub fn withdraw(&mut self, ticket: TicketId) -> bool {
        match self.waiting.iter().position(|t| t.id == ticket) {
            Some(index) => {
                self.waiting.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn is_queued(&self, ticket: TicketId) -> bool {
        self.waiting.iter().any(|t| t.id == ticket)
    }

    pub fn in_flight(&self) -> u32 {
        self.in_flight
    }

    pub fn waiting(&self) -> usize {
        self.waiting.len()
    }

    #[cfg(test)]
    pub fn head_waker(&self) -> Option<&W> {
        self.waiting.front().map(|t| &t.waker)
    }
}
