//! Concurrency instrumentation.
//!
//! A [`ConcurrencyProbe`] is entered at the start of a unit of work and left
//! when the returned guard drops. It tracks how many units are inside at once,
//! the highest value seen and the order in which units entered. The workload
//! driver and the integration tests use it to check a scheduler from the
//! outside without looking at its internals.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
struct ProbeState {
    current: AtomicUsize,
    peak: AtomicUsize,
    entered: AtomicUsize,
    start_order: Mutex<Vec<usize>>,
}

/// Shared counters; clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct ConcurrencyProbe {
    state: Arc<ProbeState>,
}

impl ConcurrencyProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that unit `id` started. The unit counts as running until the
    /// guard is dropped.
    pub fn enter(&self, id: usize) -> ProbeGuard {
        let now = self.state.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.peak.fetch_max(now, Ordering::SeqCst);
        self.state.entered.fetch_add(1, Ordering::SeqCst);
        self.state
            .start_order
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(id);
        ProbeGuard {
            state: self.state.clone(),
        }
    }

    pub fn current(&self) -> usize {
        self.state.current.load(Ordering::SeqCst)
    }

    /// Highest number of units seen inside at the same time.
    pub fn peak(&self) -> usize {
        self.state.peak.load(Ordering::SeqCst)
    }

    pub fn entered(&self) -> usize {
        self.state.entered.load(Ordering::SeqCst)
    }

    /// Unit ids in the order they entered.
    pub fn start_order(&self) -> Vec<usize> {
        self.state
            .start_order
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Marks one unit as running; leaving happens on drop, including on unwind.
#[derive(Debug)]
pub struct ProbeGuard {
    state: Arc<ProbeState>,
}

impl Drop for ProbeGuard {
    fn drop(&mut self) {
        self.state.current.fetch_sub(1, Ordering::SeqCst);
    }
}
