//! # FIFO admission control
//!
//! Bounds how many operations run at once and admits waiting callers strictly
//! in the order they started waiting.
//!
//! - [`FifoScheduler`] parks threads.
//! - [`AsyncFifoScheduler`] parks tokio tasks.
//!
//! Both share the same admission ledger, guarded by a single mutex. A caller is
//! admitted at once only when no one is queued and a slot is free; otherwise it
//! takes a ticket at the tail of the queue. Each release hands its slot to the
//! head ticket and wakes only that caller.

mod admission;
pub mod blocking;
pub mod error;
pub mod task;

pub use blocking::FifoScheduler;
pub use error::ScheduleError;
pub use task::AsyncFifoScheduler;
