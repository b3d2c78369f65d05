//! # turnstile
//!
//! A concurrency admission controller: at most `limit` operations run at once,
//! and callers that have to wait are admitted strictly first-come,
//! first-served.
//!
//! ```rust
//! use turnstile::FifoScheduler;
//! use std::thread;
//!
//! let scheduler = FifoScheduler::try_new(2).unwrap();
//! let handles: Vec<_> = (0..4)
//!     .map(|i| {
//!         let scheduler = scheduler.clone();
//!         thread::spawn(move || scheduler.run(|| i * 10))
//!     })
//!     .collect();
//! let total: i32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
//! assert_eq!(total, 60);
//! ```
//!
//! The async counterpart, [`AsyncFifoScheduler`], offers the same guarantees
//! for tokio tasks.

pub mod config;
pub mod probe;
pub mod scheduler;
pub mod shell;
pub mod utils;

pub use scheduler::{AsyncFifoScheduler, FifoScheduler, ScheduleError};
pub use turnstile_common::{ConcurrencyLimit, LimitError};
