//! fifo_scheduler_test.rs - thread front end under real concurrency
//!
//! Verified behaviour: the concurrency ceiling holds at every instant, queued
//! threads start in the order they queued, failing or panicking work still
//! frees its slot, and a zero limit parks callers indefinitely.

use anyhow::Result;
use rand::Rng;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use turnstile::FifoScheduler;
use turnstile::probe::ConcurrencyProbe;

/// Long enough for a freshly spawned thread to reach the queue.
const QUEUE_SETTLE: Duration = Duration::from_millis(30);

/// Occupies the only slot of `scheduler` until the returned sender fires.
fn hold_slot(scheduler: &FifoScheduler) -> (mpsc::Sender<()>, thread::JoinHandle<()>) {
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let (held_tx, held_rx) = mpsc::channel::<()>();
    let scheduler = scheduler.clone();
    let handle = thread::spawn(move || {
        scheduler.run(|| {
            held_tx.send(()).unwrap();
            release_rx.recv().unwrap();
        })
    });
    held_rx.recv().unwrap();
    (release_tx, handle)
}

#[test]
fn test_ceiling_holds_under_random_delays() -> Result<()> {
    for limit in [1_i64, 2, 5] {
        let scheduler = FifoScheduler::try_new(limit)?;
        let probe = ConcurrencyProbe::new();

        let handles: Vec<_> = (0..40)
            .map(|id| {
                let scheduler = scheduler.clone();
                let probe = probe.clone();
                let delay = Duration::from_micros(rand::rng().random_range(100..3_000));
                thread::spawn(move || {
                    scheduler.run(|| {
                        let _running = probe.enter(id);
                        thread::sleep(delay);
                    })
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(
            probe.peak() <= limit as usize,
            "peak {} exceeded limit {limit}",
            probe.peak()
        );
        assert_eq!(probe.entered(), 40);
        assert_eq!(probe.current(), 0);
    }
    Ok(())
}

#[test]
fn test_waiters_start_in_queue_order() -> Result<()> {
    let scheduler = FifoScheduler::try_new(1)?;
    let (release, holder) = hold_slot(&scheduler);
    let order = Arc::new(Mutex::new(Vec::new()));

    let mut waiters = Vec::new();
    for id in 0..6 {
        let scheduler = scheduler.clone();
        let order = order.clone();
        waiters.push(thread::spawn(move || {
            scheduler.run(|| order.lock().unwrap().push(id))
        }));
        thread::sleep(QUEUE_SETTLE);
    }

    release.send(())?;
    holder.join().unwrap();
    for waiter in waiters {
        waiter.join().unwrap();
    }

    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4, 5]);
    Ok(())
}

#[test]
fn test_failed_work_still_promotes_next_waiter() -> Result<()> {
    let scheduler = FifoScheduler::try_new(1)?;
    let (go_tx, go_rx) = mpsc::channel::<()>();
    let (started_tx, started_rx) = mpsc::channel::<()>();

    let failing = {
        let scheduler = scheduler.clone();
        thread::spawn(move || -> Result<(), String> {
            scheduler.run(|| {
                started_tx.send(()).unwrap();
                go_rx.recv().unwrap();
                Err("caller A failed".to_string())
            })
        })
    };
    started_rx.recv()?;

    let queued = {
        let scheduler = scheduler.clone();
        thread::spawn(move || scheduler.run(|| "caller B ran"))
    };
    thread::sleep(QUEUE_SETTLE);

    go_tx.send(())?;
    assert_eq!(failing.join().unwrap(), Err("caller A failed".to_string()));
    assert_eq!(queued.join().unwrap(), "caller B ran");
    Ok(())
}

#[test]
fn test_panicking_work_still_promotes_next_waiter() -> Result<()> {
    let scheduler = FifoScheduler::try_new(1)?;
    let (go_tx, go_rx) = mpsc::channel::<()>();
    let (started_tx, started_rx) = mpsc::channel::<()>();

    let panicking = {
        let scheduler = scheduler.clone();
        thread::spawn(move || {
            scheduler.run::<(), _>(|| {
                started_tx.send(()).unwrap();
                go_rx.recv().unwrap();
                panic!("caller A blew up");
            })
        })
    };
    started_rx.recv()?;

    let queued = {
        let scheduler = scheduler.clone();
        thread::spawn(move || scheduler.run(|| 7))
    };
    thread::sleep(QUEUE_SETTLE);

    go_tx.send(())?;
    assert!(panicking.join().is_err());
    assert_eq!(queued.join().unwrap(), 7);
    Ok(())
}

#[test]
fn test_later_caller_starts_after_earlier_one_finishes() -> Result<()> {
    let scheduler = FifoScheduler::try_new(1)?;

    let x = {
        let scheduler = scheduler.clone();
        thread::spawn(move || {
            scheduler.run(|| {
                thread::sleep(Duration::from_millis(100));
                Instant::now()
            })
        })
    };
    thread::sleep(Duration::from_millis(20));
    let y = {
        let scheduler = scheduler.clone();
        thread::spawn(move || scheduler.run(Instant::now))
    };

    let x_finished = x.join().unwrap();
    let y_started = y.join().unwrap();
    assert!(y_started >= x_finished, "Y started before X completed");
    Ok(())
}

#[test]
fn test_third_caller_waits_for_one_of_two_slots() -> Result<()> {
    let scheduler = FifoScheduler::try_new(2)?;
    let probe = ConcurrencyProbe::new();
    let (started_tx, started_rx) = mpsc::channel::<usize>();
    let releases: Vec<_> = (0..3).map(|_| mpsc::channel::<()>()).collect();
    let (senders, receivers): (Vec<_>, Vec<_>) = releases.into_iter().unzip();

    let handles: Vec<_> = receivers
        .into_iter()
        .enumerate()
        .map(|(id, release_rx)| {
            let scheduler = scheduler.clone();
            let probe = probe.clone();
            let started_tx = started_tx.clone();
            thread::spawn(move || {
                scheduler.run(|| {
                    let _running = probe.enter(id);
                    started_tx.send(id).unwrap();
                    release_rx.recv().unwrap();
                })
            })
        })
        .collect();

    let first = started_rx.recv_timeout(Duration::from_secs(5))?;
    let second = started_rx.recv_timeout(Duration::from_secs(5))?;
    assert_ne!(first, second);
    assert!(
        started_rx.recv_timeout(Duration::from_millis(100)).is_err(),
        "third caller started while both slots were busy"
    );
    assert_eq!(probe.current(), 2);

    senders[first].send(())?;
    let third = started_rx.recv_timeout(Duration::from_secs(5))?;
    assert_ne!(third, first);
    assert_ne!(third, second);

    senders[second].send(())?;
    senders[third].send(())?;
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(probe.peak(), 2);
    Ok(())
}

#[test]
fn test_zero_limit_never_admits() -> Result<()> {
    let scheduler = FifoScheduler::try_new(0)?;
    let (done_tx, done_rx) = mpsc::channel::<()>();

    // The parked thread is never joined; it stays blocked until the test
    // process exits.
    thread::spawn(move || {
        scheduler.run(|| ());
        let _ = done_tx.send(());
    });

    assert_eq!(
        done_rx.recv_timeout(Duration::from_millis(300)),
        Err(mpsc::RecvTimeoutError::Timeout)
    );
    Ok(())
}

#[test]
fn test_negative_limit_fails_construction() {
    let err = FifoScheduler::try_new(-5).unwrap_err();
    assert!(err.to_string().contains("non-negative"));
}
