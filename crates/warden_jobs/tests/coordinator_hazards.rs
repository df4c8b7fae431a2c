//! # Coordinator + Worker Pool Integration
//!
//! Runs real jobs through the coordinator and checks that no reader ever
//! overlaps a writer of the same resource, and that readers observe exactly
//! the value a sequential run would have produced.
//!
//! Run with: cargo test --package warden_jobs --test coordinator_hazards

#![allow(missing_docs)]

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use warden_core::{AccessSet, Coordinator, HazardError, JobSystem};
use warden_jobs::{JobHandle, JobPool, JobPoolConfig};

/// A resource with overlap detection.
#[derive(Default)]
struct Tracked {
    value: AtomicI64,
    readers: AtomicUsize,
    writers: AtomicUsize,
    violations: AtomicUsize,
}

impl Tracked {
    fn write(&self, f: impl FnOnce(i64) -> i64) {
        let writers = self.writers.fetch_add(1, Ordering::SeqCst);
        if writers != 0 || self.readers.load(Ordering::SeqCst) != 0 {
            self.violations.fetch_add(1, Ordering::SeqCst);
        }
        thread::sleep(Duration::from_micros(200));
        let current = self.value.load(Ordering::SeqCst);
        self.value.store(f(current), Ordering::SeqCst);
        self.writers.fetch_sub(1, Ordering::SeqCst);
    }

    fn read(&self) -> i64 {
        self.readers.fetch_add(1, Ordering::SeqCst);
        if self.writers.load(Ordering::SeqCst) != 0 {
            self.violations.fetch_add(1, Ordering::SeqCst);
        }
        thread::sleep(Duration::from_micros(100));
        let value = self.value.load(Ordering::SeqCst);
        self.readers.fetch_sub(1, Ordering::SeqCst);
        value
    }
}

fn pool() -> JobPool {
    JobPool::new(&JobPoolConfig::with_workers(4)).unwrap()
}

#[test]
fn test_no_reader_overlaps_a_writer() {
    let pool = pool();
    let mut coordinator = Coordinator::new(pool.clone());
    let resource = Arc::new(Tracked::default());
    let observed = Arc::new(Mutex::new(Vec::new()));
    let mut expected = Vec::new();
    let mut shadow = 0_i64;

    for step in 0..60_i64 {
        let resource = Arc::clone(&resource);
        if step % 4 == 0 {
            shadow = shadow * 2 + step;
            coordinator
                .schedule_with(AccessSet::write_only("a"), |pool, dep| {
                    pool.schedule(dep, move || resource.write(|v| v * 2 + step))
                })
                .unwrap();
        } else {
            expected.push((step, shadow));
            let observed = Arc::clone(&observed);
            coordinator
                .schedule_with(AccessSet::read_only("a"), |pool, dep| {
                    pool.schedule(dep, move || {
                        let value = resource.read();
                        observed.lock().push((step, value));
                    })
                })
                .unwrap();
        }
    }

    coordinator.synchronize().unwrap();

    assert_eq!(resource.violations.load(Ordering::SeqCst), 0);
    let mut observed = observed.lock().clone();
    observed.sort_unstable();
    assert_eq!(observed, expected);
}

#[test]
fn test_independent_resources_run_concurrently() {
    let pool = pool();
    let mut coordinator = Coordinator::new(pool.clone());
    let (release, gate) = crossbeam_channel::bounded::<()>(1);

    // Writer of "a" blocks until released.
    let blocked = coordinator
        .schedule_with(AccessSet::write_only("a"), |pool, dep| {
            pool.schedule(dep, move || {
                let _ = gate.recv();
            })
        })
        .unwrap();

    // A writer of "b" must not wait on it.
    let independent = coordinator
        .schedule_with(AccessSet::write_only("b"), |pool, dep| pool.schedule(dep, || {}))
        .unwrap();
    assert!(independent.wait_timeout(Duration::from_secs(5)));

    // A reader of "a" must.
    let dependent = coordinator
        .schedule_with(AccessSet::read_only("a"), |pool, dep| pool.schedule(dep, || {}))
        .unwrap();
    assert!(!dependent.wait_timeout(Duration::from_millis(20)));

    release.send(()).unwrap();
    coordinator.synchronize().unwrap();
    assert!(blocked.is_complete());
    assert!(dependent.is_complete());
}

#[test]
fn test_barrier_completes_every_registered_handle() {
    let pool = pool();
    let mut coordinator = Coordinator::new(pool.clone());
    let mut handles: Vec<JobHandle> = Vec::new();

    for i in 0..20_u64 {
        let key = if i % 2 == 0 { "even" } else { "odd" };
        let access = if i % 3 == 0 {
            AccessSet::write_only(key)
        } else {
            AccessSet::read_only(key)
        };
        let dep = coordinator.get_dependency(&access).unwrap();
        let handle = pool.schedule(&dep, move || {
            thread::sleep(Duration::from_micros(300 + i * 10));
        });
        coordinator.register_dependency(&access, handle.clone()).unwrap();
        handles.push(handle);
    }

    coordinator.synchronize().unwrap();

    assert!(handles.iter().all(JobHandle::is_complete));
    assert!(pool.combine(&handles).is_complete());
}

#[test]
fn test_coordinator_rejects_worker_threads() {
    let pool = pool();
    let coordinator = Arc::new(Mutex::new(Coordinator::new(pool.clone())));

    let shared = Arc::clone(&coordinator);
    let result = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&result);
    pool.spawn(move || {
        let outcome = shared.lock().get_dependency(&AccessSet::read_only("a"));
        *slot.lock() = Some(outcome);
    })
    .wait();

    let outcome = result.lock().take();
    assert!(matches!(outcome, Some(Err(HazardError::WrongThread { .. }))));
}
