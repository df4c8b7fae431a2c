//! # Worker Pool
//!
//! Fixed set of worker threads draining one queue. A job enters the queue
//! only after its dependency has completed, so workers never block waiting
//! on other jobs.
//!
//! ```text
//!   schedule(dep, job)
//!        │
//!        ├─ dep complete ──────────────► queue ──► worker ──► job() ──► signal
//!        │                                                               │
//!        └─ dep pending ─► gate (n signals) ─► last signal fires ─► queue │
//!                                                                        ▼
//!                                                        continuations of dependents
//! ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;

use warden_core::JobSystem;

use crate::config::JobPoolConfig;
use crate::error::{JobError, JobResult};
use crate::handle::{JobHandle, Signal};

type Job = Box<dyn FnOnce() + Send>;

/// Counters shared between the pool and its tasks.
#[derive(Default)]
struct PoolCounters {
    scheduled: AtomicU64,
    completed: AtomicU64,
    panicked: AtomicU64,
}

/// Snapshot of pool activity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Jobs handed to [`JobPool::schedule`].
    pub scheduled: u64,
    /// Jobs that have finished running, including those that panicked.
    pub completed: u64,
    /// Jobs that panicked.
    pub panicked: u64,
}

/// A job together with the signal it fires.
struct Task {
    job: Job,
    done: Arc<Signal>,
    counters: Arc<PoolCounters>,
}

impl Task {
    fn run(self) {
        let Task { job, done, counters } = self;
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
            counters.panicked.fetch_add(1, Ordering::Relaxed);
            tracing::error!(panic = panic_message(payload.as_ref()), "job panicked");
        }
        counters.completed.fetch_add(1, Ordering::Relaxed);
        // Fires dependents; their tasks are queued from here.
        done.complete();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Queues a task once `remaining` signals have fired.
struct Gate {
    remaining: AtomicUsize,
    task: Mutex<Option<Task>>,
    sender: Sender<Task>,
}

impl Gate {
    fn release(&self) {
        if self.remaining.fetch_sub(1, Ordering::AcqRel) != 1 {
            return;
        }
        if let Some(task) = self.task.lock().take() {
            submit(&self.sender, task);
        }
    }
}

fn submit(sender: &Sender<Task>, task: Task) {
    if let Err(err) = sender.send(task) {
        // Workers are gone; keep the handle's promise on this thread.
        tracing::error!("worker queue closed, running job inline");
        err.into_inner().run();
    }
}

/// Worker threads, joined on drop.
struct Workers(Vec<JoinHandle<()>>);

impl Drop for Workers {
    fn drop(&mut self) {
        // Released by a job on a worker: gates waiting on that job still hold
        // senders, so no worker can finish until it returns. Detach instead;
        // they exit once the queue drains.
        let current = thread::current().id();
        if self.0.iter().any(|w| w.thread().id() == current) {
            self.0.clear();
            tracing::debug!("job pool released from a worker, workers detached");
            return;
        }

        for worker in self.0.drain(..) {
            if worker.join().is_err() {
                tracing::error!("worker thread exited abnormally");
            }
        }
        tracing::debug!("job pool stopped");
    }
}

/// Fields drop in order: the queue closes before the workers are joined.
struct PoolShared {
    sender: Sender<Task>,
    workers: Workers,
    counters: Arc<PoolCounters>,
}

/// Fixed-size worker pool.
///
/// Cloning is cheap and shares the same workers. Workers stop once the last
/// clone is dropped and every queued or gated job has run.
///
/// # Example
///
/// ```rust,ignore
/// let pool = JobPool::new(&JobPoolConfig::with_workers(4))?;
///
/// let a = pool.schedule(&JobHandle::completed(), || produce());
/// let b = pool.schedule(&a, || consume());
/// b.wait();
/// ```
#[derive(Clone)]
pub struct JobPool {
    shared: Arc<PoolShared>,
}

impl JobPool {
    /// Starts `config.worker_threads` workers.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::InvalidConfig`] if the config fails validation, or
    /// [`JobError::SpawnFailed`] if a worker thread cannot be created.
    pub fn new(config: &JobPoolConfig) -> JobResult<Self> {
        config.validate()?;

        let (sender, receiver) = unbounded::<Task>();
        let mut workers = Vec::with_capacity(config.worker_threads);
        for index in 0..config.worker_threads {
            let receiver: Receiver<Task> = receiver.clone();
            let worker = thread::Builder::new()
                .name(format!("{}-{index}", config.thread_name_prefix))
                .spawn(move || {
                    for task in receiver.iter() {
                        task.run();
                    }
                })
                .map_err(|e| JobError::SpawnFailed(e.to_string()))?;
            workers.push(worker);
        }

        tracing::debug!(workers = config.worker_threads, "job pool started");

        Ok(Self {
            shared: Arc::new(PoolShared {
                sender,
                workers: Workers(workers),
                counters: Arc::new(PoolCounters::default()),
            }),
        })
    }

    /// Number of worker threads.
    #[inline]
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.shared.workers.0.len()
    }

    /// Schedules `job` to run after `dependency` completes.
    ///
    /// Returns a handle that completes when `job` has returned or panicked.
    pub fn schedule<F>(&self, dependency: &JobHandle, job: F) -> JobHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let counters = Arc::clone(&self.shared.counters);
        counters.scheduled.fetch_add(1, Ordering::Relaxed);

        let done = Arc::new(Signal::new());
        let task = Task {
            job: Box::new(job),
            done: Arc::clone(&done),
            counters,
        };

        let pending: Vec<&Arc<Signal>> = dependency
            .signals()
            .iter()
            .filter(|s| !s.is_done())
            .collect();
        if pending.is_empty() {
            submit(&self.shared.sender, task);
        } else {
            let gate = Arc::new(Gate {
                remaining: AtomicUsize::new(pending.len()),
                task: Mutex::new(Some(task)),
                sender: self.shared.sender.clone(),
            });
            for signal in pending {
                let gate = Arc::clone(&gate);
                signal.on_complete(Box::new(move || gate.release()));
            }
        }

        JobHandle::from_signal(done)
    }

    /// Schedules `job` with no dependency.
    pub fn spawn<F>(&self, job: F) -> JobHandle
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule(&JobHandle::completed(), job)
    }

    /// Activity counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let counters = &self.shared.counters;
        PoolStats {
            scheduled: counters.scheduled.load(Ordering::Relaxed),
            completed: counters.completed.load(Ordering::Relaxed),
            panicked: counters.panicked.load(Ordering::Relaxed),
        }
    }
}

impl JobSystem for JobPool {
    type Handle = JobHandle;

    fn combine(&self, handles: &[JobHandle]) -> JobHandle {
        JobHandle::combine(handles)
    }

    fn wait(&self, handle: &JobHandle) {
        handle.wait();
    }
}
