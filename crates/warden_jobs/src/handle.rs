//! # Job Handles
//!
//! A handle is a set of completion signals. A scheduled job's handle holds
//! one signal; a combined handle holds the union of its inputs' pending
//! signals; the completed handle holds none.
//!
//! ```text
//!   schedule(A) -> [sA]
//!   schedule(B) -> [sB]
//!   combine([sA], [sB], [sA]) -> [sA, sB]
//!   combine()                 -> []        (already complete)
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Work to run once a signal fires.
pub(crate) type Continuation = Box<dyn FnOnce() + Send>;

/// One-shot completion flag with waiters and continuations.
pub(crate) struct Signal {
    done: AtomicBool,
    /// Continuations registered before completion. Also the condvar's mutex.
    pending: Mutex<Vec<Continuation>>,
    condvar: Condvar,
}

impl Signal {
    pub(crate) fn new() -> Self {
        Self {
            done: AtomicBool::new(false),
            pending: Mutex::new(Vec::new()),
            condvar: Condvar::new(),
        }
    }

    #[inline]
    pub(crate) fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Marks the signal done, wakes waiters and runs continuations.
    ///
    /// Continuations run on the calling thread, outside the lock.
    pub(crate) fn complete(&self) {
        let continuations = {
            let mut pending = self.pending.lock();
            self.done.store(true, Ordering::Release);
            std::mem::take(&mut *pending)
        };
        self.condvar.notify_all();
        for continuation in continuations {
            continuation();
        }
    }

    /// Runs `continuation` once the signal is done, immediately if it is.
    pub(crate) fn on_complete(&self, continuation: Continuation) {
        let mut pending = self.pending.lock();
        if self.is_done() {
            drop(pending);
            continuation();
        } else {
            pending.push(continuation);
        }
    }

    fn wait(&self) {
        if self.is_done() {
            return;
        }
        let mut guard = self.pending.lock();
        while !self.is_done() {
            self.condvar.wait(&mut guard);
        }
    }

    fn wait_until(&self, deadline: Instant) -> bool {
        if self.is_done() {
            return true;
        }
        let mut guard = self.pending.lock();
        while !self.is_done() {
            if self.condvar.wait_until(&mut guard, deadline).timed_out() {
                return self.is_done();
            }
        }
        true
    }
}

/// Awaitable handle to scheduled work.
///
/// Cheap to clone. Two handles are equal when they wait on the same set of
/// signals.
#[derive(Clone)]
pub struct JobHandle {
    signals: Arc<[Arc<Signal>]>,
}

impl JobHandle {
    /// A handle that is already complete.
    #[must_use]
    pub fn completed() -> Self {
        Self {
            signals: Arc::from(Vec::new()),
        }
    }

    pub(crate) fn from_signal(signal: Arc<Signal>) -> Self {
        Self {
            signals: Arc::from(vec![signal]),
        }
    }

    /// Merges handles into one that completes when all of them have.
    ///
    /// Signals that already fired are dropped, and shared signals are kept
    /// once, so combining is idempotent and never grows without bound.
    #[must_use]
    pub fn combine(handles: &[JobHandle]) -> Self {
        let mut seen: HashSet<*const Signal> = HashSet::new();
        let mut signals: Vec<Arc<Signal>> = Vec::new();
        for handle in handles {
            for signal in handle.signals.iter() {
                if signal.is_done() || !seen.insert(Arc::as_ptr(signal)) {
                    continue;
                }
                signals.push(Arc::clone(signal));
            }
        }
        Self {
            signals: Arc::from(signals),
        }
    }

    pub(crate) fn signals(&self) -> &[Arc<Signal>] {
        &self.signals
    }

    /// Returns `true` once every job behind this handle has finished.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.signals.iter().all(|s| s.is_done())
    }

    /// Blocks until every job behind this handle has finished.
    pub fn wait(&self) {
        for signal in self.signals.iter() {
            signal.wait();
        }
    }

    /// Waits up to `timeout`. Returns `true` if the handle completed.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.signals.iter().all(|s| s.wait_until(deadline))
    }

    /// Number of jobs this handle still refers to.
    #[must_use]
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Returns `true` for a handle that refers to no jobs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

impl Default for JobHandle {
    fn default() -> Self {
        Self::completed()
    }
}

impl PartialEq for JobHandle {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.signals, &other.signals) {
            return true;
        }
        if self.signals.len() != other.signals.len() {
            return false;
        }
        let mine: HashSet<*const Signal> = self.signals.iter().map(Arc::as_ptr).collect();
        other.signals.iter().all(|s| mine.contains(&Arc::as_ptr(s)))
    }
}

impl Eq for JobHandle {}

impl fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobHandle")
            .field("jobs", &self.signals.len())
            .field("complete", &self.is_complete())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn pending() -> (Arc<Signal>, JobHandle) {
        let signal = Arc::new(Signal::new());
        (Arc::clone(&signal), JobHandle::from_signal(signal))
    }

    #[test]
    fn test_completed_handle() {
        let handle = JobHandle::completed();
        assert!(handle.is_complete());
        assert!(handle.is_empty());
        handle.wait();
        assert_eq!(handle, JobHandle::default());
    }

    #[test]
    fn test_combine_dedupes_and_ignores_order() {
        let (_a, ha) = pending();
        let (_b, hb) = pending();

        let ab = JobHandle::combine(&[ha.clone(), hb.clone(), ha.clone()]);
        let ba = JobHandle::combine(&[hb.clone(), ha.clone()]);
        assert_eq!(ab.len(), 2);
        assert_eq!(ab, ba);
        assert_ne!(ab, ha);
        assert_eq!(JobHandle::combine(&[ha.clone()]), ha);
    }

    #[test]
    fn test_combine_wide_fan_in() {
        let signals: Vec<(Arc<Signal>, JobHandle)> = (0..20_000).map(|_| pending()).collect();
        let handles: Vec<JobHandle> = signals.iter().map(|(_, h)| h.clone()).collect();

        // Every handle twice, the second pass reversed.
        let mut doubled = handles.clone();
        doubled.extend(handles.iter().rev().cloned());

        let combined = JobHandle::combine(&doubled);
        assert_eq!(combined.len(), 20_000);
        assert_eq!(combined, JobHandle::combine(&handles));

        for (signal, _) in &signals[..10_000] {
            signal.complete();
        }
        assert_eq!(JobHandle::combine(&[combined]).len(), 10_000);
    }

    #[test]
    fn test_combine_drops_finished_signals() {
        let (a, ha) = pending();
        let (_b, hb) = pending();
        a.complete();

        let combined = JobHandle::combine(&[ha, hb.clone()]);
        assert_eq!(combined, hb);
        assert!(JobHandle::combine(&[]).is_complete());
    }

    #[test]
    fn test_continuation_runs_once_on_complete() {
        let (a, _ha) = pending();
        let hits = Arc::new(Mutex::new(0));

        let counter = Arc::clone(&hits);
        a.on_complete(Box::new(move || *counter.lock() += 1));
        assert_eq!(*hits.lock(), 0);

        a.complete();
        assert_eq!(*hits.lock(), 1);

        // Registered after completion: runs immediately.
        let counter = Arc::clone(&hits);
        a.on_complete(Box::new(move || *counter.lock() += 1));
        assert_eq!(*hits.lock(), 2);
    }

    #[test]
    fn test_wait_blocks_until_signalled() {
        let (a, ha) = pending();
        assert!(!ha.wait_timeout(Duration::from_millis(10)));

        let signaller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            a.complete();
        });
        ha.wait();
        assert!(ha.is_complete());
        signaller.join().unwrap();
    }
}
