//! # Coordinator
//!
//! Owns the access registrar and mediates every job's view of it.
//!
//! ## Protocol
//!
//! ```text
//!   1. get_dependency(access)            -> dep      (resolve)
//!   2. jobs.schedule(dep, work)          -> handle   (caller, external)
//!   3. register_dependency(access, handle)           (publish)
//! ```
//!
//! Step 3 must happen before the next resolve that could conflict, and before
//! anything discards `handle`. [`Coordinator::reserve`] and
//! [`Coordinator::commit`] pair steps 1 and 3 through a token so the published
//! access set is always the one that was resolved.
//!
//! ## Thread Safety
//!
//! Every entry point checks that it runs on the thread that created the
//! coordinator. Nothing else synchronizes the registrar.

use crate::access::{AccessSet, ResourceKey};
use crate::config::CoordinatorConfig;
use crate::error::HazardResult;
use crate::guard::ThreadGuard;
use crate::jobs::JobSystem;
use crate::memory::ScratchBuffer;
use crate::registrar::AccessRegistrar;

/// Counters for how the coordinator has been used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    /// Dependencies resolved (including those taken by reservations).
    pub resolves: u64,
    /// Handles published.
    pub publishes: u64,
    /// Full structural barriers.
    pub barriers: u64,
}

/// A resolved dependency that still has to be published.
///
/// Returned by [`Coordinator::reserve`]; consumed by [`Coordinator::commit`]
/// with the handle of the job scheduled on [`dependency`](Self::dependency).
#[must_use = "a reservation must be committed with the handle of the scheduled job"]
#[derive(Debug)]
pub struct Reservation<K, H> {
    access: AccessSet<K>,
    dependency: H,
}

impl<K, H> Reservation<K, H> {
    /// The handle the new job must wait on.
    #[inline]
    pub fn dependency(&self) -> &H {
        &self.dependency
    }

    /// The access set that was resolved.
    #[inline]
    pub fn access(&self) -> &AccessSet<K> {
        &self.access
    }
}

/// Hazard-tracking coordinator for one data store.
///
/// # Type Parameters
///
/// * `K` - Resource key (one per component kind)
/// * `J` - Job system providing handle combination and waiting
///
/// # Example
///
/// ```rust,ignore
/// let mut coordinator = Coordinator::new(pool.clone());
///
/// let access = AccessSet::new().read(POSITION).write(VELOCITY);
/// let dep = coordinator.get_dependency(&access)?;
/// let handle = pool.schedule(&dep, move || integrate());
/// coordinator.register_dependency(&access, handle)?;
/// ```
pub struct Coordinator<K, J: JobSystem> {
    /// Per-resource readers and writer.
    registrar: AccessRegistrar<K, J::Handle>,
    /// Reused for every resolve and barrier.
    scratch: ScratchBuffer<J::Handle>,
    /// The coordinating thread.
    guard: ThreadGuard,
    /// Scheduler capability.
    jobs: J,
    stats: CoordinatorStats,
}

impl<K: ResourceKey, J: JobSystem> Coordinator<K, J> {
    /// Creates a coordinator bound to the calling thread.
    #[must_use]
    pub fn new(jobs: J) -> Self {
        Self::with_config(jobs, &CoordinatorConfig::default())
    }

    /// Creates a coordinator bound to the calling thread with explicit sizing.
    #[must_use]
    pub fn with_config(jobs: J, config: &CoordinatorConfig) -> Self {
        Self {
            registrar: AccessRegistrar::new(config.reader_capacity),
            scratch: ScratchBuffer::new(config.scratch_capacity),
            guard: ThreadGuard::current(),
            jobs,
            stats: CoordinatorStats::default(),
        }
    }

    /// The job system handles are combined and waited through.
    #[inline]
    pub fn jobs(&self) -> &J {
        &self.jobs
    }

    /// Read-only view of the registrar.
    #[inline]
    pub fn registrar(&self) -> &AccessRegistrar<K, J::Handle> {
        &self.registrar
    }

    /// Usage counters.
    #[inline]
    pub fn stats(&self) -> CoordinatorStats {
        self.stats
    }

    /// Largest dependency fan-in seen by a single resolve or barrier.
    #[inline]
    pub fn scratch_high_water(&self) -> usize {
        self.scratch.high_water()
    }

    /// Returns `true` when called on the coordinating thread.
    #[inline]
    pub fn is_coordinating_thread(&self) -> bool {
        self.guard.is_current()
    }

    /// Computes the handle a job with `access` must wait on.
    ///
    /// The result completes once every earlier writer of a key in `access`
    /// has finished, and, for written keys, every reader since that writer.
    /// Keys that were never published contribute nothing. With nothing to
    /// wait on, the result is an already-complete handle.
    ///
    /// # Errors
    ///
    /// Returns [`HazardError::WrongThread`](crate::HazardError::WrongThread)
    /// off the coordinating thread.
    pub fn get_dependency(&mut self, access: &AccessSet<K>) -> HazardResult<J::Handle> {
        self.guard.check("get_dependency")?;
        Ok(self.resolve(access))
    }

    /// Records `handle` as the newest reader or writer of each key in `access`.
    ///
    /// `handle` must belong to a job scheduled on the result of
    /// [`get_dependency`](Self::get_dependency) for the same `access`.
    ///
    /// # Errors
    ///
    /// Returns [`HazardError::WrongThread`](crate::HazardError::WrongThread)
    /// off the coordinating thread.
    pub fn register_dependency(
        &mut self,
        access: &AccessSet<K>,
        handle: J::Handle,
    ) -> HazardResult<()> {
        self.guard.check("register_dependency")?;
        self.publish(access, &handle);
        Ok(())
    }

    /// Resolves `access` and returns a token that must be committed.
    ///
    /// # Errors
    ///
    /// Returns [`HazardError::WrongThread`](crate::HazardError::WrongThread)
    /// off the coordinating thread.
    pub fn reserve(&mut self, access: AccessSet<K>) -> HazardResult<Reservation<K, J::Handle>> {
        self.guard.check("reserve")?;
        let dependency = self.resolve(&access);
        Ok(Reservation { access, dependency })
    }

    /// Publishes `handle` against the reserved access set.
    ///
    /// # Errors
    ///
    /// Returns [`HazardError::WrongThread`](crate::HazardError::WrongThread)
    /// off the coordinating thread. The reservation is dropped in that case.
    pub fn commit(
        &mut self,
        reservation: Reservation<K, J::Handle>,
        handle: J::Handle,
    ) -> HazardResult<()> {
        self.guard.check("commit")?;
        self.publish(&reservation.access, &handle);
        Ok(())
    }

    /// Resolves, schedules and publishes in one step.
    ///
    /// `schedule` receives the job system and the dependency, and returns the
    /// handle of the job it scheduled on that dependency.
    ///
    /// # Errors
    ///
    /// Returns [`HazardError::WrongThread`](crate::HazardError::WrongThread)
    /// off the coordinating thread; `schedule` is not called in that case.
    pub fn schedule_with<F>(&mut self, access: AccessSet<K>, schedule: F) -> HazardResult<J::Handle>
    where
        F: FnOnce(&J, &J::Handle) -> J::Handle,
    {
        let reservation = self.reserve(access)?;
        let handle = schedule(&self.jobs, reservation.dependency());
        self.commit(reservation, handle.clone())?;
        Ok(handle)
    }

    /// Blocks until every handle in the registrar has completed.
    ///
    /// Call before any structural change to the data store. The registrar is
    /// left as is; completed handles are harmless to wait on again.
    ///
    /// # Errors
    ///
    /// Returns [`HazardError::WrongThread`](crate::HazardError::WrongThread)
    /// off the coordinating thread.
    pub fn synchronize(&mut self) -> HazardResult<()> {
        self.guard.check("synchronize")?;

        self.registrar.collect_outstanding(self.scratch.begin());
        let outstanding = self.scratch.finish().len();
        if outstanding > 0 {
            let all = self.jobs.combine(self.scratch.finish());
            self.scratch.release();
            self.jobs.wait(&all);
        }
        self.stats.barriers += 1;

        tracing::debug!(
            outstanding,
            resources = self.registrar.len(),
            "structural barrier drained"
        );
        Ok(())
    }

    /// Blocks until a job with `access` could start.
    ///
    /// Used before the coordinating thread touches specific resources
    /// directly, without draining unrelated work.
    ///
    /// # Errors
    ///
    /// Returns [`HazardError::WrongThread`](crate::HazardError::WrongThread)
    /// off the coordinating thread.
    pub fn complete(&mut self, access: &AccessSet<K>) -> HazardResult<()> {
        self.guard.check("complete")?;
        let dependency = self.resolve(access);
        self.jobs.wait(&dependency);
        Ok(())
    }

    fn resolve(&mut self, access: &AccessSet<K>) -> J::Handle {
        self.registrar.collect_dependencies(access, self.scratch.begin());
        let deps = self.scratch.finish();
        let found = deps.len();
        let combined = self.jobs.combine(deps);
        self.scratch.release();
        self.stats.resolves += 1;

        tracing::trace!(
            reads = access.reads().len(),
            writes = access.writes().len(),
            dependencies = found,
            "resolved dependency"
        );
        combined
    }

    fn publish(&mut self, access: &AccessSet<K>, handle: &J::Handle) {
        self.registrar.publish(access, handle);
        self.stats.publishes += 1;

        tracing::trace!(
            reads = access.reads().len(),
            writes = access.writes().len(),
            "published dependency"
        );
    }
}
