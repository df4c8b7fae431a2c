//! # Job System Interface
//!
//! The coordinator never runs work itself. It only needs to merge handles
//! into one and to block on a handle during a structural barrier.

/// Capability interface to a job scheduler.
///
/// Implementations must be safe to call from the coordinating thread while
/// workers are running; the coordinator adds no synchronization of its own.
pub trait JobSystem {
    /// Opaque token for a scheduled unit of work.
    type Handle: Clone + PartialEq + Send + 'static;

    /// Merges handles into one that completes when all of them have.
    ///
    /// An empty slice yields a handle that is already complete.
    fn combine(&self, handles: &[Self::Handle]) -> Self::Handle;

    /// Blocks the calling thread until `handle` has completed.
    fn wait(&self, handle: &Self::Handle);
}

impl<J: JobSystem + ?Sized> JobSystem for &J {
    type Handle = J::Handle;

    fn combine(&self, handles: &[Self::Handle]) -> Self::Handle {
        (**self).combine(handles)
    }

    fn wait(&self, handle: &Self::Handle) {
        (**self).wait(handle);
    }
}
