//! # Coordinating-Thread Guard
//!
//! The registrar has no locks. It is sound only because every read and write
//! of it happens on one thread, checked on every entry point.

use std::thread::{self, ThreadId};

use crate::error::{HazardError, HazardResult};

/// Remembers the coordinating thread and rejects calls from any other.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThreadGuard {
    owner: ThreadId,
}

impl ThreadGuard {
    /// Binds the guard to the calling thread.
    #[must_use]
    pub fn current() -> Self {
        Self {
            owner: thread::current().id(),
        }
    }

    /// The thread this guard is bound to.
    #[inline]
    #[must_use]
    pub const fn owner(&self) -> ThreadId {
        self.owner
    }

    /// Returns `true` when called on the coordinating thread.
    #[inline]
    #[must_use]
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.owner
    }

    /// Fails with [`HazardError::WrongThread`] off the coordinating thread.
    ///
    /// # Errors
    ///
    /// Returns [`HazardError::WrongThread`] if the calling thread is not the
    /// one the guard was created on.
    #[inline]
    pub fn check(&self, operation: &'static str) -> HazardResult<()> {
        let actual = thread::current().id();
        if actual == self.owner {
            return Ok(());
        }
        tracing::error!(
            operation,
            expected = ?self.owner,
            actual = ?actual,
            "hazard registrar touched off the coordinating thread"
        );
        Err(HazardError::WrongThread {
            expected: self.owner,
            actual,
        })
    }
}
