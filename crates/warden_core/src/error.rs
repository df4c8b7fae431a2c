//! # Hazard Tracking Errors
//!
//! All errors that the coordinator can report.

use std::thread::ThreadId;

use thiserror::Error;

/// Errors that can occur while resolving, publishing or draining dependencies.
///
/// A resource key that was never published against is *not* an error: it is
/// treated as a resource with no readers and no writer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HazardError {
    /// The coordinator was used from a thread other than the one that created it.
    #[error("coordinator called off its thread: expected {expected:?}, got {actual:?}")]
    WrongThread {
        /// The coordinating thread captured at construction.
        expected: ThreadId,
        /// The thread that made the call.
        actual: ThreadId,
    },

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for hazard tracking operations.
pub type HazardResult<T> = Result<T, HazardError>;
