//! # Job System Errors

use thiserror::Error;

/// Errors that can occur while starting the worker pool.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The OS refused to create a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    SpawnFailed(String),

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for job system operations.
pub type JobResult<T> = Result<T, JobError>;
