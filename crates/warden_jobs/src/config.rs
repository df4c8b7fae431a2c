//! # Worker Pool Configuration

use std::num::NonZeroUsize;
use std::thread;

use serde::Deserialize;

use crate::error::{JobError, JobResult};

/// Configuration for a [`JobPool`](crate::JobPool).
///
/// ```toml
/// worker_threads = 8
/// thread_name_prefix = "warden-worker"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobPoolConfig {
    /// Number of worker threads.
    pub worker_threads: usize,
    /// Worker threads are named `{prefix}-{index}`.
    pub thread_name_prefix: String,
}

impl Default for JobPoolConfig {
    fn default() -> Self {
        Self {
            worker_threads: thread::available_parallelism().map_or(4, NonZeroUsize::get),
            thread_name_prefix: "warden-worker".to_string(),
        }
    }
}

impl JobPoolConfig {
    /// Configuration with an explicit worker count and default naming.
    #[must_use]
    pub fn with_workers(worker_threads: usize) -> Self {
        Self {
            worker_threads,
            ..Self::default()
        }
    }

    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::InvalidConfig`] on malformed TOML, unknown fields,
    /// or values rejected by [`validate`](Self::validate).
    pub fn from_toml_str(text: &str) -> JobResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| JobError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for values the pool cannot start with.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::InvalidConfig`] for zero workers or an empty
    /// thread name prefix.
    pub fn validate(&self) -> JobResult<()> {
        if self.worker_threads == 0 {
            return Err(JobError::InvalidConfig(
                "worker_threads must be greater than zero".to_string(),
            ));
        }
        if self.thread_name_prefix.is_empty() {
            return Err(JobError::InvalidConfig(
                "thread_name_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
