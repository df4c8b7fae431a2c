//! # World Configuration
//!
//! One TOML file configures the store, its coordinator and its worker pool:
//!
//! ```toml
//! capacity = 100000
//!
//! [coordinator]
//! scratch_capacity = 64
//!
//! [jobs]
//! worker_threads = 8
//! ```

use serde::Deserialize;
use warden_core::CoordinatorConfig;
use warden_jobs::JobPoolConfig;

use crate::error::{StoreError, StoreResult};

/// Configuration for a [`World`](crate::World).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Maximum number of live entities.
    pub capacity: usize,
    /// Coordinator buffer sizing.
    pub coordinator: CoordinatorConfig,
    /// Worker pool.
    pub jobs: JobPoolConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            coordinator: CoordinatorConfig::default(),
            jobs: JobPoolConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Default configuration with the given capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] on malformed TOML or an invalid
    /// capacity, and the nested config's error for invalid sections.
    pub fn from_toml_str(text: &str) -> StoreResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| StoreError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks this configuration and the nested ones.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if the capacity is zero or does
    /// not fit entity indices, or the nested config's error.
    pub fn validate(&self) -> StoreResult<()> {
        if self.capacity == 0 || u32::try_from(self.capacity).is_err() {
            return Err(StoreError::InvalidConfig(format!(
                "capacity must be between 1 and {}, got {}",
                u32::MAX,
                self.capacity
            )));
        }
        self.coordinator.validate()?;
        self.jobs.validate()?;
        Ok(())
    }
}
