//! # Coordinator Configuration
//!
//! Sizing hints for the coordinator's reusable buffers. Loaded once at
//! startup, usually as a table inside a larger TOML file.

use serde::Deserialize;

use crate::error::{HazardError, HazardResult};

/// Configuration for a [`Coordinator`](crate::Coordinator).
///
/// ```toml
/// scratch_capacity = 64
/// reader_capacity = 8
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoordinatorConfig {
    /// Initial capacity of the scratch dependency buffer.
    pub scratch_capacity: usize,
    /// Initial capacity of each access record's reader list.
    pub reader_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            scratch_capacity: 64,
            reader_capacity: 4,
        }
    }
}

impl CoordinatorConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// Missing fields fall back to [`CoordinatorConfig::default`].
    ///
    /// # Errors
    ///
    /// Returns [`HazardError::InvalidConfig`] if the text is not valid TOML,
    /// contains unknown fields, or fails [`validate`](Self::validate).
    pub fn from_toml_str(text: &str) -> HazardResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| HazardError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for values the coordinator cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`HazardError::InvalidConfig`] if the scratch buffer would start
    /// with zero capacity.
    pub fn validate(&self) -> HazardResult<()> {
        if self.scratch_capacity == 0 {
            return Err(HazardError::InvalidConfig(
                "scratch_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
