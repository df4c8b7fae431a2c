//! # Store Error Types
//!
//! All errors that can occur in the entity/component store.

use thiserror::Error;
use warden_core::HazardError;
use warden_jobs::JobError;

use crate::ecs::EntityId;

/// Errors that can occur in the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The coordinator rejected the call.
    #[error(transparent)]
    Hazard(#[from] HazardError),

    /// The worker pool could not be started.
    #[error(transparent)]
    Jobs(#[from] JobError),

    /// Entity id is null, stale, or out of range.
    #[error("entity not found: {0:?}")]
    EntityNotFound(EntityId),

    /// Every entity slot is in use.
    #[error("entity capacity exhausted: {capacity}")]
    CapacityExhausted {
        /// Configured capacity.
        capacity: usize,
    },

    /// The component type was never registered.
    #[error("component not registered: {0}")]
    ComponentNotRegistered(&'static str),

    /// Component id does not fit in an entity mask.
    #[error("component {name} has id {id}, ids must be below 64")]
    InvalidComponentId {
        /// Component name.
        name: &'static str,
        /// Offending id.
        id: u8,
    },

    /// Two component types share an id.
    #[error("component id {id} already used by {existing}, cannot register {requested}")]
    ComponentIdInUse {
        /// Shared id.
        id: u8,
        /// Component already registered under the id.
        existing: &'static str,
        /// Component being registered.
        requested: &'static str,
    },

    /// The entity does not carry the component.
    #[error("entity {entity:?} has no {component}")]
    ComponentMissing {
        /// The entity.
        entity: EntityId,
        /// The component.
        component: &'static str,
    },

    /// A job opened a column its query did not declare.
    #[error("undeclared access to {component} (write: {write})")]
    UndeclaredAccess {
        /// The component.
        component: &'static str,
        /// Whether write access was requested.
        write: bool,
    },

    /// A column was busy when it should have been free.
    #[error("hazard violation on {0}: conflicting jobs overlapped")]
    HazardViolation(&'static str),

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
