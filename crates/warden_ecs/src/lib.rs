//! # WARDEN ECS
//!
//! Entity/component store whose queries are scheduled through the
//! `warden_core` coordinator onto a `warden_jobs` worker pool.
//!
//! ## Architecture Rules
//!
//! 1. **Declared access** - A job only opens the columns its [`Query`] names
//! 2. **No waiting on locks** - Columns are try-locked; a busy column is
//!    counted as a hazard violation
//! 3. **Structural barrier** - Spawning, despawning and attaching components
//!    drain every outstanding job first
//!
//! ## Example
//!
//! ```rust,ignore
//! use warden_ecs::{Query, World, WorldConfig};
//!
//! let mut world = World::new(&WorldConfig::default())?;
//! world.register::<Position>()?;
//! world.register::<Velocity>()?;
//!
//! world.schedule(Query::new().read::<Velocity>().write::<Position>(), |view| {
//!     let (Ok(vel), Ok(mut pos)) = (view.column::<Velocity>(), view.column_mut::<Position>())
//!     else {
//!         return;
//!     };
//!     for id in view.matching() {
//!         // ...
//!     }
//! })?;
//!
//! world.complete_all()?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;

pub use config::WorldConfig;
pub use ecs::{
    ColumnMut, ColumnRef, Component, ComponentKey, ComponentStorage, Entity, EntityId, Query,
    QueryView, World, MAX_COMPONENTS,
};
pub use error::{StoreError, StoreResult};
