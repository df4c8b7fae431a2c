//! # Entity Component System
//!
//! A pre-allocated column store whose queries run as jobs.
//!
//! ## Design Philosophy
//!
//! - All storage is pre-allocated at world creation or registration
//! - Components are stored in dense arrays, one per component type
//! - Entity IDs are simple indices with generation counters
//! - Jobs declare the columns they touch; the coordinator orders them

mod component;
mod entity;
mod query;
mod storage;
mod world;

pub use component::{Component, ComponentKey, MAX_COMPONENTS};
pub use entity::{Entity, EntityId};
pub use query::{ColumnMut, ColumnRef, Query, QueryView};
pub use storage::ComponentStorage;
pub use world::World;
