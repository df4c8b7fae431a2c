//! # WARDEN Core
//!
//! Read/write hazard tracking for jobs that run over a shared, column-oriented
//! entity store. Given the components a job reads and writes, the coordinator
//! computes the earlier jobs it must wait on, then records the job so later
//! jobs wait on it in turn.
//!
//! ## Architecture Rules
//!
//! 1. **One coordinating thread** - The registrar is plain data; every entry
//!    point checks the calling thread instead of taking a lock
//! 2. **Scheduling order is the only mutual exclusion** - Component data is
//!    never locked by this crate
//! 3. **No allocation per resolve** - Dependencies are collected into a
//!    reused scratch buffer
//!
//! ## Hazards
//!
//! | New job | Waits on                                      |
//! |---------|-----------------------------------------------|
//! | read    | last writer                                   |
//! | write   | readers since the last writer, else the writer |
//!
//! ## Example
//!
//! ```rust,ignore
//! use warden_core::{AccessSet, Coordinator};
//!
//! let mut coordinator = Coordinator::new(pool.clone());
//! let access = AccessSet::new().read("Velocity").write("Position");
//!
//! let handle = coordinator.schedule_with(access, |pool, dep| {
//!     pool.schedule(dep, move || integrate())
//! })?;
//!
//! // Before spawning or despawning entities:
//! coordinator.synchronize()?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod access;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod guard;
pub mod jobs;
pub mod memory;
pub mod registrar;

pub use access::{AccessSet, ResourceKey};
pub use config::CoordinatorConfig;
pub use coordinator::{Coordinator, CoordinatorStats, Reservation};
pub use error::{HazardError, HazardResult};
pub use guard::ThreadGuard;
pub use jobs::JobSystem;
pub use memory::ScratchBuffer;
pub use registrar::{AccessRecord, AccessRegistrar};
