//! # WARDEN Jobs
//!
//! The worker pool that runs the jobs `warden_core` orders.
//!
//! ## Design
//!
//! - Workers drain a single `crossbeam-channel` queue
//! - A job with a pending dependency waits in a gate, not on a worker
//! - Handles are sets of completion signals; combining is a set union
//! - A panicking job is logged and still completes its handle
//!
//! ## Example
//!
//! ```rust,ignore
//! use warden_core::{AccessSet, Coordinator};
//! use warden_jobs::{JobPool, JobPoolConfig};
//!
//! let pool = JobPool::new(&JobPoolConfig::default())?;
//! let mut coordinator = Coordinator::new(pool.clone());
//!
//! coordinator.schedule_with(AccessSet::write_only("Position"), |pool, dep| {
//!     pool.schedule(dep, || step_positions())
//! })?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
mod handle;
pub mod pool;

pub use config::JobPoolConfig;
pub use error::{JobError, JobResult};
pub use handle::JobHandle;
pub use pool::{JobPool, PoolStats};
