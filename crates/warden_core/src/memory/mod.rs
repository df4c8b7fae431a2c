//! # Memory Management
//!
//! Reusable buffers owned by the coordinator so that resolving dependencies
//! does not allocate once the buffers have grown to their working size.

mod scratch;

pub use scratch::ScratchBuffer;
