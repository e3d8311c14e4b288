//! Shared utilities for kiln
//!
//! Small helpers used by several workspace crates: crash-safe file writes,
//! XDG directory resolution and tracing setup.

pub mod atomic_file;
pub mod tracing;
pub mod xdg;

pub use atomic_file::write_atomic;
pub use xdg::*;
