//! Eviction policy interface for external retention
//!
//! The cache store only *informs* a policy about accesses and insertions.
//! Removing entries is the job of a retention pass run between builds
//! (`sweep`); the execution engine never evicts on its own. A later miss for
//! an evicted identity is an ordinary miss.

mod policies;
mod retention;
mod traits;

pub use policies::LruPolicy;
pub use retention::{sweep, SweepReport};
pub use traits::EvictionPolicy;
