//! Content-addressable cache of unit-of-work results
//!
//! This crate provides the cache store used by the execution engine:
//! - `CacheEntry`: stored outputs plus provenance, keyed by `Identity`
//! - A versioned, checksummed on-disk format
//! - Memory, disk and tiered backends behind `CacheBackend`
//! - Append-only `put` with non-determinism detection
//! - Eviction policy hooks for external retention

pub mod backend;
pub mod config;
pub mod entry;
pub mod errors;
pub mod eviction;
pub mod format;
pub mod mode;
pub mod stats;
pub mod store;

pub use backend::{CacheBackend, DiskBackend, MemoryBackend, TieredBackend};
pub use config::{CacheConfig, CacheConfigLoader, ConfigSource};
pub use entry::{CacheEntry, OutputContent, StoredOutput};
pub use errors::{CacheError, Error, RecoveryHint, Result};
pub use eviction::{sweep, EvictionPolicy, LruPolicy, SweepReport};
pub use mode::CacheMode;
pub use stats::CacheStatSnapshot;
pub use store::{CacheStore, PutOutcome};
