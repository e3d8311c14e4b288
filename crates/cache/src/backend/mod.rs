//! Storage backends behind the cache store
//!
//! A backend is opaque key/value storage for entries. The at-most-once
//! population contract is enforced by the execution engine, not here; a
//! backend only has to make each `put` atomic so readers never observe a
//! partially written entry.

mod disk;
mod memory;
mod tiered;

pub use disk::DiskBackend;
pub use memory::MemoryBackend;
pub use tiered::TieredBackend;

use crate::entry::CacheEntry;
use crate::errors::{Result, StoreType};
use kiln_core::Identity;

/// Key/value storage for cache entries
pub trait CacheBackend: Send + Sync {
    /// Load the entry stored for an identity
    fn get(&self, identity: &Identity) -> Result<Option<CacheEntry>>;

    /// Store an entry, replacing any previous one atomically
    fn put(&self, identity: &Identity, entry: &CacheEntry) -> Result<()>;

    /// Remove an entry, reporting whether one existed
    fn remove(&self, identity: &Identity) -> Result<bool>;

    /// Every identity currently stored
    fn keys(&self) -> Result<Vec<Identity>>;

    fn store_type(&self) -> StoreType;
}
