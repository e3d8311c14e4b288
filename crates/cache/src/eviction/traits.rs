//! Core eviction policy trait definition

use kiln_core::Identity;

/// Eviction policy trait
pub trait EvictionPolicy: Send + Sync {
    /// Record a cache hit for an entry
    fn on_access(&self, key: &Identity, size: u64);

    /// Record insertion (or replacement) of an entry
    fn on_insert(&self, key: &Identity, size: u64);

    /// Record removal of an entry
    fn on_remove(&self, key: &Identity);

    /// Next entry to evict, if the policy wants one gone
    fn next_eviction(&self) -> Option<Identity>;

    /// Clear all tracking data
    fn clear(&self);

    /// Total size of the tracked entries
    fn tracked_bytes(&self) -> u64;
}
