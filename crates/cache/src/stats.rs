//! Cache store statistics using atomic counters

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub writes: AtomicU64,
    pub unchanged_writes: AtomicU64,
    pub nondeterministic_writes: AtomicU64,
    pub errors: AtomicU64,
}

impl CacheStats {
    pub(crate) fn record(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics
    pub fn snapshot(&self) -> CacheStatSnapshot {
        CacheStatSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            unchanged_writes: self.unchanged_writes.load(Ordering::Relaxed),
            nondeterministic_writes: self.nondeterministic_writes.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStatSnapshot {
    pub hits: u64,
    pub misses: u64,
    /// Entries actually written to the backend
    pub writes: u64,
    /// Writes skipped because an identical entry already existed
    pub unchanged_writes: u64,
    /// Writes that replaced an entry with different outputs
    pub nondeterministic_writes: u64,
    pub errors: u64,
}

impl CacheStatSnapshot {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
