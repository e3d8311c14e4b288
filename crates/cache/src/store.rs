//! The cache store: identity-keyed, append-only storage of execution results

use crate::backend::{CacheBackend, DiskBackend};
use crate::config::CacheConfig;
use crate::entry::CacheEntry;
use crate::errors::Result;
use crate::eviction::EvictionPolicy;
use crate::format::EncodeOptions;
use crate::mode::CacheMode;
use crate::stats::{CacheStatSnapshot, CacheStats};
use kiln_core::{Fingerprint, Identity, OriginMetadata};
use std::sync::Arc;

/// What a `put` did with the offered entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome {
    /// No entry existed; the new one was written
    Stored,
    /// An entry with identical outputs already existed and was kept
    Unchanged,
    /// An entry with different outputs existed and was replaced.
    ///
    /// Equal identities should always produce equal outputs, so this means
    /// the unit's inputs are insufficiently declared.
    Replaced {
        previous_fingerprint: Fingerprint,
        previous_origin: OriginMetadata,
    },
    /// The cache mode does not allow writes
    Skipped,
}

/// Front end over a backend adding mode checks, statistics, non-determinism
/// detection and eviction bookkeeping.
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    mode: CacheMode,
    stats: CacheStats,
    eviction: Option<Arc<dyn EvictionPolicy>>,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            mode: CacheMode::ReadWrite,
            stats: CacheStats::default(),
            eviction: None,
        }
    }

    /// Build a disk-backed store from configuration
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        let backend = DiskBackend::new(
            &config.base_dir,
            EncodeOptions {
                compression_level: config.compression_level,
                compression_threshold: config.compression_threshold,
            },
        )?;
        Ok(Self::new(Arc::new(backend)).with_mode(config.effective_mode()))
    }

    pub fn with_mode(mut self, mode: CacheMode) -> Self {
        self.mode = mode;
        self
    }

    /// Inform a policy about accesses and insertions
    pub fn with_eviction_policy(mut self, policy: Arc<dyn EvictionPolicy>) -> Self {
        self.eviction = Some(policy);
        self
    }

    pub fn mode(&self) -> CacheMode {
        self.mode
    }

    pub fn is_readable(&self) -> bool {
        self.mode.is_readable()
    }

    pub fn is_writable(&self) -> bool {
        self.mode.is_writable()
    }

    /// Look up the entry for an identity.
    ///
    /// Backend failures, corrupt entries and entries in another format
    /// version are logged and reported as misses.
    pub fn get(&self, identity: &Identity) -> Option<CacheEntry> {
        if !self.mode.is_readable() {
            return None;
        }

        match self.backend.get(identity) {
            Ok(Some(entry)) => {
                CacheStats::record(&self.stats.hits);
                if let Some(policy) = &self.eviction {
                    policy.on_access(identity, entry.size_bytes());
                }
                Some(entry)
            }
            Ok(None) => {
                CacheStats::record(&self.stats.misses);
                None
            }
            Err(e) => {
                CacheStats::record(&self.stats.errors);
                CacheStats::record(&self.stats.misses);
                if e.is_corruption() {
                    tracing::warn!(identity = %identity.short(), "Ignoring unusable cache entry: {e}");
                } else {
                    tracing::warn!(identity = %identity.short(), "Cache read failed, treating as miss: {e}");
                }
                None
            }
        }
    }

    /// Store an entry.
    ///
    /// The store is append-only: an existing entry with the same outputs is
    /// kept as is, and replacing one with different outputs is reported as
    /// `PutOutcome::Replaced`.
    pub fn put(&self, identity: &Identity, entry: &CacheEntry) -> Result<PutOutcome> {
        if !self.mode.is_writable() {
            return Ok(PutOutcome::Skipped);
        }

        let existing = match self.backend.get(identity) {
            Ok(existing) => existing,
            Err(e) => {
                // Unreadable entries are overwritten
                tracing::debug!(identity = %identity.short(), "Replacing unreadable entry: {e}");
                None
            }
        };

        let outcome = match existing {
            Some(previous) if previous.same_outputs_as(entry) => {
                CacheStats::record(&self.stats.unchanged_writes);
                return Ok(PutOutcome::Unchanged);
            }
            Some(previous) => {
                CacheStats::record(&self.stats.nondeterministic_writes);
                PutOutcome::Replaced {
                    previous_fingerprint: previous.output_fingerprint,
                    previous_origin: previous.origin,
                }
            }
            None => PutOutcome::Stored,
        };

        if let Err(e) = self.backend.put(identity, entry) {
            CacheStats::record(&self.stats.errors);
            return Err(e);
        }
        CacheStats::record(&self.stats.writes);

        if let Some(policy) = &self.eviction {
            policy.on_insert(identity, entry.size_bytes());
        }

        Ok(outcome)
    }

    /// Remove an entry; used by retention passes, never by the engine
    pub fn remove(&self, identity: &Identity) -> Result<bool> {
        self.backend.remove(identity)
    }

    pub fn keys(&self) -> Result<Vec<Identity>> {
        self.backend.keys()
    }

    pub fn stats(&self) -> CacheStatSnapshot {
        self.stats.snapshot()
    }
}
