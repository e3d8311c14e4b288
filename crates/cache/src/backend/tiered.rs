use super::CacheBackend;
use crate::entry::CacheEntry;
use crate::errors::{CacheError, RecoveryHint, Result, StoreType};
use kiln_core::Identity;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// A fast local backend in front of a shared remote one.
///
/// Reads try local first and promote remote hits into local storage. Writes
/// go to both tiers; a failure in one tier is logged and only surfaced when
/// both fail.
pub struct TieredBackend {
    local: Arc<dyn CacheBackend>,
    remote: Arc<dyn CacheBackend>,
}

impl TieredBackend {
    pub fn new(local: Arc<dyn CacheBackend>, remote: Arc<dyn CacheBackend>) -> Self {
        Self { local, remote }
    }
}

impl CacheBackend for TieredBackend {
    fn get(&self, identity: &Identity) -> Result<Option<CacheEntry>> {
        match self.local.get(identity) {
            Ok(Some(entry)) => return Ok(Some(entry)),
            Ok(None) => {}
            Err(e) => tracing::warn!(identity = %identity.short(), "Local cache read failed: {e}"),
        }

        let Some(entry) = self.remote.get(identity)? else {
            return Ok(None);
        };

        if let Err(e) = self.local.put(identity, &entry) {
            tracing::warn!(identity = %identity.short(), "Failed to promote remote entry: {e}");
        }
        Ok(Some(entry))
    }

    fn put(&self, identity: &Identity, entry: &CacheEntry) -> Result<()> {
        let local = self.local.put(identity, entry);
        let remote = self.remote.put(identity, entry);

        match (local, remote) {
            (Err(local_err), Err(remote_err)) => Err(CacheError::StoreUnavailable {
                store_type: StoreType::Tiered,
                reason: format!("local: {local_err}; remote: {remote_err}"),
                recovery_hint: RecoveryHint::Retry {
                    after: Duration::from_secs(1),
                },
            }),
            (Err(e), Ok(())) => {
                tracing::warn!(identity = %identity.short(), "Local cache write failed: {e}");
                Ok(())
            }
            (Ok(()), Err(e)) => {
                tracing::warn!(identity = %identity.short(), "Remote cache write failed: {e}");
                Ok(())
            }
            (Ok(()), Ok(())) => Ok(()),
        }
    }

    fn remove(&self, identity: &Identity) -> Result<bool> {
        let local = self.local.remove(identity)?;
        let remote = self.remote.remove(identity)?;
        Ok(local || remote)
    }

    fn keys(&self) -> Result<Vec<Identity>> {
        let mut keys: BTreeSet<Identity> = self.local.keys()?.into_iter().collect();
        keys.extend(self.remote.keys()?);
        Ok(keys.into_iter().collect())
    }

    fn store_type(&self) -> StoreType {
        StoreType::Tiered
    }
}
