use super::CacheBackend;
use crate::entry::CacheEntry;
use crate::errors::{Result, StoreType};
use dashmap::DashMap;
use kiln_core::Identity;
use std::sync::Arc;

/// In-process backend, mostly useful for tests and single-build caches
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: DashMap<Identity, Arc<CacheEntry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CacheBackend for MemoryBackend {
    fn get(&self, identity: &Identity) -> Result<Option<CacheEntry>> {
        Ok(self
            .entries
            .get(identity)
            .map(|entry| entry.value().as_ref().clone()))
    }

    fn put(&self, identity: &Identity, entry: &CacheEntry) -> Result<()> {
        self.entries.insert(*identity, Arc::new(entry.clone()));
        Ok(())
    }

    fn remove(&self, identity: &Identity) -> Result<bool> {
        Ok(self.entries.remove(identity).is_some())
    }

    fn keys(&self) -> Result<Vec<Identity>> {
        Ok(self.entries.iter().map(|entry| *entry.key()).collect())
    }

    fn store_type(&self) -> StoreType {
        StoreType::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::fixtures::{entry, identity};

    #[test]
    fn test_put_get_remove() {
        let backend = MemoryBackend::new();
        let e = entry(1, b"data");

        assert!(backend.get(&identity(1)).unwrap().is_none());
        backend.put(&identity(1), &e).unwrap();
        assert_eq!(backend.get(&identity(1)).unwrap(), Some(e));
        assert_eq!(backend.keys().unwrap(), vec![identity(1)]);

        assert!(backend.remove(&identity(1)).unwrap());
        assert!(!backend.remove(&identity(1)).unwrap());
        assert!(backend.is_empty());
    }
}
