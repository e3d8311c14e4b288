//! Local disk backend
//!
//! Entries live at `<base>/entries/<first two hex chars>/<identity>.entry`.
//! The 256-way sharding keeps directories small; writes go through a
//! temporary file and a rename.

use super::CacheBackend;
use crate::entry::CacheEntry;
use crate::errors::{CacheError, RecoveryHint, Result, StoreType};
use crate::format::{decode_entry, encode_entry, EncodeOptions};
use kiln_core::{Fingerprint, Identity};
use kiln_utils::atomic_file::write_atomic;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const ENTRIES_DIR: &str = "entries";
const ENTRY_EXTENSION: &str = "entry";

#[derive(Debug, Clone)]
pub struct DiskBackend {
    base_dir: PathBuf,
    options: EncodeOptions,
}

impl DiskBackend {
    /// Open (creating if needed) a disk backend rooted at `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>, options: EncodeOptions) -> Result<Self> {
        let base_dir = base_dir.into();
        let entries = base_dir.join(ENTRIES_DIR);
        fs::create_dir_all(&entries).map_err(|e| CacheError::Io {
            path: entries.clone(),
            operation: "create cache directory",
            source: e,
            recovery_hint: RecoveryHint::CheckPermissions {
                path: entries.clone(),
            },
        })?;

        tracing::debug!("Opened disk cache at {}", base_dir.display());
        Ok(Self { base_dir, options })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path of the entry file for an identity
    pub fn entry_path(&self, identity: &Identity) -> PathBuf {
        let hex = identity.to_hex();
        let shard = &hex[..2];
        self.base_dir
            .join(ENTRIES_DIR)
            .join(shard)
            .join(format!("{hex}.{ENTRY_EXTENSION}"))
    }
}

impl CacheBackend for DiskBackend {
    fn get(&self, identity: &Identity) -> Result<Option<CacheEntry>> {
        let path = self.entry_path(identity);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CacheError::Io {
                    recovery_hint: RecoveryHint::CheckPermissions { path: path.clone() },
                    path,
                    operation: "read cache entry",
                    source: e,
                })
            }
        };

        let entry = decode_entry(&identity.to_hex(), &bytes)?;
        if &entry.identity != identity {
            return Err(CacheError::Corruption {
                key: identity.to_hex(),
                reason: format!("Entry file holds identity {}", entry.identity),
                recovery_hint: RecoveryHint::TreatAsMiss,
            });
        }
        Ok(Some(entry))
    }

    fn put(&self, identity: &Identity, entry: &CacheEntry) -> Result<()> {
        let bytes = encode_entry(entry, self.options)?;
        write_atomic(&self.entry_path(identity), &bytes)?;
        Ok(())
    }

    fn remove(&self, identity: &Identity) -> Result<bool> {
        let path = self.entry_path(identity);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::Io {
                recovery_hint: RecoveryHint::CheckPermissions { path: path.clone() },
                path,
                operation: "remove cache entry",
                source: e,
            }),
        }
    }

    fn keys(&self) -> Result<Vec<Identity>> {
        let root = self.base_dir.join(ENTRIES_DIR);
        let mut keys = Vec::new();

        let shards = match fs::read_dir(&root) {
            Ok(shards) => shards,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(keys),
            Err(e) => return Err(CacheError::from(e)),
        };

        for shard in shards.flatten() {
            let Ok(files) = fs::read_dir(shard.path()) else {
                continue;
            };
            for file in files.flatten() {
                let path = file.path();
                if path.extension().and_then(|ext| ext.to_str()) != Some(ENTRY_EXTENSION) {
                    continue;
                }
                let parsed = path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .and_then(|stem| stem.parse::<Fingerprint>().ok());
                if let Some(fingerprint) = parsed {
                    keys.push(Identity::from_fingerprint(fingerprint));
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn store_type(&self) -> StoreType {
        StoreType::Disk
    }
}
