//! Execution history: the previous execution record of each unit

use crate::fingerprint::ContentHasher;
use dashmap::DashMap;
use kiln_core::{Error, Fingerprint, Identity, OriginMetadata, Result};
use kiln_utils::atomic_file::write_atomic;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

const HISTORY_FORMAT_VERSION: u32 = 1;

/// What the last execution of a unit left behind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviousExecution {
    pub identity: Identity,
    pub origin: OriginMetadata,
    /// Output snapshot fingerprint taken after that execution
    pub output_fingerprint: Fingerprint,
    /// Whether that execution completed without any failure
    pub successful: bool,
}

/// Storage for previous execution records, keyed by stable work id
pub trait ExecutionHistoryStore: Send + Sync {
    fn load(&self, work_id: &str) -> Result<Option<PreviousExecution>>;

    fn store(&self, work_id: &str, record: PreviousExecution) -> Result<()>;

    /// Forget a unit's record; returns whether one existed
    fn remove(&self, work_id: &str) -> Result<bool>;
}

/// History kept for the lifetime of the process
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    records: DashMap<String, PreviousExecution>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ExecutionHistoryStore for InMemoryHistory {
    fn load(&self, work_id: &str) -> Result<Option<PreviousExecution>> {
        Ok(self.records.get(work_id).map(|record| record.clone()))
    }

    fn store(&self, work_id: &str, record: PreviousExecution) -> Result<()> {
        self.records.insert(work_id.to_string(), record);
        Ok(())
    }

    fn remove(&self, work_id: &str) -> Result<bool> {
        Ok(self.records.remove(work_id).is_some())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct HistoryDocument {
    version: u32,
    work_id: String,
    record: PreviousExecution,
}

/// One JSON document per unit below a directory, replaced atomically
#[derive(Debug, Clone)]
pub struct FileHistory {
    dir: PathBuf,
}

impl FileHistory {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| Error::file_system(&dir, "create history directory", e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Work ids are arbitrary strings, so files are named by their digest
    fn record_path(&self, work_id: &str) -> PathBuf {
        let mut hasher = ContentHasher::new();
        hasher.str(work_id);
        self.dir.join(format!("{}.json", hasher.finish().to_hex()))
    }
}

impl ExecutionHistoryStore for FileHistory {
    fn load(&self, work_id: &str) -> Result<Option<PreviousExecution>> {
        let path = self.record_path(work_id);
        let content = match std::fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::file_system(&path, "read history record", e)),
        };

        // An unusable record only costs a re-execution
        match serde_json::from_slice::<HistoryDocument>(&content) {
            Ok(document)
                if document.version == HISTORY_FORMAT_VERSION && document.work_id == work_id =>
            {
                Ok(Some(document.record))
            }
            Ok(document) => {
                tracing::debug!(
                    work = %work_id,
                    version = document.version,
                    "Ignoring history record from another format version"
                );
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(work = %work_id, path = %path.display(), "Ignoring corrupt history record: {e}");
                Ok(None)
            }
        }
    }

    fn store(&self, work_id: &str, record: PreviousExecution) -> Result<()> {
        let document = HistoryDocument {
            version: HISTORY_FORMAT_VERSION,
            work_id: work_id.to_string(),
            record,
        };
        let json = serde_json::to_vec_pretty(&document)?;
        write_atomic(&self.record_path(work_id), &json)
    }

    fn remove(&self, work_id: &str) -> Result<bool> {
        let path = self.record_path(work_id);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::file_system(&path, "remove history record", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::{BuildInvocationId, ExecutionOutcome};
    use std::time::Duration;
    use tempfile::TempDir;

    fn record(seed: u8, successful: bool) -> PreviousExecution {
        PreviousExecution {
            identity: Identity::from_fingerprint(Fingerprint::from_bytes([seed; 32])),
            origin: OriginMetadata::from_current_build(
                BuildInvocationId::generate(),
                Duration::from_millis(40),
                ExecutionOutcome::Executed,
            ),
            output_fingerprint: Fingerprint::from_bytes([seed.wrapping_add(1); 32]),
            successful,
        }
    }

    fn exercise(history: &dyn ExecutionHistoryStore) {
        assert_eq!(history.load("compile :app").unwrap(), None);

        let first = record(1, true);
        history.store("compile :app", first.clone()).unwrap();
        assert_eq!(history.load("compile :app").unwrap(), Some(first));

        let second = record(2, false);
        history.store("compile :app", second.clone()).unwrap();
        assert_eq!(history.load("compile :app").unwrap(), Some(second));
        assert_eq!(history.load("compile :lib").unwrap(), None);

        assert!(history.remove("compile :app").unwrap());
        assert!(!history.remove("compile :app").unwrap());
        assert_eq!(history.load("compile :app").unwrap(), None);
    }

    #[test]
    fn test_in_memory_history() {
        exercise(&InMemoryHistory::new());
    }

    #[test]
    fn test_file_history() {
        let dir = TempDir::new().unwrap();
        exercise(&FileHistory::new(dir.path().join("history")).unwrap());
    }

    #[test]
    fn test_file_history_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let rec = record(3, true);
        FileHistory::new(dir.path()).unwrap().store("gen", rec.clone()).unwrap();
        assert_eq!(FileHistory::new(dir.path()).unwrap().load("gen").unwrap(), Some(rec));
    }

    #[test]
    fn test_corrupt_record_reads_as_absent() {
        let dir = TempDir::new().unwrap();
        let history = FileHistory::new(dir.path()).unwrap();
        std::fs::write(history.record_path("gen"), b"{ truncated").unwrap();
        assert_eq!(history.load("gen").unwrap(), None);
    }
}
