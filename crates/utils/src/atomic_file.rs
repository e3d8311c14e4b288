//! Crash-safe file replacement
//!
//! Content is written to a hidden sibling of the target, flushed to disk and
//! renamed over the target. Readers see either the old file or the new one.

use kiln_core::{Error, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Replace `path` with `content` atomically, creating parent directories
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => {
            return Err(Error::configuration(format!(
                "cannot write {}: path has no parent directory",
                path.display()
            )))
        }
    };
    fs::create_dir_all(parent)
        .map_err(|e| Error::file_system(parent, "create parent directory", e))?;

    let staging = staging_path(parent, path);
    if let Err(e) = write_synced(&staging, content) {
        let _ = fs::remove_file(&staging);
        return Err(e);
    }

    if let Err(e) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(Error::file_system(path, "replace file", e));
    }

    sync_dir(parent);
    Ok(())
}

/// Staging files share the directory so the rename never crosses filesystems
fn staging_path(parent: &Path, target: &Path) -> PathBuf {
    let stem = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    parent.join(format!(".{stem}.{}.tmp", Uuid::new_v4().simple()))
}

fn write_synced(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| Error::file_system(path, "create staging file", e))?;
    file.write_all(content)
        .map_err(|e| Error::file_system(path, "write staging file", e))?;
    file.sync_all()
        .map_err(|e| Error::file_system(path, "sync staging file", e))
}

/// Persist the rename itself; best effort, not every platform supports it
fn sync_dir(dir: &Path) {
    #[cfg(unix)]
    if let Ok(handle) = File::open(dir) {
        let _ = handle.sync_all();
    }
    #[cfg(not(unix))]
    let _ = dir;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_replaces_existing_content() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("record.json");
        fs::write(&target, b"old").unwrap();

        write_atomic(&target, b"new").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"new");
    }

    #[test]
    fn test_creates_missing_parents() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("entries").join("ab").join("abcd.entry");

        write_atomic(&target, &[1, 2, 3]).unwrap();
        assert_eq!(fs::read(&target).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_no_staging_files_remain() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.bin");
        for round in 0..3u8 {
            write_atomic(&target, &[round]).unwrap();
        }

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["out.bin".to_string()]);
    }

    #[test]
    fn test_bare_file_name_is_rejected() {
        assert!(write_atomic(Path::new("relative.txt"), b"x").is_err());
    }
}
