//! Output locations, snapshots of their state, and transfer to and from the cache

use super::hasher::{digest_bytes, ContentHasher, TAG_CONTENT, TAG_DIRECTORY, TAG_MISSING, TAG_TREE};
use super::inputs::{digest_file, relative_path};
use kiln_cache::{OutputContent, StoredOutput};
use kiln_core::{Error, Fingerprint, Result};
use kiln_utils::atomic_file::write_atomic;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// A named location whose state after execution is captured
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputLocation {
    pub name: String,
    pub path: PathBuf,
}

impl OutputLocation {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// State of one output location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputState {
    Missing,
    File { digest: Fingerprint },
    /// Regular files below the directory, keyed by relative path
    Directory { files: BTreeMap<String, Fingerprint> },
}

/// State of every declared output at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSnapshot {
    outputs: BTreeMap<String, OutputState>,
}

impl OutputSnapshot {
    /// Read the current state of the given locations
    pub fn capture(locations: &[OutputLocation]) -> Result<Self> {
        let mut outputs = BTreeMap::new();
        for location in locations {
            outputs.insert(location.name.clone(), capture_state(&location.path)?);
        }
        Ok(Self { outputs })
    }

    /// Snapshot describing packed output content, equal to what `capture`
    /// returns once that content is on disk
    pub fn from_stored(stored: &[StoredOutput]) -> Self {
        let outputs = stored
            .iter()
            .map(|output| {
                let state = match &output.content {
                    OutputContent::Missing => OutputState::Missing,
                    OutputContent::File(bytes) => OutputState::File {
                        digest: digest_bytes(bytes),
                    },
                    OutputContent::Directory(files) => OutputState::Directory {
                        files: files
                            .iter()
                            .map(|(path, bytes)| (path.clone(), digest_bytes(bytes)))
                            .collect(),
                    },
                };
                (output.name.clone(), state)
            })
            .collect();
        Self { outputs }
    }

    pub fn get(&self, name: &str) -> Option<&OutputState> {
        self.outputs.get(name)
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Fingerprint over all output states.
    ///
    /// Any difference anywhere in any output changes it; staleness is decided
    /// for the unit as a whole.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = ContentHasher::new();
        hasher.tag(TAG_TREE).length(self.outputs.len());
        for (name, state) in &self.outputs {
            hasher.str(name);
            match state {
                OutputState::Missing => {
                    hasher.tag(TAG_MISSING);
                }
                OutputState::File { digest } => {
                    hasher.tag(TAG_CONTENT).fingerprint(digest);
                }
                OutputState::Directory { files } => {
                    hasher.tag(TAG_DIRECTORY).length(files.len());
                    for (path, digest) in files {
                        hasher.str(path).fingerprint(digest);
                    }
                }
            }
        }
        hasher.finish()
    }
}

fn capture_state(path: &Path) -> Result<OutputState> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(OutputState::Missing),
        Err(e) => return Err(Error::file_system(path, "inspect output", e)),
    };

    if metadata.is_dir() {
        let mut files = BTreeMap::new();
        for_each_file(path, |relative, file| {
            let digest = digest_file(file).map_err(|e| Error::file_system(file, "hash output", e))?;
            files.insert(relative, digest);
            Ok(())
        })?;
        Ok(OutputState::Directory { files })
    } else {
        let digest = digest_file(path).map_err(|e| Error::file_system(path, "hash output", e))?;
        Ok(OutputState::File { digest })
    }
}

/// Visit every regular file below `root`, following symlinks
fn for_each_file(
    root: &Path,
    mut visit: impl FnMut(String, &Path) -> Result<()>,
) -> Result<()> {
    for entry in WalkDir::new(root).min_depth(1).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            Error::file_system(path, "walk output directory", io::Error::from(e))
        })?;
        if entry.file_type().is_file() {
            visit(relative_path(root, entry.path()), entry.path())?;
        }
    }
    Ok(())
}

/// Read the content of every output location for storage in the cache
pub fn pack_outputs(locations: &[OutputLocation]) -> Result<Vec<StoredOutput>> {
    locations
        .iter()
        .map(|location| {
            Ok(StoredOutput {
                name: location.name.clone(),
                content: pack_location(&location.path)?,
            })
        })
        .collect()
}

fn pack_location(path: &Path) -> Result<OutputContent> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(OutputContent::Missing),
        Err(e) => return Err(Error::file_system(path, "inspect output", e)),
    };

    if metadata.is_dir() {
        let mut files = BTreeMap::new();
        for_each_file(path, |relative, file| {
            let bytes = fs::read(file).map_err(|e| Error::file_system(file, "read output", e))?;
            files.insert(relative, bytes);
            Ok(())
        })?;
        Ok(OutputContent::Directory(files))
    } else {
        let bytes = fs::read(path).map_err(|e| Error::file_system(path, "read output", e))?;
        Ok(OutputContent::File(bytes))
    }
}

/// Reject stored directory entries whose relative paths would leave the
/// output location they belong to
pub fn validate_stored_outputs(stored: &[StoredOutput]) -> Result<()> {
    for output in stored {
        let OutputContent::Directory(files) = &output.content else {
            continue;
        };
        if let Some(relative) = files.keys().find(|relative| !is_contained(relative)) {
            return Err(Error::invalid_value(
                "stored output path",
                relative.as_str(),
                format!("escapes output '{}'", output.name),
            ));
        }
    }
    Ok(())
}

fn is_contained(relative: &str) -> bool {
    relative.split('/').all(|part| {
        let mut components = Path::new(part).components();
        matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        )
    })
}

/// Replace the state of each location with the stored content of the same name
pub fn restore_outputs(locations: &[OutputLocation], stored: &[StoredOutput]) -> Result<()> {
    validate_stored_outputs(stored)?;
    for location in locations {
        let content = stored
            .iter()
            .find(|output| output.name == location.name)
            .map(|output| &output.content);

        remove_location(&location.path)?;
        match content {
            None | Some(OutputContent::Missing) => {}
            Some(OutputContent::File(bytes)) => write_atomic(&location.path, bytes)?,
            Some(OutputContent::Directory(files)) => {
                fs::create_dir_all(&location.path)
                    .map_err(|e| Error::file_system(&location.path, "create output directory", e))?;
                for (relative, bytes) in files {
                    let target = relative
                        .split('/')
                        .fold(location.path.clone(), |path, part| path.join(part));
                    write_atomic(&target, bytes)?;
                }
            }
        }
    }
    Ok(())
}

fn remove_location(path: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(Error::file_system(path, "inspect output", e)),
    };
    let removed = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    removed.map_err(|e| Error::file_system(path, "remove stale output", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn locations(dir: &TempDir) -> Vec<OutputLocation> {
        vec![
            OutputLocation::new("object", dir.path().join("out/main.o")),
            OutputLocation::new("docs", dir.path().join("out/docs")),
            OutputLocation::new("log", dir.path().join("out/build.log")),
        ]
    }

    fn populate(dir: &TempDir) {
        fs::create_dir_all(dir.path().join("out/docs/api")).unwrap();
        fs::write(dir.path().join("out/main.o"), b"\x7fELF").unwrap();
        fs::write(dir.path().join("out/docs/index.html"), b"<html/>").unwrap();
        fs::write(dir.path().join("out/docs/api/mod.html"), b"<p/>").unwrap();
    }

    #[test]
    fn test_capture_distinguishes_states() {
        let dir = TempDir::new().unwrap();
        populate(&dir);
        let snapshot = OutputSnapshot::capture(&locations(&dir)).unwrap();

        assert_eq!(snapshot.len(), 3);
        assert!(matches!(snapshot.get("object"), Some(OutputState::File { .. })));
        assert_eq!(snapshot.get("log"), Some(&OutputState::Missing));
        match snapshot.get("docs") {
            Some(OutputState::Directory { files }) => {
                assert_eq!(
                    files.keys().cloned().collect::<Vec<_>>(),
                    vec!["api/mod.html".to_string(), "index.html".to_string()]
                );
            }
            other => panic!("expected directory, got {other:?}"),
        }
    }

    #[test]
    fn test_external_modification_changes_fingerprint() {
        let dir = TempDir::new().unwrap();
        populate(&dir);
        let before = OutputSnapshot::capture(&locations(&dir)).unwrap().fingerprint();

        fs::write(dir.path().join("out/docs/api/mod.html"), b"<p>edited</p>").unwrap();
        let after = OutputSnapshot::capture(&locations(&dir)).unwrap().fingerprint();
        assert_ne!(before, after);
    }

    #[test]
    fn test_pack_matches_capture_and_restores() {
        let source = TempDir::new().unwrap();
        populate(&source);
        let packed = pack_outputs(&locations(&source)).unwrap();
        let captured = OutputSnapshot::capture(&locations(&source)).unwrap();
        assert_eq!(OutputSnapshot::from_stored(&packed), captured);

        let target = TempDir::new().unwrap();
        // Stale state that restoration must replace
        fs::create_dir_all(target.path().join("out")).unwrap();
        fs::write(target.path().join("out/build.log"), b"stale").unwrap();
        fs::write(target.path().join("out/docs"), b"not a directory").unwrap();

        restore_outputs(&locations(&target), &packed).unwrap();
        let restored = OutputSnapshot::capture(&locations(&target)).unwrap();
        assert_eq!(restored.fingerprint(), captured.fingerprint());
        assert!(!target.path().join("out/build.log").exists());
    }

    #[test]
    fn test_entries_escaping_the_location_are_rejected() {
        let dir = TempDir::new().unwrap();
        let location = OutputLocation::new("docs", dir.path().join("out/docs"));
        fs::create_dir_all(&location.path).unwrap();
        fs::write(location.path.join("index.html"), b"<html/>").unwrap();

        for relative in ["../../escaped.txt", "/etc/escaped.txt", "api//mod.html", "./index.html"] {
            let stored = vec![StoredOutput {
                name: "docs".to_string(),
                content: OutputContent::Directory(BTreeMap::from([(
                    relative.to_string(),
                    b"pwned".to_vec(),
                )])),
            }];
            assert!(validate_stored_outputs(&stored).is_err(), "{relative}");
            assert!(restore_outputs(std::slice::from_ref(&location), &stored).is_err());
        }

        assert!(!dir.path().join("escaped.txt").exists());
        // Rejected before anything was removed
        assert!(location.path.join("index.html").exists());
    }
}
