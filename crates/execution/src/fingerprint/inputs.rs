//! Declared input values and their fingerprints

use super::hasher::{
    digest_reader, ContentHasher, TAG_BOOL, TAG_CONTENT, TAG_DIRECTORY, TAG_INT, TAG_MAP,
    TAG_ORDERED_LIST, TAG_STR, TAG_SYMLINK, TAG_TREE, TAG_UNORDERED_LIST,
};
use indexmap::IndexMap;
use kiln_core::{Error, Fingerprint, Result};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Inputs in declaration order; the fingerprint does not depend on that order
pub type InputSet = IndexMap<String, InputValue>;

/// One declared input: an inline value or a reference to content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputValue {
    Str(String),
    Int(i64),
    Bool(bool),
    /// In-memory content; fingerprints like a file with the same bytes
    Bytes(Vec<u8>),
    File(PathBuf),
    /// Every entry below a directory, normalized by relative path
    Tree(PathBuf),
    /// A sequence; `ordered` lists are order-sensitive, others are not
    List { items: Vec<InputValue>, ordered: bool },
}

impl InputValue {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        InputValue::File(path.into())
    }

    pub fn tree(path: impl Into<PathBuf>) -> Self {
        InputValue::Tree(path.into())
    }

    /// An order-sensitive list such as command-line arguments
    pub fn ordered<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<InputValue>,
    {
        InputValue::List {
            items: items.into_iter().map(Into::into).collect(),
            ordered: true,
        }
    }

    /// A list whose element order carries no meaning
    pub fn unordered<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<InputValue>,
    {
        InputValue::List {
            items: items.into_iter().map(Into::into).collect(),
            ordered: false,
        }
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        InputValue::Str(value.to_string())
    }
}

impl From<String> for InputValue {
    fn from(value: String) -> Self {
        InputValue::Str(value)
    }
}

impl From<i64> for InputValue {
    fn from(value: i64) -> Self {
        InputValue::Int(value)
    }
}

impl From<bool> for InputValue {
    fn from(value: bool) -> Self {
        InputValue::Bool(value)
    }
}

impl From<Vec<u8>> for InputValue {
    fn from(value: Vec<u8>) -> Self {
        InputValue::Bytes(value)
    }
}

/// Fingerprint a declared input set.
///
/// Keys are canonicalized by sorting, so two sets with the same entries in a
/// different declaration order fingerprint identically. Any input that cannot
/// be read fails the whole computation with `Error::UnreadableInput`.
pub fn fingerprint_inputs(inputs: &InputSet) -> Result<Fingerprint> {
    let mut entries: Vec<(&String, &InputValue)> = inputs.iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut hasher = ContentHasher::new();
    hasher.tag(TAG_MAP).length(entries.len());
    for (name, value) in entries {
        let value_fingerprint = fingerprint_value(name, value)?;
        hasher.str(name).fingerprint(&value_fingerprint);
    }
    Ok(hasher.finish())
}

/// Fingerprint a single value; `input` names it in errors
pub fn fingerprint_value(input: &str, value: &InputValue) -> Result<Fingerprint> {
    let mut hasher = ContentHasher::new();
    match value {
        InputValue::Str(s) => {
            hasher.tag(TAG_STR).str(s);
        }
        InputValue::Int(i) => {
            hasher.tag(TAG_INT).i64(*i);
        }
        InputValue::Bool(b) => {
            hasher.tag(TAG_BOOL).i64(i64::from(*b));
        }
        InputValue::Bytes(bytes) => {
            hasher
                .tag(TAG_CONTENT)
                .fingerprint(&super::hasher::digest_bytes(bytes));
        }
        InputValue::File(path) => {
            let digest = digest_file(path).map_err(|e| Error::unreadable_input(input, path, e))?;
            hasher.tag(TAG_CONTENT).fingerprint(&digest);
        }
        InputValue::Tree(root) => {
            let entries = read_tree(root).map_err(|(path, e)| Error::unreadable_input(input, path, e))?;
            hasher.tag(TAG_TREE).length(entries.len());
            for (relative, entry) in &entries {
                hasher.str(relative);
                match entry {
                    TreeEntry::Directory => {
                        hasher.tag(TAG_DIRECTORY);
                    }
                    TreeEntry::File(digest) => {
                        hasher.tag(TAG_CONTENT).fingerprint(digest);
                    }
                    TreeEntry::Symlink(target) => {
                        hasher.tag(TAG_SYMLINK).str(target);
                    }
                }
            }
        }
        InputValue::List { items, ordered } => {
            let mut fingerprints = items
                .iter()
                .map(|item| fingerprint_value(input, item))
                .collect::<Result<Vec<_>>>()?;
            if *ordered {
                hasher.tag(TAG_ORDERED_LIST);
            } else {
                fingerprints.sort();
                hasher.tag(TAG_UNORDERED_LIST);
            }
            hasher.length(fingerprints.len());
            for fingerprint in &fingerprints {
                hasher.fingerprint(fingerprint);
            }
        }
    }
    Ok(hasher.finish())
}

pub(crate) fn digest_file(path: &Path) -> io::Result<Fingerprint> {
    digest_reader(File::open(path)?)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TreeEntry {
    Directory,
    File(Fingerprint),
    Symlink(String),
}

/// Walk a directory tree into entries keyed by `/`-separated relative path
fn read_tree(root: &Path) -> std::result::Result<BTreeMap<String, TreeEntry>, (PathBuf, io::Error)> {
    let metadata = fs::metadata(root).map_err(|e| (root.to_path_buf(), e))?;
    if !metadata.is_dir() {
        return Err((
            root.to_path_buf(),
            io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }

    let mut entries = BTreeMap::new();
    for entry in WalkDir::new(root).min_depth(1).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            (path, io::Error::from(e))
        })?;
        let path = entry.path();
        let relative = relative_path(root, path);
        let file_type = entry.file_type();

        let tree_entry = if file_type.is_dir() {
            TreeEntry::Directory
        } else if file_type.is_symlink() {
            let target = fs::read_link(path).map_err(|e| (path.to_path_buf(), e))?;
            TreeEntry::Symlink(target.to_string_lossy().replace('\\', "/"))
        } else {
            TreeEntry::File(digest_file(path).map_err(|e| (path.to_path_buf(), e))?)
        };
        entries.insert(relative, tree_entry);
    }
    Ok(entries)
}

/// Relative path with `/` separators regardless of platform
pub(crate) fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn set(entries: Vec<(&str, InputValue)>) -> InputSet {
        entries
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }

    #[test]
    fn test_declaration_order_is_irrelevant() {
        let a = set(vec![("src", "int x=1;".into()), ("opt", 2i64.into())]);
        let b = set(vec![("opt", 2i64.into()), ("src", "int x=1;".into())]);
        assert_eq!(fingerprint_inputs(&a).unwrap(), fingerprint_inputs(&b).unwrap());
    }

    #[test]
    fn test_ordered_lists_are_order_sensitive() {
        let forward = set(vec![("args", InputValue::ordered(["-O2", "-g"]))]);
        let reversed = set(vec![("args", InputValue::ordered(["-g", "-O2"]))]);
        assert_ne!(
            fingerprint_inputs(&forward).unwrap(),
            fingerprint_inputs(&reversed).unwrap()
        );

        let forward = set(vec![("flags", InputValue::unordered(["-O2", "-g"]))]);
        let reversed = set(vec![("flags", InputValue::unordered(["-g", "-O2"]))]);
        assert_eq!(
            fingerprint_inputs(&forward).unwrap(),
            fingerprint_inputs(&reversed).unwrap()
        );
    }

    #[test]
    fn test_scalar_types_do_not_collide() {
        let as_str = set(vec![("v", "1".into())]);
        let as_int = set(vec![("v", 1i64.into())]);
        let as_bool = set(vec![("v", true.into())]);
        let a = fingerprint_inputs(&as_str).unwrap();
        let b = fingerprint_inputs(&as_int).unwrap();
        let c = fingerprint_inputs(&as_bool).unwrap();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn test_file_and_bytes_fingerprint_identically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.c");
        fs::write(&path, b"int x=1;").unwrap();

        assert_eq!(
            fingerprint_value("src", &InputValue::file(&path)).unwrap(),
            fingerprint_value("src", &InputValue::Bytes(b"int x=1;".to_vec())).unwrap()
        );
    }

    #[test]
    fn test_tree_depends_on_content_and_layout() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("a/b/one.txt"), b"1").unwrap();
        fs::write(dir.path().join("two.txt"), b"2").unwrap();

        let tree = InputValue::tree(dir.path());
        let first = fingerprint_value("srcs", &tree).unwrap();
        assert_eq!(first, fingerprint_value("srcs", &tree).unwrap());

        fs::write(dir.path().join("a/b/one.txt"), b"changed").unwrap();
        let changed = fingerprint_value("srcs", &tree).unwrap();
        assert_ne!(first, changed);

        fs::rename(dir.path().join("two.txt"), dir.path().join("a/two.txt")).unwrap();
        assert_ne!(changed, fingerprint_value("srcs", &tree).unwrap());
    }

    #[test]
    fn test_missing_inputs_are_unreadable() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.c");

        let err = fingerprint_inputs(&set(vec![("src", InputValue::file(&missing))])).unwrap_err();
        assert!(err.is_unreadable_input());
        assert!(err.to_string().contains("'src'"));

        let err = fingerprint_inputs(&set(vec![("srcs", InputValue::tree(&missing))])).unwrap_err();
        assert!(err.is_unreadable_input());
    }

    #[test]
    fn test_nested_unreadable_input_propagates() {
        let dir = TempDir::new().unwrap();
        let value = InputValue::unordered(vec![
            InputValue::from("ok"),
            InputValue::file(dir.path().join("missing")),
        ]);
        assert!(fingerprint_value("deps", &value).unwrap_err().is_unreadable_input());
    }
}
