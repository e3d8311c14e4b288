//! Cache entries: what the store keeps per identity

use kiln_core::{Fingerprint, Identity, OriginMetadata};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A stored execution result, keyed by identity.
///
/// Entries are created on the first successful execution of an identity and
/// are read, never mutated, on later hits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub identity: Identity,
    pub origin: OriginMetadata,
    /// Fingerprint of the output snapshot taken after execution
    pub output_fingerprint: Fingerprint,
    pub outputs: Vec<StoredOutput>,
}

/// Content of one declared output location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredOutput {
    pub name: String,
    pub content: OutputContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputContent {
    /// The location did not exist after execution
    Missing,
    File(Vec<u8>),
    /// Files below a directory, keyed by `/`-separated relative path
    Directory(BTreeMap<String, Vec<u8>>),
}

impl OutputContent {
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        match self {
            OutputContent::Missing => 0,
            OutputContent::File(bytes) => bytes.len() as u64,
            OutputContent::Directory(files) => files
                .iter()
                .map(|(path, bytes)| (path.len() + bytes.len()) as u64)
                .sum(),
        }
    }
}

impl CacheEntry {
    /// Approximate payload size, reported to eviction policies
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        self.outputs
            .iter()
            .map(|output| output.name.len() as u64 + output.content.size_bytes())
            .sum()
    }

    /// Whether two entries describe the same output state
    #[must_use]
    pub fn same_outputs_as(&self, other: &CacheEntry) -> bool {
        self.output_fingerprint == other.output_fingerprint
    }

    /// Look up stored content by output name
    #[must_use]
    pub fn output(&self, name: &str) -> Option<&OutputContent> {
        self.outputs
            .iter()
            .find(|output| output.name == name)
            .map(|output| &output.content)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use kiln_core::{BuildInvocationId, ExecutionOutcome};
    use std::time::Duration;

    pub fn identity(seed: u8) -> Identity {
        Identity::from_fingerprint(Fingerprint::from_bytes([seed; 32]))
    }

    pub fn entry(seed: u8, output: &[u8]) -> CacheEntry {
        CacheEntry {
            identity: identity(seed),
            origin: OriginMetadata::from_current_build(
                BuildInvocationId::generate(),
                Duration::from_millis(25),
                ExecutionOutcome::Executed,
            ),
            output_fingerprint: Fingerprint::from_bytes([output.first().copied().unwrap_or(0); 32]),
            outputs: vec![StoredOutput {
                name: "out".to_string(),
                content: OutputContent::File(output.to_vec()),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::entry;
    use super::*;

    #[test]
    fn test_size_accounts_for_all_outputs() {
        let mut e = entry(1, b"hello");
        let mut files = BTreeMap::new();
        files.insert("a/b.txt".to_string(), vec![0u8; 10]);
        e.outputs.push(StoredOutput {
            name: "dir".to_string(),
            content: OutputContent::Directory(files),
        });
        // "out" + 5 bytes, "dir" + "a/b.txt" + 10 bytes
        assert_eq!(e.size_bytes(), 3 + 5 + 3 + 7 + 10);
        assert!(e.output("dir").is_some());
        assert!(e.output("nope").is_none());
    }

    #[test]
    fn test_same_outputs_compares_fingerprints() {
        let a = entry(1, b"x");
        let b = entry(1, b"x");
        let c = entry(1, b"y");
        assert!(a.same_outputs_as(&b));
        assert!(!a.same_outputs_as(&c));
    }
}
