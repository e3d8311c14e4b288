//! Framed SHA-256 hashing
//!
//! Every value fed to a `ContentHasher` is preceded by a one-byte tag and,
//! for variable-length data, a little-endian length, so no two distinct
//! sequences of values can produce the same byte stream.

use kiln_core::{Fingerprint, FINGERPRINT_LEN};
use sha2::{Digest, Sha256};
use std::io::{self, Read};

pub(crate) const TAG_STR: u8 = 0x01;
pub(crate) const TAG_INT: u8 = 0x02;
pub(crate) const TAG_BOOL: u8 = 0x03;
pub(crate) const TAG_CONTENT: u8 = 0x04;
pub(crate) const TAG_TREE: u8 = 0x05;
pub(crate) const TAG_ORDERED_LIST: u8 = 0x06;
pub(crate) const TAG_UNORDERED_LIST: u8 = 0x07;
pub(crate) const TAG_MAP: u8 = 0x08;
pub(crate) const TAG_DIRECTORY: u8 = 0x09;
pub(crate) const TAG_SYMLINK: u8 = 0x0A;
pub(crate) const TAG_MISSING: u8 = 0x0B;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Incremental hasher producing a `Fingerprint`
#[derive(Clone, Default)]
pub struct ContentHasher {
    inner: Sha256,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(&mut self, tag: u8) -> &mut Self {
        self.inner.update([tag]);
        self
    }

    /// Length-prefixed raw bytes
    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.length(bytes.len());
        self.inner.update(bytes);
        self
    }

    pub fn str(&mut self, value: &str) -> &mut Self {
        self.bytes(value.as_bytes())
    }

    pub fn length(&mut self, len: usize) -> &mut Self {
        self.inner.update((len as u64).to_le_bytes());
        self
    }

    pub fn i64(&mut self, value: i64) -> &mut Self {
        self.inner.update(value.to_le_bytes());
        self
    }

    pub fn fingerprint(&mut self, fingerprint: &Fingerprint) -> &mut Self {
        self.inner.update(fingerprint.as_bytes());
        self
    }

    pub fn finish(self) -> Fingerprint {
        let digest = self.inner.finalize();
        let mut bytes = [0u8; FINGERPRINT_LEN];
        bytes.copy_from_slice(&digest);
        Fingerprint::from_bytes(bytes)
    }
}

/// Plain SHA-256 of a byte slice
pub fn digest_bytes(bytes: &[u8]) -> Fingerprint {
    let mut hasher = ContentHasher::new();
    hasher.inner.update(bytes);
    hasher.finish()
}

/// Plain SHA-256 of everything a reader yields; equals `digest_bytes` of the same data
pub fn digest_reader(mut reader: impl Read) -> io::Result<Fingerprint> {
    let mut hasher = ContentHasher::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.inner.update(&buffer[..read]);
    }
    Ok(hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_and_slice_agree() {
        let data = vec![7u8; READ_BUFFER_SIZE * 2 + 13];
        assert_eq!(digest_reader(&data[..]).unwrap(), digest_bytes(&data));
    }

    #[test]
    fn test_framing_separates_adjacent_values() {
        let mut a = ContentHasher::new();
        a.str("ab").str("c");
        let mut b = ContentHasher::new();
        b.str("a").str("bc");
        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            digest_bytes(b"").to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
