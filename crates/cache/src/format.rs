//! On-disk entry format
//!
//! Every entry file starts with a fixed header carrying a magic number, the
//! format version and CRC32C checksums. Entries written by any other format
//! version are rejected with `VersionMismatch` instead of being misread.

use crate::entry::CacheEntry;
use crate::errors::{CacheError, RecoveryHint, Result, SerializationOp};
use crc32c::crc32c;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Magic number for entry files: "KILN"
pub const CACHE_MAGIC: u32 = 0x4B49_4C4E;

/// Current storage format version
pub const STORAGE_VERSION: u16 = 1;

/// Default zstd compression level (3 = fast with good compression)
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Payloads smaller than this are stored uncompressed
pub const DEFAULT_COMPRESSION_THRESHOLD: usize = 4 * 1024;

/// Encoded header length (bincode fixed-int encoding of `StorageHeader`)
pub const HEADER_LEN: usize = 56;

/// Binary storage header for entry files
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[repr(C)]
pub struct StorageHeader {
    magic: u32,
    version: u16,
    /// bit 0: compressed
    flags: u16,
    /// CRC32C of the header with this field zeroed
    header_crc: u32,
    /// Seconds since the epoch when written
    timestamp: u64,
    uncompressed_size: u64,
    compressed_size: u64,
    /// CRC32C of the stored payload
    pub data_crc: u32,
    reserved: [u8; 16],
}

impl StorageHeader {
    const FLAG_COMPRESSED: u16 = 1 << 0;

    pub fn new(uncompressed_size: u64, compressed_size: u64, data_crc: u32, compressed: bool) -> Self {
        let mut header = Self {
            magic: CACHE_MAGIC,
            version: STORAGE_VERSION,
            flags: if compressed { Self::FLAG_COMPRESSED } else { 0 },
            header_crc: 0,
            timestamp: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            uncompressed_size,
            compressed_size,
            data_crc,
            reserved: [0u8; 16],
        };

        header.header_crc = header.calculate_crc();
        header
    }

    fn calculate_crc(&self) -> u32 {
        let mut temp = *self;
        temp.header_crc = 0;

        match bincode::serialize(&temp) {
            Ok(bytes) => crc32c(&bytes),
            Err(_) => 0,
        }
    }

    pub fn validate(&self, key: &str) -> Result<()> {
        if self.magic != CACHE_MAGIC {
            return Err(CacheError::Corruption {
                key: key.to_string(),
                reason: format!(
                    "Invalid magic number: expected {:08x}, got {:08x}",
                    CACHE_MAGIC, self.magic
                ),
                recovery_hint: RecoveryHint::TreatAsMiss,
            });
        }

        if self.version != STORAGE_VERSION {
            return Err(version_mismatch(key, self.version));
        }

        let expected_crc = self.calculate_crc();
        if self.header_crc != expected_crc {
            return Err(CacheError::IntegrityFailure {
                key: key.to_string(),
                expected_crc,
                actual_crc: self.header_crc,
                recovery_hint: RecoveryHint::TreatAsMiss,
            });
        }

        Ok(())
    }

    pub fn is_compressed(&self) -> bool {
        self.flags & Self::FLAG_COMPRESSED != 0
    }
}

fn version_mismatch(key: &str, actual_version: u16) -> CacheError {
    CacheError::VersionMismatch {
        key: key.to_string(),
        expected_version: STORAGE_VERSION,
        actual_version,
        recovery_hint: RecoveryHint::TreatAsMiss,
    }
}

/// Encoding options for entry files
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    pub compression_level: i32,
    pub compression_threshold: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            compression_threshold: DEFAULT_COMPRESSION_THRESHOLD,
        }
    }
}

/// Encode an entry into its on-disk representation
pub fn encode_entry(entry: &CacheEntry, options: EncodeOptions) -> Result<Vec<u8>> {
    let key = entry.identity.to_hex();
    let payload = bincode::serialize(entry).map_err(|e| CacheError::Serialization {
        key: key.clone(),
        operation: SerializationOp::Encode,
        source: e,
        recovery_hint: RecoveryHint::Manual {
            instructions: "Entry contents could not be serialized".to_string(),
        },
    })?;

    let compressed = payload.len() >= options.compression_threshold;
    let stored = if compressed {
        zstd::encode_all(payload.as_slice(), options.compression_level).map_err(|e| {
            CacheError::Compression {
                operation: "compress entry payload",
                source: e,
                recovery_hint: RecoveryHint::Ignore,
            }
        })?
    } else {
        payload.clone()
    };

    let header = StorageHeader::new(
        payload.len() as u64,
        stored.len() as u64,
        crc32c(&stored),
        compressed,
    );

    let mut bytes = bincode::serialize(&header).map_err(|e| CacheError::Serialization {
        key,
        operation: SerializationOp::Encode,
        source: e,
        recovery_hint: RecoveryHint::Ignore,
    })?;
    debug_assert_eq!(bytes.len(), HEADER_LEN);
    bytes.extend_from_slice(&stored);
    Ok(bytes)
}

/// Decode an entry file, validating version and checksums
pub fn decode_entry(key: &str, bytes: &[u8]) -> Result<CacheEntry> {
    if bytes.len() < HEADER_LEN {
        return Err(CacheError::Corruption {
            key: key.to_string(),
            reason: format!("Entry truncated: {} bytes", bytes.len()),
            recovery_hint: RecoveryHint::TreatAsMiss,
        });
    }

    // Magic and version are read raw so later header layouts are still recognised
    let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if magic == CACHE_MAGIC && version != STORAGE_VERSION {
        return Err(version_mismatch(key, version));
    }

    let header: StorageHeader = bincode::deserialize(&bytes[..HEADER_LEN])?;
    header.validate(key)?;

    let stored = &bytes[HEADER_LEN..];
    if stored.len() as u64 != header.compressed_size {
        return Err(CacheError::Corruption {
            key: key.to_string(),
            reason: format!(
                "Payload size mismatch: header says {}, found {}",
                header.compressed_size,
                stored.len()
            ),
            recovery_hint: RecoveryHint::TreatAsMiss,
        });
    }

    let actual_crc = crc32c(stored);
    if actual_crc != header.data_crc {
        return Err(CacheError::IntegrityFailure {
            key: key.to_string(),
            expected_crc: header.data_crc,
            actual_crc,
            recovery_hint: RecoveryHint::TreatAsMiss,
        });
    }

    let payload = if header.is_compressed() {
        zstd::decode_all(stored).map_err(|e| CacheError::Compression {
            operation: "decompress entry payload",
            source: e,
            recovery_hint: RecoveryHint::TreatAsMiss,
        })?
    } else {
        stored.to_vec()
    };

    bincode::deserialize(&payload).map_err(|e| CacheError::Serialization {
        key: key.to_string(),
        operation: SerializationOp::Decode,
        source: e,
        recovery_hint: RecoveryHint::TreatAsMiss,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::fixtures::entry;

    #[test]
    fn test_header_has_fixed_length() {
        let header = StorageHeader::new(10, 10, 0, false);
        assert_eq!(bincode::serialize(&header).unwrap().len(), HEADER_LEN);
        assert!(header.validate("k").is_ok());
    }

    #[test]
    fn test_large_payloads_are_compressed() {
        let e = entry(3, &vec![7u8; 64 * 1024]);
        let bytes = encode_entry(&e, EncodeOptions::default()).unwrap();
        assert!(bytes.len() < 64 * 1024);
        let header: StorageHeader = bincode::deserialize(&bytes[..HEADER_LEN]).unwrap();
        assert!(header.is_compressed());
        assert_eq!(decode_entry("k", &bytes).unwrap(), e);
    }

    #[test]
    fn test_other_versions_are_rejected() {
        let e = entry(3, b"small");
        let mut bytes = encode_entry(&e, EncodeOptions::default()).unwrap();
        bytes[4..6].copy_from_slice(&(STORAGE_VERSION + 1).to_le_bytes());

        let err = decode_entry("k", &bytes).unwrap_err();
        assert!(matches!(
            err,
            CacheError::VersionMismatch { actual_version, .. } if actual_version == STORAGE_VERSION + 1
        ));
    }

    #[test]
    fn test_flipped_payload_byte_fails_integrity() {
        let e = entry(3, b"some output bytes");
        let mut bytes = encode_entry(&e, EncodeOptions::default()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;

        let err = decode_entry("k", &bytes).unwrap_err();
        assert!(matches!(err, CacheError::IntegrityFailure { .. }));
        assert!(err.is_corruption());
    }

    #[test]
    fn test_truncated_and_foreign_files() {
        assert!(matches!(
            decode_entry("k", &[1, 2, 3]),
            Err(CacheError::Corruption { .. })
        ));
        let garbage = vec![0u8; HEADER_LEN + 4];
        assert!(decode_entry("k", &garbage).unwrap_err().is_corruption());
    }
}
