//! Core error types for the cache store

use std::path::PathBuf;
use std::time::Duration;

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Crate-wide name for `CacheError`
pub use CacheError as Error;

/// Error type for cache operations
#[derive(Debug)]
pub enum CacheError {
    /// Reading or writing an entry file failed
    Io {
        path: PathBuf,
        operation: &'static str,
        source: std::io::Error,
        recovery_hint: RecoveryHint,
    },

    /// An entry could not be encoded or decoded
    Serialization {
        key: String,
        operation: SerializationOp,
        source: Box<dyn std::error::Error + Send + Sync>,
        recovery_hint: RecoveryHint,
    },

    /// Entry bytes are not a valid entry (bad magic, truncated, wrong identity)
    Corruption {
        key: String,
        reason: String,
        recovery_hint: RecoveryHint,
    },

    /// Entry written by an incompatible format version
    VersionMismatch {
        key: String,
        expected_version: u16,
        actual_version: u16,
        recovery_hint: RecoveryHint,
    },

    /// Header or payload checksum does not match
    IntegrityFailure {
        key: String,
        expected_crc: u32,
        actual_crc: u32,
        recovery_hint: RecoveryHint,
    },

    /// zstd failed on an entry payload
    Compression {
        operation: &'static str,
        source: std::io::Error,
        recovery_hint: RecoveryHint,
    },

    /// A backend cannot serve requests at all
    StoreUnavailable {
        store_type: StoreType,
        reason: String,
        recovery_hint: RecoveryHint,
    },

    /// Configuration error
    Configuration {
        message: String,
        recovery_hint: RecoveryHint,
    },
}

/// What a caller can do about a failed cache operation
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryHint {
    /// Retry the operation
    Retry { after: Duration },

    /// Treat the entry as absent and let the next write replace it
    TreatAsMiss,

    /// Clear the cache and retry
    ClearAndRetry,

    /// Check file permissions
    CheckPermissions { path: PathBuf },

    /// Check disk space and clean up if needed
    CheckDiskSpace,

    /// No automated recovery possible
    Manual { instructions: String },

    /// Operation can be safely ignored
    Ignore,
}

/// Serialization operation types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationOp {
    Encode,
    Decode,
}

/// Backend kinds, for error reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreType {
    Memory,
    Disk,
    Remote { endpoint: String },
    Tiered,
}
