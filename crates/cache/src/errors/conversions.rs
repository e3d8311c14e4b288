//! Error conversion utilities

use super::types::{CacheError, RecoveryHint, SerializationOp};
use std::path::PathBuf;

impl From<std::io::Error> for CacheError {
    fn from(error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        let recovery_hint = match error.kind() {
            ErrorKind::PermissionDenied => RecoveryHint::CheckPermissions {
                path: PathBuf::from("."),
            },
            ErrorKind::NotFound => RecoveryHint::TreatAsMiss,
            ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => {
                RecoveryHint::Retry {
                    after: std::time::Duration::from_millis(100),
                }
            }
            _ => RecoveryHint::CheckDiskSpace,
        };

        Self::Io {
            path: PathBuf::from("."),
            operation: "unknown",
            source: error,
            recovery_hint,
        }
    }
}

impl From<bincode::Error> for CacheError {
    fn from(error: bincode::Error) -> Self {
        Self::Serialization {
            key: String::new(),
            operation: SerializationOp::Decode,
            source: error,
            recovery_hint: RecoveryHint::TreatAsMiss,
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization {
            key: String::new(),
            operation: SerializationOp::Decode,
            source: Box::new(error),
            recovery_hint: RecoveryHint::Manual {
                instructions: "Check JSON format and data types".to_string(),
            },
        }
    }
}

/// Surface cache failures through the core error type
impl From<CacheError> for kiln_core::Error {
    fn from(error: CacheError) -> Self {
        kiln_core::Error::Configuration {
            message: error.to_string(),
        }
    }
}

impl From<kiln_core::Error> for CacheError {
    fn from(error: kiln_core::Error) -> Self {
        match error {
            kiln_core::Error::FileSystem {
                path,
                operation: _,
                source,
            } => Self::Io {
                recovery_hint: RecoveryHint::CheckPermissions { path: path.clone() },
                path,
                operation: "write cache file",
                source,
            },
            other => Self::Configuration {
                message: other.to_string(),
                recovery_hint: RecoveryHint::Manual {
                    instructions: "Check the cache directory configuration".to_string(),
                },
            },
        }
    }
}
