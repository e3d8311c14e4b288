//! Recovery utilities for cache errors

use super::types::{CacheError, RecoveryHint};

impl CacheError {
    /// Get the recovery hint for this error
    #[must_use]
    pub const fn recovery_hint(&self) -> &RecoveryHint {
        match self {
            Self::Io { recovery_hint, .. }
            | Self::Serialization { recovery_hint, .. }
            | Self::Corruption { recovery_hint, .. }
            | Self::VersionMismatch { recovery_hint, .. }
            | Self::IntegrityFailure { recovery_hint, .. }
            | Self::Compression { recovery_hint, .. }
            | Self::StoreUnavailable { recovery_hint, .. }
            | Self::Configuration { recovery_hint, .. } => recovery_hint,
        }
    }

    /// Check if this error is transient and can be retried
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.recovery_hint(), RecoveryHint::Retry { .. })
    }

    /// Check if this error indicates an unreadable or stale entry
    ///
    /// Such entries are reported as misses; a fresh write replaces them.
    #[must_use]
    pub const fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::Corruption { .. } | Self::IntegrityFailure { .. } | Self::VersionMismatch { .. }
        ) || matches!(self.recovery_hint(), RecoveryHint::TreatAsMiss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_version_mismatch_is_corruption() {
        let err = CacheError::VersionMismatch {
            key: "abc".to_string(),
            expected_version: 1,
            actual_version: 7,
            recovery_hint: RecoveryHint::TreatAsMiss,
        };
        assert!(err.is_corruption());
        assert!(!err.is_transient());
        assert!(err.to_string().contains("expected v1, found v7"));
    }

    #[test]
    fn test_retry_hint_is_transient() {
        let err = CacheError::from(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "slow disk",
        ));
        assert!(err.is_transient());
        assert_eq!(
            err.recovery_hint(),
            &RecoveryHint::Retry {
                after: Duration::from_millis(100)
            }
        );
    }
}
