use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal classification of a single pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionOutcome {
    /// Previous outputs are still valid; nothing ran
    UpToDate,
    /// Outputs were taken from the cache
    FromCache,
    /// The unit's execution function ran
    Executed,
    /// The run failed; see the attached failure
    Failed,
}

impl ExecutionOutcome {
    /// Whether the unit's work was skipped
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::UpToDate | Self::FromCache)
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UpToDate => "UP_TO_DATE",
            Self::FromCache => "FROM_CACHE",
            Self::Executed => "EXECUTED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for ExecutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
