//! Provenance of execution results.

use crate::outcome::ExecutionOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Identifier of one build invocation, shared by every unit executed in it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildInvocationId(Uuid);

impl BuildInvocationId {
    /// Generate a fresh identifier for a new build
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for BuildInvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for BuildInvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BuildInvocationId({})", self.0)
    }
}

/// Records which build produced a result, how long it took and how it ended.
///
/// Persisted alongside outputs so a later run can attribute why a unit was
/// skipped or reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginMetadata {
    pub build_invocation_id: BuildInvocationId,
    pub execution_time: Duration,
    pub outcome: ExecutionOutcome,
    pub produced_at: DateTime<Utc>,
}

impl OriginMetadata {
    /// Metadata for a result produced by the current build
    #[must_use]
    pub fn from_current_build(
        build_invocation_id: BuildInvocationId,
        execution_time: Duration,
        outcome: ExecutionOutcome,
    ) -> Self {
        Self {
            build_invocation_id,
            execution_time,
            outcome,
            produced_at: Utc::now(),
        }
    }

    /// Whether this metadata was produced by the given build
    #[must_use]
    pub fn is_from_build(&self, build: &BuildInvocationId) -> bool {
        &self.build_invocation_id == build
    }

    #[must_use]
    pub fn execution_time_ms(&self) -> u64 {
        u64::try_from(self.execution_time.as_millis()).unwrap_or(u64::MAX)
    }
}
