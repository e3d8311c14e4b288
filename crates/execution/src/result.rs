//! Results of a pipeline invocation and their assembly

use kiln_core::{
    BuildInvocationId, ExecutionOutcome, Fingerprint, Identity, OriginMetadata,
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Where cancellation was observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationPhase {
    BeforeExecution,
    AfterExecution,
}

impl fmt::Display for CancellationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancellationPhase::BeforeExecution => write!(f, "before execution"),
            CancellationPhase::AfterExecution => write!(f, "after execution"),
        }
    }
}

/// Why a unit did not complete cleanly
#[derive(Debug, thiserror::Error)]
pub enum ExecutionFailure {
    /// A declared input could not be read, so no identity exists
    #[error("{work}: cannot compute identity: {source}")]
    UnreadableInput {
        work: String,
        #[source]
        source: kiln_core::Error,
    },

    /// The unit's execution function returned an error or panicked
    #[error("{work} failed: {source:#}")]
    Execution {
        work: String,
        #[source]
        source: anyhow::Error,
    },

    /// Outputs could not be read back after execution
    #[error("{work}: cannot snapshot outputs: {source}")]
    OutputSnapshot {
        work: String,
        #[source]
        source: kiln_core::Error,
    },

    /// The build was cancelled
    #[error("{work}: cancelled {phase}")]
    Cancelled {
        work: String,
        phase: CancellationPhase,
    },
}

impl ExecutionFailure {
    /// Distinguishes "the build stopped" from "this unit is broken"
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ExecutionFailure::Cancelled { .. })
    }

    pub fn work(&self) -> &str {
        match self {
            ExecutionFailure::UnreadableInput { work, .. }
            | ExecutionFailure::Execution { work, .. }
            | ExecutionFailure::OutputSnapshot { work, .. }
            | ExecutionFailure::Cancelled { work, .. } => work,
        }
    }
}

/// Outputs of an identity differ between two executions.
///
/// Equal identities must be interchangeable, so this means the unit's
/// inputs are insufficiently declared.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "{work} is non-deterministic: identity {identity} produced outputs {previous_fingerprint} \
     before and {current_fingerprint} now"
)]
pub struct NonDeterminismWarning {
    pub work: String,
    pub identity: Identity,
    pub previous_fingerprint: Fingerprint,
    pub current_fingerprint: Fingerprint,
    /// The execution that produced the replaced entry
    pub previous_origin: OriginMetadata,
}

/// Outcome of one `execute_unit` call. Immutable once returned.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub outcome: ExecutionOutcome,
    pub origin: OriginMetadata,
    pub failure: Option<Arc<ExecutionFailure>>,
    /// Set whenever the build was stopped, even when `failure` reports
    /// the unit's own error
    pub cancellation: Option<CancellationPhase>,
    pub warnings: Vec<NonDeterminismWarning>,
}

impl ExecutionResult {
    /// Skipped because a previous execution still holds; `origin` is that execution's
    pub fn up_to_date(origin: OriginMetadata) -> Self {
        Self::assemble(ExecutionOutcome::UpToDate, origin, None)
    }

    /// Outputs were restored from the cache entry produced by `origin`
    pub fn from_cache(origin: OriginMetadata) -> Self {
        Self::assemble(ExecutionOutcome::FromCache, origin, None)
    }

    pub fn executed(origin: OriginMetadata) -> Self {
        Self::assemble(ExecutionOutcome::Executed, origin, None)
    }

    /// A failure that stopped the unit in this build
    pub fn failed(build: BuildInvocationId, duration: Duration, failure: ExecutionFailure) -> Self {
        let origin = OriginMetadata::from_current_build(build, duration, ExecutionOutcome::Failed);
        Self::assemble(ExecutionOutcome::Failed, origin, Some(failure))
    }

    /// Attach a failure while keeping the outcome, as for cancellation
    /// observed after the execution function completed.
    pub fn with_failure(mut self, failure: ExecutionFailure) -> Self {
        if let ExecutionFailure::Cancelled { phase, .. } = &failure {
            self.cancellation = Some(*phase);
        }
        self.failure = Some(Arc::new(failure));
        self
    }

    /// Mark the build as stopped without replacing the reported failure
    pub fn with_cancellation(mut self, phase: CancellationPhase) -> Self {
        self.cancellation = Some(phase);
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<NonDeterminismWarning>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    fn assemble(
        outcome: ExecutionOutcome,
        origin: OriginMetadata,
        failure: Option<ExecutionFailure>,
    ) -> Self {
        let cancellation = match &failure {
            Some(ExecutionFailure::Cancelled { phase, .. }) => Some(*phase),
            _ => None,
        };
        Self {
            outcome,
            origin,
            failure: failure.map(Arc::new),
            cancellation,
            warnings: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_some()
    }

    pub fn failure(&self) -> Option<&ExecutionFailure> {
        self.failure.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_result_carries_origin_and_failure() {
        let build = BuildInvocationId::generate();
        let result = ExecutionResult::failed(
            build,
            Duration::from_millis(5),
            ExecutionFailure::Execution {
                work: "compile".to_string(),
                source: anyhow::anyhow!("exit status 1"),
            },
        );
        assert_eq!(result.outcome, ExecutionOutcome::Failed);
        assert_eq!(result.origin.outcome, ExecutionOutcome::Failed);
        assert!(result.origin.is_from_build(&build));
        assert!(!result.is_success());
        assert!(!result.is_cancelled());
        assert_eq!(result.failure().map(ExecutionFailure::work), Some("compile"));
    }

    #[test]
    fn test_cancellation_keeps_outcome() {
        let origin = OriginMetadata::from_current_build(
            BuildInvocationId::generate(),
            Duration::from_millis(5),
            ExecutionOutcome::Executed,
        );
        let result = ExecutionResult::executed(origin).with_failure(ExecutionFailure::Cancelled {
            work: "compile".to_string(),
            phase: CancellationPhase::AfterExecution,
        });
        assert_eq!(result.outcome, ExecutionOutcome::Executed);
        assert!(result.is_cancelled());
        assert_eq!(
            result.failure().map(ToString::to_string).as_deref(),
            Some("compile: cancelled after execution")
        );
    }

    #[test]
    fn test_clones_share_the_failure() {
        let result = ExecutionResult::failed(
            BuildInvocationId::generate(),
            Duration::ZERO,
            ExecutionFailure::Cancelled {
                work: "gen".to_string(),
                phase: CancellationPhase::BeforeExecution,
            },
        );
        let clone = result.clone();
        assert!(Arc::ptr_eq(
            result.failure.as_ref().unwrap(),
            clone.failure.as_ref().unwrap()
        ));
    }

    #[test]
    fn test_cancellation_does_not_hide_the_unit_error() {
        let result = ExecutionResult::failed(
            BuildInvocationId::generate(),
            Duration::ZERO,
            ExecutionFailure::Execution {
                work: "compile".to_string(),
                source: anyhow::anyhow!("exit status 1"),
            },
        )
        .with_cancellation(CancellationPhase::AfterExecution);

        assert!(result.is_cancelled());
        assert_eq!(result.cancellation, Some(CancellationPhase::AfterExecution));
        assert!(matches!(
            result.failure(),
            Some(ExecutionFailure::Execution { .. })
        ));
    }
}
