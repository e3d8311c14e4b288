//! Up-to-date oracle

use crate::history::PreviousExecution;
use kiln_core::{Fingerprint, Identity};

/// Result of comparing current state against the previous execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpToDateCheck {
    UpToDate,
    NoHistory,
    IdentityChanged,
    PreviousFailed,
    OutputsModified,
}

impl UpToDateCheck {
    pub fn is_up_to_date(&self) -> bool {
        matches!(self, UpToDateCheck::UpToDate)
    }

    /// Short reason used in logs
    pub fn reason(&self) -> &'static str {
        match self {
            UpToDateCheck::UpToDate => "up to date",
            UpToDateCheck::NoHistory => "no previous execution",
            UpToDateCheck::IdentityChanged => "inputs changed",
            UpToDateCheck::PreviousFailed => "previous execution failed",
            UpToDateCheck::OutputsModified => "outputs modified since last execution",
        }
    }
}

pub fn check(
    identity: &Identity,
    previous: Option<&PreviousExecution>,
    current_output_fingerprint: &Fingerprint,
) -> UpToDateCheck {
    let Some(previous) = previous else {
        return UpToDateCheck::NoHistory;
    };
    if previous.identity != *identity {
        UpToDateCheck::IdentityChanged
    } else if !previous.successful || previous.origin.outcome.is_failed() {
        UpToDateCheck::PreviousFailed
    } else if previous.output_fingerprint != *current_output_fingerprint {
        UpToDateCheck::OutputsModified
    } else {
        UpToDateCheck::UpToDate
    }
}

/// A unit is up to date iff a previous record exists for the same identity,
/// it did not fail, and the outputs still match what it recorded.
pub fn is_up_to_date(
    identity: &Identity,
    previous: Option<&PreviousExecution>,
    current_output_fingerprint: &Fingerprint,
) -> bool {
    check(identity, previous, current_output_fingerprint).is_up_to_date()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::{BuildInvocationId, ExecutionOutcome, OriginMetadata};
    use std::time::Duration;

    fn id(seed: u8) -> Identity {
        Identity::from_fingerprint(Fingerprint::from_bytes([seed; 32]))
    }

    fn fp(seed: u8) -> Fingerprint {
        Fingerprint::from_bytes([seed; 32])
    }

    fn previous(outcome: ExecutionOutcome, successful: bool) -> PreviousExecution {
        PreviousExecution {
            identity: id(1),
            origin: OriginMetadata::from_current_build(
                BuildInvocationId::generate(),
                Duration::ZERO,
                outcome,
            ),
            output_fingerprint: fp(9),
            successful,
        }
    }

    #[test]
    fn test_matching_record_is_up_to_date() {
        let prev = previous(ExecutionOutcome::Executed, true);
        assert!(is_up_to_date(&id(1), Some(&prev), &fp(9)));
    }

    #[test]
    fn test_each_mismatch_is_reported() {
        let prev = previous(ExecutionOutcome::Executed, true);
        assert_eq!(check(&id(1), None, &fp(9)), UpToDateCheck::NoHistory);
        assert_eq!(check(&id(2), Some(&prev), &fp(9)), UpToDateCheck::IdentityChanged);
        assert_eq!(check(&id(1), Some(&prev), &fp(8)), UpToDateCheck::OutputsModified);
    }

    #[test]
    fn test_failures_never_satisfy_the_check() {
        let unsuccessful = previous(ExecutionOutcome::Executed, false);
        let failed = previous(ExecutionOutcome::Failed, true);
        assert_eq!(check(&id(1), Some(&unsuccessful), &fp(9)), UpToDateCheck::PreviousFailed);
        assert_eq!(check(&id(1), Some(&failed), &fp(9)), UpToDateCheck::PreviousFailed);
    }
}
