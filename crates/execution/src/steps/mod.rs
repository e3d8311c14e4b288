//! The execution step pipeline
//!
//! Each stage inspects or enriches the shared `Context` and either finishes
//! the invocation with a result or lets the next stage run. The engine drives
//! the stages in a fixed order:
//!
//! 1. `CancellationGateStep`
//! 2. `IdentityStep`
//! 3. `CacheLookupStep`
//! 4. `UpToDateStep`
//! 5. `NotifyOutputChangeStep`
//! 6. `ExecuteStep`
//! 7. `PersistStep`
//!
//! Stages 3 to 7 run while holding the memoization lock for the identity.

mod cache_lookup;
mod cancellation;
mod execute;
mod identity;
mod notify;
mod persist;
mod up_to_date;

pub use cache_lookup::CacheLookupStep;
pub use cancellation::CancellationGateStep;
pub use execute::ExecuteStep;
pub use identity::IdentityStep;
pub use notify::NotifyOutputChangeStep;
pub use persist::PersistStep;
pub use up_to_date::UpToDateStep;

use crate::fingerprint::{OutputLocation, OutputSnapshot};
use crate::history::PreviousExecution;
use crate::result::{ExecutionFailure, ExecutionResult};
use crate::unit::UnitOfWork;
use kiln_core::{BuildInvocationId, CancellationToken, Fingerprint, Identity};
use std::time::Duration;

/// What a stage decided
pub enum StepOutcome {
    Continue,
    Complete(ExecutionResult),
}

pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(&self, ctx: &mut Context<'_>) -> StepOutcome;
}

/// What the execution function did
#[derive(Debug)]
pub struct ExecutionRecord {
    pub did_work: bool,
    pub duration: Duration,
    pub failure: Option<ExecutionFailure>,
    /// Cancellation was requested by the time the function returned
    pub cancelled: bool,
}

/// State of one invocation, filled in as stages run
pub struct Context<'a> {
    pub work: &'a dyn UnitOfWork,
    pub cancellation: &'a CancellationToken,
    pub build_id: BuildInvocationId,
    pub work_name: String,
    pub work_id: String,
    pub outputs: Vec<OutputLocation>,
    pub input_fingerprint: Option<Fingerprint>,
    pub identity: Option<Identity>,
    pub previous: Option<PreviousExecution>,
    pub before_outputs: Option<OutputSnapshot>,
    pub execution: Option<ExecutionRecord>,
}

impl<'a> Context<'a> {
    pub fn new(
        work: &'a dyn UnitOfWork,
        cancellation: &'a CancellationToken,
        build_id: BuildInvocationId,
    ) -> Self {
        Self {
            work,
            cancellation,
            build_id,
            work_name: work.display_name().to_string(),
            work_id: work.work_id(),
            outputs: work.declare_outputs(),
            input_fingerprint: None,
            identity: None,
            previous: None,
            before_outputs: None,
            execution: None,
        }
    }
}

/// Run stages in order until one completes the invocation
pub fn drive(steps: &[Box<dyn Step>], ctx: &mut Context<'_>) -> StepOutcome {
    for step in steps {
        tracing::trace!(unit = %ctx.work_name, step = step.name(), "Running step");
        if let StepOutcome::Complete(result) = step.run(ctx) {
            tracing::debug!(
                unit = %ctx.work_name,
                step = step.name(),
                outcome = %result.outcome,
                "Pipeline completed"
            );
            return StepOutcome::Complete(result);
        }
    }
    StepOutcome::Continue
}
