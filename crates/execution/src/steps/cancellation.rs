use super::{Context, Step, StepOutcome};
use crate::result::{CancellationPhase, ExecutionFailure, ExecutionResult};
use std::time::Duration;

/// Fails fast when the build was cancelled before this unit started
pub struct CancellationGateStep;

impl Step for CancellationGateStep {
    fn name(&self) -> &'static str {
        "cancellation-gate"
    }

    fn run(&self, ctx: &mut Context<'_>) -> StepOutcome {
        if !ctx.cancellation.is_cancelled() {
            return StepOutcome::Continue;
        }
        StepOutcome::Complete(ExecutionResult::failed(
            ctx.build_id,
            Duration::ZERO,
            ExecutionFailure::Cancelled {
                work: ctx.work_name.clone(),
                phase: CancellationPhase::BeforeExecution,
            },
        ))
    }
}
