use super::{Context, Step, StepOutcome};
use crate::fingerprint::OutputSnapshot;
use crate::oracle;
use crate::result::ExecutionResult;

/// Skips execution when the previous execution's outputs are still in place
pub struct UpToDateStep;

impl Step for UpToDateStep {
    fn name(&self) -> &'static str {
        "up-to-date"
    }

    fn run(&self, ctx: &mut Context<'_>) -> StepOutcome {
        let Some(identity) = ctx.identity else {
            return StepOutcome::Continue;
        };

        let snapshot = match OutputSnapshot::capture(&ctx.outputs) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(unit = %ctx.work_name, "Cannot snapshot outputs, executing: {e}");
                return StepOutcome::Continue;
            }
        };

        let check = oracle::check(&identity, ctx.previous.as_ref(), &snapshot.fingerprint());
        if check.is_up_to_date() {
            if let Some(previous) = &ctx.previous {
                return StepOutcome::Complete(ExecutionResult::up_to_date(previous.origin.clone()));
            }
        }

        tracing::debug!(unit = %ctx.work_name, reason = check.reason(), "Not up to date");
        ctx.before_outputs = Some(snapshot);
        StepOutcome::Continue
    }
}
