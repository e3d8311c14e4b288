use super::{Context, Step, StepOutcome};
use crate::fingerprint::fingerprint_inputs;
use crate::identity::identity;
use crate::result::{ExecutionFailure, ExecutionResult};
use std::time::{Duration, Instant};

/// Fingerprints declared inputs and derives the identity
pub struct IdentityStep;

impl Step for IdentityStep {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn run(&self, ctx: &mut Context<'_>) -> StepOutcome {
        let started = Instant::now();
        match fingerprint_inputs(&ctx.work.declare_inputs()) {
            Ok(input_fingerprint) => {
                let identity = identity(ctx.work.work_type(), &input_fingerprint);
                tracing::debug!(
                    unit = %ctx.work_name,
                    identity = %identity.short(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Computed identity"
                );
                ctx.input_fingerprint = Some(input_fingerprint);
                ctx.identity = Some(identity);
                StepOutcome::Continue
            }
            Err(source) => StepOutcome::Complete(ExecutionResult::failed(
                ctx.build_id,
                Duration::ZERO,
                ExecutionFailure::UnreadableInput {
                    work: ctx.work_name.clone(),
                    source,
                },
            )),
        }
    }
}
