use super::{Context, Step, StepOutcome};
use crate::listener::OutputChangeListener;
use std::sync::Arc;

/// Lets observers invalidate derived state before outputs are mutated
pub struct NotifyOutputChangeStep {
    listener: Arc<dyn OutputChangeListener>,
}

impl NotifyOutputChangeStep {
    pub fn new(listener: Arc<dyn OutputChangeListener>) -> Self {
        Self { listener }
    }
}

impl Step for NotifyOutputChangeStep {
    fn name(&self) -> &'static str {
        "notify-output-change"
    }

    fn run(&self, ctx: &mut Context<'_>) -> StepOutcome {
        self.listener.before_output_change(&ctx.work_name, &ctx.outputs);
        StepOutcome::Continue
    }
}
