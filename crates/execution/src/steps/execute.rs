use super::{Context, ExecutionRecord, Step, StepOutcome};
use crate::result::ExecutionFailure;
use crate::unit::WorkContext;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

/// Invokes the unit's execution function.
///
/// Errors and panics are captured into the execution record; they never
/// escape the pipeline.
pub struct ExecuteStep;

impl Step for ExecuteStep {
    fn name(&self) -> &'static str {
        "execute"
    }

    fn run(&self, ctx: &mut Context<'_>) -> StepOutcome {
        let work = ctx.work;
        let work_ctx = WorkContext::new(ctx.cancellation, ctx.build_id);

        tracing::debug!(unit = %ctx.work_name, "Executing");
        let started = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| work.execute(&work_ctx)));
        let duration = started.elapsed();

        let (did_work, failure) = match outcome {
            Ok(Ok(did_work)) => (did_work, None),
            Ok(Err(source)) => (
                true,
                Some(ExecutionFailure::Execution {
                    work: ctx.work_name.clone(),
                    source,
                }),
            ),
            Err(payload) => (
                true,
                Some(ExecutionFailure::Execution {
                    work: ctx.work_name.clone(),
                    source: anyhow::anyhow!("panicked: {}", panic_message(payload.as_ref())),
                }),
            ),
        };

        ctx.execution = Some(ExecutionRecord {
            did_work,
            duration,
            failure,
            cancelled: ctx.cancellation.is_cancelled(),
        });
        StepOutcome::Continue
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_messages() {
        let from_str: Box<dyn Any + Send> = Box::new("static message");
        let from_string: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        let other: Box<dyn Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(from_str.as_ref()), "static message");
        assert_eq!(panic_message(from_string.as_ref()), "owned message");
        assert_eq!(panic_message(other.as_ref()), "unknown panic payload");
    }
}
