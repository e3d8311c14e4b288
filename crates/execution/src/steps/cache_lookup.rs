use super::{Context, Step, StepOutcome};
use crate::fingerprint::{restore_outputs, validate_stored_outputs};
use crate::history::{ExecutionHistoryStore, PreviousExecution};
use crate::listener::OutputChangeListener;
use crate::result::ExecutionResult;
use kiln_cache::CacheStore;
use std::sync::Arc;

/// Serves the unit from the cache store.
///
/// A successful local execution of the same identity takes precedence: its
/// outputs are either still current, or were modified externally and must
/// be rebuilt.
pub struct CacheLookupStep {
    cache: Option<Arc<CacheStore>>,
    history: Arc<dyn ExecutionHistoryStore>,
    listener: Arc<dyn OutputChangeListener>,
}

impl CacheLookupStep {
    pub fn new(
        cache: Option<Arc<CacheStore>>,
        history: Arc<dyn ExecutionHistoryStore>,
        listener: Arc<dyn OutputChangeListener>,
    ) -> Self {
        Self {
            cache,
            history,
            listener,
        }
    }
}

impl Step for CacheLookupStep {
    fn name(&self) -> &'static str {
        "cache-lookup"
    }

    fn run(&self, ctx: &mut Context<'_>) -> StepOutcome {
        let (Some(cache), Some(identity)) = (self.cache.as_deref(), ctx.identity) else {
            return StepOutcome::Continue;
        };
        if !cache.is_readable() {
            return StepOutcome::Continue;
        }

        let executed_locally = ctx
            .previous
            .as_ref()
            .is_some_and(|previous| previous.identity == identity && previous.successful);
        if executed_locally {
            tracing::debug!(unit = %ctx.work_name, "Local execution record takes precedence over cache");
            return StepOutcome::Continue;
        }

        let hex = identity.short();
        let Some(entry) = cache.get(&identity) else {
            kiln_utils::tracing::cache_event(&ctx.work_name, &hex, false);
            return StepOutcome::Continue;
        };

        if entry.identity != identity {
            tracing::warn!(unit = %ctx.work_name, identity = %hex, "Cache entry is filed under the wrong identity");
            return StepOutcome::Continue;
        }
        if let Some(missing) = ctx.outputs.iter().find(|o| entry.output(&o.name).is_none()) {
            tracing::debug!(
                unit = %ctx.work_name,
                output = %missing.name,
                "Cache entry lacks a declared output"
            );
            return StepOutcome::Continue;
        }

        if let Err(e) = validate_stored_outputs(&entry.outputs) {
            tracing::warn!(unit = %ctx.work_name, identity = %hex, "Ignoring corrupt cache entry: {e}");
            return StepOutcome::Continue;
        }

        self.listener.before_output_change(&ctx.work_name, &ctx.outputs);
        if let Err(e) = restore_outputs(&ctx.outputs, &entry.outputs) {
            tracing::warn!(unit = %ctx.work_name, "Could not restore outputs from cache: {e}");
            return StepOutcome::Continue;
        }
        kiln_utils::tracing::cache_event(&ctx.work_name, &hex, true);

        let record = PreviousExecution {
            identity,
            origin: entry.origin.clone(),
            output_fingerprint: entry.output_fingerprint,
            successful: true,
        };
        if let Err(e) = self.history.store(&ctx.work_id, record) {
            tracing::warn!(unit = %ctx.work_name, "Failed to record execution history: {e}");
        }

        StepOutcome::Complete(ExecutionResult::from_cache(entry.origin))
    }
}
