use super::{Context, ExecutionRecord, Step, StepOutcome};
use crate::fingerprint::{pack_outputs, OutputSnapshot};
use crate::history::{ExecutionHistoryStore, PreviousExecution};
use crate::result::{CancellationPhase, ExecutionFailure, ExecutionResult, NonDeterminismWarning};
use kiln_cache::{CacheEntry, CacheStore, PutOutcome, StoredOutput};
use kiln_core::{ExecutionOutcome, Fingerprint, Identity, OriginMetadata};
use std::sync::Arc;

/// Snapshots outputs after execution, records history, populates the cache
/// and assembles the final result.
pub struct PersistStep {
    cache: Option<Arc<CacheStore>>,
    history: Arc<dyn ExecutionHistoryStore>,
}

impl PersistStep {
    pub fn new(cache: Option<Arc<CacheStore>>, history: Arc<dyn ExecutionHistoryStore>) -> Self {
        Self { cache, history }
    }

    fn record_history(
        &self,
        ctx: &Context<'_>,
        identity: Identity,
        origin: &OriginMetadata,
        output_fingerprint: Fingerprint,
        successful: bool,
    ) {
        let record = PreviousExecution {
            identity,
            origin: origin.clone(),
            output_fingerprint,
            successful,
        };
        if let Err(e) = self.history.store(&ctx.work_id, record) {
            tracing::warn!(unit = %ctx.work_name, "Failed to record execution history: {e}");
        }
    }

    /// The cache writes only wholly successful executions that did work
    fn writable_cache(&self, record: &ExecutionRecord) -> Option<&CacheStore> {
        let cache = self.cache.as_deref()?;
        (cache.is_writable() && record.did_work && !record.cancelled && record.failure.is_none())
            .then_some(cache)
    }

    fn populate_cache(
        &self,
        ctx: &Context<'_>,
        cache: &CacheStore,
        identity: Identity,
        origin: &OriginMetadata,
        output_fingerprint: Fingerprint,
        outputs: Vec<StoredOutput>,
    ) -> Option<NonDeterminismWarning> {
        let entry = CacheEntry {
            identity,
            origin: origin.clone(),
            output_fingerprint,
            outputs,
        };
        match cache.put(&identity, &entry) {
            Ok(PutOutcome::Replaced {
                previous_fingerprint,
                previous_origin,
            }) => {
                let warning = NonDeterminismWarning {
                    work: ctx.work_name.clone(),
                    identity,
                    previous_fingerprint,
                    current_fingerprint: output_fingerprint,
                    previous_origin,
                };
                tracing::warn!(unit = %ctx.work_name, identity = %identity.short(), "{warning}");
                Some(warning)
            }
            Ok(outcome) => {
                tracing::debug!(unit = %ctx.work_name, ?outcome, "Cache populated");
                None
            }
            Err(e) => {
                tracing::warn!(unit = %ctx.work_name, "Failed to write cache entry: {e}");
                None
            }
        }
    }
}

impl Step for PersistStep {
    fn name(&self) -> &'static str {
        "persist"
    }

    fn run(&self, ctx: &mut Context<'_>) -> StepOutcome {
        let (Some(record), Some(identity)) = (ctx.execution.take(), ctx.identity) else {
            return StepOutcome::Continue;
        };
        let ExecutionRecord {
            did_work,
            duration,
            cancelled,
            ..
        } = record;

        // Packing reads the content anyway, so the snapshot is derived from it
        let cache = self.writable_cache(&record);
        let captured = match cache {
            Some(_) => pack_outputs(&ctx.outputs)
                .map(|stored| (OutputSnapshot::from_stored(&stored), Some(stored))),
            None => OutputSnapshot::capture(&ctx.outputs).map(|snapshot| (snapshot, None)),
        };

        if let Some(failure) = record.failure {
            let snapshot = captured.map(|(snapshot, _)| snapshot).unwrap_or_default();
            let mut result = ExecutionResult::failed(ctx.build_id, duration, failure);
            if cancelled {
                result = result.with_cancellation(CancellationPhase::AfterExecution);
            }
            self.record_history(ctx, identity, &result.origin, snapshot.fingerprint(), false);
            return StepOutcome::Complete(result);
        }

        let (snapshot, stored) = match captured {
            Ok(captured) => captured,
            Err(source) => {
                let result = ExecutionResult::failed(
                    ctx.build_id,
                    duration,
                    ExecutionFailure::OutputSnapshot {
                        work: ctx.work_name.clone(),
                        source,
                    },
                );
                let empty = OutputSnapshot::default().fingerprint();
                self.record_history(ctx, identity, &result.origin, empty, false);
                return StepOutcome::Complete(result);
            }
        };
        let output_fingerprint = snapshot.fingerprint();
        if ctx.before_outputs.as_ref() == Some(&snapshot) {
            tracing::debug!(unit = %ctx.work_name, "Execution left outputs unchanged");
        }

        let outcome = if did_work {
            ExecutionOutcome::Executed
        } else {
            ExecutionOutcome::UpToDate
        };
        let origin = OriginMetadata::from_current_build(ctx.build_id, duration, outcome);
        self.record_history(ctx, identity, &origin, output_fingerprint, !cancelled);

        let warning = match (cache, stored) {
            (Some(cache), Some(stored)) => {
                self.populate_cache(ctx, cache, identity, &origin, output_fingerprint, stored)
            }
            _ => None,
        };

        let mut result = match outcome {
            ExecutionOutcome::UpToDate => ExecutionResult::up_to_date(origin),
            _ => ExecutionResult::executed(origin),
        };
        result = result.with_warnings(warning.into_iter().collect());
        if cancelled {
            result = result.with_failure(ExecutionFailure::Cancelled {
                work: ctx.work_name.clone(),
                phase: CancellationPhase::AfterExecution,
            });
        }
        StepOutcome::Complete(result)
    }
}
