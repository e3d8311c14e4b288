//! The execution engine: entry point invoked by the scheduler once per unit

use crate::config::EngineConfig;
use crate::history::{ExecutionHistoryStore, FileHistory, InMemoryHistory};
use crate::listener::{CompositeListener, NoopListener, OutputChangeListener};
use crate::memo::MemoTable;
use crate::result::{ExecutionFailure, ExecutionResult};
use crate::steps::{
    self, CacheLookupStep, CancellationGateStep, Context, ExecuteStep, IdentityStep,
    NotifyOutputChangeStep, PersistStep, Step, StepOutcome, UpToDateStep,
};
use crate::unit::UnitOfWork;
use anyhow::Context as _;
use kiln_cache::{CacheMode, CacheStore};
use kiln_core::{BuildInvocationId, CancellationToken};
use std::sync::Arc;
use std::time::Duration;

/// Runs units of work through the step pipeline.
///
/// One engine serves one build invocation and may be shared by any number
/// of scheduler threads.
pub struct ExecutionEngine {
    build_id: BuildInvocationId,
    cache: Option<Arc<CacheStore>>,
    history: Arc<dyn ExecutionHistoryStore>,
    memo: MemoTable,
    /// Stages run before the memoization lock is taken
    unlocked: Vec<Box<dyn Step>>,
    /// Stages run while holding the lock for the unit's identity
    locked: Vec<Box<dyn Step>>,
}

impl ExecutionEngine {
    pub fn builder(build_id: BuildInvocationId) -> ExecutionEngineBuilder {
        ExecutionEngineBuilder::new(build_id)
    }

    /// Disk-backed cache and file-backed history as configured
    pub fn from_config(config: &EngineConfig, build_id: BuildInvocationId) -> anyhow::Result<Self> {
        let history = FileHistory::new(&config.history_dir).with_context(|| {
            format!(
                "Failed to open execution history at {}",
                config.history_dir.display()
            )
        })?;
        let mut builder = Self::builder(build_id).history(Arc::new(history));

        if config.cache.effective_mode() != CacheMode::Off {
            let cache = CacheStore::from_config(&config.cache).with_context(|| {
                format!("Failed to open cache at {}", config.cache.base_dir.display())
            })?;
            builder = builder.cache(Arc::new(cache));
        }

        Ok(builder.build())
    }

    pub fn build_id(&self) -> BuildInvocationId {
        self.build_id
    }

    pub fn cache(&self) -> Option<&CacheStore> {
        self.cache.as_deref()
    }

    pub fn history(&self) -> &dyn ExecutionHistoryStore {
        self.history.as_ref()
    }

    /// Identities currently executing or awaited by concurrent callers
    pub fn in_flight(&self) -> usize {
        self.memo.in_flight()
    }

    /// Run one unit of work. Never panics and never returns an error:
    /// every failure is reported in `ExecutionResult::failure`.
    pub fn execute_unit(
        &self,
        work: &dyn UnitOfWork,
        cancellation: &CancellationToken,
    ) -> ExecutionResult {
        let span = kiln_utils::tracing::unit_span(work.display_name(), &self.build_id.to_string());
        let _entered = span.enter();

        let mut ctx = Context::new(work, cancellation, self.build_id);
        let result = match steps::drive(&self.unlocked, &mut ctx) {
            StepOutcome::Complete(result) => result,
            StepOutcome::Continue => match ctx.identity {
                Some(identity) => {
                    let owner = ctx.work_id.clone();
                    self.memo
                        .run_exclusive(&identity, &owner, || self.run_locked(&mut ctx))
                }
                None => self.incomplete(&ctx),
            },
        };

        self.report(&ctx, &result);
        result
    }

    fn run_locked(&self, ctx: &mut Context<'_>) -> ExecutionResult {
        ctx.previous = match self.history.load(&ctx.work_id) {
            Ok(previous) => previous,
            Err(e) => {
                tracing::warn!(unit = %ctx.work_name, "Failed to load execution history: {e}");
                None
            }
        };

        match steps::drive(&self.locked, ctx) {
            StepOutcome::Complete(result) => result,
            StepOutcome::Continue => self.incomplete(ctx),
        }
    }

    fn incomplete(&self, ctx: &Context<'_>) -> ExecutionResult {
        ExecutionResult::failed(
            self.build_id,
            Duration::ZERO,
            ExecutionFailure::Execution {
                work: ctx.work_name.clone(),
                source: anyhow::anyhow!("pipeline finished without a result"),
            },
        )
    }

    fn report(&self, ctx: &Context<'_>, result: &ExecutionResult) {
        kiln_utils::tracing::unit_completed(
            &ctx.work_name,
            result.outcome.as_str(),
            result.origin.execution_time_ms(),
            result.is_success(),
        );
        if let Some(failure) = result.failure() {
            if failure.is_cancellation() {
                tracing::info!(unit = %ctx.work_name, "{failure}");
            } else {
                tracing::error!(unit = %ctx.work_name, "{failure}");
            }
        }
    }
}

/// Collaborators default to no cache, in-memory history and no listeners
pub struct ExecutionEngineBuilder {
    build_id: BuildInvocationId,
    cache: Option<Arc<CacheStore>>,
    history: Option<Arc<dyn ExecutionHistoryStore>>,
    listeners: CompositeListener,
}

impl ExecutionEngineBuilder {
    pub fn new(build_id: BuildInvocationId) -> Self {
        Self {
            build_id,
            cache: None,
            history: None,
            listeners: CompositeListener::new(),
        }
    }

    pub fn cache(mut self, cache: Arc<CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn history(mut self, history: Arc<dyn ExecutionHistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    /// Add an output change listener; may be called repeatedly
    pub fn listener(mut self, listener: Arc<dyn OutputChangeListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn build(self) -> ExecutionEngine {
        let history = self
            .history
            .unwrap_or_else(|| Arc::new(InMemoryHistory::new()));
        let listener: Arc<dyn OutputChangeListener> = if self.listeners.is_empty() {
            Arc::new(NoopListener)
        } else {
            Arc::new(self.listeners)
        };

        let unlocked: Vec<Box<dyn Step>> = vec![Box::new(CancellationGateStep), Box::new(IdentityStep)];
        let locked: Vec<Box<dyn Step>> = vec![
            Box::new(CacheLookupStep::new(
                self.cache.clone(),
                history.clone(),
                listener.clone(),
            )),
            Box::new(UpToDateStep),
            Box::new(NotifyOutputChangeStep::new(listener)),
            Box::new(ExecuteStep),
            Box::new(PersistStep::new(self.cache.clone(), history.clone())),
        ];

        ExecutionEngine {
            build_id: self.build_id,
            cache: self.cache,
            history,
            memo: MemoTable::new(),
            unlocked,
            locked,
        }
    }
}
