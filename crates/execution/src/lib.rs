//! Incremental unit-of-work execution for kiln
//!
//! Given a unit of work, the engine decides whether it can be skipped
//! because its previous outputs are still in place, whether its outputs can
//! be restored from the cache, or whether it must run, and records the
//! provenance of whatever it returns.
//!
//! ```no_run
//! use kiln_core::{BuildInvocationId, CancellationToken};
//! use kiln_execution::{EngineConfig, ExecutionEngine};
//!
//! # fn run(unit: &dyn kiln_execution::UnitOfWork) -> anyhow::Result<()> {
//! let engine = ExecutionEngine::from_config(&EngineConfig::load()?, BuildInvocationId::generate())?;
//! let result = engine.execute_unit(unit, &CancellationToken::new());
//! println!("{}: {}", unit.display_name(), result.outcome);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod fingerprint;
pub mod history;
pub mod identity;
pub mod listener;
pub mod memo;
pub mod oracle;
pub mod result;
pub mod steps;
pub mod unit;

pub use config::EngineConfig;
pub use engine::{ExecutionEngine, ExecutionEngineBuilder};
pub use fingerprint::{
    fingerprint_inputs, InputSet, InputValue, OutputLocation, OutputSnapshot, OutputState,
};
pub use history::{ExecutionHistoryStore, FileHistory, InMemoryHistory, PreviousExecution};
pub use identity::identity;
pub use listener::{CompositeListener, NoopListener, OutputChangeListener};
pub use oracle::{is_up_to_date, UpToDateCheck};
pub use result::{CancellationPhase, ExecutionFailure, ExecutionResult, NonDeterminismWarning};
pub use unit::{UnitOfWork, WorkContext};
