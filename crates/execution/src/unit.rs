//! The capability interface implemented by every unit of work

use crate::fingerprint::{InputSet, OutputLocation};
use kiln_core::{BuildInvocationId, CancellationToken};

/// A discrete piece of buildable work with declared inputs and outputs.
///
/// The engine borrows a unit for the duration of a single invocation.
pub trait UnitOfWork {
    /// Human-readable name used in logs and failures
    fn display_name(&self) -> &str;

    /// Logical type, part of the identity (e.g. `compile`)
    fn work_type(&self) -> &str;

    /// Stable key under which the previous execution is recorded
    fn work_id(&self) -> String {
        self.display_name().to_string()
    }

    fn declare_inputs(&self) -> InputSet;

    fn declare_outputs(&self) -> Vec<OutputLocation>;

    /// Perform the work. Returns whether real work happened; `Ok(false)`
    /// means the unit decided on its own that nothing needed doing.
    fn execute(&self, ctx: &WorkContext<'_>) -> anyhow::Result<bool>;
}

/// What an execution function can see of the invocation running it
#[derive(Debug, Clone, Copy)]
pub struct WorkContext<'a> {
    cancellation: &'a CancellationToken,
    build_id: BuildInvocationId,
}

impl<'a> WorkContext<'a> {
    pub fn new(cancellation: &'a CancellationToken, build_id: BuildInvocationId) -> Self {
        Self {
            cancellation,
            build_id,
        }
    }

    /// Long-running units poll this to stop early
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        self.cancellation
    }

    pub fn build_id(&self) -> BuildInvocationId {
        self.build_id
    }
}
