//! Core domain types and errors shared by every kiln crate.
//!
//! ## Key Components
//!
//! - **`errors`**: the crate-wide `Error` enum and `Result` alias.
//! - **`fingerprint`** / **`identity`**: content digests and the cache keys
//!   derived from them.
//! - **`outcome`** / **`origin`**: classification and provenance of a single
//!   unit-of-work execution.
//! - **`cancellation`**: the build-wide cooperative cancellation flag.
//! - **`constants`**: shared environment variable names and paths.

pub mod cancellation;
pub mod constants;
pub mod errors;
pub mod fingerprint;
pub mod identity;
pub mod origin;
pub mod outcome;

pub use self::{
    cancellation::CancellationToken,
    constants::*,
    errors::{Error, Result},
    fingerprint::Fingerprint,
    identity::Identity,
    origin::{BuildInvocationId, OriginMetadata},
    outcome::ExecutionOutcome,
};
