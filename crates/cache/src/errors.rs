//! Error handling for the cache store
//!
//! Every error carries a recovery hint so callers can decide whether a failure
//! should degrade into a cache miss, be retried, or be surfaced.

mod conversions;
mod display;
mod recovery;
mod types;

pub use types::*;
