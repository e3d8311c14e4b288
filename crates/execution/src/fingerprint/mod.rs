//! Fingerprint engine: deterministic digests of input and output state

mod hasher;
mod inputs;
mod outputs;

pub use hasher::{digest_bytes, digest_reader, ContentHasher};
pub use inputs::{fingerprint_inputs, fingerprint_value, InputSet, InputValue};
pub use outputs::{
    pack_outputs, restore_outputs, validate_stored_outputs, OutputLocation, OutputSnapshot, OutputState,
};
