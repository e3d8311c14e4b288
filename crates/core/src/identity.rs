//! Cache keys for units of work.

use crate::fingerprint::Fingerprint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable cache key of a unit of work.
///
/// An identity is a fingerprint over the unit's type and its input
/// fingerprint. Two units with equal identities are interchangeable: the
/// result of one may always stand in for the other.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(Fingerprint);

impl Identity {
    /// Wrap an already combined fingerprint
    #[must_use]
    pub const fn from_fingerprint(fingerprint: Fingerprint) -> Self {
        Self(fingerprint)
    }

    #[must_use]
    pub const fn fingerprint(&self) -> &Fingerprint {
        &self.0
    }

    /// Full hex form, used as the storage key
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }

    #[must_use]
    pub fn short(&self) -> String {
        self.0.short()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.0.short())
    }
}
