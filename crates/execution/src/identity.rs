//! Identity computer

use crate::fingerprint::ContentHasher;
use kiln_core::{Fingerprint, Identity};

/// Bumped whenever the way identities are derived changes, so old cache
/// entries stop matching instead of being misread.
const IDENTITY_KEY_VERSION: i64 = 1;

const IDENTITY_DOMAIN: &str = "kiln.identity";

/// Derive the cache key of a unit from its type and input fingerprint.
///
/// Pure: equal arguments always yield an equal identity.
pub fn identity(unit_type: &str, input_fingerprint: &Fingerprint) -> Identity {
    let mut hasher = ContentHasher::new();
    hasher
        .str(IDENTITY_DOMAIN)
        .i64(IDENTITY_KEY_VERSION)
        .str(unit_type)
        .fingerprint(input_fingerprint);
    Identity::from_fingerprint(hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::digest_bytes;

    #[test]
    fn test_identity_is_structural() {
        let inputs = digest_bytes(b"int x=1;");
        let same_inputs = digest_bytes(b"int x=1;");
        assert_eq!(identity("compile", &inputs), identity("compile", &same_inputs));
    }

    #[test]
    fn test_type_and_inputs_both_matter() {
        let a = digest_bytes(b"a");
        let b = digest_bytes(b"b");
        assert_ne!(identity("compile", &a), identity("link", &a));
        assert_ne!(identity("compile", &a), identity("compile", &b));
        // The identity is not just the input fingerprint
        assert_ne!(identity("compile", &a).fingerprint(), &a);
    }
}
