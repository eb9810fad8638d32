//! Feed fingerprints
//!
//! Cached links are keyed by a one-way hash of the feed identifier so the
//! raw identifier is never stored twice.

use sha2::{Digest, Sha256};

/// Returns the lowercase hex SHA-256 of a feed or domain identifier.
pub fn fingerprint(identifier: &str) -> String {
    hex::encode(Sha256::digest(identifier.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable() {
        assert_eq!(fingerprint("example.org"), fingerprint("example.org"));
        assert_ne!(fingerprint("example.org"), fingerprint("example.com"));
    }

    #[test]
    fn test_fingerprint_known_value() {
        assert_eq!(
            fingerprint(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(fingerprint("abc").len(), 64);
    }
}
