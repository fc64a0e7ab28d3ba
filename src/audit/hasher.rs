//! Integrity hashing
//!
//! SHA-256 over the canonical payload, rendered as 64 lowercase hex
//! characters.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hex digest of an audit payload
///
/// Deserialization accepts any string so that a tampered or malformed digest
/// can still be loaded and reported by verification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntegrityDigest(String);

impl IntegrityDigest {
    /// Length of a well-formed digest
    pub const HEX_LEN: usize = 64;

    /// Digest the given canonical text
    pub fn of(payload: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(payload.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Whether this digest matches the payload
    pub fn matches(&self, payload: &str) -> bool {
        *self == Self::of(payload)
    }

    /// Exactly 64 lowercase hex characters
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == Self::HEX_LEN
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IntegrityDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical text together with its digest
///
/// Produced once per capture and moved into the audit record, so the digest
/// can never be computed over anything other than the stored payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    text: String,
    digest: IntegrityDigest,
}

impl SealedPayload {
    /// Hash the canonical text
    pub fn seal(text: String) -> Self {
        let digest = IntegrityDigest::of(&text);
        Self { text, digest }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn digest(&self) -> &IntegrityDigest {
        &self.digest
    }

    pub(crate) fn into_parts(self) -> (String, IntegrityDigest) {
        (self.text, self.digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        assert_eq!(
            IntegrityDigest::of("abc").as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_digest_format() {
        let digest = IntegrityDigest::of(r#"{"numbers":[1,2,3,4,5,6]}"#);
        assert_eq!(digest.as_str().len(), IntegrityDigest::HEX_LEN);
        assert!(digest.is_well_formed());
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(IntegrityDigest::of("same"), IntegrityDigest::of("same"));
        assert_ne!(IntegrityDigest::of("same"), IntegrityDigest::of("other"));
    }

    #[test]
    fn test_uppercase_is_not_well_formed() {
        let digest = IntegrityDigest(IntegrityDigest::of("x").as_str().to_uppercase());
        assert!(!digest.is_well_formed());
    }

    #[test]
    fn test_seal_matches() {
        let sealed = SealedPayload::seal("{}".to_string());
        assert!(sealed.digest().matches(sealed.text()));
        assert!(!sealed.digest().matches("{ }"));
    }
}
