use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Digest of replicated application state at a checkpoint.
///
/// A `StateDigest` is the BLAKE3 hash of whatever bytes the application
/// chooses to represent its state with. Two replicas agree on a checkpoint
/// exactly when their digests for that sequence number are equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateDigest([u8; 32]);

impl StateDigest {
    /// Compute a `StateDigest` over raw state bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"pbft-state-v1:");
        hasher.update(data);
        Self(*hasher.finalize().as_bytes())
    }

    /// Create a `StateDigest` from a pre-computed hash.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The null digest (all zeros). Represents "no state yet".
    pub const fn null() -> Self {
        Self([0u8; 32])
    }

    /// Returns `true` if this is the null digest.
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for StateDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateDigest({})", self.short_hex())
    }
}

impl fmt::Display for StateDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 32]> for StateDigest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn from_bytes_is_deterministic() {
        let d1 = StateDigest::from_bytes(b"state at 10");
        let d2 = StateDigest::from_bytes(b"state at 10");
        assert_eq!(d1, d2);
    }

    #[test]
    fn different_state_produces_different_digests() {
        let d1 = StateDigest::from_bytes(b"state at 10");
        let d2 = StateDigest::from_bytes(b"state at 20");
        assert_ne!(d1, d2);
    }

    #[test]
    fn domain_separated_from_plain_blake3() {
        let plain = *blake3::hash(b"x").as_bytes();
        assert_ne!(StateDigest::from_bytes(b"x").as_bytes(), &plain);
    }

    #[test]
    fn null_is_all_zeros() {
        let null = StateDigest::null();
        assert!(null.is_null());
        assert!(!StateDigest::from_bytes(b"").is_null());
    }

    #[test]
    fn hex_parsing() {
        let d = StateDigest::from_bytes(b"test");
        assert_eq!(StateDigest::from_hex(&d.to_hex()).unwrap(), d);
        assert_eq!(d.short_hex().len(), 8);
        assert_eq!(format!("{d}").len(), 64);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        let err = StateDigest::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: 32,
                actual: 2
            }
        );
    }

    #[test]
    fn from_hex_rejects_non_hex() {
        assert!(matches!(
            StateDigest::from_hex("zz"),
            Err(TypeError::InvalidHex(_))
        ));
    }

    proptest! {
        #[test]
        fn from_hex_never_panics(s in "\\PC{0,80}") {
            let _ = StateDigest::from_hex(&s);
        }
    }
}
