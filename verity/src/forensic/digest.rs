use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use crate::error::Result;

/// Lower-case hex SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Digest of the canonical JSON encoding of `value`.
    pub fn of_json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self::of_bytes(&serde_json::to_vec(value)?))
    }

    /// Predecessor of the first audit entry: 64 zero characters.
    pub fn genesis() -> Self {
        Self("0".repeat(64))
    }

    /// `SHA256(previous ‖ input ‖ output)` over the hex strings.
    pub fn link(previous: &Digest, input: &Digest, output: &Digest) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(previous.0.as_bytes());
        hasher.update(input.0.as_bytes());
        hasher.update(output.0.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_sha256() {
        assert_eq!(
            Digest::of_bytes(b"abc").as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_genesis_shape() {
        let genesis = Digest::genesis();
        assert_eq!(genesis.as_str().len(), 64);
        assert!(genesis.as_str().chars().all(|c| c == '0'));
    }

    #[test]
    fn test_link_depends_on_every_part() {
        let a = Digest::of_bytes(b"a");
        let b = Digest::of_bytes(b"b");
        let base = Digest::link(&Digest::genesis(), &a, &b);
        assert_ne!(base, Digest::link(&a, &a, &b));
        assert_ne!(base, Digest::link(&Digest::genesis(), &b, &b));
        assert_ne!(base, Digest::link(&Digest::genesis(), &a, &a));
        assert_eq!(base, Digest::link(&Digest::genesis(), &a, &b));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let digest = Digest::of_bytes(b"x");
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"{digest}\""));
    }
}
