//! Block hash type for the block-lattice ledger.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;

/// A 32-byte block hash — identifies a block in an account's chain.
///
/// On the wire (topics, RPC, store keys) hashes travel as 64-character
/// uppercase hex strings, so serde goes through the string form rather
/// than the raw bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockHash([u8; 32]);

impl Default for BlockHash {
    fn default() -> Self {
        Self::ZERO
    }
}

impl BlockHash {
    /// The all-zero hash. Marks an open block's `previous` reference and
    /// the burn address as a send `link`.
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Parse from a 64-character hex string (either case).
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        if s.len() != 64 {
            return Err(TypeError::InvalidHash(format!(
                "expected 64 hex chars, got {}",
                s.len()
            )));
        }
        let decoded = hex::decode(s).map_err(|e| TypeError::InvalidHash(e.to_string()))?;
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }

    /// The canonical uppercase hex form used on the wire.
    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(64);
        for b in &self.0 {
            use fmt::Write;
            let _ = write!(s, "{:02X}", b);
        }
        s
    }
}

impl FromStr for BlockHash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash(")?;
        for b in &self.0[..4] {
            write!(f, "{:02X}", b)?;
        }
        write!(f, "\u{2026})")
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}

impl Serialize for BlockHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for BlockHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_hash_is_zero() {
        assert!(BlockHash::ZERO.is_zero());
        assert!(!BlockHash::new([1u8; 32]).is_zero());
    }

    #[test]
    fn hex_round_trip() {
        let hash = BlockHash::new([0xAB; 32]);
        let parsed = BlockHash::from_hex(&hash.to_hex()).unwrap();
        assert_eq!(parsed, hash);
    }

    #[test]
    fn parses_lowercase_hex() {
        let hash = BlockHash::from_hex(&"ab".repeat(32)).unwrap();
        assert_eq!(hash, BlockHash::new([0xAB; 32]));
    }

    #[test]
    fn rejects_short_input() {
        assert!(BlockHash::from_hex("ABCD").is_err());
    }

    #[test]
    fn rejects_non_hex_input() {
        assert!(BlockHash::from_hex(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn serde_uses_hex_string() {
        let hash = BlockHash::new([0x0F; 32]);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", "0F".repeat(32)));
        let back: BlockHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }
}
