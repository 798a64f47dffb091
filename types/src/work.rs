//! Proof-of-work nonce type.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::TypeError;

/// The result of PoW generation — an opaque 8-byte work value computed by a
/// worker for a block hash. Rendered as 16 lowercase hex chars on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorkNonce(pub u64);

impl WorkNonce {
    /// Parse from a 16-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        if s.len() != 16 {
            return Err(TypeError::InvalidWork(format!(
                "expected 16 hex chars, got {}",
                s.len()
            )));
        }
        let value =
            u64::from_str_radix(s, 16).map_err(|e| TypeError::InvalidWork(e.to_string()))?;
        Ok(Self(value))
    }

    pub fn to_hex(&self) -> String {
        format!("{:016x}", self.0)
    }
}

impl fmt::Display for WorkNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl Serialize for WorkNonce {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for WorkNonce {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let nonce = WorkNonce(0xdead_beef_0123_4567);
        assert_eq!(nonce.to_hex(), "deadbeef01234567");
        assert_eq!(WorkNonce::from_hex(&nonce.to_hex()).unwrap(), nonce);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(WorkNonce::from_hex("abcd").is_err());
    }
}
