//! Git object identifiers
//!
//! An [`ObjectHash`] is the raw 20-byte SHA-1 name of a commit, tree or blob.
//! The all-zero hash is reserved to mean "unknown" or "not processed yet".

use crate::error::{CacheError, Result};
use std::fmt;
use std::str::FromStr;

/// Length in bytes of a git object hash
pub const HASH_LEN: usize = 20;

/// Raw identifier of a git object
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ObjectHash([u8; HASH_LEN]);

impl ObjectHash {
    /// The distinguished "unknown" hash
    pub const ZERO: ObjectHash = ObjectHash([0; HASH_LEN]);

    /// Wrap an exact-length byte array
    pub const fn new(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Build a hash from a raw byte slice, rejecting any other length
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; HASH_LEN] = bytes.try_into().map_err(|_| {
            CacheError::InvalidHash(format!(
                "expected {} bytes, got {}",
                HASH_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(raw))
    }

    /// Parse a 40 character hex string
    pub fn from_hex(hex: &str) -> Result<Self> {
        let hex = hex.trim();
        let raw = hex::decode(hex).map_err(|e| {
            CacheError::InvalidHash(format!("'{}' is not a hex string: {}", hex, e))
        })?;
        Self::from_bytes(&raw)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; HASH_LEN]
    }

    /// Lowercase hex rendering
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ObjectHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectHash({})", self.to_hex())
    }
}

impl FromStr for ObjectHash {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl From<[u8; HASH_LEN]> for ObjectHash {
    fn from(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }
}
