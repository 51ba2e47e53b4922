//! Account identities and network scoping.
//!
//! An [`Identity`] is case-insensitive on input but always canonicalized to
//! lowercase hex without prefix before it is used as a derivation input or a
//! ledger key.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, Result};

/// Length of an identity in bytes.
pub const IDENTITY_LEN: usize = 20;

/// A 20-byte account identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(pub [u8; IDENTITY_LEN]);

impl Identity {
    /// The zero identity. Never a valid authorization target.
    pub const ZERO: Self = Self([0u8; IDENTITY_LEN]);

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; IDENTITY_LEN] {
        &self.0
    }

    /// Parse from hex, with or without a `0x` prefix, in any letter case.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.len() != IDENTITY_LEN * 2 {
            return Err(CoreError::InvalidIdentity(format!(
                "expected {} hex digits, got {}",
                IDENTITY_LEN * 2,
                digits.len()
            )));
        }

        let mut bytes = [0u8; IDENTITY_LEN];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| CoreError::InvalidIdentity(e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Create from a byte slice, which must be exactly 20 bytes.
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        let bytes: [u8; IDENTITY_LEN] = slice.try_into().map_err(|_| {
            CoreError::InvalidIdentity(format!(
                "expected {} bytes, got {}",
                IDENTITY_LEN,
                slice.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    /// Canonical form: lowercase hex without prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Whether this is the zero identity.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; IDENTITY_LEN]
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", &self.to_hex()[..8])
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Identity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<[u8]> for Identity {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; IDENTITY_LEN]> for Identity {
    fn from(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(de::Error::custom)
    }
}

/// The execution context an identity is scoped to.
///
/// The same identity on two networks derives two unrelated keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(pub u64);

impl NetworkId {
    /// Create a new network id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the numeric value.
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NetworkId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}
