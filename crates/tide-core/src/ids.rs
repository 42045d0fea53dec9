//! Ledger identifiers: object ids, account addresses, object references
//! and Move type tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, Result};

/// Width of ledger object ids and addresses in bytes.
pub const ID_LENGTH: usize = 32;

/// Parse `0x`-prefixed hex, left-padding short forms such as `0x2`.
fn parse_hex_32(s: &str) -> Result<[u8; ID_LENGTH]> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() || digits.len() > ID_LENGTH * 2 {
        return Err(CoreError::InvalidObjectId(s.to_string()));
    }
    let padded = format!("{digits:0>64}");
    let mut out = [0u8; ID_LENGTH];
    hex::decode_to_slice(&padded, &mut out)
        .map_err(|_| CoreError::InvalidObjectId(s.to_string()))?;
    Ok(out)
}

/// Object id on the ledger.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub [u8; ID_LENGTH]);

impl ObjectId {
    /// Build an id whose last byte is `n` (framework objects: `0x2`, `0x6`).
    #[must_use]
    pub const fn from_low_byte(n: u8) -> Self {
        let mut bytes = [0u8; ID_LENGTH];
        bytes[ID_LENGTH - 1] = n;
        Self(bytes)
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for ObjectId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        parse_hex_32(s).map(Self)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Account address (same width as an object id, distinct type).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub [u8; ID_LENGTH]);

impl Address {
    pub const ZERO: Self = Self([0u8; ID_LENGTH]);

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        parse_hex_32(s).map(Self)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Reference to a specific version of an owned object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub object_id: ObjectId,
    pub version: u64,
    pub digest: String,
}

impl ObjectRef {
    pub fn new(object_id: ObjectId, version: u64, digest: impl Into<String>) -> Self {
        Self {
            object_id,
            version,
            digest: digest.into(),
        }
    }
}

/// Reference to a shared object (pools, balance managers, the clock).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SharedObjectRef {
    pub object_id: ObjectId,
    pub initial_shared_version: u64,
    pub mutable: bool,
}

impl SharedObjectRef {
    pub fn new(object_id: ObjectId, initial_shared_version: u64, mutable: bool) -> Self {
        Self {
            object_id,
            initial_shared_version,
            mutable,
        }
    }

    /// Same object, accessed read-only.
    #[must_use]
    pub fn read_only(self) -> Self {
        Self {
            mutable: false,
            ..self
        }
    }
}

/// Fully qualified Move type, e.g. `0x2::sui::SUI`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeTag(String);

impl TypeTag {
    /// Type tag of the ledger's native gas currency.
    pub const NATIVE_GAS: &'static str = "0x2::sui::SUI";

    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical form with the address component at full width, so that
    /// `0x2::sui::SUI` and `0x000..02::sui::SUI` compare equal.
    pub fn canonical(&self) -> String {
        match self.0.split_once("::") {
            Some((addr, rest)) => match parse_hex_32(addr) {
                Ok(bytes) => format!("0x{}::{}", hex::encode(bytes), rest),
                Err(_) => self.0.clone(),
            },
            None => self.0.clone(),
        }
    }

    pub fn is_native_gas(&self) -> bool {
        self.canonical() == TypeTag::new(Self::NATIVE_GAS).canonical()
    }

    /// Wrap as a coin object type: `0x2::coin::Coin<T>`.
    pub fn coin_of(&self) -> TypeTag {
        TypeTag(format!("0x2::coin::Coin<{}>", self.0))
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeTag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
