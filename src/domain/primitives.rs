//! Domain primitives: Address, TxHash.

use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// The zero address, used as the "no underlying" sentinel.
pub const ADDRESS_ZERO: &str = "0x0000000000000000000000000000000000000000";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("address must start with 0x: {0}")]
    MissingPrefix(String),
    #[error("address must be 20 bytes of hex: {0}")]
    InvalidHex(String),
}

/// Contract or account address, always stored as lowercase `0x`-prefixed hex.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Address(String);

impl Address {
    /// Parse and normalize an address string.
    pub fn parse(s: &str) -> Result<Self, AddressParseError> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| AddressParseError::MissingPrefix(trimmed.to_string()))?;
        let bytes =
            hex::decode(digits).map_err(|_| AddressParseError::InvalidHex(trimmed.to_string()))?;
        if bytes.len() != 20 {
            return Err(AddressParseError::InvalidHex(trimmed.to_string()));
        }
        Ok(Address::from_bytes(&bytes))
    }

    /// Build an address from 20 raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Address(format!("0x{}", hex::encode(bytes)))
    }

    pub fn zero() -> Self {
        Address(ADDRESS_ZERO.to_string())
    }

    pub fn is_zero(&self) -> bool {
        self.0 == ADDRESS_ZERO
    }

    /// Get the address as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Address::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction hash, lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct TxHash(String);

impl TxHash {
    pub fn new(hash: &str) -> Self {
        TxHash(hash.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TxHash {
    fn from(value: String) -> Self {
        TxHash::new(&value)
    }
}

impl std::fmt::Display for TxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
