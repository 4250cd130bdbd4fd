//! Raw fixed-point integer amounts as emitted on-chain.

use alloy_primitives::U256;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Unsigned 256-bit amount in the token's native precision.
///
/// Serializes as a base-10 string. Deserializes from a base-10 or `0x` string, or a JSON
/// integer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RawAmount(pub U256);

impl RawAmount {
    pub const ZERO: RawAmount = RawAmount(U256::ZERO);

    pub fn new(value: U256) -> Self {
        RawAmount(value)
    }

    pub fn from_u64(value: u64) -> Self {
        RawAmount(U256::from(value))
    }

    pub fn inner(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Narrow to u128 when the value fits.
    pub fn to_u128(&self) -> Option<u128> {
        crate::domain::decimal::u256_to_u128(self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid raw amount: {0}")]
pub struct RawAmountParseError(String);

impl FromStr for RawAmount {
    type Err = RawAmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex_digits) => U256::from_str_radix(hex_digits, 16),
            None => U256::from_str_radix(trimmed, 10),
        };
        parsed
            .map(RawAmount)
            .map_err(|_| RawAmountParseError(trimmed.to_string()))
    }
}

impl fmt::Display for RawAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RawAmount {
    fn from(value: u64) -> Self {
        RawAmount::from_u64(value)
    }
}

impl Serialize for RawAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

struct RawAmountVisitor;

impl<'de> Visitor<'de> for RawAmountVisitor {
    type Value = RawAmount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an unsigned integer or integer string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<RawAmount, E> {
        Ok(RawAmount::from_u64(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<RawAmount, E> {
        u64::try_from(v)
            .map(RawAmount::from_u64)
            .map_err(|_| E::custom(format!("negative raw amount: {}", v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<RawAmount, E> {
        RawAmount::from_str(v).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for RawAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RawAmountVisitor)
    }
}

/// Signed integer amount (vote power, reward accumulators).
///
/// Serializes as a base-10 string so values beyond the JSON integer range survive storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SignedAmount(pub i128);

impl SignedAmount {
    pub const ZERO: SignedAmount = SignedAmount(0);

    pub fn value(&self) -> i128 {
        self.0
    }

    pub fn checked_add(self, rhs: SignedAmount) -> Option<SignedAmount> {
        self.0.checked_add(rhs.0).map(SignedAmount)
    }
}

impl fmt::Display for SignedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for SignedAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SignedAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.trim()
            .parse::<i128>()
            .map(SignedAmount)
            .map_err(de::Error::custom)
    }
}
