//! Lossless decimal numeric type backed by rust_decimal, plus token-precision normalization.
//!
//! Raw on-chain amounts are fixed-point integers in the token's native precision. `to_decimal`
//! turns them into scale-independent values given the token's decimal count.

use crate::domain::RawAmount;
use alloy_primitives::U256;
use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Largest scale rust_decimal can carry.
const MAX_SCALE: u32 = 28;

/// `10^78` exceeds `U256::MAX`, so any larger pre-division leaves nothing.
const MAX_U256_EXPONENT: u32 = 77;

/// Lossless decimal numeric type for ledger amounts.
///
/// Backed by rust_decimal to avoid floating-point drift.
/// Serializes to a JSON string so stored balances round-trip exactly.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Decimal(#[serde(with = "rust_decimal::serde::str")] RustDecimal);

impl Decimal {
    /// Create a Decimal from a RustDecimal.
    pub fn new(value: RustDecimal) -> Self {
        Decimal(value)
    }

    /// Parse a Decimal from a string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s).map(Decimal)
    }

    /// Format the Decimal as a canonical string (no exponent notation).
    pub fn to_canonical_string(&self) -> String {
        let normalized = self.0.normalize();
        format!("{}", normalized)
    }

    /// Get the underlying RustDecimal.
    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    /// The additive identity (0).
    pub fn zero() -> Self {
        Decimal(RustDecimal::ZERO)
    }

    /// Returns true if the value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Largest representable value; overflowing amounts saturate here.
    pub fn max() -> Self {
        Decimal(RustDecimal::MAX)
    }

    /// `None` when the sum leaves the 96-bit mantissa.
    pub fn checked_add(self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_add(rhs.0).map(Decimal)
    }

    pub fn checked_sub(self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_sub(rhs.0).map(Decimal)
    }

    pub fn saturating_add(self, rhs: Decimal) -> Decimal {
        Decimal(self.0.saturating_add(rhs.0))
    }
}

/// Normalize a raw token amount by `10^decimals`.
///
/// `decimals == 0` returns the raw integer unchanged. The division is carried out on the
/// 256-bit integer first (integer part and remainder), so amounts wider than the 96-bit
/// rust_decimal mantissa still normalize; the remainder keeps at most 28 fractional digits.
pub fn to_decimal(raw: RawAmount, decimals: u32) -> Decimal {
    if decimals == 0 {
        return Decimal(u256_to_rust_decimal(raw.0));
    }

    let mut value = raw.0;
    let mut scale = decimals;
    if scale > MAX_SCALE {
        let excess = scale - MAX_SCALE;
        if excess > MAX_U256_EXPONENT {
            return Decimal::zero();
        }
        value /= pow10(excess);
        scale = MAX_SCALE;
    }

    let divisor = pow10(scale);
    let whole = u256_to_rust_decimal(value / divisor);
    let remainder = value % divisor;
    // remainder < 10^scale <= 10^28, which always fits the mantissa
    let fraction = u256_to_u128(remainder)
        .and_then(|r| RustDecimal::try_from_i128_with_scale(r as i128, scale).ok())
        .unwrap_or(RustDecimal::ZERO);

    Decimal(whole.checked_add(fraction).unwrap_or(whole))
}

/// `10^exponent` by repeated multiplication.
fn pow10(exponent: u32) -> U256 {
    let ten = U256::from(10u64);
    let mut result = U256::from(1u64);
    for _ in 0..exponent {
        result *= ten;
    }
    result
}

/// Lossless narrowing of a 256-bit integer to u128.
pub(crate) fn u256_to_u128(value: U256) -> Option<u128> {
    let limbs = value.as_limbs();
    if limbs[2] != 0 || limbs[3] != 0 {
        return None;
    }
    Some(((limbs[1] as u128) << 64) | limbs[0] as u128)
}

fn u256_to_rust_decimal(value: U256) -> RustDecimal {
    match u256_to_u128(value)
        .and_then(|v| i128::try_from(v).ok())
        .and_then(|v| RustDecimal::try_from_i128_with_scale(v, 0).ok())
    {
        Some(d) => d,
        None => {
            warn!(value = %value, "Raw amount exceeds decimal range, saturating");
            RustDecimal::MAX
        }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Decimal {
    fn from(value: RustDecimal) -> Self {
        Decimal(value)
    }
}

impl From<Decimal> for RustDecimal {
    fn from(value: Decimal) -> Self {
        value.0
    }
}

impl std::ops::Add for Decimal {
    type Output = Decimal;

    fn add(self, rhs: Decimal) -> Decimal {
        Decimal(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::Sub for Decimal {
    type Output = Decimal;

    fn sub(self, rhs: Decimal) -> Decimal {
        Decimal(self.0.saturating_sub(rhs.0))
    }
}

impl std::ops::Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Decimal(-self.0)
    }
}

impl std::iter::Sum for Decimal {
    fn sum<I: Iterator<Item = Decimal>>(iter: I) -> Decimal {
        iter.fold(Decimal::zero(), |acc, d| acc + d)
    }
}
