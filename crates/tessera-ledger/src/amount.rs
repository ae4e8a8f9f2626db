//! Fixed-point amount representation.
//!
//! Every balance, allowance, and resolved price in the ledger is an [`Amount`]
//! of base units. The number of decimals an amount carries is a property of
//! the currency it denominates (native coin, a registered token, or the
//! market's reference base), not of the amount itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// A quantity of base units of some currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    /// Zero units.
    pub const ZERO: Self = Self(0);

    /// Maximum representable amount.
    pub const MAX: Self = Self(u64::MAX);

    /// Create an amount from base units.
    #[must_use]
    pub const fn from_units(units: u64) -> Self {
        Self(units)
    }

    /// Create an amount from a whole number of coins at the given decimal
    /// precision. Returns `None` on overflow.
    #[must_use]
    pub fn coins(whole: u64, decimals: u32) -> Option<Self> {
        let scale = 10u64.checked_pow(decimals)?;
        whole.checked_mul(scale).map(Self)
    }

    /// Get the amount in base units.
    #[must_use]
    pub const fn units(&self) -> u64 {
        self.0
    }

    /// Check if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Saturating addition.
    #[must_use]
    pub const fn saturating_add(&self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction.
    #[must_use]
    pub const fn saturating_sub(&self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Checked addition.
    #[must_use]
    pub const fn checked_add(&self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(units) => Some(Self(units)),
            None => None,
        }
    }

    /// Checked subtraction.
    #[must_use]
    pub const fn checked_sub(&self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(units) => Some(Self(units)),
            None => None,
        }
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

impl From<u64> for Amount {
    fn from(units: u64) -> Self {
        Self(units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_units() {
        let amount = Amount::from_units(1_000);
        assert_eq!(amount.units(), 1_000);
    }

    #[test]
    fn test_coins_scaling() {
        let amount = Amount::coins(5, 9).expect("should scale");
        assert_eq!(amount.units(), 5_000_000_000);
    }

    #[test]
    fn test_coins_overflow() {
        assert!(Amount::coins(u64::MAX, 9).is_none());
    }

    #[test]
    fn test_zero() {
        assert!(Amount::ZERO.is_zero());
        assert_eq!(Amount::default(), Amount::ZERO);
    }

    #[test]
    fn test_add_sub() {
        let a = Amount::from_units(30);
        let b = Amount::from_units(12);
        assert_eq!((a + b).units(), 42);
        assert_eq!((a - b).units(), 18);
    }

    #[test]
    fn test_saturating_ops() {
        assert_eq!(Amount::MAX.saturating_add(Amount::from_units(1)), Amount::MAX);
        assert!(Amount::ZERO.saturating_sub(Amount::from_units(1)).is_zero());
    }

    #[test]
    fn test_checked_ops() {
        assert!(Amount::MAX.checked_add(Amount::from_units(1)).is_none());
        assert!(Amount::ZERO.checked_sub(Amount::from_units(1)).is_none());
        assert_eq!(
            Amount::from_units(10).checked_sub(Amount::from_units(4)),
            Some(Amount::from_units(6))
        );
    }

    #[test]
    fn test_ordering() {
        assert!(Amount::from_units(1) < Amount::from_units(2));
    }

    #[test]
    fn test_serialization_transparent() {
        let amount = Amount::from_units(77);
        let json = serde_json::to_string(&amount).expect("serialize");
        assert_eq!(json, "77");
        let parsed: Amount = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(amount, parsed);
    }
}
