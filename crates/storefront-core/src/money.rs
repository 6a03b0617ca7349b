//! Currency amounts in minor units.
//!
//! Prices, line totals and tax are kept as whole cents so that
//! `grand_total == subtotal + gst` holds exactly. On the wire they are plain
//! decimal numbers (`45000.0`, `8100.18`).

use crate::error::{Result, ShopError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    /// Parse a decimal amount, rounding to the nearest cent.
    pub fn from_decimal(amount: f64) -> Result<Self> {
        if !amount.is_finite() {
            return Err(ShopError::InvalidPrice(amount.to_string()));
        }
        if amount < 0.0 {
            return Err(ShopError::InvalidPrice(format!("{amount} is negative")));
        }
        let cents = (amount * 100.0).round();
        if cents > i64::MAX as f64 {
            return Err(ShopError::InvalidPrice(format!("{amount} is too large")));
        }
        Ok(Money(cents as i64))
    }

    pub fn to_decimal(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn times(self, quantity: i64) -> Money {
        Money(self.0.saturating_mul(quantity))
    }

    /// Tax owed on this amount, rounded half up to the cent.
    pub fn tax(self, rate: TaxRate) -> Money {
        let scaled = self.0 as i128 * rate.basis_points() as i128;
        let rounded = (scaled + 5_000).div_euclid(10_000);
        Money(rounded.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_decimal())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        Money::from_decimal(amount).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// TaxRate
// ---------------------------------------------------------------------------

/// A tax rate in basis points (1800 = 18%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate(u32);

impl TaxRate {
    pub const GST: TaxRate = TaxRate(1_800);

    pub fn from_basis_points(bps: u32) -> Self {
        TaxRate(bps)
    }

    pub fn basis_points(self) -> u32 {
        self.0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::GST
    }
}
