//! # Money
//!
//! Monetary amounts in minor units (centavos).
//!
//! The backend serializes amounts as decimal strings (`"42.50"`). The
//! terminal converts them to an integer count of centavos on the way in, so
//! every comparison is exact at the cent.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

/// An amount of store currency in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Create from minor units (centavos).
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Create from a decimal amount, rounding at the cent.
    pub fn from_major(amount: f64) -> Self {
        Money((amount * 100.0).round() as i64)
    }

    /// Amount in minor units.
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Parse cashier-typed input such as `"50"`, `"50.0"` or `"42.50"`.
    ///
    /// Returns `None` for anything that is not a finite number.
    pub fn parse(input: &str) -> Option<Money> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }
        let value: f64 = trimmed.parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        Some(Money::from_major(value))
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Difference floored at zero, used for change due.
    pub fn saturating_sub(&self, other: Money) -> Money {
        Money((self.0 - other.0).max(0))
    }

    /// Line total for `quantity` units at this unit price. Saturates at the
    /// `i64` limits rather than overflowing.
    pub fn times(&self, quantity: u32) -> Money {
        Money(self.0.saturating_mul(i64::from(quantity)))
    }

    /// Wire form expected by the backend: a plain decimal string, two
    /// fractional digits, no currency symbol.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        format!("{}{}.{:02}", sign, abs / 100, abs % 100)
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
        write!(f, "${}", self.to_decimal_string())
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_decimal_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => {
                if !value.is_finite() {
                    return Err(de::Error::custom("non-finite amount"));
                }
                Ok(Money::from_major(value))
            }
            Raw::Text(text) => Money::parse(&text)
                .ok_or_else(|| de::Error::custom(format!("invalid decimal amount: {text:?}"))),
        }
    }
}
