//! Fixed-point money arithmetic
//!
//! Tablestakes keeps every monetary and chip quantity in base-10 fixed
//! point with two decimal places, stored as `i64` minor units (cents).
//! All ledger aggregation, rate conversion and reconciliation go
//! through this type; binary floating point never enters a balance.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Decimal places carried by every [`Money`] value.
pub const DECIMALS: u32 = 2;

/// Minor units per whole unit (10^DECIMALS).
pub const MINOR_PER_UNIT: i64 = 100;

/// Errors produced by money arithmetic and parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("amount overflow")]
    Overflow,

    #[error("division by zero exchange rate")]
    DivisionByZero,

    #[error("invalid money literal: {0:?}")]
    Parse(String),
}

/// A signed monetary or chip quantity with exactly two decimal places.
///
/// Internally a count of minor units, so addition and subtraction are
/// exact. Multiplication and division by an exchange rate round half
/// away from zero to the nearest minor unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Absolute tolerance used when reconciling room books (0.01).
    pub const RECONCILE_TOLERANCE: Money = Money(1);

    /// Build from minor units (cents).
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Build from whole units.
    pub const fn from_major(major: i64) -> Self {
        Money(major * MINOR_PER_UNIT)
    }

    /// Raw minor units.
    pub const fn minor(self) -> i64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn abs(self) -> Self {
        Money(self.0.abs())
    }

    pub const fn neg(self) -> Self {
        Money(-self.0)
    }

    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or(MoneyError::Overflow)
    }

    pub fn checked_sub(self, other: Self) -> Result<Self, MoneyError> {
        self.0
            .checked_sub(other.0)
            .map(Money)
            .ok_or(MoneyError::Overflow)
    }

    /// Convert a cash amount to chips at `rate` chips per cash unit.
    pub fn to_chips(self, rate: Money) -> Result<Self, MoneyError> {
        let product = (self.0 as i128) * (rate.0 as i128);
        let minor = div_round(product, MINOR_PER_UNIT as i128)?;
        i64::try_from(minor).map(Money).map_err(|_| MoneyError::Overflow)
    }

    /// Convert a chip amount to cash at `rate` chips per cash unit.
    pub fn to_cash(self, rate: Money) -> Result<Self, MoneyError> {
        if rate.0 == 0 {
            return Err(MoneyError::DivisionByZero);
        }
        let scaled = (self.0 as i128) * (MINOR_PER_UNIT as i128);
        let minor = div_round(scaled, rate.0 as i128)?;
        i64::try_from(minor).map(Money).map_err(|_| MoneyError::Overflow)
    }

    /// True when `self` and `other` differ by at most `tolerance`.
    pub fn within(self, other: Self, tolerance: Self) -> bool {
        (self.0 - other.0).abs() <= tolerance.0.abs()
    }

    /// Exact sum of a sequence of amounts.
    pub fn total<I>(amounts: I) -> Result<Self, MoneyError>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, m| acc.checked_add(m))
    }
}

/// Integer division rounding half away from zero.
fn div_round(n: i128, d: i128) -> Result<i128, MoneyError> {
    if d == 0 {
        return Err(MoneyError::DivisionByZero);
    }
    let q = n / d;
    let r = n % d;
    if r == 0 {
        return Ok(q);
    }
    if (r.abs() * 2) >= d.abs() {
        Ok(q + if (n < 0) != (d < 0) { -1 } else { 1 })
    } else {
        Ok(q)
    }
}

impl PartialOrd for Money {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Money {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    /// Parses decimal literals with at most two fractional digits,
    /// e.g. `"100"`, `"12.5"`, `"-0.01"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let err = || MoneyError::Parse(s.to_string());

        let (negative, digits) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw.strip_prefix('+').unwrap_or(raw)),
        };
        if digits.is_empty() {
            return Err(err());
        }

        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(err());
        }
        if frac.len() > DECIMALS as usize {
            return Err(err());
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(err());
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| err())?
        };
        let mut frac_minor: i64 = if frac.is_empty() {
            0
        } else {
            frac.parse().map_err(|_| err())?
        };
        if frac.len() == 1 {
            frac_minor *= 10;
        }

        let minor = whole
            .checked_mul(MINOR_PER_UNIT)
            .and_then(|m| m.checked_add(frac_minor))
            .ok_or(MoneyError::Overflow)?;

        Ok(Money(if negative { -minor } else { minor }))
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    /// Accepts either a decimal string (`"12.34"`) or a JSON number
    /// (`12.34`, `-50`). Numbers are rounded to the nearest cent.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MoneyVisitor;

        impl<'de> Visitor<'de> for MoneyVisitor {
            type Value = Money;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal string or number with at most 2 decimal places")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
                v.parse().map_err(|_| {
                    E::invalid_value(de::Unexpected::Str(v), &self)
                })
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
                v.checked_mul(MINOR_PER_UNIT)
                    .map(Money)
                    .ok_or_else(|| E::custom("amount overflow"))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
                let v = i64::try_from(v).map_err(|_| E::custom("amount overflow"))?;
                self.visit_i64(v)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
                let minor = (v * MINOR_PER_UNIT as f64).round();
                if !minor.is_finite() || minor.abs() >= i64::MAX as f64 {
                    return Err(E::custom("amount overflow"));
                }
                Ok(Money(minor as i64))
            }
        }

        deserializer.deserialize_any(MoneyVisitor)
    }
}
