//! Exact monetary amounts.
//!
//! Amounts are kept as integer ten-thousandths of the store currency so that
//! threshold comparisons never go through floating point. Four fractional
//! digits cover every ISO 4217 minor unit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fractional digits kept by [`Money`].
const SCALE_DIGITS: usize = 4;
const SCALE: i64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid amount: {0:?}")]
pub struct InvalidAmount(pub String);

/// A non-negative amount in the store currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Build from ten-thousandths of a currency unit (the storage form).
    pub fn from_units(units: i64) -> Result<Self, InvalidAmount> {
        if units < 0 {
            return Err(InvalidAmount(units.to_string()));
        }
        Ok(Self(units))
    }

    /// Whole currency units, e.g. `Money::whole(500)` is 500.00.
    #[cfg(test)]
    pub fn whole(amount: u32) -> Self {
        Self(i64::from(amount) * SCALE)
    }

    pub fn units(&self) -> i64 {
        self.0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }
}

impl FromStr for Money {
    type Err = InvalidAmount;

    /// Parse a plain decimal string such as `"499.99"` or `"12"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidAmount(s.to_string());
        let trimmed = s.trim();

        let (whole, frac) = match trimmed.split_once('.') {
            Some((w, f)) => (w, f),
            None => (trimmed, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        // Digits past the fourth place are only accepted when they are zeros.
        let (kept, dropped) = frac.split_at(frac.len().min(SCALE_DIGITS));
        if dropped.chars().any(|c| c != '0') {
            return Err(invalid());
        }

        let whole_units: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let frac_units: i64 = if kept.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", kept, width = SCALE_DIGITS);
            padded.parse().map_err(|_| invalid())?
        };

        whole_units
            .checked_mul(SCALE)
            .and_then(|u| u.checked_add(frac_units))
            .map(Money)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / SCALE;
        let frac = format!("{:04}", self.0 % SCALE);
        // Always show at least two places, drop trailing zeros beyond that.
        let frac = frac.trim_end_matches('0');
        write!(f, "{}.{:0<2}", whole, frac)
    }
}

impl TryFrom<String> for Money {
    type Error = InvalidAmount;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Money> for String {
    fn from(value: Money) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amounts() {
        assert_eq!("500".parse::<Money>().unwrap(), Money::whole(500));
        assert_eq!("499.99".parse::<Money>().unwrap().units(), 4_999_900);
        assert_eq!("0.5".parse::<Money>().unwrap().units(), 5_000);
        assert_eq!(".25".parse::<Money>().unwrap().units(), 2_500);
        assert_eq!("12.345".parse::<Money>().unwrap().units(), 123_450);
        assert_eq!("1.230000".parse::<Money>().unwrap().units(), 12_300);
    }

    #[test]
    fn test_rejects_malformed() {
        assert!("".parse::<Money>().is_err());
        assert!(".".parse::<Money>().is_err());
        assert!("-5".parse::<Money>().is_err());
        assert!("1,000".parse::<Money>().is_err());
        assert!("1.00001".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::whole(500).to_string(), "500.00");
        assert_eq!("0.5".parse::<Money>().unwrap().to_string(), "0.50");
        assert_eq!("12.345".parse::<Money>().unwrap().to_string(), "12.345");
    }

    #[test]
    fn test_decimal_sum_is_exact() {
        let a: Money = "0.1".parse().unwrap();
        let b: Money = "0.2".parse().unwrap();
        assert_eq!(a.checked_add(b), Some("0.3".parse().unwrap()));
    }

    #[test]
    fn test_negative_units_rejected() {
        assert!(Money::from_units(-1).is_err());
        assert_eq!(Money::from_units(0).unwrap(), Money::ZERO);
    }
}
