//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    10 cents + 20 cents = 30 cents → "0.30"                              │
//! │    1290 cents * 3 = 3870 cents → "38.70"                                │
//! │                                                                         │
//! │  The remote cart sends amounts as decimal STRINGS ("38.70"); they are  │
//! │  parsed digit by digit, never through f64.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use label_core::money::Money;
//!
//! let price = Money::from_cents(1290); // 12.90 EUR
//! let line = price * 2u32;
//! assert_eq!(line.to_decimal_string(), "25.80");
//!
//! let remote = Money::parse_decimal("38.70").unwrap();
//! assert_eq!(remote.cents(), 3870);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: the remote may report discounts as negative lines
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Single currency**: the shop sells in EUR only
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (euros) portion.
    #[inline]
    pub const fn euros(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use label_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(1290);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 3870);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: u32) -> Self {
        Money(self.0 * qty as i64)
    }

    /// Parses a decimal amount as sent by the remote cart ("12.9", "12.90", "12").
    ///
    /// ## Rules
    /// - Optional leading `-`
    /// - At most two fractional digits
    /// - Digits only otherwise (no exponent, no thousands separator)
    pub fn parse_decimal(raw: &str) -> CoreResult<Money> {
        let invalid = || CoreError::InvalidAmount(raw.to_string());
        let trimmed = raw.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (whole, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if frac.len() > 2
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole_cents = if whole.is_empty() {
            0
        } else {
            whole
                .parse::<i64>()
                .map_err(|_| invalid())?
                .checked_mul(100)
                .ok_or_else(invalid)?
        };
        let frac_cents = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => frac.parse::<i64>().map_err(|_| invalid())?,
        };

        let cents = whole_cents + frac_cents;
        Ok(Money(if negative { -cents } else { cents }))
    }

    /// Formats as a plain decimal with two fractional digits ("25.80").
    ///
    /// This is the format the remote cart expects and returns.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.euros().abs(), self.cents_part())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the amount with the euro sign, e.g. "€25.80".
///
/// ## Note
/// This is for logs. The configurator formats prices with the
/// browser's locale ("25,80 €").
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}€{}.{:02}", sign, self.euros().abs(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Multiplication by a label quantity.
impl Mul<u32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: u32) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1290);
        assert_eq!(money.cents(), 1290);
        assert_eq!(money.euros(), 12);
        assert_eq!(money.cents_part(), 90);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(2580)), "€25.80");
        assert_eq!(format!("{}", Money::from_cents(0)), "€0.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-€5.50");
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(Money::parse_decimal("12.90").unwrap().cents(), 1290);
        assert_eq!(Money::parse_decimal("12.9").unwrap().cents(), 1290);
        assert_eq!(Money::parse_decimal("38").unwrap().cents(), 3800);
        assert_eq!(Money::parse_decimal("0.0").unwrap().cents(), 0);
        assert_eq!(Money::parse_decimal(".5").unwrap().cents(), 50);
        assert_eq!(Money::parse_decimal("-1.05").unwrap().cents(), -105);
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        assert!(Money::parse_decimal("").is_err());
        assert!(Money::parse_decimal(".").is_err());
        assert!(Money::parse_decimal("12.905").is_err());
        assert!(Money::parse_decimal("1e3").is_err());
        assert!(Money::parse_decimal("1,50").is_err());
    }

    #[test]
    fn test_to_decimal_string() {
        assert_eq!(Money::from_cents(3870).to_decimal_string(), "38.70");
        assert_eq!(Money::from_cents(5).to_decimal_string(), "0.05");
        assert_eq!(Money::zero().to_decimal_string(), "0.00");
    }

    /// Cent sums stay exact where the float sum drifts
    #[test]
    fn test_arithmetic_is_exact() {
        let unit = Money::from_cents(1290);
        assert_eq!((unit * 3u32).to_decimal_string(), "38.70");

        let cents = Money::from_cents(10) + Money::from_cents(20);
        assert_eq!(cents, Money::from_cents(30));
        assert_ne!(0.1_f64 + 0.2, 0.3);

        let total = unit * 3u32 + Money::from_cents(10) + Money::from_cents(20);
        assert_eq!(total.to_decimal_string(), "39.00");
    }

    #[test]
    fn test_sum() {
        let total: Money = [Money::from_cents(2580), Money::from_cents(1290)]
            .into_iter()
            .sum();
        assert_eq!(total.cents(), 3870);
    }
}
