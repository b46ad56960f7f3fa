//! # Money Module
//!
//! Provides the `Money` and `Quantity` fixed-point types.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  The oracle reports decimals ("$300 cada una"), and the validator       │
//! │  demands EXACT equality between a declared total and the sum of         │
//! │  line-item subtotals. Exactness is impossible in f64.                   │
//! │                                                                         │
//! │  OUR SOLUTION: fixed-point integers                                     │
//! │    Money    = cents        (i64, 2 fractional digits)                   │
//! │    Quantity = thousandths  (i64, 3 fractional digits)                   │
//! │                                                                         │
//! │  Decimal numbers from the oracle are rounded ONCE at the extraction     │
//! │  boundary; everything downstream is integer arithmetic.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use voz_core::money::{Money, Quantity};
//!
//! let price = Money::from_cents(30000);      // $300.00
//! let qty = Quantity::from_milli(2500);      // 2.5 (bulk goods)
//! let subtotal = price.times_quantity(qty);  // $750.00
//! assert_eq!(subtotal.cents(), 75000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative intermediates in reconciliation math
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use voz_core::money::Money;
    ///
    /// let price = Money::from_cents(30000); // Represents $300.00
    /// assert_eq!(price.cents(), 30000);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Normalizes a decimal amount reported by the oracle to cents.
    ///
    /// ## Boundary Use Only
    /// This is the ONE place a float becomes money: the extraction
    /// normalization step. Business code works in cents from then on.
    /// Rounds half away from zero to 2 fractional digits.
    ///
    /// ## Example
    /// ```rust
    /// use voz_core::money::Money;
    ///
    /// assert_eq!(Money::from_decimal(300.0).cents(), 30000);
    /// assert_eq!(Money::from_decimal(0.125).cents(), 13);
    /// ```
    pub fn from_decimal(amount: f64) -> Self {
        Money((amount * 100.0).round() as i64)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn units(&self) -> i64 {
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

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a (possibly fractional) quantity.
    ///
    /// ## Rounding
    /// Quantity carries 3 fractional digits, so the raw product has 5;
    /// the result is rounded half-up back to cents. Uses i128 internally
    /// to prevent overflow on large amounts.
    ///
    /// ## Example
    /// ```rust
    /// use voz_core::money::{Money, Quantity};
    ///
    /// let unit = Money::from_cents(25000);          // $250.00
    /// let half = Quantity::from_milli(500);         // 0.5
    /// assert_eq!(unit.times_quantity(half).cents(), 12500);
    /// ```
    pub fn times_quantity(&self, qty: Quantity) -> Money {
        let raw = self.0 as i128 * qty.milli() as i128;
        // Round half away from zero at the thousandths boundary
        let rounded = if raw >= 0 { (raw + 500) / 1000 } else { (raw - 500) / 1000 };
        Money(rounded as i64)
    }
}

// =============================================================================
// Money Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logging and the CLI driver. Real presentation formatting
/// (locale, thousands separators) belongs to the caller.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.units().abs(), self.cents_part())
    }
}

/// Default money is zero.
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

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Quantity Type
// =============================================================================

/// A sale quantity in fixed-point thousandths.
///
/// ## Why Thousandths?
/// Bulk goods are sold fractionally ("medio kilo de pan" = 0.5). Three
/// fractional digits cover every quantity the oracle produces while keeping
/// subtotal math exact and overflow-safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Quantity(i64);

impl Quantity {
    /// Creates a quantity from thousandths.
    #[inline]
    pub const fn from_milli(milli: i64) -> Self {
        Quantity(milli)
    }

    /// Creates a whole-unit quantity.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units * 1000)
    }

    /// Normalizes a decimal quantity reported by the oracle.
    ///
    /// ## Boundary Use Only
    /// Like [`Money::from_decimal`], this is the single float-to-fixed-point
    /// conversion point. Non-finite input becomes zero, which the validator
    /// then rejects as a non-positive quantity.
    pub fn from_decimal(qty: f64) -> Self {
        if !qty.is_finite() {
            return Quantity(0);
        }
        Quantity((qty * 1000.0).round() as i64)
    }

    /// Returns the value in thousandths.
    #[inline]
    pub const fn milli(&self) -> i64 {
        self.0
    }

    /// Checks if the quantity is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

/// Display trims trailing zeros: `3`, `2.5`, `0.125`.
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 1000 == 0 {
            write!(f, "{}", self.0 / 1000)
        } else {
            let text = format!("{}.{:03}", self.0 / 1000, (self.0 % 1000).abs());
            write!(f, "{}", text.trim_end_matches('0'))
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
