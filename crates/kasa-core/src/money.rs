//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    All amounts are i64 cents. Rounding happens in exactly one place    │
//! │    (basis-point multiplication) and is always round-half-up, because   │
//! │    downstream accounting reconciliation depends on reproducing totals  │
//! │    to the cent.                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kasa_core::money::Money;
//!
//! let price = Money::from_cents(1099); // $10.99
//! let line = price * 3;                // $32.97
//! let ten_pct = line.percentage(1000); // $3.30 (rounded half-up)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: return orders carry negated amounts
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Ord derived**: lets callers clamp with `min`/`max` directly
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies by a basis-point factor, rounding half-up.
    ///
    /// This is THE rounding point of the engine. 1 bps = 0.01%, so a 10%
    /// discount is 1000 bps and an 8% tax rate is 800 bps.
    ///
    /// ## Implementation
    /// Integer math in i128 to avoid overflow:
    /// `(cents * bps + 5000) / 10000` — the +5000 rounds the half case up.
    ///
    /// ## Example
    /// ```rust
    /// use kasa_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(1000); // $10.00
    /// assert_eq!(subtotal.percentage(1000).cents(), 100); // 10% = $1.00
    /// assert_eq!(Money::from_cents(999).percentage(825).cents(), 82); // $0.824 → $0.82
    /// assert_eq!(Money::from_cents(1000).percentage(825).cents(), 83); // $0.825 → $0.83
    /// ```
    pub fn percentage(&self, bps: u32) -> Money {
        let cents = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money(cents as i64)
    }

    /// Calculates tax on this amount, rounding half-up.
    ///
    /// ## Example
    /// ```rust
    /// use kasa_core::money::Money;
    /// use kasa_core::types::TaxRate;
    ///
    /// let base = Money::from_cents(900);       // $9.00 taxable base
    /// let rate = TaxRate::from_bps(800);       // 8%
    /// assert_eq!(base.calculate_tax(rate).cents(), 72); // $0.72
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        self.percentage(rate.bps())
    }

    /// Clamps this amount into `[lo, hi]`.
    #[inline]
    pub fn clamp(self, lo: Money, hi: Money) -> Money {
        Money(self.0.clamp(lo.0, hi.0))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly display. Receipt formatting belongs to callers.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
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

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Uniform sign flip for return orders.
impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Summing line amounts into order totals.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
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
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!((-a).cents(), -1000);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, 33].iter().map(|&c| Money::from_cents(c)).sum();
        assert_eq!(total.cents(), 383);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // $10.00 × 8.25% = $0.825 → rounds up to $0.83
        assert_eq!(Money::from_cents(1000).percentage(825).cents(), 83);
        // $9.99 × 8.25% = $0.8242 → $0.82
        assert_eq!(Money::from_cents(999).percentage(825).cents(), 82);
        // exact: $10.00 × 10% = $1.00
        assert_eq!(Money::from_cents(1000).percentage(1000).cents(), 100);
    }

    #[test]
    fn test_tax_calculation() {
        // The spec's worked scenario: $9.00 base at 8% = $0.72
        let base = Money::from_cents(900);
        assert_eq!(base.calculate_tax(TaxRate::from_bps(800)).cents(), 72);
    }

    #[test]
    fn test_clamp() {
        let subtotal = Money::from_cents(1000);
        let over = Money::from_cents(1500);
        assert_eq!(over.clamp(Money::zero(), subtotal).cents(), 1000);
        assert_eq!(Money::from_cents(-5).clamp(Money::zero(), subtotal).cents(), 0);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(Money::from_cents(100).is_positive());
        assert!(Money::from_cents(-100).is_negative());
    }
}
