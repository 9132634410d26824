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
//! │  OUR SOLUTION: Integer Rupiah                                           │
//! │    Every price, discount and total is a whole count of the smallest    │
//! │    currency unit. Rupiah has no minor unit, so Money(1) = Rp 1.        │
//! │                                                                         │
//! │  THE ONE EXCEPTION: Ingredient cost                                    │
//! │    Costs per gram are fractional (Rp 0.63/ml). Cost resolution runs    │
//! │    in f64 and only becomes Money via `round_half_up` when persisted.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kasir_core::money::Money;
//!
//! let price = Money::from_rupiah(18_000);
//! let doubled = price * 2_i64;
//! let total = price + Money::from_rupiah(5_000);
//!
//! assert_eq!(doubled.rupiah(), 36_000);
//! assert_eq!(total.rupiah(), 23_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: differences (margin, price drift) may be negative
/// - **Single field tuple struct**: serializes as a bare JSON number
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  MenuItem.price ──┬──► CartLine.base_price ──► CartLine.unit_price     │
/// │                   │                                  ▲                  │
/// │  Addon.unit_price ┴──► AddonSelection ───────────────┘                  │
/// │                                                                         │
/// │  Σ unit_price × qty ──► subtotal ──► discount ──► total                │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole rupiah.
    #[inline]
    pub const fn from_rupiah(rupiah: i64) -> Self {
        Money(rupiah)
    }

    /// Returns the value in rupiah.
    #[inline]
    pub const fn rupiah(&self) -> i64 {
        self.0
    }

    /// Converts a fractional amount to Money using round-half-up.
    ///
    /// This is the only bridge from floating point into Money. Non-finite
    /// input yields `None` so callers decide what an unusable number means.
    ///
    /// ## Example
    /// ```rust
    /// use kasir_core::money::Money;
    ///
    /// assert_eq!(Money::round_half_up(1234.5), Some(Money::from_rupiah(1235)));
    /// assert_eq!(Money::round_half_up(1234.49), Some(Money::from_rupiah(1234)));
    /// assert_eq!(Money::round_half_up(-2.5), Some(Money::from_rupiah(-2)));
    /// assert_eq!(Money::round_half_up(f64::NAN), None);
    /// ```
    pub fn round_half_up(amount: f64) -> Option<Self> {
        if !amount.is_finite() {
            return None;
        }
        let rounded = (amount + 0.5).floor();
        if rounded > i64::MAX as f64 || rounded < i64::MIN as f64 {
            return None;
        }
        Some(Money(rounded as i64))
    }

    /// Returns the amount as f64, for mixing with fractional costs.
    #[inline]
    pub fn as_f64(&self) -> f64 {
        self.0 as f64
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

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use kasir_core::money::Money;
    ///
    /// let unit_price = Money::from_rupiah(4_000);
    /// assert_eq!(unit_price.multiply_quantity(3).rupiah(), 12_000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Returns the smaller of two amounts.
    #[inline]
    pub fn min(self, other: Money) -> Money {
        Money(self.0.min(other.0))
    }

    /// Returns the larger of two amounts.
    #[inline]
    pub fn max(self, other: Money) -> Money {
        Money(self.0.max(other.0))
    }

    /// Clamps negative amounts to zero.
    #[inline]
    pub fn non_negative(self) -> Money {
        self.max(Money::zero())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================
//
// Arithmetic saturates at the i64 bounds.

/// Debug-friendly rendering. Locale formatting belongs to the client.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            write!(f, "-Rp{}", self.0.unsigned_abs())
        } else {
            write!(f, "Rp{}", self.0)
        }
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
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: u32) -> Self {
        Money(self.0.saturating_mul(qty as i64))
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rupiah() {
        let money = Money::from_rupiah(18_500);
        assert_eq!(money.rupiah(), 18_500);
        assert!(money.is_positive());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_rupiah(10_000)), "Rp10000");
        assert_eq!(format!("{}", Money::from_rupiah(-550)), "-Rp550");
        assert_eq!(format!("{}", Money::zero()), "Rp0");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_rupiah(1000);
        let b = Money::from_rupiah(500);

        assert_eq!((a + b).rupiah(), 1500);
        assert_eq!((a - b).rupiah(), 500);
        let result: Money = a * 3u32;
        assert_eq!(result.rupiah(), 3000);
    }

    #[test]
    fn test_sum() {
        let amounts = [Money::from_rupiah(1), Money::from_rupiah(2), Money::from_rupiah(3)];
        let total: Money = amounts.iter().sum();
        assert_eq!(total.rupiah(), 6);
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(Money::round_half_up(0.5), Some(Money::from_rupiah(1)));
        assert_eq!(Money::round_half_up(1.5), Some(Money::from_rupiah(2)));
        assert_eq!(Money::round_half_up(2.5), Some(Money::from_rupiah(3)));
        assert_eq!(Money::round_half_up(43775.0), Some(Money::from_rupiah(43775)));
        assert_eq!(Money::round_half_up(170.63), Some(Money::from_rupiah(171)));
        assert_eq!(Money::round_half_up(f64::INFINITY), None);
        assert_eq!(Money::round_half_up(1e300), None);
    }

    #[test]
    fn test_min_max_non_negative() {
        let a = Money::from_rupiah(10_000);
        let b = Money::from_rupiah(20_000);
        assert_eq!(a.min(b), a);
        assert_eq!(a.max(b), b);
        assert_eq!(Money::from_rupiah(-5).non_negative(), Money::zero());
    }

    #[test]
    fn test_arithmetic_saturates() {
        let huge = Money::from_rupiah(i64::MAX - 1);
        assert_eq!(huge * 2u32, Money::from_rupiah(i64::MAX));
        assert_eq!(huge * 2i64, Money::from_rupiah(i64::MAX));
        assert_eq!(huge + huge, Money::from_rupiah(i64::MAX));
        assert_eq!(Money::from_rupiah(i64::MIN) - huge, Money::from_rupiah(i64::MIN));
        assert_eq!(huge.multiply_quantity(3), Money::from_rupiah(i64::MAX));

        let total: Money = vec![huge, huge, huge].into_iter().sum();
        assert_eq!(total, Money::from_rupiah(i64::MAX));

        let mut acc = huge;
        acc += huge;
        assert_eq!(acc, Money::from_rupiah(i64::MAX));
    }
}
