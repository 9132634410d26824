//! # Totals Module
//!
//! Folds priced cart lines and discount inputs into order totals.
//!
//! ## Calculation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  subtotal = Σ line.unit_price × line.quantity                          │
//! │                                                                         │
//! │  percent  = subtotal × discount_pct / 100          (f64)               │
//! │  discount = min(subtotal, round_half_up(percent + discount_rp))        │
//! │                                                                         │
//! │  total    = max(0, subtotal − discount + fee)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Discount can never exceed the subtotal. The fee is supplied by the
//! caller (the server computes it) and treated as a non-negative addend.
//!
//! ## Example
//! ```rust
//! use kasir_core::money::Money;
//! use kasir_core::totals::{compute_totals, Discount};
//!
//! let totals = compute_totals(&[], &Discount::none(), Money::zero());
//! assert_eq!(totals.total, Money::zero());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{CartLine, OrderTotals};
use crate::validation::{validate_discount, ValidationResult};

// =============================================================================
// Discount
// =============================================================================

/// Order-level discount: a flat rupiah amount plus a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Discount {
    rp: Money,
    pct: f64,
}

impl Discount {
    /// Creates a validated discount.
    ///
    /// ## Errors
    /// Negative `rp`, or `pct` that is non-finite or outside 0..=100.
    pub fn new(rp: Money, pct: f64) -> ValidationResult<Self> {
        validate_discount(rp, pct)?;
        Ok(Discount { rp, pct })
    }

    /// Builds a discount from untrusted input, clamping instead of failing.
    ///
    /// Negative amounts become 0, the percentage is clamped into 0..=100,
    /// and a non-finite percentage counts as 0.
    pub fn clamped(rp: Money, pct: f64) -> Self {
        let pct = if pct.is_finite() { pct.clamp(0.0, 100.0) } else { 0.0 };
        Discount {
            rp: rp.non_negative(),
            pct,
        }
    }

    pub fn none() -> Self {
        Discount::default()
    }

    pub fn rp(&self) -> Money {
        self.rp
    }

    pub fn pct(&self) -> f64 {
        self.pct
    }

    /// Discount applied to `subtotal`, before clamping to it.
    fn amount_for(&self, subtotal: Money) -> Money {
        let percent = subtotal.as_f64() * self.pct / 100.0;
        Money::round_half_up(percent + self.rp.as_f64()).unwrap_or(self.rp)
    }
}

impl TryFrom<(Money, f64)> for Discount {
    type Error = ValidationError;

    fn try_from((rp, pct): (Money, f64)) -> Result<Self, Self::Error> {
        Discount::new(rp, pct)
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Σ `unit_price × quantity` over the lines.
pub fn subtotal(lines: &[CartLine]) -> Money {
    lines.iter().map(CartLine::line_total).sum()
}

/// Computes order totals.
///
/// Pure: identical inputs always give identical output. A negative `fee`
/// is treated as zero.
pub fn compute_totals(lines: &[CartLine], discount: &Discount, fee: Money) -> OrderTotals {
    let subtotal = subtotal(lines);
    let discount = discount.amount_for(subtotal).min(subtotal).non_negative();
    let fee = fee.non_negative();
    let total = (subtotal - discount + fee).non_negative();

    OrderTotals {
        subtotal,
        discount,
        fee,
        total,
    }
}

/// Local estimate: totals without a server fee.
pub fn estimate_totals(lines: &[CartLine], discount: &Discount) -> OrderTotals {
    compute_totals(lines, discount, Money::zero())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AddonSelection;

    fn line(item: &str, base: i64, addon: i64, qty: u32) -> CartLine {
        let addons = if addon > 0 {
            vec![AddonSelection {
                addon_id: "shot".to_string(),
                name: "Extra shot".to_string(),
                quantity: 1,
                unit_price_at_selection: Money::from_rupiah(addon),
            }]
        } else {
            Vec::new()
        };
        CartLine::assemble(item, item, Money::from_rupiah(base), addons, qty, None)
    }

    #[test]
    fn test_subtotal_uses_unit_price_times_quantity() {
        let lines = vec![line("latte", 25_000, 5_000, 2), line("tea", 8_000, 0, 3)];
        assert_eq!(subtotal(&lines).rupiah(), 84_000);
    }

    #[test]
    fn test_discount_clamped_to_subtotal() {
        let lines = vec![line("tea", 10_000, 0, 1)];
        let discount = Discount::new(Money::from_rupiah(20_000), 0.0).unwrap();

        let totals = compute_totals(&lines, &discount, Money::zero());
        assert_eq!(totals.subtotal.rupiah(), 10_000);
        assert_eq!(totals.discount.rupiah(), 10_000);
        assert_eq!(totals.total.rupiah(), 0);
    }

    #[test]
    fn test_percent_and_flat_discount_combine() {
        let lines = vec![line("latte", 25_000, 0, 1)];
        let discount = Discount::new(Money::from_rupiah(1_000), 10.0).unwrap();

        let totals = estimate_totals(&lines, &discount);
        assert_eq!(totals.discount.rupiah(), 3_500);
        assert_eq!(totals.total.rupiah(), 21_500);
    }

    #[test]
    fn test_percent_discount_rounds_half_up() {
        // 12.5% of 8_500 = 1_062.5
        let lines = vec![line("tea", 8_500, 0, 1)];
        let discount = Discount::new(Money::zero(), 12.5).unwrap();
        assert_eq!(estimate_totals(&lines, &discount).discount.rupiah(), 1_063);
    }

    #[test]
    fn test_fee_is_added_after_discount() {
        let lines = vec![line("tea", 10_000, 0, 1)];
        let discount = Discount::new(Money::from_rupiah(20_000), 0.0).unwrap();

        let totals = compute_totals(&lines, &discount, Money::from_rupiah(2_000));
        assert_eq!(totals.fee.rupiah(), 2_000);
        assert_eq!(totals.total.rupiah(), 2_000);

        let negative_fee = compute_totals(&lines, &Discount::none(), Money::from_rupiah(-500));
        assert_eq!(negative_fee.fee, Money::zero());
        assert_eq!(negative_fee.total.rupiah(), 10_000);
    }

    #[test]
    fn test_empty_cart() {
        let discount = Discount::new(Money::from_rupiah(5_000), 50.0).unwrap();
        let totals = estimate_totals(&[], &discount);
        assert_eq!(totals, OrderTotals::default());
    }

    #[test]
    fn test_discount_validation_and_clamping() {
        assert!(Discount::new(Money::from_rupiah(-1), 0.0).is_err());
        assert!(Discount::new(Money::zero(), 101.0).is_err());
        assert!(Discount::try_from((Money::zero(), 50.0)).is_ok());

        let clamped = Discount::clamped(Money::from_rupiah(-1), 150.0);
        assert_eq!(clamped.rp(), Money::zero());
        assert_eq!(clamped.pct(), 100.0);
        assert_eq!(Discount::clamped(Money::zero(), f64::NAN).pct(), 0.0);
    }

    #[test]
    fn test_idempotent() {
        let lines = vec![line("latte", 25_000, 5_000, 2)];
        let discount = Discount::new(Money::from_rupiah(1_500), 7.5).unwrap();
        assert_eq!(
            estimate_totals(&lines, &discount),
            estimate_totals(&lines, &discount)
        );
    }

    #[test]
    fn test_oversized_lines_do_not_overflow() {
        let lines = vec![line("x", 5_000_000_000_000_000_000, 0, 2), line("y", i64::MAX, 0, 1)];
        let totals = estimate_totals(&lines, &Discount::none());
        assert_eq!(totals.subtotal, Money::from_rupiah(i64::MAX));
        assert_eq!(totals.total, Money::from_rupiah(i64::MAX));

        let discounted = estimate_totals(&lines, &Discount::new(Money::zero(), 10.0).unwrap());
        assert!(discounted.total < discounted.subtotal);
        assert!(discounted.total.is_positive());
    }
}
