//! # Cart State
//!
//! The in-progress order: priced lines plus checkout details.
//!
//! ## Cart Structure
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart                                                                   │
//! │  ├── lines: Vec<CartLine>                                               │
//! │  │   ├── "latte|shot=1,sugar=1"   × 2   @ Rp30000                      │
//! │  │   └── "tea"                    × 1   @ Rp8000                       │
//! │  ├── discount_rp / discount_pct                                         │
//! │  ├── customer_name / customer_phone / send_notif                        │
//! │  ├── payment_method                                                     │
//! │  └── created_at                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines are unique by identity key: adding an economically identical line
//! bumps the existing quantity instead of appending.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

use kasir_core::draft::merge_duplicate_lines;
use kasir_core::totals::{compute_totals, Discount};
use kasir_core::{
    CartLine, CoreError, CoreResult, DraftOrder, Money, OrderTotals, PaymentMethod,
    ValidationError,
};

use crate::state::config::CartConfig;

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `identity_key`
/// - Every line has `1 ≤ quantity ≤ max_line_quantity`
/// - At most `max_lines` lines
/// - Discount is validated on the way in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub lines: Vec<CartLine>,
    pub discount_rp: Money,
    pub discount_pct: f64,
    pub customer_name: String,
    pub customer_phone: String,
    pub send_notif: bool,
    pub payment_method: PaymentMethod,

    /// When the cart was created or last cleared
    pub created_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new()
    }
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            discount_rp: Money::zero(),
            discount_pct: 0.0,
            customer_name: String::new(),
            customer_phone: String::new(),
            send_notif: false,
            payment_method: PaymentMethod::default(),
            created_at: Utc::now(),
        }
    }

    /// Adds `quantity` units of a priced line, merging by identity key.
    ///
    /// ## Behavior
    /// - Key already in cart: quantities are summed; the existing notes are
    ///   kept, and the incoming notes are used only when it has none
    /// - Key not in cart: line appended with `quantity`
    ///
    /// Returns the identity key of the affected line.
    pub fn add_line(
        &mut self,
        mut line: CartLine,
        quantity: u32,
        limits: &CartConfig,
    ) -> CoreResult<String> {
        let quantity = quantity.max(1);

        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|l| l.identity_key == line.identity_key)
        {
            let new_qty = existing.quantity.saturating_add(quantity);
            if new_qty > limits.max_line_quantity {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: limits.max_line_quantity,
                });
            }
            existing.quantity = new_qty;
            if existing.notes.is_none() {
                existing.notes = line.notes.take();
            } else if line.notes.is_some() {
                debug!(identity_key = %existing.identity_key, "Keeping existing notes on merge");
            }
            return Ok(existing.identity_key.to_string());
        }

        if self.lines.len() >= limits.max_lines {
            return Err(CoreError::CartTooLarge {
                max: limits.max_lines,
            });
        }

        if quantity > limits.max_line_quantity {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: limits.max_line_quantity,
            });
        }

        line.quantity = quantity;
        let key = line.identity_key.to_string();
        self.lines.push(line);
        Ok(key)
    }

    /// Sets the quantity of a line. Zero or less removes it.
    pub fn update_quantity(
        &mut self,
        identity_key: &str,
        quantity: i64,
        limits: &CartConfig,
    ) -> CoreResult<()> {
        if quantity <= 0 {
            return self.remove_line(identity_key).map(|_| ());
        }

        if quantity > i64::from(limits.max_line_quantity) {
            return Err(CoreError::QuantityTooLarge {
                requested: u32::try_from(quantity).unwrap_or(u32::MAX),
                max: limits.max_line_quantity,
            });
        }

        let line = self.line_mut(identity_key)?;
        line.quantity = quantity as u32;
        Ok(())
    }

    /// Sets or clears the notes of a line. Notes never change the key.
    pub fn set_notes(&mut self, identity_key: &str, notes: Option<String>) -> CoreResult<()> {
        let notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        self.line_mut(identity_key)?.notes = notes;
        Ok(())
    }

    /// Removes a line by identity key.
    pub fn remove_line(&mut self, identity_key: &str) -> CoreResult<CartLine> {
        let index = self
            .lines
            .iter()
            .position(|l| l.identity_key.as_str() == identity_key)
            .ok_or_else(|| CoreError::LineNotFound(identity_key.to_string()))?;
        Ok(self.lines.remove(index))
    }

    fn line_mut(&mut self, identity_key: &str) -> CoreResult<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|l| l.identity_key.as_str() == identity_key)
            .ok_or_else(|| CoreError::LineNotFound(identity_key.to_string()))
    }

    /// Sets the order discount after validating it.
    pub fn set_discount(&mut self, rp: Money, pct: f64) -> Result<(), ValidationError> {
        let discount = Discount::new(rp, pct)?;
        self.discount_rp = discount.rp();
        self.discount_pct = discount.pct();
        Ok(())
    }

    /// The discount as the totals aggregator sees it.
    pub fn discount(&self) -> Discount {
        Discount::clamped(self.discount_rp, self.discount_pct)
    }

    /// Clears lines and checkout details.
    pub fn clear(&mut self) {
        *self = Cart::new();
    }

    /// Totals with the given fee.
    pub fn totals(&self, fee: Money) -> OrderTotals {
        compute_totals(&self.lines, &self.discount(), fee)
    }

    /// Returns the number of lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns the total quantity across lines.
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    // =========================================================================
    // Drafts
    // =========================================================================

    /// Captures the cart as a persistable draft.
    pub fn to_draft(&self, now: DateTime<Utc>) -> DraftOrder {
        DraftOrder {
            cart: self.lines.clone(),
            discount_rp: self.discount_rp,
            discount_pct: self.discount_pct,
            customer_name: self.customer_name.clone(),
            customer_phone: self.customer_phone.clone(),
            send_notif: self.send_notif,
            payment_method: self.payment_method,
            timestamp: now,
        }
    }

    /// Replaces the cart with a normalized draft, enforcing the limits.
    ///
    /// Lines beyond `max_lines` are dropped; quantities are capped but never
    /// fall below 1. Returns the number of lines dropped.
    pub fn restore(&mut self, draft: DraftOrder, limits: &CartConfig) -> usize {
        let mut lines = merge_duplicate_lines(draft.cart);
        let dropped = lines.len().saturating_sub(limits.max_lines);
        if dropped > 0 {
            warn!(
                lines = lines.len(),
                max = limits.max_lines,
                "Draft has more lines than allowed, dropping the rest"
            );
            lines.truncate(limits.max_lines);
        }
        for line in &mut lines {
            line.quantity = line.quantity.min(limits.max_line_quantity).max(1);
        }

        let discount = Discount::clamped(draft.discount_rp, draft.discount_pct);
        *self = Cart {
            lines,
            discount_rp: discount.rp(),
            discount_pct: discount.pct(),
            customer_name: draft.customer_name,
            customer_phone: draft.customer_phone,
            send_notif: draft.send_notif,
            payment_method: draft.payment_method,
            created_at: Utc::now(),
        };
        dropped
    }
}

// =============================================================================
// Cart State
// =============================================================================

/// Session-owned cart state.
///
/// ## Thread Safety
/// Uses `Arc<Mutex<Cart>>`: the cart is the one shared mutable resource
/// and every mutation is serialized through the lock. A poisoned lock
/// still yields the cart; its invariants hold between operations.
#[derive(Debug, Clone, Default)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
}

impl CartState {
    /// Creates a new empty cart state.
    pub fn new() -> Self {
        CartState::default()
    }

    /// Executes a function with read access to the cart.
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = self.cart.lock().unwrap_or_else(PoisonError::into_inner);
        f(&cart)
    }

    /// Executes a function with write access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// cart_state.with_cart_mut(|cart| cart.add_line(line, 1, &config.cart))?;
    /// ```
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut cart = self.cart.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut cart)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
