//! # kasir-core: Pricing & Costing Engine for Kasir
//!
//! This crate is the **heart** of Kasir, a point of sale for small
//! food-and-beverage shops. It prices what the cashier sells and costs what
//! the kitchen makes, as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Kasir Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Client (menu grid, cart, checkout)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 kasir-session (commands + state)                │   │
//! │  │   add_to_cart, skip_addons, checkout, restore_draft, ...        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kasir-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐           │   │
//! │  │   │ costing  │ │ pricing  │ │  totals  │ │  draft   │           │   │
//! │  │   │ resolver │ │ add-ons  │ │ discount │ │ untrusted│           │   │
//! │  │   │  cycles  │ │ key      │ │ clamp    │ │ JSON in  │           │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘           │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO GLOBAL CATALOG • PURE FUNCTIONS                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Data Flow
//! ```text
//! Ingredient registry ──► costing ──► CostSheet (informational margin)
//!
//! Add-on catalog ─┐
//! Selections ─────┴──► pricing ──► CartLine ──► totals ──► order payload
//!                                     ▲
//! Persisted draft ──► draft ──────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Ingredient, AddonDefinition, CartLine, ...)
//! - [`money`] - Integer rupiah `Money`
//! - [`costing`] - Recursive ingredient cost resolution with cycle guard
//! - [`pricing`] - Add-on validation, unit price, identity key
//! - [`totals`] - Subtotal, clamped discount, total
//! - [`draft`] - Untrusted JSON to validated cart lines and drafts
//! - [`validation`] - Input and catalog rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use kasir_core::pricing::build_cart_line;
//! use kasir_core::totals::{estimate_totals, Discount};
//! use kasir_core::{AddonDefinition, MenuItem, Money, RequestedAddon};
//!
//! let latte = MenuItem::new("latte", "Iced Latte", Money::from_rupiah(25_000));
//! let catalog = vec![AddonDefinition::new("shot", "Extra shot", Money::from_rupiah(5_000))];
//!
//! let line = build_cart_line(&latte, &[RequestedAddon::new("shot", 1)], &catalog).unwrap();
//! let discount = Discount::new(Money::zero(), 10.0).unwrap();
//! let totals = estimate_totals(&[line], &discount);
//!
//! assert_eq!(totals.subtotal.rupiah(), 30_000);
//! assert_eq!(totals.total.rupiah(), 27_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod costing;
pub mod draft;
pub mod error;
pub mod money;
pub mod pricing;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use costing::{CostReport, CostResolver, CostSheet};
pub use error::{CoreError, CoreResult, CostDiagnostic, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart.
///
/// Sessions may configure a lower limit, never a higher one.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single cart line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: u32 = 999;

/// Highest unit or add-on price accepted from any source.
///
/// Rp 100 million keeps `price × MAX_LINE_QUANTITY × MAX_CART_LINES` far
/// inside `i64`.
pub const MAX_PRICE: Money = Money::from_rupiah(100_000_000);
