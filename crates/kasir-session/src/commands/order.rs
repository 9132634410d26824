//! # Order Commands
//!
//! Pre-submission verification and the order payload.
//!
//! ## Submission Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart (prices frozen when each line was added)                          │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  verify_cart ── rebuild every line against the current catalog          │
//! │         │                                                               │
//! │    ┌────┴─────────────────────┐                                         │
//! │    ▼                          ▼                                         │
//! │  clean                     drift                                        │
//! │    │                          │                                         │
//! │    ▼                          ▼                                         │
//! │  OrderPayload              PRICE_DRIFT + one detail per line            │
//! │  (clientRef, items,           │                                         │
//! │   subtotal, discount,         ▼                                         │
//! │   fee, total, ...)         accept_current_prices ──► verify again       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Verification never changes the cart; only `accept_current_prices` does,
//! and only when the cashier asks for it.

use serde::Serialize;
use tracing::{debug, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use kasir_core::pricing::rebuild_cart_line;
use kasir_core::totals::{compute_totals, Discount};
use kasir_core::{
    CartLine, Money, OrderLinePayload, OrderTotals, PaymentMethod, ValidationError,
};

use crate::commands::cart::CartResponse;
use crate::error::{ApiError, ErrorCode};
use crate::state::{CartState, CatalogSnapshot, CatalogState, SessionConfig};

// =============================================================================
// Verification
// =============================================================================

/// How a cart line compares with the current catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LineDrift {
    Unchanged,

    /// Same choices, different unit price.
    PriceChanged { expected: Money, actual: Money },

    /// The choices no longer satisfy the add-on catalog.
    Rejected { errors: Vec<ValidationError> },

    /// The menu item was removed or deactivated.
    ItemUnavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineCheck {
    pub identity_key: String,
    pub name: String,
    #[serde(flatten)]
    pub drift: LineDrift,
}

impl LineCheck {
    /// Detail line for the drift banner; `None` when unchanged.
    fn describe(&self) -> Option<String> {
        match &self.drift {
            LineDrift::Unchanged => None,
            LineDrift::PriceChanged { expected, actual } => Some(format!(
                "{}: price changed from {} to {}",
                self.name, expected, actual
            )),
            LineDrift::Rejected { errors } => Some(format!(
                "{}: {}",
                self.name,
                errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ")
            )),
            LineDrift::ItemUnavailable => Some(format!("{}: no longer available", self.name)),
        }
    }
}

/// Result of checking a cart against the current catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub lines: Vec<LineCheck>,
    /// Totals of the cart as it stands.
    pub totals: OrderTotals,
}

impl VerificationReport {
    /// True when every line still prices the same.
    pub fn is_clean(&self) -> bool {
        self.lines.iter().all(|l| l.drift == LineDrift::Unchanged)
    }

    /// One message per drifting line.
    pub fn details(&self) -> Vec<String> {
        self.lines.iter().filter_map(LineCheck::describe).collect()
    }
}

/// Rebuilds `line` against the snapshot, or says why it cannot be.
fn reprice(line: &CartLine, snapshot: &CatalogSnapshot) -> Result<CartLine, LineDrift> {
    let item = snapshot
        .menu_item(&line.item_id)
        .filter(|item| item.is_active)
        .ok_or(LineDrift::ItemUnavailable)?;

    rebuild_cart_line(line, item, snapshot.addons_for(&item.id))
        .map_err(|errors| LineDrift::Rejected { errors })
}

/// Compares every line with the current catalog and recomputes totals.
pub fn verify_cart(
    lines: &[CartLine],
    snapshot: &CatalogSnapshot,
    discount: &Discount,
    fee: Money,
) -> VerificationReport {
    let checks = lines
        .iter()
        .map(|line| {
            let drift = match reprice(line, snapshot) {
                Ok(current) if current.unit_price == line.unit_price => LineDrift::Unchanged,
                Ok(current) => LineDrift::PriceChanged {
                    expected: line.unit_price,
                    actual: current.unit_price,
                },
                Err(drift) => drift,
            };
            LineCheck {
                identity_key: line.identity_key.to_string(),
                name: line.name.clone(),
                drift,
            }
        })
        .collect();

    VerificationReport {
        lines: checks,
        totals: compute_totals(lines, discount, fee),
    }
}

/// Verifies the session cart without changing it.
pub fn check_cart(
    catalog: &CatalogState,
    cart: &CartState,
    config: &SessionConfig,
) -> VerificationReport {
    debug!("check_cart command");

    let snapshot = catalog.snapshot();
    cart.with_cart(|c| verify_cart(&c.lines, &snapshot, &c.discount(), config.order.default_fee))
}

/// Replaces drifted lines with their current pricing.
///
/// Lines that can no longer be built are removed. Returns the updated cart
/// and the names of the removed lines.
pub fn accept_current_prices(
    catalog: &CatalogState,
    cart: &CartState,
    config: &SessionConfig,
) -> (CartResponse, Vec<String>) {
    debug!("accept_current_prices command");

    let snapshot = catalog.snapshot();
    cart.with_cart_mut(|c| {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(c.lines.len());

        for line in c.lines.drain(..) {
            match reprice(&line, &snapshot) {
                Ok(current) => kept.push(current),
                Err(drift) => {
                    warn!(identity_key = %line.identity_key, drift = ?drift, "Dropping line");
                    removed.push(line.name);
                }
            }
        }

        c.lines = kept;
        (CartResponse::new(c, config.order.default_fee), removed)
    })
}

// =============================================================================
// Order Payload
// =============================================================================

/// The order as submitted to the backend.
///
/// `clientRef` is generated per submission so retries can be deduplicated
/// downstream.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub client_ref: String,
    pub items: Vec<OrderLinePayload>,
    pub subtotal: Money,
    pub discount: Money,
    pub fee: Money,
    pub total: Money,
    pub discount_rp: Money,
    pub discount_pct: f64,
    pub customer_name: String,
    pub customer_phone: String,
    pub send_notif: bool,
    pub payment_method: PaymentMethod,
}

/// Verifies the cart and builds the submission payload.
///
/// ## Errors
/// - `CART_ERROR` when the cart is empty
/// - `PRICE_DRIFT` when any line no longer matches the catalog, with one
///   detail per line
pub fn prepare_order(
    catalog: &CatalogState,
    cart: &CartState,
    config: &SessionConfig,
) -> Result<OrderPayload, ApiError> {
    debug!("prepare_order command");

    let snapshot = catalog.snapshot();
    let fee = config.order.default_fee;

    cart.with_cart(|c| {
        if c.is_empty() {
            return Err(ApiError::cart("Cart is empty"));
        }

        let report = verify_cart(&c.lines, &snapshot, &c.discount(), fee);
        if !report.is_clean() {
            let details = report.details();
            warn!(lines = details.len(), "Cart drifted from catalog");
            return Err(ApiError::new(
                ErrorCode::PriceDrift,
                "Some prices changed since the items were added",
            )
            .with_details(details));
        }

        let totals = report.totals;
        let payload = OrderPayload {
            client_ref: Uuid::new_v4().to_string(),
            items: c.lines.iter().map(OrderLinePayload::from).collect(),
            subtotal: totals.subtotal,
            discount: totals.discount,
            fee: totals.fee,
            total: totals.total,
            discount_rp: c.discount_rp,
            discount_pct: c.discount_pct,
            customer_name: c.customer_name.clone(),
            customer_phone: c.customer_phone.clone(),
            send_notif: c.send_notif,
            payment_method: c.payment_method,
        };

        info!(
            client_ref = %payload.client_ref,
            lines = payload.items.len(),
            total = %payload.total,
            "Order payload prepared"
        );
        Ok(payload)
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::{add_to_cart, set_discount, AddToCartRequest};
    use kasir_core::{AddonDefinition, MenuItem, RequestedAddon};
    use std::collections::HashMap;

    fn snapshot(latte_price: i64, shot_price: i64) -> CatalogSnapshot {
        let mut addons = HashMap::new();
        addons.insert(
            "latte".to_string(),
            vec![AddonDefinition::new("shot", "Extra shot", Money::from_rupiah(shot_price)).with_max(2)],
        );
        CatalogSnapshot {
            menu: vec![
                MenuItem::new("latte", "Iced Latte", Money::from_rupiah(latte_price)),
                MenuItem::new("tea", "Es Teh", Money::from_rupiah(8_000)),
            ],
            addons,
            ..Default::default()
        }
    }

    fn filled_cart(catalog: &CatalogState, config: &SessionConfig) -> CartState {
        let cart = CartState::new();
        add_to_cart(
            catalog,
            &cart,
            config,
            AddToCartRequest {
                item_id: "latte".into(),
                addons: vec![RequestedAddon::new("shot", 1)],
                quantity: Some(2),
                notes: None,
            },
        )
        .unwrap();
        add_to_cart(
            catalog,
            &cart,
            config,
            AddToCartRequest {
                item_id: "tea".into(),
                ..Default::default()
            },
        )
        .unwrap();
        cart
    }

    #[test]
    fn test_prepare_order_builds_payload() {
        let catalog = CatalogState::new(snapshot(25_000, 5_000));
        let mut config = SessionConfig::default();
        config.order.default_fee = Money::from_rupiah(2_000);
        let cart = filled_cart(&catalog, &config);
        set_discount(&cart, &config, 0, 10.0).unwrap();

        let payload = prepare_order(&catalog, &cart, &config).unwrap();

        assert_eq!(payload.items.len(), 2);
        assert_eq!(payload.items[0].price.rupiah(), 30_000);
        assert_eq!(payload.items[0].addons[0].id, "shot");
        assert_eq!(payload.subtotal.rupiah(), 68_000);
        assert_eq!(payload.discount.rupiah(), 6_800);
        assert_eq!(payload.fee.rupiah(), 2_000);
        assert_eq!(payload.total.rupiah(), 63_200);
        assert!(Uuid::parse_str(&payload.client_ref).is_ok());
    }

    #[test]
    fn test_empty_cart_is_rejected() {
        let catalog = CatalogState::new(snapshot(25_000, 5_000));
        let err = prepare_order(&catalog, &CartState::new(), &SessionConfig::default())
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);
    }

    #[test]
    fn test_drift_is_reported_not_applied() {
        let catalog = CatalogState::new(snapshot(25_000, 5_000));
        let config = SessionConfig::default();
        let cart = filled_cart(&catalog, &config);

        let mut changed = snapshot(25_000, 6_000);
        changed.menu.retain(|item| item.id != "tea");
        catalog.replace(changed);

        let report = check_cart(&catalog, &cart, &config);
        assert_eq!(
            report.lines[0].drift,
            LineDrift::PriceChanged {
                expected: Money::from_rupiah(30_000),
                actual: Money::from_rupiah(31_000),
            }
        );
        assert_eq!(report.lines[1].drift, LineDrift::ItemUnavailable);

        let err = prepare_order(&catalog, &cart, &config).unwrap_err();
        assert_eq!(err.code, ErrorCode::PriceDrift);
        assert_eq!(err.details.len(), 2);

        // cart untouched
        assert_eq!(cart.with_cart(|c| c.lines[0].unit_price.rupiah()), 30_000);

        let (response, removed) = accept_current_prices(&catalog, &cart, &config);
        assert_eq!(removed, vec!["Es Teh".to_string()]);
        assert_eq!(response.lines[0].unit_price.rupiah(), 31_000);
        assert_eq!(response.lines[0].quantity, 2);
        assert!(prepare_order(&catalog, &cart, &config).is_ok());
    }

    #[test]
    fn test_tightened_catalog_rejects_line() {
        let catalog = CatalogState::new(snapshot(25_000, 5_000));
        let config = SessionConfig::default();
        let cart = filled_cart(&catalog, &config);

        let mut changed = snapshot(25_000, 5_000);
        changed.addons.insert(
            "latte".to_string(),
            vec![AddonDefinition::new("shot", "Extra shot", Money::from_rupiah(5_000)).inactive()],
        );
        catalog.replace(changed);

        let report = check_cart(&catalog, &cart, &config);
        assert!(matches!(report.lines[0].drift, LineDrift::Rejected { .. }));
        assert_eq!(report.lines[1].drift, LineDrift::Unchanged);
        assert!(!report.is_clean());
    }
}
