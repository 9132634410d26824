//! # Cart Commands
//!
//! Building lines from add-on choices and editing the cart.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│  Verify  │────►│ Payload  │       │
//! │  │  Cart    │     │          │     │          │     │          │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │       ▲                │                               order.rs         │
//! │       │           add_to_cart                                           │
//! │       │           skip_addons_to_cart                                   │
//! │       │           update_cart_line                                      │
//! │       │           set_discount / set_customer                           │
//! │       │                │                                                │
//! │       │                ▼                                                │
//! │       └──────── clear_cart / save_draft (draft.rs)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use kasir_core::pricing::{build_cart_line, default_selections, skip_addons, skip_gate, SkipGate};
use kasir_core::validation::{validate_line_quantity, validate_name, validate_notes};
use kasir_core::{
    AddonDefinition, CartLine, CoreError, MenuItem, Money, OrderTotals, PaymentMethod,
    RequestedAddon,
};

use crate::error::ApiError;
use crate::state::{Cart, CartState, CatalogSnapshot, CatalogState, SessionConfig};

/// Cart response including lines and totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub lines: Vec<CartLine>,
    pub totals: OrderTotals,
    pub discount_rp: Money,
    pub discount_pct: f64,
    pub customer_name: String,
    pub customer_phone: String,
    pub send_notif: bool,
    pub payment_method: PaymentMethod,
}

impl CartResponse {
    pub fn new(cart: &Cart, fee: Money) -> Self {
        CartResponse {
            lines: cart.lines.clone(),
            totals: cart.totals(fee),
            discount_rp: cart.discount_rp,
            discount_pct: cart.discount_pct,
            customer_name: cart.customer_name.clone(),
            customer_phone: cart.customer_phone.clone(),
            send_notif: cart.send_notif,
            payment_method: cart.payment_method,
        }
    }
}

/// What the cashier submitted from the add-on dialog.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub item_id: String,
    #[serde(default)]
    pub addons: Vec<RequestedAddon>,
    /// Defaults to 1.
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Options shown when an item is tapped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonOptions {
    pub item_id: String,
    /// Active add-ons only, in catalog order.
    pub addons: Vec<AddonDefinition>,
    /// Prefilled quantities.
    pub defaults: Vec<RequestedAddon>,
    pub skip: SkipGate,
}

/// Gets the current cart contents.
pub fn get_cart(cart: &CartState, config: &SessionConfig) -> CartResponse {
    debug!("get_cart command");
    cart.with_cart(|c| CartResponse::new(c, config.order.default_fee))
}

/// Looks up an item that can be sold right now.
fn sellable_item<'a>(
    snapshot: &'a CatalogSnapshot,
    item_id: &str,
) -> Result<&'a MenuItem, ApiError> {
    let item = snapshot
        .menu_item(item_id)
        .ok_or_else(|| ApiError::not_found("Menu item", item_id))?;

    if !item.is_active {
        return Err(ApiError::validation("Menu item is not available for sale"));
    }

    Ok(item)
}

/// Add-on catalog, defaults, and skip gate of an item.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Cashier taps "Iced Latte"                                              │
/// │                    │                                                    │
/// │                    ▼                                                    │
/// │  get_addon_options("latte")                                             │
/// │    addons:   [Sugar level (required), Extra shot (max 2)]               │
/// │    defaults: [sugar × 1]                                                │
/// │    skip:     { status: "blocked", required: ["Sugar level"] }           │
/// │                    │                                                    │
/// │                    ▼                                                    │
/// │  Dialog opens prefilled, [Skip add-ons] disabled                        │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn get_addon_options(catalog: &CatalogState, item_id: &str) -> Result<AddonOptions, ApiError> {
    debug!(item_id = %item_id, "get_addon_options command");

    let snapshot = catalog.snapshot();
    let item = sellable_item(&snapshot, item_id)?;
    let definitions = snapshot.addons_for(&item.id);

    Ok(AddonOptions {
        item_id: item.id.clone(),
        addons: definitions.iter().filter(|d| d.is_active).cloned().collect(),
        defaults: default_selections(definitions),
        skip: skip_gate(definitions),
    })
}

/// Prices an item with the chosen add-ons and adds it to the cart.
///
/// ## Behavior
/// - Every unmet add-on constraint is reported at once (`ADDON_CONSTRAINT`)
/// - An identical line already in the cart has its quantity increased
/// - Prices are frozen at the time of adding
pub fn add_to_cart(
    catalog: &CatalogState,
    cart: &CartState,
    config: &SessionConfig,
    request: AddToCartRequest,
) -> Result<CartResponse, ApiError> {
    let quantity = request.quantity.unwrap_or(1);
    debug!(
        item_id = %request.item_id,
        addons = request.addons.len(),
        quantity = %quantity,
        "add_to_cart command"
    );

    validate_line_quantity(quantity)?;

    let snapshot = catalog.snapshot();
    let item = sellable_item(&snapshot, &request.item_id)?;

    let mut line = build_cart_line(item, &request.addons, snapshot.addons_for(&item.id))
        .map_err(|errors| CoreError::LineRejected {
            item_id: item.id.clone(),
            errors,
        })?;

    if let Some(notes) = request.notes {
        validate_notes(&notes)?;
        let notes = notes.trim();
        if !notes.is_empty() {
            line.notes = Some(notes.to_string());
        }
    }

    add_line(cart, config, line, quantity as u32)
}

/// Adds an item without add-ons, if none of its add-ons is mandatory.
pub fn skip_addons_to_cart(
    catalog: &CatalogState,
    cart: &CartState,
    config: &SessionConfig,
    item_id: &str,
) -> Result<CartResponse, ApiError> {
    debug!(item_id = %item_id, "skip_addons_to_cart command");

    let snapshot = catalog.snapshot();
    let item = sellable_item(&snapshot, item_id)?;
    let line = skip_addons(item, snapshot.addons_for(&item.id))?;

    add_line(cart, config, line, 1)
}

fn add_line(
    cart: &CartState,
    config: &SessionConfig,
    line: CartLine,
    quantity: u32,
) -> Result<CartResponse, ApiError> {
    cart.with_cart_mut(|c| -> Result<CartResponse, ApiError> {
        let key = c.add_line(line, quantity, &config.cart)?;
        debug!(identity_key = %key, "Line added");
        Ok(CartResponse::new(c, config.order.default_fee))
    })
}

/// Updates the quantity of a line.
///
/// ## Behavior
/// - Quantity 0 or less: removes the line
/// - Quantity > max: returns error
pub fn update_cart_line(
    cart: &CartState,
    config: &SessionConfig,
    identity_key: &str,
    quantity: i64,
) -> Result<CartResponse, ApiError> {
    debug!(identity_key = %identity_key, quantity = %quantity, "update_cart_line command");

    cart.with_cart_mut(|c| -> Result<CartResponse, ApiError> {
        c.update_quantity(identity_key, quantity, &config.cart)?;
        Ok(CartResponse::new(c, config.order.default_fee))
    })
}

/// Sets or clears the free-text notes of a line.
pub fn set_line_notes(
    cart: &CartState,
    config: &SessionConfig,
    identity_key: &str,
    notes: Option<String>,
) -> Result<CartResponse, ApiError> {
    debug!(identity_key = %identity_key, "set_line_notes command");

    if let Some(notes) = &notes {
        validate_notes(notes)?;
    }

    cart.with_cart_mut(|c| -> Result<CartResponse, ApiError> {
        c.set_notes(identity_key, notes)?;
        Ok(CartResponse::new(c, config.order.default_fee))
    })
}

/// Removes a line from the cart.
pub fn remove_from_cart(
    cart: &CartState,
    config: &SessionConfig,
    identity_key: &str,
) -> Result<CartResponse, ApiError> {
    debug!(identity_key = %identity_key, "remove_from_cart command");

    cart.with_cart_mut(|c| -> Result<CartResponse, ApiError> {
        c.remove_line(identity_key)?;
        Ok(CartResponse::new(c, config.order.default_fee))
    })
}

/// Clears the cart and its checkout details.
///
/// ## When Used
/// - Cashier cancels the order
/// - After the order payload was accepted
pub fn clear_cart(cart: &CartState, config: &SessionConfig) -> CartResponse {
    debug!("clear_cart command");

    cart.with_cart_mut(|c| {
        c.clear();
        CartResponse::new(c, config.order.default_fee)
    })
}

/// Sets the order discount. Rejects negative amounts and percentages
/// outside 0..=100.
pub fn set_discount(
    cart: &CartState,
    config: &SessionConfig,
    discount_rp: i64,
    discount_pct: f64,
) -> Result<CartResponse, ApiError> {
    debug!(discount_rp = %discount_rp, discount_pct = %discount_pct, "set_discount command");

    cart.with_cart_mut(|c| -> Result<CartResponse, ApiError> {
        c.set_discount(Money::from_rupiah(discount_rp), discount_pct)?;
        Ok(CartResponse::new(c, config.order.default_fee))
    })
}

/// Sets the customer details attached to the order.
pub fn set_customer(
    cart: &CartState,
    config: &SessionConfig,
    name: &str,
    phone: &str,
    send_notif: bool,
) -> Result<CartResponse, ApiError> {
    debug!(send_notif = %send_notif, "set_customer command");

    let name = name.trim();
    if !name.is_empty() {
        validate_name(name)?;
    }

    let phone: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    if phone.len() > 20 {
        return Err(ApiError::validation("Phone number must be at most 20 characters"));
    }

    cart.with_cart_mut(|c| {
        c.customer_name = name.to_string();
        c.customer_phone = phone;
        c.send_notif = send_notif;
        Ok(CartResponse::new(c, config.order.default_fee))
    })
}

/// Sets the payment method ("cash", "qris", "transfer").
pub fn set_payment_method(
    cart: &CartState,
    config: &SessionConfig,
    method: &str,
) -> Result<CartResponse, ApiError> {
    debug!(method = %method, "set_payment_method command");

    let method: PaymentMethod = method.parse().map_err(ApiError::validation)?;

    cart.with_cart_mut(|c| {
        c.payment_method = method;
        info!(method = ?method, "Payment method set");
        Ok(CartResponse::new(c, config.order.default_fee))
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
