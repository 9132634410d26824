//! # Draft Module
//!
//! Turns persisted or transmitted cart JSON back into domain types.
//!
//! ## Untrusted Input Boundary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  local storage / request body (serde_json::Value, any shape)            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  normalize_cart_line  ──► Some(CartLine)   every invariant holds       │
//! │                       ──► None             not an object, or no id     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  normalize_draft      ──► bad lines dropped, duplicates merged,         │
//! │                           discounts clamped, unknown fields defaulted   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here fails the whole cart for one bad line, and nothing returns
//! a partially valid value: output either satisfies [`CartLine`]'s
//! invariants or is absent.
//!
//! ## Accepted Field Names
//! | Field        | Also accepted             |
//! |--------------|---------------------------|
//! | `id`         | `itemId`                  |
//! | `quantity`   | `qty`                     |
//! | `price`      | `unitPrice`               |
//! | addon `id`   | `addonId`                 |
//! | addon price  | `unitPriceAtSelection`, `unitPrice`, `price` |
//! | `identityKey`| `cartKey`                 |
//!
//! Numbers may arrive as JSON numbers or numeric strings.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use crate::money::Money;
use crate::totals::Discount;
use crate::types::{addons_total, AddonSelection, CartLine, DraftOrder, PaymentMethod};
use crate::{MAX_LINE_QUANTITY, MAX_PRICE};

// =============================================================================
// Field Helpers
// =============================================================================

fn field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| obj.get(*name))
        .find(|v| !v.is_null())
}

/// Reads a finite number from a JSON number or numeric string.
fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Reads an id from a string or number; empty ids are absent.
fn id(value: &Value) -> Option<String> {
    let id = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!id.is_empty()).then_some(id)
}

fn text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Reads an amount capped at [`MAX_PRICE`], rounded half-up.
fn capped_money(value: &Value) -> Option<Money> {
    number(value)
        .map(|n| n.min(MAX_PRICE.as_f64()))
        .and_then(Money::round_half_up)
}

fn non_negative_money(value: &Value) -> Option<Money> {
    capped_money(value).filter(|price| !price.is_negative())
}

fn clamp_quantity(n: f64, floor: u32) -> u32 {
    let capped = n.floor().min(MAX_LINE_QUANTITY as f64);
    (capped.max(0.0) as u32).max(floor)
}

// =============================================================================
// Cart Line
// =============================================================================

/// Normalizes one add-on entry. Entries without a resolvable id are dropped.
///
/// A missing quantity means the add-on was simply listed, i.e. one unit.
fn normalize_addon(raw: &Value) -> Option<AddonSelection> {
    let obj = raw.as_object()?;
    let addon_id = field(obj, &["id", "addonId"]).and_then(id)?;

    let quantity = match field(obj, &["quantity", "qty"]) {
        None => 1,
        Some(v) => number(v).map(|n| clamp_quantity(n, 0)).unwrap_or(0),
    };
    let unit_price = field(obj, &["unitPriceAtSelection", "unitPrice", "price"])
        .and_then(non_negative_money)
        .unwrap_or_default();
    let name = text(obj.get("name")).unwrap_or_else(|| addon_id.clone());

    Some(AddonSelection {
        addon_id,
        name,
        quantity,
        unit_price_at_selection: unit_price,
    })
}

/// Normalizes a persisted cart line.
///
/// Returns `None` for anything that is not an object with an id. Otherwise
/// every field is coerced:
/// - `addons` becomes a list; unusable entries and zero quantities go
/// - `base_price` comes from `basePrice` when it is a finite non-negative
///   number, else `max(0, price − addons_total)`
/// - every price is capped at [`MAX_PRICE`]
/// - `unit_price` and `identity_key` are recomputed
/// - `quantity` defaults to 1 and is floored at 1
///
/// ## Example
/// ```rust
/// use kasir_core::draft::normalize_cart_line;
/// use serde_json::json;
///
/// let line = normalize_cart_line(&json!({ "id": "7" })).unwrap();
/// assert_eq!(line.base_price.rupiah(), 0);
/// assert_eq!(line.unit_price.rupiah(), 0);
/// assert_eq!(line.quantity, 1);
///
/// assert!(normalize_cart_line(&json!(null)).is_none());
/// ```
pub fn normalize_cart_line(raw: &Value) -> Option<CartLine> {
    let obj = raw.as_object()?;
    let item_id = field(obj, &["id", "itemId"]).and_then(id)?;

    let addons: Vec<AddonSelection> = match obj.get("addons") {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(normalize_addon)
            .filter(|a| a.quantity > 0)
            .collect(),
        _ => Vec::new(),
    };

    let base_price = match obj.get("basePrice").and_then(non_negative_money) {
        Some(base) => base,
        None => field(obj, &["price", "unitPrice"])
            .and_then(capped_money)
            .map(|price| (price - addons_total(&addons)).non_negative())
            .unwrap_or_default(),
    };

    let quantity = field(obj, &["quantity", "qty"])
        .and_then(number)
        .map(|n| clamp_quantity(n, 1))
        .unwrap_or(1);

    let name = text(obj.get("name")).unwrap_or_default();
    let notes = text(obj.get("notes"));

    let line = CartLine::assemble(item_id, name, base_price, addons, quantity, notes);

    if let Some(stored) = field(obj, &["identityKey", "cartKey"]).and_then(Value::as_str) {
        if stored != line.identity_key.as_str() {
            debug!(
                stored,
                recomputed = %line.identity_key,
                "Stored identity key does not match selections, replacing"
            );
        }
    }

    Some(line)
}

/// Parses `raw` as JSON and normalizes it. Unparseable text is `None`.
pub fn normalize_cart_line_str(raw: &str) -> Option<CartLine> {
    let value: Value = serde_json::from_str(raw).ok()?;
    normalize_cart_line(&value)
}

/// Merges lines sharing an identity key, summing quantities.
///
/// The first line of each key keeps its position and name. Its notes win
/// unless it has none. Quantities are capped at the per-line maximum.
pub fn merge_duplicate_lines(lines: Vec<CartLine>) -> Vec<CartLine> {
    let mut merged: Vec<CartLine> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged
            .iter_mut()
            .find(|existing| existing.identity_key == line.identity_key)
        {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .saturating_add(line.quantity)
                    .min(MAX_LINE_QUANTITY);
                if existing.notes.is_none() {
                    existing.notes = line.notes;
                }
            }
            None => merged.push(line),
        }
    }
    merged
}

// =============================================================================
// Draft Order
// =============================================================================

fn timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match value? {
        Value::String(s) => match DateTime::parse_from_rfc3339(s.trim()) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(_) => number(&Value::String(s.clone()))
                .and_then(|ms| Utc.timestamp_millis_opt(ms as i64).single()),
        },
        other => number(other).and_then(|ms| Utc.timestamp_millis_opt(ms as i64).single()),
    }
}

fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        Some(other) => number(other).is_some_and(|n| n != 0.0),
        None => false,
    }
}

/// Reconstructs a draft from untrusted JSON.
///
/// Returns `None` only when `raw` is not an object. Bad cart lines are
/// dropped, lines with the same identity key are merged, discount fields
/// are clamped, and an unknown payment method falls back to cash.
///
/// A draft without a readable timestamp is stamped with the Unix epoch so
/// that an age check treats it as stale.
pub fn normalize_draft(raw: &Value) -> Option<DraftOrder> {
    let obj = raw.as_object()?;

    let lines: Vec<CartLine> = match obj.get("cart") {
        Some(Value::Array(entries)) => {
            let lines: Vec<CartLine> = entries.iter().filter_map(normalize_cart_line).collect();
            if lines.len() < entries.len() {
                debug!(
                    dropped = entries.len() - lines.len(),
                    "Dropped unreadable draft lines"
                );
            }
            lines
        }
        _ => Vec::new(),
    };

    let discount = Discount::clamped(
        obj.get("discountRp")
            .and_then(number)
            .and_then(Money::round_half_up)
            .unwrap_or_default(),
        obj.get("discountPct").and_then(number).unwrap_or(0.0),
    );

    let payment_method = text(obj.get("paymentMethod"))
        .and_then(|s| s.parse::<PaymentMethod>().ok())
        .unwrap_or_default();

    Some(DraftOrder {
        cart: merge_duplicate_lines(lines),
        discount_rp: discount.rp(),
        discount_pct: discount.pct(),
        customer_name: text(obj.get("customerName")).unwrap_or_default(),
        customer_phone: text(obj.get("customerPhone")).unwrap_or_default(),
        send_notif: flag(obj.get("sendNotif")),
        payment_method,
        timestamp: timestamp(obj.get("timestamp")).unwrap_or_default(),
    })
}

/// Parses `raw` as JSON and normalizes it as a draft.
pub fn normalize_draft_str(raw: &str) -> Option<DraftOrder> {
    let value: Value = serde_json::from_str(raw).ok()?;
    normalize_draft(&value)
}

// =============================================================================
// Unit Tests
// =============================================================================
