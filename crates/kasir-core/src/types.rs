//! # Domain Types
//!
//! Core domain types used throughout Kasir.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  BACK OFFICE (costing)              FRONT OF HOUSE (selling)            │
//! │  ┌─────────────────────┐            ┌─────────────────────┐             │
//! │  │   Ingredient        │            │   MenuItem          │             │
//! │  │  ─────────────────  │  recipe    │  ─────────────────  │             │
//! │  │  net_quantity       │◄───────────│  price              │             │
//! │  │  unit_buy_price     │            │  base_price (cost)  │             │
//! │  │  waste_percent      │            └─────────┬───────────┘             │
//! │  │  composition[] ──┐  │                      │                         │
//! │  └──────────────────┼──┘            ┌─────────▼───────────┐             │
//! │        ▲            │               │   AddonDefinition   │ per item    │
//! │        └────────────┘               │  min/max/default    │             │
//! │   (by id, may be cyclic)            └─────────┬───────────┘             │
//! │                                               │ RequestedAddon          │
//! │                                     ┌─────────▼───────────┐             │
//! │                                     │   CartLine          │             │
//! │                                     │  unit_price         │             │
//! │                                     │  identity_key       │             │
//! │                                     └─────────────────────┘             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Arena Lookup
//! Ingredients reference each other by id through [`IngredientRegistry`],
//! never by pointer. That keeps the structure serializable and makes the
//! cycle guard in [`crate::costing`] a plain set of ids.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Ingredient
// =============================================================================

/// One `{ingredientId, quantity}` entry of a batch recipe.
///
/// Used both for compound ingredients and for menu item recipes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CompositionEntry {
    pub ingredient_id: String,
    pub quantity: f64,
}

impl CompositionEntry {
    pub fn new(ingredient_id: impl Into<String>, quantity: f64) -> Self {
        CompositionEntry {
            ingredient_id: ingredient_id.into(),
            quantity,
        }
    }
}

/// A purchasable or prepared ingredient.
///
/// ## Leaf vs. Compound
/// ```text
/// LEAF      "Arabica beans"   500 g per bag, Rp 170.000 per bag
///           unit cost = 170000 / 500 = 340 per g
///
/// COMPOUND  "Espresso"        18 g beans + 36 ml water → yields 36 ml
///           unit cost = (18 × 340 + 36 × 0.63) / 36 ≈ 170.63 per ml
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    /// Unique within the registry.
    pub id: String,

    /// Display name for cost reports.
    #[serde(default)]
    pub name: String,

    /// Quantity contained in one purchased unit (e.g. 500 g per bag).
    #[serde(alias = "netConfirmedQuantity")]
    pub net_quantity: f64,

    /// Price of one purchased unit.
    #[serde(default)]
    pub unit_buy_price: Money,

    /// Measurement unit label ("g", "ml", "pcs").
    #[serde(default)]
    pub unit: String,

    /// Expected loss, applied multiplicatively to cost.
    #[serde(default)]
    pub waste_percent: f64,

    /// Batch recipe. Only meaningful together with `composition_yield`.
    #[serde(default)]
    pub composition: Vec<CompositionEntry>,

    /// Total output quantity of one batch of `composition`.
    #[serde(default)]
    pub composition_yield: Option<f64>,
}

impl Ingredient {
    /// Creates a leaf ingredient.
    pub fn leaf(id: impl Into<String>, net_quantity: f64, unit_buy_price: Money) -> Self {
        Ingredient {
            id: id.into(),
            name: String::new(),
            net_quantity,
            unit_buy_price,
            unit: String::new(),
            waste_percent: 0.0,
            composition: Vec::new(),
            composition_yield: None,
        }
    }

    /// Creates a compound ingredient from a batch recipe and its yield.
    pub fn compound(
        id: impl Into<String>,
        composition: Vec<CompositionEntry>,
        composition_yield: f64,
    ) -> Self {
        Ingredient {
            composition,
            composition_yield: Some(composition_yield),
            ..Ingredient::leaf(id, 0.0, Money::zero())
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_waste_percent(mut self, waste_percent: f64) -> Self {
        self.waste_percent = waste_percent;
        self
    }

    /// An ingredient is compound iff it has a non-empty composition AND a
    /// positive yield. Anything else is priced as a leaf.
    pub fn is_compound(&self) -> bool {
        !self.composition.is_empty() && self.compound_yield().is_some()
    }

    /// Returns the batch yield when it is usable as a divisor.
    pub fn compound_yield(&self) -> Option<f64> {
        self.composition_yield
            .filter(|y| y.is_finite() && *y > 0.0)
    }
}

/// Arena of ingredients keyed by id.
///
/// Serializes as a plain list, which is the shape the registry ships.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Ingredient>", into = "Vec<Ingredient>")]
pub struct IngredientRegistry {
    ingredients: HashMap<String, Ingredient>,
}

impl IngredientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an ingredient, returning the previous record.
    pub fn insert(&mut self, ingredient: Ingredient) -> Option<Ingredient> {
        self.ingredients.insert(ingredient.id.clone(), ingredient)
    }

    pub fn remove(&mut self, id: &str) -> Option<Ingredient> {
        self.ingredients.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&Ingredient> {
        self.ingredients.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ingredients.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.ingredients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ingredient> {
        self.ingredients.values()
    }
}

impl From<Vec<Ingredient>> for IngredientRegistry {
    fn from(list: Vec<Ingredient>) -> Self {
        let mut registry = IngredientRegistry::new();
        for ingredient in list {
            registry.insert(ingredient);
        }
        registry
    }
}

impl From<IngredientRegistry> for Vec<Ingredient> {
    fn from(registry: IngredientRegistry) -> Self {
        let mut list: Vec<Ingredient> = registry.ingredients.into_values().collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }
}

impl FromIterator<Ingredient> for IngredientRegistry {
    fn from_iter<I: IntoIterator<Item = Ingredient>>(iter: I) -> Self {
        IngredientRegistry::from(iter.into_iter().collect::<Vec<_>>())
    }
}

// =============================================================================
// Menu Item
// =============================================================================

/// A sellable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub name: String,

    /// Selling price before add-ons.
    pub price: Money,

    /// Manually entered cost reference, if the shop keeps one.
    #[serde(default)]
    pub base_price: Option<Money>,

    /// Ingredients consumed by one unit, for informational costing.
    #[serde(default)]
    pub recipe: Vec<CompositionEntry>,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl MenuItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Money) -> Self {
        MenuItem {
            id: id.into(),
            name: name.into(),
            price,
            base_price: None,
            recipe: Vec::new(),
            is_active: true,
        }
    }
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Add-ons
// =============================================================================

/// An add-on offered for a sellable item ("Extra shot", "Sugar level").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AddonDefinition {
    pub id: String,
    pub name: String,

    #[serde(default, alias = "price")]
    pub unit_price: Money,

    #[serde(default)]
    pub min_quantity: u32,

    /// Upper bound; unbounded when absent.
    #[serde(default)]
    pub max_quantity: Option<u32>,

    /// Quantity prefilled in the selection UI.
    #[serde(default)]
    pub default_quantity: Option<u32>,

    #[serde(default)]
    pub is_required: bool,

    /// Inactive add-ons are excluded from selection entirely.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl AddonDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, unit_price: Money) -> Self {
        AddonDefinition {
            id: id.into(),
            name: name.into(),
            unit_price,
            min_quantity: 0,
            max_quantity: None,
            default_quantity: None,
            is_required: false,
            is_active: true,
        }
    }

    pub fn required(mut self, min_quantity: u32) -> Self {
        self.is_required = true;
        self.min_quantity = min_quantity;
        self
    }

    pub fn with_min(mut self, min_quantity: u32) -> Self {
        self.min_quantity = min_quantity;
        self
    }

    pub fn with_max(mut self, max_quantity: u32) -> Self {
        self.max_quantity = Some(max_quantity);
        self
    }

    pub fn with_default(mut self, default_quantity: u32) -> Self {
        self.default_quantity = Some(default_quantity);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Smallest acceptable quantity for a required add-on.
    ///
    /// A required add-on with `min_quantity = 0` still needs one unit,
    /// otherwise "required" would be satisfied by not choosing it.
    pub fn effective_min(&self) -> u32 {
        if self.is_required {
            self.min_quantity.max(1)
        } else {
            self.min_quantity
        }
    }

    /// True when the add-on may be left out of a line entirely.
    pub fn is_skippable(&self) -> bool {
        !self.is_required && self.min_quantity == 0
    }
}

/// What the cashier asked for: an add-on id and a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RequestedAddon {
    pub addon_id: String,
    pub quantity: u32,
}

impl RequestedAddon {
    pub fn new(addon_id: impl Into<String>, quantity: u32) -> Self {
        RequestedAddon {
            addon_id: addon_id.into(),
            quantity,
        }
    }
}

/// An add-on as it sits on a cart line.
///
/// The price is frozen at selection time: later catalog price changes do
/// not alter a line that is already in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AddonSelection {
    pub addon_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price_at_selection: Money,
}

impl AddonSelection {
    /// Price contribution of this selection to one unit of the line.
    #[inline]
    pub fn total(&self) -> Money {
        self.unit_price_at_selection * self.quantity
    }
}

// =============================================================================
// Identity Key
// =============================================================================

/// Deterministic key under which economically identical lines merge.
///
/// ## Canonical Form
/// ```text
/// item only               →  "7"
/// item + {Y:1, X:2}       →  "7|X=2,Y=1"      (sorted by add-on id)
/// item + {X:2, Z:0}       →  "7|X=2"          (zero quantities ignored)
/// ```
/// The characters `\ | , =` inside ids are escaped with a backslash so two
/// different configurations can never render to the same string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Derives the key from an item id and `(addon_id, quantity)` pairs.
    ///
    /// Input order does not matter. Pairs with quantity 0 are ignored.
    pub fn derive<'a, I>(item_id: &str, selections: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, u32)>,
    {
        let mut pairs: Vec<(&str, u32)> = selections
            .into_iter()
            .filter(|(_, qty)| *qty > 0)
            .collect();
        pairs.sort_unstable();

        let mut key = escape_key_part(item_id);
        for (i, (addon_id, qty)) in pairs.iter().enumerate() {
            key.push(if i == 0 { '|' } else { ',' });
            key.push_str(&escape_key_part(addon_id));
            key.push('=');
            key.push_str(&qty.to_string());
        }
        IdentityKey(key)
    }

    /// Derives the key for a set of frozen selections.
    pub fn for_selections(item_id: &str, selections: &[AddonSelection]) -> Self {
        Self::derive(
            item_id,
            selections.iter().map(|s| (s.addon_id.as_str(), s.quantity)),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn escape_key_part(part: &str) -> String {
    let mut escaped = String::with_capacity(part.len());
    for c in part.chars() {
        if matches!(c, '\\' | '|' | ',' | '=') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// =============================================================================
// Cart Line
// =============================================================================

/// A priced line in the cart.
///
/// ## Invariants
/// - `unit_price = base_price + Σ addon.unit_price_at_selection × addon.quantity`
/// - `identity_key` is derived from `item_id` and the non-zero add-ons
/// - `quantity ≥ 1` (zero or negative quantity removes the line)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub item_id: String,
    pub name: String,
    pub base_price: Money,
    pub unit_price: Money,
    pub addons: Vec<AddonSelection>,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub identity_key: IdentityKey,
}

impl CartLine {
    /// Assembles a line, computing `unit_price` and `identity_key`.
    ///
    /// `quantity` is floored at 1.
    pub fn assemble(
        item_id: impl Into<String>,
        name: impl Into<String>,
        base_price: Money,
        addons: Vec<AddonSelection>,
        quantity: u32,
        notes: Option<String>,
    ) -> Self {
        let item_id = item_id.into();
        let unit_price = base_price + addons_total(&addons);
        let identity_key = IdentityKey::for_selections(&item_id, &addons);
        CartLine {
            item_id,
            name: name.into(),
            base_price,
            unit_price,
            addons,
            quantity: quantity.max(1),
            notes,
            identity_key,
        }
    }

    /// Sum of add-on contributions to one unit.
    pub fn addons_total(&self) -> Money {
        addons_total(&self.addons)
    }

    /// Unit price × quantity.
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// Σ `unit_price_at_selection × quantity` over selections with quantity > 0.
pub fn addons_total(addons: &[AddonSelection]) -> Money {
    addons
        .iter()
        .filter(|a| a.quantity > 0)
        .map(AddonSelection::total)
        .sum()
}

// =============================================================================
// Order Totals
// =============================================================================

/// Totals derived from the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Money,
    pub discount: Money,
    /// Server-computed fee; zero for local estimates.
    pub fee: Money,
    pub total: Money,
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    #[default]
    Cash,
    /// QRIS scan.
    Qris,
    /// Bank transfer.
    Transfer,
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" | "tunai" => Ok(PaymentMethod::Cash),
            "qris" => Ok(PaymentMethod::Qris),
            "transfer" | "bank_transfer" => Ok(PaymentMethod::Transfer),
            other => Err(format!("Unknown payment method: '{}'", other)),
        }
    }
}

// =============================================================================
// Draft Order
// =============================================================================

/// A cart persisted between sessions.
///
/// The engine only defines what must round-trip; where it is stored is the
/// caller's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DraftOrder {
    pub cart: Vec<CartLine>,
    pub discount_rp: Money,
    pub discount_pct: f64,
    pub customer_name: String,
    pub customer_phone: String,
    pub send_notif: bool,
    pub payment_method: PaymentMethod,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

impl DraftOrder {
    /// True when the draft is older than `max_age`.
    pub fn is_expired(&self, now: DateTime<Utc>, max_age: chrono::Duration) -> bool {
        now.signed_duration_since(self.timestamp) > max_age
    }
}

// =============================================================================
// Order Submission Payload
// =============================================================================

/// An add-on as submitted with an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderAddonPayload {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

/// A cart line as submitted with an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderLinePayload {
    pub id: String,
    pub name: String,
    /// Unit price including add-ons.
    pub price: Money,
    pub base_price: Money,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub addons: Vec<OrderAddonPayload>,
}

impl From<&CartLine> for OrderLinePayload {
    fn from(line: &CartLine) -> Self {
        OrderLinePayload {
            id: line.item_id.clone(),
            name: line.name.clone(),
            price: line.unit_price,
            base_price: line.base_price,
            quantity: line.quantity,
            notes: line.notes.clone(),
            addons: line
                .addons
                .iter()
                .filter(|a| a.quantity > 0)
                .map(|a| OrderAddonPayload {
                    id: a.addon_id.clone(),
                    name: a.name.clone(),
                    quantity: a.quantity,
                    unit_price: a.unit_price_at_selection,
                })
                .collect(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
