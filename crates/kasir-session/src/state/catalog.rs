//! # Catalog State
//!
//! The menu, add-on catalogs, and ingredient registry the session prices
//! against.
//!
//! ## Snapshot Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CatalogState                                                           │
//! │  RwLock<Arc<CatalogSnapshot>>                                           │
//! │        │                                                                │
//! │        ├── snapshot()  ──► Arc clone, lock released immediately         │
//! │        │                   the caller prices against a frozen catalog   │
//! │        │                                                                │
//! │        └── replace()   ──► swaps the whole Arc                          │
//! │                            in-flight pricing keeps the old snapshot     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! No request ever observes a half-updated catalog.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

use kasir_core::validation::{validate_addon_catalog, validate_ingredient};
use kasir_core::{AddonDefinition, IngredientRegistry, MenuItem};

// =============================================================================
// Catalog Snapshot
// =============================================================================

/// An immutable catalog.
///
/// ## JSON Shape
/// ```json
/// {
///   "menu": [{ "id": "latte", "name": "Iced Latte", "price": 25000 }],
///   "addons": { "latte": [{ "id": "shot", "name": "Extra shot", "unitPrice": 5000 }] },
///   "ingredients": [{ "id": "beans", "netQuantity": 500, "unitBuyPrice": 170000 }]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub menu: Vec<MenuItem>,

    /// Add-on catalog per menu item id.
    #[serde(default)]
    pub addons: HashMap<String, Vec<AddonDefinition>>,

    #[serde(default)]
    pub ingredients: IngredientRegistry,
}

impl CatalogSnapshot {
    pub fn menu_item(&self, item_id: &str) -> Option<&MenuItem> {
        self.menu.iter().find(|item| item.id == item_id)
    }

    /// Add-on catalog of an item; empty when it has none.
    pub fn addons_for(&self, item_id: &str) -> &[AddonDefinition] {
        self.addons.get(item_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Save-time problems in this catalog, one message each.
    ///
    /// A snapshot with problems is still usable: pricing refuses the
    /// broken add-ons and costing reports broken ingredients.
    pub fn audit(&self) -> Vec<String> {
        let mut problems = Vec::new();

        let mut item_ids: Vec<&String> = self.addons.keys().collect();
        item_ids.sort();
        for item_id in item_ids {
            if let Err(errors) = validate_addon_catalog(self.addons_for(item_id)) {
                problems.extend(errors.iter().map(|e| format!("{}: {}", item_id, e)));
            }
        }

        let mut ingredients: Vec<_> = self.ingredients.iter().collect();
        ingredients.sort_by(|a, b| a.id.cmp(&b.id));
        for ingredient in ingredients {
            if let Err(errors) = validate_ingredient(ingredient, &self.ingredients) {
                problems.extend(errors.iter().map(|e| format!("{}: {}", ingredient.id, e)));
            }
        }

        problems
    }
}

// =============================================================================
// Catalog State
// =============================================================================

/// Shared handle to the current catalog snapshot.
#[derive(Debug, Default)]
pub struct CatalogState {
    current: RwLock<Arc<CatalogSnapshot>>,
}

impl CatalogState {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        CatalogState {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Swaps in a new snapshot, logging any save-time problems it carries.
    pub fn replace(&self, snapshot: CatalogSnapshot) {
        for problem in snapshot.audit() {
            warn!(problem = %problem, "Catalog problem");
        }
        info!(
            items = snapshot.menu.len(),
            ingredients = snapshot.ingredients.len(),
            "Catalog snapshot replaced"
        );

        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(snapshot);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use kasir_core::{CompositionEntry, Ingredient, Money};

    fn snapshot() -> CatalogSnapshot {
        let mut addons = HashMap::new();
        addons.insert(
            "latte".to_string(),
            vec![AddonDefinition::new("shot", "Extra shot", Money::from_rupiah(5_000)).with_max(2)],
        );
        CatalogSnapshot {
            menu: vec![MenuItem::new("latte", "Iced Latte", Money::from_rupiah(25_000))],
            addons,
            ingredients: IngredientRegistry::new(),
        }
    }

    #[test]
    fn test_lookup() {
        let catalog = snapshot();
        assert!(catalog.menu_item("latte").is_some());
        assert!(catalog.menu_item("tea").is_none());
        assert_eq!(catalog.addons_for("latte").len(), 1);
        assert!(catalog.addons_for("tea").is_empty());
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let state = CatalogState::new(snapshot());
        let before = state.snapshot();

        state.replace(CatalogSnapshot::default());

        assert_eq!(before.menu.len(), 1);
        assert!(state.snapshot().menu.is_empty());
    }

    #[test]
    fn test_deserializes_from_json() {
        let json = r#"{
            "menu": [{ "id": "latte", "name": "Iced Latte", "price": 25000 }],
            "addons": { "latte": [{ "id": "shot", "name": "Extra shot", "price": 5000, "maxQuantity": 2 }] }
        }"#;
        let catalog: CatalogSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(catalog, snapshot());
    }

    #[test]
    fn test_audit_reports_problems() {
        let mut catalog = snapshot();
        catalog.addons.get_mut("latte").unwrap().push(
            AddonDefinition::new("shot", "Double shot", Money::zero()),
        );
        catalog.ingredients.insert(Ingredient::compound(
            "syrup",
            vec![CompositionEntry::new("syrup", 1.0)],
            1.0,
        ));

        let problems = catalog.audit();
        assert_eq!(problems.len(), 2);
        assert!(problems[0].starts_with("latte:"));
        assert!(problems[1].contains("cycle"));
    }
}
