//! # Costing Module
//!
//! Resolves the true cost of an ingredient, expanding compound ingredients
//! recursively through the [`IngredientRegistry`].
//!
//! ## Resolution Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       unit_cost(ingredient, visited)                    │
//! │                                                                         │
//! │  missing ingredient ─────────────► 0   + MissingReference              │
//! │  id ∈ visited ───────────────────► 0   + CyclicComposition             │
//! │  leaf ───────────────────────────► unit_buy_price / net_quantity       │
//! │                                        (0 when net_quantity ≤ 0)        │
//! │  compound ───────────────────────► Σ unit_cost(child, visited ∪ {id})  │
//! │                                        × entry.quantity                 │
//! │                                      ÷ composition_yield                │
//! │                                                                         │
//! │  cost(ingredient, qty) = unit_cost × (qty == 0 ? 1 : qty)               │
//! │                                    × (1 + waste_percent / 100)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Fail-Soft
//! Missing references and cycles never abort resolution. They contribute
//! zero cost on the affected edge and come back as [`CostDiagnostic`]s in
//! the [`CostReport`], so a broken recipe shows up in the back office
//! instead of silently under-costing a menu item.
//!
//! ## Termination
//! An id is never expanded twice on the same path, so the recursion depth is
//! bounded by the number of ingredients regardless of the graph's shape.
//!
//! ## Numeric Policy
//! No rounding happens here. Callers round with [`Money::round_half_up`]
//! only when a cost is persisted as currency.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{CostDiagnostic, ValidationError};
use crate::money::Money;
use crate::types::{CompositionEntry, Ingredient, IngredientRegistry, MenuItem};

// =============================================================================
// Cost Report
// =============================================================================

/// A resolved cost plus everything that was skipped to produce it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostReport {
    pub value: f64,
    pub diagnostics: Vec<CostDiagnostic>,
}

impl CostReport {
    fn clean(value: f64) -> Self {
        CostReport {
            value,
            diagnostics: Vec::new(),
        }
    }

    /// True when no reference was missing and no cycle was cut.
    pub fn is_complete(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// The value as currency, rounded half-up.
    pub fn to_money(&self) -> Money {
        Money::round_half_up(self.value).unwrap_or_default()
    }

    fn absorb(&mut self, other: CostReport) {
        self.value += other.value;
        for diagnostic in other.diagnostics {
            push_unique(&mut self.diagnostics, diagnostic);
        }
    }
}

fn push_unique(diagnostics: &mut Vec<CostDiagnostic>, diagnostic: CostDiagnostic) {
    if !diagnostics.contains(&diagnostic) {
        diagnostics.push(diagnostic);
    }
}

// =============================================================================
// Cost Resolver
// =============================================================================

/// Cost resolution over one immutable registry snapshot.
#[derive(Debug, Clone, Copy)]
pub struct CostResolver<'a> {
    registry: &'a IngredientRegistry,
}

/// Per-call traversal state: the ids on the current path.
///
/// Inserting before descending and removing after returning gives each
/// branch its own view of `visited`, exactly as if the set were copied.
struct Walk {
    visited: HashSet<String>,
    path: Vec<String>,
    diagnostics: Vec<CostDiagnostic>,
}

impl<'a> CostResolver<'a> {
    pub fn new(registry: &'a IngredientRegistry) -> Self {
        CostResolver { registry }
    }

    /// Unit cost of `ingredient`, starting with an empty visited set.
    pub fn unit_cost(&self, ingredient: Option<&Ingredient>) -> CostReport {
        self.resolve_unit_cost(ingredient, &HashSet::new())
    }

    /// Unit cost of `ingredient`, treating every id in `visited` as already
    /// being expanded.
    pub fn resolve_unit_cost(
        &self,
        ingredient: Option<&Ingredient>,
        visited: &HashSet<String>,
    ) -> CostReport {
        let Some(ingredient) = ingredient else {
            return CostReport::clean(0.0);
        };

        let mut walk = Walk {
            visited: visited.clone(),
            path: Vec::new(),
            diagnostics: Vec::new(),
        };
        let value = self.walk_unit_cost(ingredient, &mut walk);
        CostReport {
            value,
            diagnostics: walk.diagnostics,
        }
    }

    /// Cost of `requested_quantity` units of `ingredient`, including waste.
    ///
    /// A requested quantity of exactly 0 charges one unit: packaging items
    /// (cups, stickers) are recorded with quantity 0 but always consumed.
    ///
    /// ## Errors
    /// Negative or non-finite quantities are rejected, never negated.
    pub fn resolve_cost(
        &self,
        ingredient: Option<&Ingredient>,
        requested_quantity: f64,
    ) -> Result<CostReport, ValidationError> {
        let effective_quantity = effective_quantity(requested_quantity)?;
        let Some(ingredient) = ingredient else {
            return Ok(CostReport::clean(0.0));
        };

        let mut report = self.unit_cost(Some(ingredient));
        report.value *= effective_quantity * waste_factor(ingredient.waste_percent);
        Ok(report)
    }

    /// Cost of `requested_quantity` units of the ingredient with id `id`.
    ///
    /// A missing id costs zero and is reported as a diagnostic.
    pub fn cost_of(&self, id: &str, requested_quantity: f64) -> Result<CostReport, ValidationError> {
        match self.registry.get(id) {
            Some(ingredient) => self.resolve_cost(Some(ingredient), requested_quantity),
            None => {
                effective_quantity(requested_quantity)?;
                debug!(ingredient_id = %id, "Cost requested for missing ingredient");
                Ok(CostReport {
                    value: 0.0,
                    diagnostics: vec![CostDiagnostic::MissingReference {
                        parent: None,
                        ingredient_id: id.to_string(),
                    }],
                })
            }
        }
    }

    /// Total cost of a recipe: Σ cost_of(entry) including each entry's waste.
    pub fn recipe_cost(&self, recipe: &[CompositionEntry]) -> Result<CostReport, ValidationError> {
        let mut report = CostReport::clean(0.0);
        for entry in recipe {
            report.absorb(self.cost_of(&entry.ingredient_id, entry.quantity)?);
        }
        Ok(report)
    }

    /// Builds the cost sheet of a menu item.
    ///
    /// The recipe wins when present; otherwise the manually entered
    /// `base_price` is used as the cost reference.
    pub fn cost_sheet(&self, item: &MenuItem) -> Result<CostSheet, ValidationError> {
        let (source, cost, diagnostics) = if !item.recipe.is_empty() {
            let report = self.recipe_cost(&item.recipe)?;
            (CostSource::Recipe, Some(report.to_money()), report.diagnostics)
        } else if let Some(base_price) = item.base_price {
            (CostSource::Manual, Some(base_price), Vec::new())
        } else {
            (CostSource::Unknown, None, Vec::new())
        };

        let margin = cost.map(|c| item.price - c);
        let margin_pct = margin
            .filter(|_| item.price.is_positive())
            .map(|m| m.as_f64() / item.price.as_f64() * 100.0);

        Ok(CostSheet {
            item_id: item.id.clone(),
            price: item.price,
            source,
            cost,
            margin,
            margin_pct,
            diagnostics,
        })
    }

    /// Unit cost of every ingredient in the registry, sorted by id.
    pub fn unit_cost_table(&self) -> Vec<(String, CostReport)> {
        let mut table: Vec<(String, CostReport)> = self
            .registry
            .iter()
            .map(|ingredient| (ingredient.id.clone(), self.unit_cost(Some(ingredient))))
            .collect();
        table.sort_by(|a, b| a.0.cmp(&b.0));
        table
    }

    fn walk_unit_cost(&self, ingredient: &Ingredient, walk: &mut Walk) -> f64 {
        if walk.visited.contains(&ingredient.id) {
            let mut cycle: Vec<String> = match walk.path.iter().position(|id| *id == ingredient.id) {
                Some(start) => walk.path[start..].to_vec(),
                None => Vec::new(),
            };
            cycle.push(ingredient.id.clone());
            warn!(path = ?cycle, "Cyclic ingredient composition, costing repeat as zero");
            push_unique(
                &mut walk.diagnostics,
                CostDiagnostic::CyclicComposition { path: cycle },
            );
            return 0.0;
        }

        let Some(batch_yield) = ingredient.compound_yield().filter(|_| ingredient.is_compound())
        else {
            return leaf_unit_cost(ingredient);
        };

        walk.visited.insert(ingredient.id.clone());
        walk.path.push(ingredient.id.clone());

        let mut batch_cost = 0.0;
        for entry in &ingredient.composition {
            match self.registry.get(&entry.ingredient_id) {
                Some(child) => {
                    batch_cost += self.walk_unit_cost(child, walk) * entry.quantity;
                }
                None => {
                    debug!(
                        parent = %ingredient.id,
                        ingredient_id = %entry.ingredient_id,
                        "Composition references missing ingredient, costing as zero"
                    );
                    push_unique(
                        &mut walk.diagnostics,
                        CostDiagnostic::MissingReference {
                            parent: Some(ingredient.id.clone()),
                            ingredient_id: entry.ingredient_id.clone(),
                        },
                    );
                }
            }
        }

        walk.path.pop();
        walk.visited.remove(&ingredient.id);

        batch_cost / batch_yield
    }
}

fn leaf_unit_cost(ingredient: &Ingredient) -> f64 {
    if ingredient.net_quantity.is_finite() && ingredient.net_quantity > 0.0 {
        ingredient.unit_buy_price.as_f64() / ingredient.net_quantity
    } else {
        0.0
    }
}

/// Maps the requested quantity to the quantity actually charged.
fn effective_quantity(requested: f64) -> Result<f64, ValidationError> {
    if !requested.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: "quantity".to_string(),
            reason: "must be a finite number".to_string(),
        });
    }
    if requested < 0.0 {
        return Err(ValidationError::NegativeQuantity {
            field: "quantity".to_string(),
            value: requested,
        });
    }
    Ok(if requested == 0.0 { 1.0 } else { requested })
}

/// `1 + waste/100`; unusable waste values (negative, NaN) count as no waste.
fn waste_factor(waste_percent: f64) -> f64 {
    if waste_percent.is_finite() && waste_percent > 0.0 {
        1.0 + waste_percent / 100.0
    } else {
        1.0
    }
}

// =============================================================================
// Menu Item Cost Sheet
// =============================================================================

/// Where a menu item's cost figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CostSource {
    Recipe,
    Manual,
    Unknown,
}

/// Informational cost and margin of a menu item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostSheet {
    pub item_id: String,
    pub price: Money,
    pub source: CostSource,
    pub cost: Option<Money>,
    pub margin: Option<Money>,
    pub margin_pct: Option<f64>,
    pub diagnostics: Vec<CostDiagnostic>,
}

// =============================================================================
// Save-Time Cycle Detection
// =============================================================================

/// Finds a composition cycle reachable from `start_id`.
///
/// Returns the cyclic path (first and last element equal), or `None`.
/// Missing references are ignored here; they are not cycles.
pub fn find_composition_cycle(registry: &IngredientRegistry, start_id: &str) -> Option<Vec<String>> {
    fn visit(
        registry: &IngredientRegistry,
        id: &str,
        path: &mut Vec<String>,
        done: &mut HashSet<String>,
    ) -> Option<Vec<String>> {
        if let Some(start) = path.iter().position(|p| p == id) {
            let mut cycle = path[start..].to_vec();
            cycle.push(id.to_string());
            return Some(cycle);
        }
        if done.contains(id) {
            return None;
        }
        let ingredient = registry.get(id)?;
        if !ingredient.is_compound() {
            return None;
        }

        path.push(id.to_string());
        for entry in &ingredient.composition {
            if let Some(cycle) = visit(registry, &entry.ingredient_id, path, done) {
                return Some(cycle);
            }
        }
        path.pop();
        done.insert(id.to_string());
        None
    }

    visit(registry, start_id, &mut Vec::new(), &mut HashSet::new())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn beans() -> Ingredient {
        Ingredient::leaf("beans", 500.0, Money::from_rupiah(170_000))
            .with_unit("g")
            .with_waste_percent(3.0)
    }

    fn water() -> Ingredient {
        Ingredient::leaf("water", 1000.0, Money::from_rupiah(630)).with_unit("ml")
    }

    fn espresso() -> Ingredient {
        Ingredient::compound(
            "espresso",
            vec![
                CompositionEntry::new("beans", 18.0),
                CompositionEntry::new("water", 36.0),
            ],
            36.0,
        )
        .with_unit("ml")
    }

    fn registry() -> IngredientRegistry {
        IngredientRegistry::from(vec![beans(), water(), espresso()])
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_leaf_cost_with_waste() {
        let registry = registry();
        let resolver = CostResolver::new(&registry);

        // 340/g × 250 g × 1.03
        let report = resolver.resolve_cost(Some(&beans()), 250.0).unwrap();
        assert_close(report.value, 87_550.0);
        assert!(report.is_complete());

        // Rp 170.000 per 1000 g: 170 × 250 × 1.03
        let kilo_bag = Ingredient::leaf("beans-1kg", 1000.0, Money::from_rupiah(170_000))
            .with_waste_percent(3.0);
        let report = resolver.resolve_cost(Some(&kilo_bag), 250.0).unwrap();
        assert_close(report.value, 43_775.0);
        assert_eq!(report.to_money().rupiah(), 43_775);
    }

    #[test]
    fn test_compound_cost() {
        let registry = registry();
        let resolver = CostResolver::new(&registry);

        let unit = resolver.unit_cost(registry.get("espresso"));
        assert_close(unit.value, (18.0 * 340.0 + 36.0 * 0.63) / 36.0);
        assert_close(unit.value, 170.63);

        // Children's waste does not leak into the parent's unit cost.
        let cost = resolver.cost_of("espresso", 36.0).unwrap();
        assert_close(cost.value, unit.value * 36.0);
    }

    #[test]
    fn test_zero_quantity_charges_one_unit() {
        let sticker = Ingredient::leaf("sticker", 100.0, Money::from_rupiah(15_000));
        let registry = IngredientRegistry::from(vec![sticker.clone()]);
        let resolver = CostResolver::new(&registry);

        let zero = resolver.resolve_cost(Some(&sticker), 0.0).unwrap();
        let one = resolver.resolve_cost(Some(&sticker), 1.0).unwrap();
        assert_eq!(zero, one);
        assert_close(zero.value, 150.0);
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let registry = registry();
        let resolver = CostResolver::new(&registry);

        let err = resolver.resolve_cost(Some(&beans()), -5.0).unwrap_err();
        assert!(matches!(err, ValidationError::NegativeQuantity { .. }));
        assert!(resolver.cost_of("beans", f64::NAN).is_err());
        assert!(resolver.cost_of("ghost", -1.0).is_err());
    }

    #[test]
    fn test_leaf_with_zero_net_quantity_costs_zero() {
        let broken = Ingredient::leaf("broken", 0.0, Money::from_rupiah(10_000));
        let registry = IngredientRegistry::from(vec![broken.clone()]);
        let resolver = CostResolver::new(&registry);

        assert_eq!(resolver.unit_cost(Some(&broken)).value, 0.0);
    }

    #[test]
    fn test_missing_ingredient_is_zero_and_reported() {
        let registry = registry();
        let resolver = CostResolver::new(&registry);

        assert_eq!(resolver.unit_cost(None).value, 0.0);

        let report = resolver.cost_of("deleted", 10.0).unwrap();
        assert_eq!(report.value, 0.0);
        assert_eq!(
            report.diagnostics,
            vec![CostDiagnostic::MissingReference {
                parent: None,
                ingredient_id: "deleted".to_string(),
            }]
        );
    }

    #[test]
    fn test_missing_child_contributes_zero() {
        let mut registry = registry();
        registry.insert(Ingredient::compound(
            "latte-base",
            vec![
                CompositionEntry::new("espresso", 36.0),
                CompositionEntry::new("oat-milk", 150.0),
            ],
            186.0,
        ));
        let resolver = CostResolver::new(&registry);

        let report = resolver.unit_cost(registry.get("latte-base"));
        let espresso_unit = resolver.unit_cost(registry.get("espresso")).value;
        assert_close(report.value, espresso_unit * 36.0 / 186.0);
        assert_eq!(
            report.diagnostics,
            vec![CostDiagnostic::MissingReference {
                parent: Some("latte-base".to_string()),
                ingredient_id: "oat-milk".to_string(),
            }]
        );
    }

    #[test]
    fn test_mutual_cycle_terminates_with_diagnostic() {
        let registry = IngredientRegistry::from(vec![
            Ingredient::compound(
                "a",
                vec![CompositionEntry::new("b", 1.0), CompositionEntry::new("water", 10.0)],
                1.0,
            ),
            Ingredient::compound("b", vec![CompositionEntry::new("a", 1.0)], 1.0),
            water(),
        ]);
        let resolver = CostResolver::new(&registry);

        let report = resolver.unit_cost(registry.get("a"));
        assert!(report.value.is_finite());
        // Only the water edge carries cost; b → a is cut.
        assert_close(report.value, 10.0 * 0.63);
        assert_eq!(
            report.diagnostics,
            vec![CostDiagnostic::CyclicComposition {
                path: vec!["a".to_string(), "b".to_string(), "a".to_string()],
            }]
        );
    }

    #[test]
    fn test_self_reference_terminates() {
        let registry = IngredientRegistry::from(vec![Ingredient::compound(
            "loop",
            vec![CompositionEntry::new("loop", 2.0)],
            1.0,
        )]);
        let resolver = CostResolver::new(&registry);

        let report = resolver.unit_cost(registry.get("loop"));
        assert_eq!(report.value, 0.0);
        assert!(!report.is_complete());
    }

    #[test]
    fn test_seeded_visited_set_cuts_expansion() {
        let registry = registry();
        let resolver = CostResolver::new(&registry);
        let visited: HashSet<String> = ["espresso".to_string()].into_iter().collect();

        let report = resolver.resolve_unit_cost(registry.get("espresso"), &visited);
        assert_eq!(report.value, 0.0);
    }

    #[test]
    fn test_shared_child_is_not_a_cycle() {
        // Diamond: mocha → espresso, mocha → chocolate → espresso
        let mut registry = registry();
        registry.insert(Ingredient::compound(
            "chocolate",
            vec![CompositionEntry::new("espresso", 1.0)],
            1.0,
        ));
        registry.insert(Ingredient::compound(
            "mocha",
            vec![
                CompositionEntry::new("espresso", 1.0),
                CompositionEntry::new("chocolate", 1.0),
            ],
            2.0,
        ));
        let resolver = CostResolver::new(&registry);

        let report = resolver.unit_cost(registry.get("mocha"));
        let espresso_unit = resolver.unit_cost(registry.get("espresso")).value;
        assert_close(report.value, espresso_unit);
        assert!(report.is_complete());
    }

    #[test]
    fn test_cost_sheet_from_recipe() {
        let registry = registry();
        let resolver = CostResolver::new(&registry);
        let mut item = MenuItem::new("americano", "Americano", Money::from_rupiah(20_000));
        item.recipe = vec![
            CompositionEntry::new("espresso", 36.0),
            CompositionEntry::new("water", 150.0),
        ];

        let sheet = resolver.cost_sheet(&item).unwrap();
        assert_eq!(sheet.source, CostSource::Recipe);
        // 170.63 × 36 + 0.63 × 150 = 6142.68 + 94.5 = 6237.18
        assert_eq!(sheet.cost, Some(Money::from_rupiah(6_237)));
        assert_eq!(sheet.margin, Some(Money::from_rupiah(13_763)));
        assert!(sheet.diagnostics.is_empty());
    }

    #[test]
    fn test_cost_sheet_falls_back_to_manual_base_price() {
        let registry = registry();
        let resolver = CostResolver::new(&registry);
        let mut item = MenuItem::new("cookie", "Cookie", Money::from_rupiah(10_000));

        assert_eq!(resolver.cost_sheet(&item).unwrap().source, CostSource::Unknown);

        item.base_price = Some(Money::from_rupiah(4_000));
        let sheet = resolver.cost_sheet(&item).unwrap();
        assert_eq!(sheet.source, CostSource::Manual);
        assert_eq!(sheet.margin, Some(Money::from_rupiah(6_000)));
        assert_eq!(sheet.margin_pct, Some(60.0));
    }

    #[test]
    fn test_find_composition_cycle() {
        let mut registry = registry();
        assert_eq!(find_composition_cycle(&registry, "espresso"), None);

        registry.insert(Ingredient::compound(
            "syrup",
            vec![CompositionEntry::new("caramel", 1.0)],
            1.0,
        ));
        registry.insert(Ingredient::compound(
            "caramel",
            vec![CompositionEntry::new("syrup", 1.0)],
            1.0,
        ));

        assert_eq!(
            find_composition_cycle(&registry, "syrup"),
            Some(vec!["syrup".to_string(), "caramel".to_string(), "syrup".to_string()])
        );
    }

    #[test]
    fn test_unit_cost_table_is_sorted() {
        let registry = registry();
        let table = CostResolver::new(&registry).unit_cost_table();
        let ids: Vec<&str> = table.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["beans", "espresso", "water"]);
    }
}
