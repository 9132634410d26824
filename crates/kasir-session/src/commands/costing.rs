//! # Costing Commands
//!
//! Back-office cost and margin views. Informational only: nothing here
//! affects what a customer is charged.

use serde::Serialize;
use tracing::debug;

use kasir_core::{CostDiagnostic, CostResolver, CostSheet, Money};

use crate::error::ApiError;
use crate::state::CatalogState;

/// Cost of a quantity of one ingredient.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientCost {
    pub ingredient_id: String,
    pub quantity: f64,
    /// Unrounded cost, waste included.
    pub value: f64,
    /// `value` rounded half-up to whole rupiah.
    pub cost: Money,
    pub diagnostics: Vec<CostDiagnostic>,
}

/// Cost sheet of one menu item.
pub fn cost_sheet(catalog: &CatalogState, item_id: &str) -> Result<CostSheet, ApiError> {
    debug!(item_id = %item_id, "cost_sheet command");

    let snapshot = catalog.snapshot();
    let item = snapshot
        .menu_item(item_id)
        .ok_or_else(|| ApiError::not_found("Menu item", item_id))?;

    Ok(CostResolver::new(&snapshot.ingredients).cost_sheet(item)?)
}

/// Cost sheets of every menu item, in menu order.
///
/// Items whose recipe carries an unusable quantity are skipped.
pub fn menu_cost_sheets(catalog: &CatalogState) -> Vec<CostSheet> {
    debug!("menu_cost_sheets command");

    let snapshot = catalog.snapshot();
    let resolver = CostResolver::new(&snapshot.ingredients);
    snapshot
        .menu
        .iter()
        .filter_map(|item| match resolver.cost_sheet(item) {
            Ok(sheet) => Some(sheet),
            Err(e) => {
                debug!(item_id = %item.id, error = %e, "Skipping cost sheet");
                None
            }
        })
        .collect()
}

/// Cost of `quantity` of an ingredient.
///
/// ## Errors
/// - `NOT_FOUND` for an unknown ingredient
/// - `VALIDATION_ERROR` for a negative or non-finite quantity
pub fn ingredient_cost(
    catalog: &CatalogState,
    ingredient_id: &str,
    quantity: f64,
) -> Result<IngredientCost, ApiError> {
    debug!(ingredient_id = %ingredient_id, quantity = %quantity, "ingredient_cost command");

    let snapshot = catalog.snapshot();
    let ingredient = snapshot
        .ingredients
        .get(ingredient_id)
        .ok_or_else(|| ApiError::not_found("Ingredient", ingredient_id))?;

    let report = CostResolver::new(&snapshot.ingredients).resolve_cost(Some(ingredient), quantity)?;

    Ok(IngredientCost {
        ingredient_id: ingredient.id.clone(),
        quantity,
        value: report.value,
        cost: report.to_money(),
        diagnostics: report.diagnostics,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
