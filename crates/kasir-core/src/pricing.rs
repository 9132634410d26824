//! # Pricing Module
//!
//! Builds priced cart lines from a menu item, the cashier's add-on choices,
//! and the item's add-on catalog.
//!
//! ## Selection Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  For every ACTIVE add-on definition of the item (qty = 0 if omitted):   │
//! │                                                                         │
//! │  required  && qty < max(min, 1)      ──► RequiredAddonUnmet             │
//! │  !required && 0 < qty < min          ──► BelowMinimum                   │
//! │  max set   && qty > max              ──► QuantityExceedsMax             │
//! │  definition breaks its own bounds    ──► InvalidConfiguration           │
//! │                                                                         │
//! │  For every REQUESTED add-on id:                                         │
//! │  not in catalog, or inactive         ──► UnknownAddon                   │
//! │                                                                         │
//! │  All errors are collected; one bad selection never hides another.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Skip-All Gate
//! "Skip add-ons" is only offered when every active add-on is optional with
//! a zero minimum. Otherwise the gate reports which add-ons must be chosen,
//! which the client uses to disable the button.
//!
//! Everything here is pure: the catalog is a snapshot slice and the result
//! is a new [`CartLine`].

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{AddonDefinition, AddonSelection, CartLine, MenuItem, RequestedAddon};
use crate::validation::validate_addon_definition;

// =============================================================================
// Build Cart Line
// =============================================================================

/// Prices `item` with the requested add-ons.
///
/// The returned line has quantity 1 and no notes; the cart decides both.
/// Requested entries that share an add-on id are summed.
///
/// ## Example
/// ```rust
/// use kasir_core::money::Money;
/// use kasir_core::pricing::build_cart_line;
/// use kasir_core::types::{AddonDefinition, MenuItem, RequestedAddon};
///
/// let latte = MenuItem::new("latte", "Latte", Money::from_rupiah(25_000));
/// let catalog = vec![
///     AddonDefinition::new("shot", "Extra shot", Money::from_rupiah(5_000)).with_max(2),
/// ];
///
/// let line = build_cart_line(&latte, &[RequestedAddon::new("shot", 2)], &catalog).unwrap();
/// assert_eq!(line.unit_price.rupiah(), 35_000);
/// assert_eq!(line.identity_key.as_str(), "latte|shot=2");
///
/// let errors = build_cart_line(&latte, &[RequestedAddon::new("shot", 3)], &catalog).unwrap_err();
/// assert_eq!(errors.len(), 1);
/// ```
pub fn build_cart_line(
    item: &MenuItem,
    requested: &[RequestedAddon],
    catalog: &[AddonDefinition],
) -> Result<CartLine, Vec<ValidationError>> {
    let active = active_addons(catalog);
    let quantities = merge_requested(requested);
    let mut errors = Vec::new();

    for (addon_id, _) in &quantities {
        if !active.iter().any(|def| def.id == *addon_id) {
            errors.push(ValidationError::UnknownAddon {
                addon_id: addon_id.to_string(),
            });
        }
    }

    let mut selections = Vec::new();
    for def in &active {
        let qty = quantity_for(&quantities, &def.id);

        if qty > 0 || !def.is_skippable() {
            if let Err(e) = validate_addon_definition(def) {
                errors.push(e);
                continue;
            }
        }

        errors.extend(check_selection(def, qty));

        if qty > 0 {
            selections.push(AddonSelection {
                addon_id: def.id.clone(),
                name: def.name.clone(),
                quantity: qty,
                unit_price_at_selection: def.unit_price,
            });
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(CartLine::assemble(
        item.id.clone(),
        item.name.clone(),
        item.price,
        selections,
        1,
        None,
    ))
}

/// Re-prices an existing line against the current catalog.
///
/// Keeps the line's quantity and notes; add-on prices are taken fresh from
/// the catalog, so a difference in `unit_price` means the catalog changed
/// since the line was built.
pub fn rebuild_cart_line(
    line: &CartLine,
    item: &MenuItem,
    catalog: &[AddonDefinition],
) -> Result<CartLine, Vec<ValidationError>> {
    let requested: Vec<RequestedAddon> = line
        .addons
        .iter()
        .filter(|a| a.quantity > 0)
        .map(|a| RequestedAddon::new(a.addon_id.clone(), a.quantity))
        .collect();

    let mut rebuilt = build_cart_line(item, &requested, catalog)?;
    rebuilt.quantity = line.quantity;
    rebuilt.notes = line.notes.clone();
    Ok(rebuilt)
}

/// Checks one active definition against the quantity chosen for it.
fn check_selection(def: &AddonDefinition, qty: u32) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if def.is_required && qty < def.effective_min() {
        errors.push(ValidationError::RequiredAddonUnmet {
            addon_id: def.id.clone(),
            name: def.name.clone(),
            min: def.effective_min(),
            requested: qty,
        });
    } else if !def.is_required && qty > 0 && qty < def.min_quantity {
        errors.push(ValidationError::BelowMinimum {
            addon_id: def.id.clone(),
            name: def.name.clone(),
            min: def.min_quantity,
            requested: qty,
        });
    }

    if let Some(max) = def.max_quantity {
        if qty > max {
            errors.push(ValidationError::QuantityExceedsMax {
                addon_id: def.id.clone(),
                name: def.name.clone(),
                max,
                requested: qty,
            });
        }
    }

    errors
}

/// Active definitions, first occurrence of each id wins.
fn active_addons(catalog: &[AddonDefinition]) -> Vec<&AddonDefinition> {
    let mut seen = HashMap::new();
    catalog
        .iter()
        .filter(|def| def.is_active)
        .filter(|def| seen.insert(def.id.as_str(), ()).is_none())
        .collect()
}

/// Sums requested quantities per add-on id, preserving first-seen order.
fn merge_requested(requested: &[RequestedAddon]) -> Vec<(&str, u32)> {
    let mut merged: Vec<(&str, u32)> = Vec::new();
    for req in requested {
        match merged.iter_mut().find(|(id, _)| *id == req.addon_id) {
            Some((_, qty)) => *qty = qty.saturating_add(req.quantity),
            None => merged.push((req.addon_id.as_str(), req.quantity)),
        }
    }
    merged
}

fn quantity_for(quantities: &[(&str, u32)], addon_id: &str) -> u32 {
    quantities
        .iter()
        .find(|(id, _)| *id == addon_id)
        .map(|(_, qty)| *qty)
        .unwrap_or(0)
}

// =============================================================================
// Skip-All Gate
// =============================================================================

/// Whether "skip add-ons" may be offered for an item.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SkipGate {
    Allowed,
    /// Names of the active add-ons that must be chosen.
    Blocked { required: Vec<String> },
}

impl SkipGate {
    pub fn is_allowed(&self) -> bool {
        matches!(self, SkipGate::Allowed)
    }
}

/// Evaluates the skip-all gate for an item's catalog.
pub fn skip_gate(catalog: &[AddonDefinition]) -> SkipGate {
    let required: Vec<String> = active_addons(catalog)
        .into_iter()
        .filter(|def| !def.is_skippable())
        .map(|def| def.name.clone())
        .collect();

    if required.is_empty() {
        SkipGate::Allowed
    } else {
        SkipGate::Blocked { required }
    }
}

/// Builds the bare line for an item when add-ons may be skipped.
///
/// ## Errors
/// `CoreError::SkipRejected` naming every add-on that must be chosen.
pub fn skip_addons(item: &MenuItem, catalog: &[AddonDefinition]) -> CoreResult<CartLine> {
    match skip_gate(catalog) {
        SkipGate::Allowed => Ok(CartLine::assemble(
            item.id.clone(),
            item.name.clone(),
            item.price,
            Vec::new(),
            1,
            None,
        )),
        SkipGate::Blocked { required } => Err(CoreError::SkipRejected { required }),
    }
}

// =============================================================================
// Default Selections
// =============================================================================

/// Prefilled choices for the selection UI.
///
/// Uses each active add-on's `default_quantity`; mandatory add-ons without
/// a default start at their effective minimum. Zero quantities are omitted.
pub fn default_selections(catalog: &[AddonDefinition]) -> Vec<RequestedAddon> {
    active_addons(catalog)
        .into_iter()
        .filter_map(|def| {
            let qty = match def.default_quantity {
                Some(default) => default,
                None if !def.is_skippable() => def.effective_min(),
                None => 0,
            };
            (qty > 0).then(|| RequestedAddon::new(def.id.clone(), qty))
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    fn latte() -> MenuItem {
        MenuItem::new("latte", "Iced Latte", Money::from_rupiah(25_000))
    }

    fn catalog() -> Vec<AddonDefinition> {
        vec![
            AddonDefinition::new("sugar", "Sugar level", Money::zero())
                .required(1)
                .with_max(1)
                .with_default(1),
            AddonDefinition::new("shot", "Extra shot", Money::from_rupiah(5_000)).with_max(2),
            AddonDefinition::new("boba", "Boba", Money::from_rupiah(4_000)).inactive(),
            AddonDefinition::new("syrup", "Vanilla syrup", Money::from_rupiah(3_000)),
        ]
    }

    #[test]
    fn test_build_line_prices_addons() {
        let line = build_cart_line(
            &latte(),
            &[
                RequestedAddon::new("shot", 2),
                RequestedAddon::new("sugar", 1),
                RequestedAddon::new("syrup", 0),
            ],
            &catalog(),
        )
        .unwrap();

        assert_eq!(line.base_price.rupiah(), 25_000);
        assert_eq!(line.unit_price.rupiah(), 35_000);
        assert_eq!(line.quantity, 1);
        assert_eq!(line.addons.len(), 2);
        assert_eq!(line.identity_key.as_str(), "latte|shot=2,sugar=1");
    }

    #[test]
    fn test_selection_order_does_not_change_key() {
        let a = build_cart_line(
            &latte(),
            &[RequestedAddon::new("shot", 2), RequestedAddon::new("sugar", 1)],
            &catalog(),
        )
        .unwrap();
        let b = build_cart_line(
            &latte(),
            &[RequestedAddon::new("sugar", 1), RequestedAddon::new("shot", 2)],
            &catalog(),
        )
        .unwrap();

        assert_eq!(a.identity_key, b.identity_key);
        assert_eq!(a, b);
    }

    #[test]
    fn test_required_addon_unmet() {
        let errors = build_cart_line(
            &latte(),
            &[RequestedAddon::new("sugar", 0)],
            &catalog(),
        )
        .unwrap_err();

        assert_eq!(
            errors,
            vec![ValidationError::RequiredAddonUnmet {
                addon_id: "sugar".to_string(),
                name: "Sugar level".to_string(),
                min: 1,
                requested: 0,
            }]
        );
    }

    #[test]
    fn test_omitted_required_addon_is_unmet() {
        let errors = build_cart_line(&latte(), &[], &catalog()).unwrap_err();
        assert!(matches!(errors[0], ValidationError::RequiredAddonUnmet { .. }));
    }

    #[test]
    fn test_errors_are_collected_not_short_circuited() {
        let errors = build_cart_line(
            &latte(),
            &[
                RequestedAddon::new("shot", 3),
                RequestedAddon::new("boba", 1),
                RequestedAddon::new("ghost", 1),
            ],
            &catalog(),
        )
        .unwrap_err();

        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::UnknownAddon {
            addon_id: "boba".to_string()
        }));
        assert!(errors.contains(&ValidationError::UnknownAddon {
            addon_id: "ghost".to_string()
        }));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::QuantityExceedsMax { max: 2, requested: 3, .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::RequiredAddonUnmet { .. })));
    }

    #[test]
    fn test_duplicate_requests_are_summed() {
        let errors = build_cart_line(
            &latte(),
            &[
                RequestedAddon::new("sugar", 1),
                RequestedAddon::new("shot", 2),
                RequestedAddon::new("shot", 1),
            ],
            &catalog(),
        )
        .unwrap_err();

        assert_eq!(
            errors,
            vec![ValidationError::QuantityExceedsMax {
                addon_id: "shot".to_string(),
                name: "Extra shot".to_string(),
                max: 2,
                requested: 3,
            }]
        );
    }

    #[test]
    fn test_optional_addon_below_minimum() {
        let catalog = vec![
            AddonDefinition::new("pearl", "Pearls", Money::from_rupiah(2_000)).with_min(2),
        ];

        assert!(build_cart_line(&latte(), &[], &catalog).is_ok());

        let errors =
            build_cart_line(&latte(), &[RequestedAddon::new("pearl", 1)], &catalog).unwrap_err();
        assert!(matches!(errors[0], ValidationError::BelowMinimum { min: 2, .. }));
    }

    #[test]
    fn test_misconfigured_definition_is_refused_not_clamped() {
        let catalog = vec![AddonDefinition::new("cream", "Cream", Money::from_rupiah(2_000))
            .with_min(3)
            .with_max(1)];

        let errors =
            build_cart_line(&latte(), &[RequestedAddon::new("cream", 1)], &catalog).unwrap_err();
        assert!(matches!(errors[0], ValidationError::InvalidConfiguration { .. }));

        // Untouched optional add-ons don't block the item.
        let broken_optional = vec![AddonDefinition::new("cream", "Cream", Money::zero())
            .with_max(1)
            .with_default(5)];
        assert!(build_cart_line(&latte(), &[], &broken_optional).is_ok());
    }

    #[test]
    fn test_frozen_price_survives_catalog_change() {
        let mut catalog = catalog();
        let line = build_cart_line(
            &latte(),
            &[RequestedAddon::new("sugar", 1), RequestedAddon::new("shot", 1)],
            &catalog,
        )
        .unwrap();

        catalog[1].unit_price = Money::from_rupiah(7_000);
        assert_eq!(line.unit_price.rupiah(), 30_000);

        let rebuilt = rebuild_cart_line(&line, &latte(), &catalog).unwrap();
        assert_eq!(rebuilt.unit_price.rupiah(), 32_000);
        assert_eq!(rebuilt.identity_key, line.identity_key);
    }

    #[test]
    fn test_skip_gate_blocks_on_required_or_minimum() {
        assert_eq!(
            skip_gate(&catalog()),
            SkipGate::Blocked {
                required: vec!["Sugar level".to_string()]
            }
        );

        let with_min = vec![AddonDefinition::new("pearl", "Pearls", Money::zero()).with_min(1)];
        assert!(!skip_gate(&with_min).is_allowed());

        let inactive_required =
            vec![AddonDefinition::new("sugar", "Sugar", Money::zero()).required(1).inactive()];
        assert!(skip_gate(&inactive_required).is_allowed());
    }

    #[test]
    fn test_skip_addons() {
        match skip_addons(&latte(), &catalog()) {
            Err(CoreError::SkipRejected { required }) => {
                assert_eq!(required, vec!["Sugar level".to_string()]);
            }
            other => panic!("expected SkipRejected, got {:?}", other),
        }

        let optional_only = vec![
            AddonDefinition::new("shot", "Extra shot", Money::from_rupiah(5_000)),
            AddonDefinition::new("syrup", "Vanilla syrup", Money::from_rupiah(3_000)),
        ];
        let line = skip_addons(&latte(), &optional_only).unwrap();
        assert!(line.addons.is_empty());
        assert_eq!(line.identity_key.as_str(), "latte");
        assert_eq!(line.unit_price.rupiah(), 25_000);
    }

    #[test]
    fn test_default_selections() {
        let mut catalog = catalog();
        catalog.push(AddonDefinition::new("ice", "Ice", Money::zero()).required(0));

        assert_eq!(
            default_selections(&catalog),
            vec![RequestedAddon::new("sugar", 1), RequestedAddon::new("ice", 1)]
        );

        // Defaults always produce a valid line.
        assert!(build_cart_line(&latte(), &default_selections(&catalog), &catalog).is_ok());
    }
}
