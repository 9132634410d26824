//! # Validation Module
//!
//! Input and catalog validation for Kasir.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Save time (back office)                                                │
//! │  ├── validate_addon_definition / validate_addon_catalog                 │
//! │  └── validate_ingredient (missing children, cycles, bad numbers)        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Sale time (session commands)                                           │
//! │  ├── validate_item_id / validate_line_quantity / validate_cart_size     │
//! │  ├── validate_discount                                                  │
//! │  └── pricing::build_cart_line re-checks each add-on definition it uses  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kasir_core::validation::{validate_item_id, validate_line_quantity};
//!
//! validate_item_id("latte").unwrap();
//! validate_line_quantity(5).unwrap();
//! assert!(validate_line_quantity(0).is_err());
//! ```

use std::collections::HashSet;

use crate::costing::find_composition_cycle;
use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{AddonDefinition, Ingredient, IngredientRegistry};
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY, MAX_PRICE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a menu item, add-on, or ingredient id.
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters
pub fn validate_item_id(id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    if id.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "id".to_string(),
            max: 64,
        });
    }

    Ok(())
}

/// Validates a display name.
///
/// ## Example
/// ```rust
/// use kasir_core::validation::validate_name;
///
/// assert!(validate_name("Es Kopi Susu").is_ok());
/// assert!(validate_name("").is_err());
/// ```
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates free-text line notes ("less ice"). Empty is fine.
pub fn validate_notes(notes: &str) -> ValidationResult<()> {
    if notes.len() > 500 {
        return Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: 500,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (999)
pub fn validate_line_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY as i64 {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1.0,
            max: MAX_LINE_QUANTITY as f64,
        });
    }

    Ok(())
}

/// Validates a selling or buying price. Zero is allowed (free items).
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() || price > MAX_PRICE {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0.0,
            max: MAX_PRICE.as_f64(),
        });
    }

    Ok(())
}

/// Validates discount inputs before they reach the totals aggregator.
///
/// ## Rules
/// - `rp` must be non-negative
/// - `pct` must be finite and within 0..=100
pub fn validate_discount(rp: Money, pct: f64) -> ValidationResult<()> {
    if rp.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "discountRp".to_string(),
            min: 0.0,
            max: i64::MAX as f64,
        });
    }

    if !pct.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: "discountPct".to_string(),
            reason: "must be a finite number".to_string(),
        });
    }

    if !(0.0..=100.0).contains(&pct) {
        return Err(ValidationError::OutOfRange {
            field: "discountPct".to_string(),
            min: 0.0,
            max: 100.0,
        });
    }

    Ok(())
}

// =============================================================================
// Catalog Validators
// =============================================================================

/// Validates one add-on definition against its own bounds.
///
/// Returns `InvalidConfiguration` naming the first broken rule. Used at
/// save time and again by pricing for every definition it relies on.
///
/// ## Rules
/// - `max_quantity`, when set, is at least the effective minimum
/// - `default_quantity`, when set, lies within the bounds (0 is allowed
///   for optional add-ons)
/// - `unit_price` lies within `0..=MAX_PRICE`
pub fn validate_addon_definition(def: &AddonDefinition) -> ValidationResult<()> {
    let invalid = |reason: String| ValidationError::InvalidConfiguration {
        addon_id: def.id.clone(),
        reason,
    };

    if def.unit_price.is_negative() {
        return Err(invalid(format!("negative price {}", def.unit_price)));
    }
    if def.unit_price > MAX_PRICE {
        return Err(invalid(format!("price {} exceeds {}", def.unit_price, MAX_PRICE)));
    }

    let min = def.effective_min();
    if let Some(max) = def.max_quantity {
        if max < min {
            return Err(invalid(format!("max {} is below min {}", max, min)));
        }
    }

    if let Some(default) = def.default_quantity {
        if def.max_quantity.is_some_and(|max| default > max) {
            return Err(invalid(format!("default {} exceeds max", default)));
        }
        let omitted_ok = default == 0 && !def.is_required;
        if default < min && !omitted_ok {
            return Err(invalid(format!("default {} is below min {}", default, min)));
        }
    }

    Ok(())
}

/// Validates a whole add-on catalog for one item.
///
/// Collects every problem: missing ids or names, duplicate ids, and each
/// misconfigured definition.
pub fn validate_addon_catalog(catalog: &[AddonDefinition]) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for def in catalog {
        if let Err(e) = validate_item_id(&def.id) {
            errors.push(e);
            continue;
        }
        if let Err(e) = validate_name(&def.name) {
            errors.push(e);
        }
        if !seen.insert(def.id.as_str()) {
            errors.push(ValidationError::Duplicate {
                field: "addon id".to_string(),
                value: def.id.clone(),
            });
        }
        if let Err(e) = validate_addon_definition(def) {
            errors.push(e);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates an ingredient before it is saved into `registry`.
///
/// `registry` is the state the ingredient will join; an existing entry
/// with the same id is treated as replaced. Rejects numbers the resolver
/// would have to treat as zero, dangling children, and any composition
/// cycle the new definition would close.
pub fn validate_ingredient(
    ingredient: &Ingredient,
    registry: &IngredientRegistry,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = validate_item_id(&ingredient.id) {
        errors.push(e);
    }
    if let Err(e) = validate_price(ingredient.unit_buy_price) {
        errors.push(e);
    }
    if !ingredient.net_quantity.is_finite() || ingredient.net_quantity < 0.0 {
        errors.push(ValidationError::NegativeQuantity {
            field: "netQuantity".to_string(),
            value: ingredient.net_quantity,
        });
    }
    if !ingredient.waste_percent.is_finite() || !(0.0..100.0).contains(&ingredient.waste_percent) {
        errors.push(ValidationError::OutOfRange {
            field: "wastePercent".to_string(),
            min: 0.0,
            max: 100.0,
        });
    }

    if !ingredient.composition.is_empty() {
        if ingredient.compound_yield().is_none() {
            errors.push(ValidationError::MustBePositive {
                field: "compositionYield".to_string(),
            });
        }

        for entry in &ingredient.composition {
            if !entry.quantity.is_finite() || entry.quantity < 0.0 {
                errors.push(ValidationError::NegativeQuantity {
                    field: format!("composition.{}", entry.ingredient_id),
                    value: entry.quantity,
                });
            }
            if entry.ingredient_id != ingredient.id && !registry.contains(&entry.ingredient_id) {
                errors.push(ValidationError::InvalidFormat {
                    field: format!("composition.{}", entry.ingredient_id),
                    reason: "references an unknown ingredient".to_string(),
                });
            }
        }

        let mut proposed = registry.clone();
        proposed.insert(ingredient.clone());
        if let Some(path) = find_composition_cycle(&proposed, &ingredient.id) {
            errors.push(ValidationError::InvalidFormat {
                field: "composition".to_string(),
                reason: format!("creates a cycle: {}", path.join(" -> ")),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates that one more line fits in the cart.
///
/// ## Rules
/// - Must not exceed MAX_CART_LINES (100)
pub fn validate_cart_size(current_lines: usize) -> ValidationResult<()> {
    validate_cart_size_with(current_lines, MAX_CART_LINES)
}

/// Same as [`validate_cart_size`] with a configured limit.
pub fn validate_cart_size_with(current_lines: usize, max_lines: usize) -> ValidationResult<()> {
    if current_lines >= max_lines {
        return Err(ValidationError::OutOfRange {
            field: "cart lines".to_string(),
            min: 0.0,
            max: max_lines as f64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
