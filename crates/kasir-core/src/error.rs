//! # Error Types
//!
//! Domain-specific error types for kasir-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kasir-core errors (this file)                                         │
//! │  ├── CoreError        - Cart / pricing failures                         │
//! │  ├── ValidationError  - One unmet constraint each (returned as a list) │
//! │  └── CostDiagnostic   - NOT an error: fail-soft cost findings           │
//! │                                                                         │
//! │  kasir-session errors (separate crate)                                 │
//! │  ├── ApiError         - What the client sees (serialized)              │
//! │  └── ConfigError      - kasir.toml / environment problems               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Fatal vs. Fail-Soft
//! | Condition            | Outcome                                        |
//! |----------------------|------------------------------------------------|
//! | Missing ingredient   | zero cost + `CostDiagnostic::MissingReference` |
//! | Cyclic composition   | zero cost + `CostDiagnostic::CyclicComposition`|
//! | Bad add-on selection | `Vec<ValidationError>`, caller decides         |
//! | Corrupted draft line | line dropped by the normalizer                 |

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Menu item id is not in the catalog snapshot.
    #[error("Menu item not found: {0}")]
    MenuItemNotFound(String),

    /// No cart line carries this identity key.
    #[error("Cart line not found: {0}")]
    LineNotFound(String),

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: u32, max: u32 },

    /// The add-on selection for an item failed one or more constraints.
    ///
    /// Every unmet constraint is listed, never only the first one.
    #[error("Cannot add {item_id}: {} add-on constraint(s) unmet", .errors.len())]
    LineRejected {
        item_id: String,
        errors: Vec<ValidationError>,
    },

    /// "Skip add-ons" was requested while some add-ons must be chosen.
    ///
    /// ## User Workflow
    /// ```text
    /// Item: Iced Latte
    ///   Sugar level  (required, min 1)
    ///   Extra shot   (optional)
    ///      │
    ///      ▼
    /// [Skip add-ons] ──► SkipRejected { required: ["Sugar level"] }
    ///      │
    ///      ▼
    /// UI disables the skip button and names "Sugar level"
    /// ```
    #[error("Add-ons cannot be skipped, choose: {}", .required.join(", "))]
    SkipRejected { required: Vec<String> },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns every constraint message carried by this error.
    ///
    /// Used to build one banner line per unmet constraint.
    pub fn messages(&self) -> Vec<String> {
        match self {
            CoreError::LineRejected { errors, .. } => {
                errors.iter().map(ToString::to_string).collect()
            }
            CoreError::SkipRejected { required } => required
                .iter()
                .map(|name| format!("{} must be selected", name))
                .collect(),
            other => vec![other.to_string()],
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input and selection validation errors.
///
/// Pricing returns these as a list so one bad selection never hides the
/// others. They are serializable because the client renders them inline
/// next to the add-on they refer to.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// Requested add-on is not in the item's catalog or is inactive.
    #[error("Add-on {addon_id} is not available for this item")]
    UnknownAddon { addon_id: String },

    /// A required add-on was omitted or chosen below its minimum.
    #[error("{name} requires at least {min} (selected {requested})")]
    RequiredAddonUnmet {
        addon_id: String,
        name: String,
        min: u32,
        requested: u32,
    },

    /// An optional add-on was chosen, but below its minimum.
    #[error("{name} must be at least {min} when selected (selected {requested})")]
    BelowMinimum {
        addon_id: String,
        name: String,
        min: u32,
        requested: u32,
    },

    /// Quantity is above the add-on's bound.
    #[error("{name} allows at most {max} (selected {requested})")]
    QuantityExceedsMax {
        addon_id: String,
        name: String,
        max: u32,
        requested: u32,
    },

    /// A definition violates its own constraints (rejected at save time,
    /// and refused at sale time rather than silently clamped).
    #[error("Add-on {addon_id} is misconfigured: {reason}")]
    InvalidConfiguration { addon_id: String, reason: String },

    /// A cost was requested for a negative quantity.
    #[error("{field} cannot be negative (got {value})")]
    NegativeQuantity { field: String, value: f64 },

    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: f64, max: f64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., non-finite number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., the same add-on listed twice in a catalog).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Cost Diagnostics
// =============================================================================

/// A fail-soft finding produced while resolving ingredient cost.
///
/// Neither case aborts resolution. Both contribute zero cost on the affected
/// edge, and both are reported so an operator can fix the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CostDiagnostic {
    /// A composition entry points at an ingredient that no longer exists.
    MissingReference {
        /// The compound ingredient holding the dangling entry, if any.
        parent: Option<String>,
        ingredient_id: String,
    },

    /// The composition path revisits an ingredient already being expanded.
    ///
    /// `path` starts at the first occurrence and ends with the repeat,
    /// e.g. `["syrup", "caramel", "syrup"]`.
    CyclicComposition { path: Vec<String> },
}

impl std::fmt::Display for CostDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CostDiagnostic::MissingReference {
                parent: Some(parent),
                ingredient_id,
            } => write!(f, "{} references missing ingredient {}", parent, ingredient_id),
            CostDiagnostic::MissingReference {
                parent: None,
                ingredient_id,
            } => write!(f, "missing ingredient {}", ingredient_id),
            CostDiagnostic::CyclicComposition { path } => {
                write!(f, "cyclic composition: {}", path.join(" -> "))
            }
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
