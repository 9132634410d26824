//! # Session Error Types
//!
//! What commands return when they fail, plus the loading errors.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Command Function                                                       │
//! │  Result<T, ApiError>                                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  CoreError::LineRejected ──────► ApiError {                             │
//! │                                    code: "ADDON_CONSTRAINT",            │
//! │                                    message: "Cannot add latte: ...",    │
//! │                                    details: [one line per constraint]   │
//! │                                  }                                      │
//! │                                                                         │
//! │  ConfigError / LoadError ──────► startup and the quote binary only      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The client shows `message` as a banner and `details` inline.

use serde::Serialize;
use thiserror::Error;

use kasir_core::{CoreError, ValidationError};

// =============================================================================
// API Error
// =============================================================================

/// Error returned from session commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "ADDON_CONSTRAINT",
///   "message": "Cannot add latte: 2 add-on constraint(s) unmet",
///   "details": ["Sugar level requires at least 1 (selected 0)", "..."]
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// One entry per unmet constraint, empty when there is only `message`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Add-on selection does not satisfy the catalog
    AddonConstraint,

    /// Cart operation failed
    CartError,

    /// Cart no longer matches the current catalog
    PriceDrift,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Attaches per-constraint detail lines.
    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a cart error.
    pub fn cart(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::CartError, message)
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let details = match &err {
            CoreError::LineRejected { .. } | CoreError::SkipRejected { .. } => err.messages(),
            _ => Vec::new(),
        };

        let code = match &err {
            CoreError::MenuItemNotFound(_) | CoreError::LineNotFound(_) => ErrorCode::NotFound,
            CoreError::CartTooLarge { .. } => ErrorCode::CartError,
            CoreError::QuantityTooLarge { .. } | CoreError::Validation(_) => {
                ErrorCode::ValidationError
            }
            CoreError::LineRejected { .. } | CoreError::SkipRejected { .. } => {
                ErrorCode::AddonConstraint
            }
        };

        let message = match &err {
            CoreError::MenuItemNotFound(id) => format!("Menu item not found: {}", id),
            CoreError::LineNotFound(key) => format!("Cart line not found: {}", key),
            other => other.to_string(),
        };

        ApiError::new(code, message).with_details(details)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading or saving `kasir.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("No config path available")]
    NoPath,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Snapshot Loading Errors
// =============================================================================

/// Errors while loading a catalog snapshot or a draft from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Api(#[from] ApiError),
}

// =============================================================================
// Unit Tests
// =============================================================================
