//! # Session Configuration
//!
//! Store settings, cart limits, and draft expiry.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     KASIR_STORE_NAME="Kopi Senja"                                      │
//! │     KASIR_DRAFT_MAX_AGE_HOURS=12                                       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/kasir/kasir.toml (Linux)                                 │
//! │     ~/Library/Application Support/id.kasir.kasir/kasir.toml (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # kasir.toml
//! [store]
//! name = "Kopi Senja"
//! currency_code = "IDR"
//!
//! [cart]
//! max_lines = 100
//! max_line_quantity = 999
//!
//! [order]
//! default_fee = 0
//!
//! [draft]
//! max_age_hours = 24   # 0 keeps drafts forever
//!
//! [logging]
//! filter = "info,kasir=debug"
//! ```
//!
//! Read-only after startup, so commands borrow it without a lock.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use kasir_core::{Money, MAX_CART_LINES, MAX_LINE_QUANTITY};

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Sections
// =============================================================================

/// The shop this session sells for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_name")]
    pub name: String,

    /// ISO 4217 code; amounts are whole units of this currency.
    #[serde(default = "default_currency_code")]
    pub currency_code: String,
}

fn default_store_name() -> String {
    "Kasir".to_string()
}

fn default_currency_code() -> String {
    "IDR".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            name: default_store_name(),
            currency_code: default_currency_code(),
        }
    }
}

/// Cart size limits. Never above the engine's hard limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartConfig {
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,

    #[serde(default = "default_max_line_quantity")]
    pub max_line_quantity: u32,
}

fn default_max_lines() -> usize {
    MAX_CART_LINES
}

fn default_max_line_quantity() -> u32 {
    MAX_LINE_QUANTITY
}

impl Default for CartConfig {
    fn default() -> Self {
        CartConfig {
            max_lines: default_max_lines(),
            max_line_quantity: default_max_line_quantity(),
        }
    }
}

/// Order submission settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderConfig {
    /// Fee added to local estimates until the server supplies the real one.
    #[serde(default)]
    pub default_fee: Money,
}

/// Draft persistence settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftConfig {
    /// Drafts older than this are discarded on restore. 0 disables expiry.
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: u32,
}

fn default_max_age_hours() -> u32 {
    24
}

impl Default for DraftConfig {
    fn default() -> Self {
        DraftConfig {
            max_age_hours: default_max_age_hours(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` still wins when set.
    #[serde(default)]
    pub filter: Option<String>,
}

// =============================================================================
// Session Config
// =============================================================================

/// Complete session configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub cart: CartConfig,

    #[serde(default)]
    pub order: OrderConfig,

    #[serde(default)]
    pub draft: DraftConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SessionConfig {
    /// Loads configuration from file and environment.
    ///
    /// ## Loading Order
    /// 1. Start with defaults
    /// 2. Load from TOML file if it exists
    /// 3. Override with environment variables
    /// 4. Validate
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading session config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns defaults if loading fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load session config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses a `kasir.toml` document.
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoPath)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Session config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.store.currency_code.trim().len() != 3 {
            return Err(ConfigError::Invalid(format!(
                "currency_code must be a 3-letter ISO code, got: '{}'",
                self.store.currency_code
            )));
        }

        if self.cart.max_lines == 0 || self.cart.max_lines > MAX_CART_LINES {
            return Err(ConfigError::Invalid(format!(
                "cart.max_lines must be between 1 and {}",
                MAX_CART_LINES
            )));
        }

        if self.cart.max_line_quantity == 0 || self.cart.max_line_quantity > MAX_LINE_QUANTITY {
            return Err(ConfigError::Invalid(format!(
                "cart.max_line_quantity must be between 1 and {}",
                MAX_LINE_QUANTITY
            )));
        }

        if self.order.default_fee.is_negative() {
            return Err(ConfigError::Invalid(
                "order.default_fee cannot be negative".into(),
            ));
        }

        Ok(())
    }

    /// Applies `KASIR_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup. Unparseable values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("KASIR_STORE_NAME") {
            self.store.name = name;
        }

        if let Some(code) = lookup("KASIR_CURRENCY_CODE") {
            self.store.currency_code = code.to_uppercase();
        }

        if let Some(value) = lookup("KASIR_MAX_CART_LINES") {
            match value.parse::<usize>() {
                Ok(n) => self.cart.max_lines = n,
                Err(_) => warn!(value = %value, "Ignoring invalid KASIR_MAX_CART_LINES"),
            }
        }

        if let Some(value) = lookup("KASIR_MAX_LINE_QUANTITY") {
            match value.parse::<u32>() {
                Ok(n) => self.cart.max_line_quantity = n,
                Err(_) => warn!(value = %value, "Ignoring invalid KASIR_MAX_LINE_QUANTITY"),
            }
        }

        if let Some(value) = lookup("KASIR_DEFAULT_FEE") {
            match value.parse::<i64>() {
                Ok(fee) => self.order.default_fee = Money::from_rupiah(fee),
                Err(_) => warn!(value = %value, "Ignoring invalid KASIR_DEFAULT_FEE"),
            }
        }

        if let Some(value) = lookup("KASIR_DRAFT_MAX_AGE_HOURS") {
            match value.parse::<u32>() {
                Ok(hours) => {
                    debug!(hours, "Overriding draft max age from environment");
                    self.draft.max_age_hours = hours;
                }
                Err(_) => warn!(value = %value, "Ignoring invalid KASIR_DRAFT_MAX_AGE_HOURS"),
            }
        }

        if let Some(filter) = lookup("KASIR_LOG") {
            self.logging.filter = Some(filter);
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("id", "kasir", "kasir")
            .map(|dirs| dirs.config_dir().join("kasir.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Maximum draft age, or `None` when drafts never expire.
    pub fn draft_max_age(&self) -> Option<chrono::Duration> {
        (self.draft.max_age_hours > 0)
            .then(|| chrono::Duration::hours(i64::from(self.draft.max_age_hours)))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.store.currency_code, "IDR");
        assert_eq!(config.cart.max_lines, 100);
        assert_eq!(config.cart.max_line_quantity, 999);
        assert_eq!(config.order.default_fee, Money::zero());
        assert_eq!(config.draft_max_age(), Some(chrono::Duration::hours(24)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SessionConfig::from_toml_str(
            r#"
            [store]
            name = "Kopi Senja"

            [draft]
            max_age_hours = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.store.name, "Kopi Senja");
        assert_eq!(config.store.currency_code, "IDR");
        assert_eq!(config.cart.max_lines, 100);
        assert_eq!(config.draft_max_age(), None);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("KASIR_STORE_NAME", "Warung Teh"),
            ("KASIR_MAX_CART_LINES", "20"),
            ("KASIR_DEFAULT_FEE", "1500"),
            ("KASIR_DRAFT_MAX_AGE_HOURS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = SessionConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.store.name, "Warung Teh");
        assert_eq!(config.cart.max_lines, 20);
        assert_eq!(config.order.default_fee.rupiah(), 1500);
        assert_eq!(config.draft.max_age_hours, 24);
    }

    #[test]
    fn test_validate_rejects_limits_above_engine() {
        let mut config = SessionConfig::default();
        config.cart.max_lines = 500;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = SessionConfig::default();
        config.store.currency_code = "RUPIAH".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = SessionConfig::default();
        config.logging.filter = Some("debug".into());

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = SessionConfig::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir()
            .join(format!("kasir-config-{}", uuid::Uuid::new_v4()))
            .join("kasir.toml");

        let mut config = SessionConfig::default();
        config.store.name = "Kopi Senja".into();
        config.save(Some(path.clone())).unwrap();

        let loaded = SessionConfig::load(Some(path.clone())).unwrap();
        assert_eq!(loaded.store.name, "Kopi Senja");

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}
