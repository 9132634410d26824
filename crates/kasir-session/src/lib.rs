//! # Kasir Session Library
//!
//! The session layer of one POS terminal: owns the catalog snapshot, the
//! cart, and the configuration, and exposes them as commands.
//!
//! ## Module Organization
//! ```text
//! kasir_session/
//! ├── lib.rs          ◄─── You are here (Session, tracing setup)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── catalog.rs  ◄─── Catalog snapshot (RwLock<Arc<_>>)
//! │   ├── cart.rs     ◄─── Cart state management
//! │   └── config.rs   ◄─── kasir.toml + KASIR_* overrides
//! ├── commands/
//! │   ├── cart.rs     ◄─── Add-on options and cart edits
//! │   ├── order.rs    ◄─── Verification and order payload
//! │   ├── draft.rs    ◄─── Draft save / restore
//! │   └── costing.rs  ◄─── Cost sheets
//! ├── error.rs        ◄─── ApiError, ConfigError, LoadError
//! └── bin/
//!     └── kasir-quote.rs ◄─ Offline quote from a catalog and a draft
//! ```
//!
//! ## Multiple State Types
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Session                                                                │
//! │  ┌──────────────────┐ ┌──────────────────┐ ┌──────────────────────┐    │
//! │  │  CatalogState    │ │    CartState     │ │   SessionConfig      │    │
//! │  │                  │ │                  │ │                      │    │
//! │  │  • Menu          │ │  • Lines         │ │  • Store             │    │
//! │  │  • Add-ons       │ │  • Discount      │ │  • Cart limits       │    │
//! │  │  • Ingredients   │ │  • Customer      │ │  • Fee, draft expiry │    │
//! │  └──────────────────┘ └──────────────────┘ └──────────────────────┘    │
//! │                                                                         │
//! │  Commands borrow only the states they need.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All pricing, costing, and normalization lives in `kasir_core`.

pub mod commands;
pub mod error;
pub mod state;

use tracing::info;
use tracing_subscriber::EnvFilter;

use error::ConfigResult;
use state::{CartState, CatalogSnapshot, CatalogState, SessionConfig};

/// Default filter when neither `RUST_LOG` nor `logging.filter` is set.
pub const DEFAULT_LOG_FILTER: &str = "info,kasir=debug";

/// The states of one terminal, created together at startup.
#[derive(Debug)]
pub struct Session {
    pub catalog: CatalogState,
    pub cart: CartState,
    pub config: SessionConfig,
}

impl Session {
    /// Creates a session with an empty cart.
    ///
    /// The config is validated first; a config that fails is rejected. The
    /// snapshot is audited on the way in; problems are logged and the
    /// session starts anyway.
    pub fn new(config: SessionConfig, snapshot: CatalogSnapshot) -> ConfigResult<Self> {
        config.validate()?;

        let catalog = CatalogState::default();
        catalog.replace(snapshot);

        info!(
            store = %config.store.name,
            currency = %config.store.currency_code,
            "Session started"
        );

        Ok(Session {
            catalog,
            cart: CartState::new(),
            config,
        })
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=kasir_core=trace` - Show trace for the engine only
/// - Otherwise `filter` (from `logging.filter`), then `info,kasir=debug`
///
/// Calling this twice is harmless; the second call is ignored.
pub fn init_tracing(filter: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter.unwrap_or(DEFAULT_LOG_FILTER)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

// =============================================================================
// Unit Tests
// =============================================================================
