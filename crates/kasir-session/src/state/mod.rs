//! # State Module
//!
//! Session state for one terminal.
//!
//! ## Multiple State Types
//! Each piece of state is its own type and each command takes only the
//! ones it touches.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────┐  ┌──────────────────┐          │
//! │  │  CatalogState    │  │  CartState   │  │  SessionConfig   │          │
//! │  │                  │  │              │  │                  │          │
//! │  │  RwLock<Arc<     │  │  Arc<Mutex<  │  │  store           │          │
//! │  │   CatalogSnap-   │  │    Cart      │  │  cart limits     │          │
//! │  │   shot>>         │  │  >>          │  │  default fee     │          │
//! │  │                  │  │              │  │  draft expiry    │          │
//! │  └──────────────────┘  └──────────────┘  └──────────────────┘          │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • CatalogState: readers clone the Arc, writers swap it whole          │
//! │  • CartState: Arc<Mutex<T>> for exclusive access                       │
//! │  • SessionConfig: read-only after load                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod catalog;
pub mod config;

pub use cart::{Cart, CartState};
pub use catalog::{CatalogSnapshot, CatalogState};
pub use config::SessionConfig;
