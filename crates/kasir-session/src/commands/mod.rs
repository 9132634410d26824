//! # Commands Module
//!
//! Everything a POS client can ask the session to do.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (exports)
//! ├── cart.rs     ◄─── Add-on options, line building, cart edits
//! ├── order.rs    ◄─── Drift verification, order payload
//! ├── draft.rs    ◄─── Save / restore between sessions
//! └── costing.rs  ◄─── Cost sheets and ingredient costs
//! ```
//!
//! ## State Injection
//! Each command declares only the state it needs:
//! ```rust,ignore
//! // Only needs the cart
//! fn get_cart(cart: &CartState, config: &SessionConfig)
//!
//! // Needs the catalog and the cart
//! fn add_to_cart(catalog: &CatalogState, cart: &CartState, config: &SessionConfig, ...)
//!
//! // Only needs the catalog
//! fn cost_sheet(catalog: &CatalogState, item_id: &str)
//! ```
//!
//! Commands return `Result<T, ApiError>`; the error serializes to
//! `{ code, message, details }` for the client.

pub mod cart;
pub mod costing;
pub mod draft;
pub mod order;
