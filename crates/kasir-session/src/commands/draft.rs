//! # Draft Commands
//!
//! Saving the cart between sessions and restoring it.
//!
//! ## Restore Flow
//! ```text
//! stored JSON (any shape)
//!       │
//!       ▼
//! normalize_draft ──► None ──────────────► VALIDATION_ERROR
//!       │
//!       ▼
//! older than draft.max_age_hours? ──yes──► Expired (cart untouched)
//!       │ no
//!       ▼
//! Cart::restore (limits applied) ────────► Restored
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use kasir_core::draft::{normalize_cart_line, normalize_draft};
use kasir_core::DraftOrder;

use crate::commands::cart::CartResponse;
use crate::error::ApiError;
use crate::state::{CartState, SessionConfig};

/// Outcome of a restore attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DraftRestore {
    Restored {
        cart: CartResponse,
        /// Lines in the stored draft that could not be read or did not fit.
        /// Duplicates merged into another line are not counted.
        dropped_lines: usize,
    },
    Expired {
        saved_at: DateTime<Utc>,
    },
}

/// Captures the current cart as a draft.
pub fn save_draft(cart: &CartState, now: DateTime<Utc>) -> DraftOrder {
    let draft = cart.with_cart(|c| c.to_draft(now));
    debug!(lines = draft.cart.len(), "save_draft command");
    draft
}

/// Restores a stored draft into the session cart.
///
/// ## Errors
/// `VALIDATION_ERROR` when `raw` is not a draft object at all.
pub fn restore_draft(
    cart: &CartState,
    config: &SessionConfig,
    raw: &Value,
    now: DateTime<Utc>,
) -> Result<DraftRestore, ApiError> {
    debug!("restore_draft command");

    let draft = normalize_draft(raw).ok_or_else(|| ApiError::validation("Draft is not an object"))?;

    if let Some(max_age) = config.draft_max_age() {
        if draft.is_expired(now, max_age) {
            info!(saved_at = %draft.timestamp, "Draft expired, discarding");
            return Ok(DraftRestore::Expired {
                saved_at: draft.timestamp,
            });
        }
    }

    let unreadable = raw
        .get("cart")
        .and_then(Value::as_array)
        .map_or(0, |entries| {
            entries
                .iter()
                .filter(|entry| normalize_cart_line(entry).is_none())
                .count()
        });

    let (response, truncated) = cart.with_cart_mut(|c| {
        let truncated = c.restore(draft, &config.cart);
        (CartResponse::new(c, config.order.default_fee), truncated)
    });

    let dropped_lines = unreadable + truncated;
    info!(
        lines = response.lines.len(),
        unreadable,
        truncated,
        "Draft restored"
    );

    Ok(DraftRestore::Restored {
        cart: response,
        dropped_lines,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
