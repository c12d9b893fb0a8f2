//! # Remote Cart Contract
//!
//! The operations the cart store needs from the shop's cart service, and
//! the shape of the cart it returns.
//!
//! ```text
//! ┌──────────────┐  create_cart / query_cart   ┌─────────────────────────┐
//! │  CartStore   │ ──────────────────────────► │  impl CartBackend       │
//! │              │  add_line / update_line     │  ├── StorefrontClient   │
//! │              │  remove_lines               │  └── InMemoryBackend    │
//! │              │ ◄────────────────────────── │                         │
//! └──────────────┘        RemoteCart           └─────────────────────────┘
//! ```
//!
//! Every mutation answers with the complete cart after the change; the
//! store replaces its snapshot with it wholesale.

use std::future::Future;

use label_core::label::{CartItem, CartSnapshot, LineAttribute, LineId};
use label_core::Money;

use crate::error::BackendResult;

// =============================================================================
// Wire Types
// =============================================================================

/// Handle of a freshly created cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedCart {
    pub cart_id: String,
    pub checkout_url: String,
}

/// A line to add: the label product variant plus the configuration as
/// attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLine {
    pub variant_ref: String,
    pub quantity: u32,
    pub attributes: Vec<LineAttribute>,
}

/// One line of the remote cart.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteLine {
    pub id: LineId,
    pub quantity: u32,
    pub attributes: Vec<LineAttribute>,
    pub total_amount: Money,
}

/// The remote cart as returned by queries and mutations.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCart {
    pub id: String,
    pub checkout_url: String,
    pub total_quantity: u32,
    pub total_amount: Money,
    pub currency_code: String,
    pub lines: Vec<RemoteLine>,
}

impl RemoteCart {
    /// Derives the read model. Totals are taken from the remote cart, never
    /// recomputed from the lines.
    pub fn to_snapshot(&self, unit_price: Money) -> CartSnapshot {
        let items = self
            .lines
            .iter()
            .map(|line| {
                CartItem::from_remote_line(
                    line.id.clone(),
                    line.quantity,
                    &line.attributes,
                    line.total_amount,
                    unit_price,
                )
            })
            .collect();

        CartSnapshot {
            cart_id: self.id.clone(),
            checkout_url: self.checkout_url.clone(),
            items,
            total_quantity: self.total_quantity,
            total_price: self.total_amount,
            currency_code: self.currency_code.clone(),
        }
    }
}

// =============================================================================
// Backend Trait
// =============================================================================

/// The remote cart service.
///
/// Methods return `Send` futures so a store can be driven from spawned
/// tasks (the poller runs on its own task).
pub trait CartBackend: Send + Sync {
    /// Creates an empty cart.
    fn create_cart(&self) -> impl Future<Output = BackendResult<CreatedCart>> + Send;

    /// Reads a cart. `Ok(None)` means the handle is unknown or expired.
    fn query_cart(&self, cart_id: &str) -> impl Future<Output = BackendResult<Option<RemoteCart>>> + Send;

    /// Adds one line.
    fn add_line(&self, cart_id: &str, line: NewLine) -> impl Future<Output = BackendResult<RemoteCart>> + Send;

    /// Sets the quantity of one line.
    fn update_line(
        &self,
        cart_id: &str,
        line_id: &LineId,
        quantity: u32,
    ) -> impl Future<Output = BackendResult<RemoteCart>> + Send;

    /// Removes lines in one batch.
    fn remove_lines(
        &self,
        cart_id: &str,
        line_ids: &[LineId],
    ) -> impl Future<Output = BackendResult<RemoteCart>> + Send;
}
