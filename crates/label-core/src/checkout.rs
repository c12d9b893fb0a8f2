//! # Checkout Data
//!
//! The order payload handed to the production backend once the customer
//! checks out. Every item carries its memoized `fontSizePt`, so the
//! printed label uses the size the customer saw in the preview.
//!
//! ```text
//!  CartSnapshot (remote totals) ──► CheckoutData ──► order webhook
//!                                    + customer info
//! ```
//!
//! Built only from a snapshot the remote store acknowledged; local sums
//! never enter the payload.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::label::{CartItem, CartSnapshot};
use crate::money::Money;

/// Optional contact details collected at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CustomerInfo {
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Items and totals of one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutData {
    /// Remote cart the order was placed from.
    pub cart_id: String,
    pub items: Vec<CartItem>,
    pub total_quantity: u32,
    pub total_price: Money,
    pub currency_code: String,
    pub customer_info: Option<CustomerInfo>,
}

impl CheckoutData {
    /// Builds the payload from an acknowledged snapshot.
    pub fn from_snapshot(snapshot: &CartSnapshot, customer_info: Option<CustomerInfo>) -> Self {
        CheckoutData {
            cart_id: snapshot.cart_id.clone(),
            items: snapshot.items.clone(),
            total_quantity: snapshot.total_quantity,
            total_price: snapshot.total_price,
            currency_code: snapshot.currency_code.clone(),
            customer_info,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
