//! # Order Submission
//!
//! Hands a checked-out cart to the production backend, which renders the
//! print PDFs.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST {order.webhook_url}                                               │
//! │  X-Shopify-API-Key: {order.api_key}          (only when set)            │
//! │  { "checkoutData": { ... }, "timestamp": "2024-05-01T10:00:00Z" }       │
//! │                         │                                               │
//! │                         ▼                                               │
//! │  network failure ────────────────► OrderError::Transport                │
//! │  HTTP status != 2xx ─────────────► OrderError::Rejected                 │
//! │      body { "error": "..." }         (message, else "HTTP {status}")    │
//! │  2xx { "orderId", "pdfUrl" } ────► OrderReceipt                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One attempt per submission; retrying is up to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use label_core::checkout::CheckoutData;

use crate::config::StorefrontConfig;

/// Header carrying the order backend key.
const API_KEY_HEADER: &str = "X-Shopify-API-Key";

/// Result type alias for order submission.
pub type OrderResult<T> = Result<T, OrderError>;

// =============================================================================
// Order Error
// =============================================================================

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderError {
    /// No order webhook is configured, or the configured one is invalid.
    #[error("Order submission is not configured: {0}")]
    NotConfigured(String),

    /// Nothing to order.
    #[error("Cart is empty")]
    EmptyCart,

    /// The request did not complete.
    #[error("Order could not be sent: {0}")]
    Transport(String),

    /// The backend answered with an error.
    #[error("Order rejected: {0}")]
    Rejected(String),

    /// The success response could not be decoded.
    #[error("Invalid order response: {0}")]
    Decode(String),
}

impl OrderError {
    /// Returns true if submitting the same order again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, OrderError::Transport(_))
    }
}

impl From<reqwest::Error> for OrderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            OrderError::Decode(err.to_string())
        } else {
            OrderError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for OrderError {
    fn from(err: serde_json::Error) -> Self {
        OrderError::Decode(err.to_string())
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderRequest<'a> {
    checkout_data: &'a CheckoutData,
    timestamp: DateTime<Utc>,
}

/// What the production backend reports for an accepted order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    #[serde(default)]
    pub order_id: Option<String>,

    /// Rendered print file, when already available.
    #[serde(default)]
    pub pdf_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

// =============================================================================
// Decoding
// =============================================================================

fn request_body(checkout: &CheckoutData, timestamp: DateTime<Utc>) -> OrderResult<Value> {
    Ok(serde_json::to_value(OrderRequest {
        checkout_data: checkout,
        timestamp,
    })?)
}

fn decode_receipt(body: Value) -> OrderResult<OrderReceipt> {
    if !body.is_object() {
        return Err(OrderError::Decode(format!("expected an object, got: {}", body)));
    }
    Ok(serde_json::from_value(body)?)
}

/// Message of a non-2xx answer: the body's `error` field if any.
fn decode_rejection(status: u16, body: &str) -> OrderError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status));
    OrderError::Rejected(message)
}

// =============================================================================
// Submitter
// =============================================================================

/// Client of the order webhook.
#[derive(Debug, Clone)]
pub struct OrderSubmitter {
    http: reqwest::Client,
    webhook: Url,
    api_key: Option<String>,
}

impl OrderSubmitter {
    /// Builds a submitter. Fails when no webhook is configured.
    pub fn new(config: &StorefrontConfig) -> OrderResult<Self> {
        let webhook = config
            .order_webhook()
            .map_err(|e| OrderError::NotConfigured(e.to_string()))?
            .ok_or_else(|| OrderError::NotConfigured("order webhook_url is empty".into()))?;

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| OrderError::NotConfigured(e.to_string()))?;

        let api_key = Some(config.order.api_key.trim())
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        Ok(OrderSubmitter { http, webhook, api_key })
    }

    pub fn webhook(&self) -> &Url {
        &self.webhook
    }

    /// Sends one order.
    pub async fn submit(&self, checkout: &CheckoutData) -> OrderResult<OrderReceipt> {
        if checkout.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let body = request_body(checkout, Utc::now())?;
        let mut request = self.http.post(self.webhook.clone()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await.inspect_err(|e| {
            warn!(error = %e, cart_id = %checkout.cart_id, "Order submission failed");
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let err = decode_rejection(status.as_u16(), &text);
            warn!(%status, error = %err, cart_id = %checkout.cart_id, "Order rejected");
            return Err(err);
        }

        let receipt = decode_receipt(response.json().await?)?;
        info!(
            cart_id = %checkout.cart_id,
            order_id = receipt.order_id.as_deref().unwrap_or("-"),
            items = checkout.items.len(),
            "Order submitted"
        );
        Ok(receipt)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use label_core::label::{unit_price, CartItem, CartSnapshot, FontSize, LabelConfiguration, LineId};
    use label_core::Money;
    use serde_json::json;

    fn checkout() -> CheckoutData {
        let config = LabelConfiguration::new("15A", FontSize::from_px(48.0), 3).unwrap();
        let mut snapshot = CartSnapshot::empty("gid://shopify/Cart/c1", "https://x/checkout");
        snapshot.items.push(CartItem::from_remote_line(
            LineId::new("gid://shopify/CartLine/1"),
            3,
            &config.to_attributes(),
            Money::from_cents(3870),
            unit_price(),
        ));
        snapshot.total_quantity = 3;
        snapshot.total_price = Money::from_cents(3870);
        CheckoutData::from_snapshot(&snapshot, None)
    }

    fn configured() -> StorefrontConfig {
        let mut config = StorefrontConfig::default();
        config.order.webhook_url = "https://orders.example.com/api/shopify/process-order".into();
        config
    }

    #[test]
    fn test_request_body_shape() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let body = request_body(&checkout(), at).unwrap();

        assert_eq!(body["timestamp"], "2024-05-01T10:00:00Z");
        let data = &body["checkoutData"];
        assert_eq!(data["cartId"], "gid://shopify/Cart/c1");
        assert_eq!(data["totalQuantity"], 3);
        assert_eq!(data["totalPrice"], 3870);
        assert_eq!(data["items"][0]["text"], "15A");
        assert_eq!(data["items"][0]["fontSizePt"], 36.0);
    }

    #[test]
    fn test_decode_receipt() {
        let receipt = decode_receipt(json!({
            "orderId": "ORD-1001",
            "pdfUrl": "https://orders.example.com/pdf/ORD-1001.pdf",
            "success": true
        }))
        .unwrap();
        assert_eq!(receipt.order_id.as_deref(), Some("ORD-1001"));
        assert_eq!(
            receipt.pdf_url.as_deref(),
            Some("https://orders.example.com/pdf/ORD-1001.pdf")
        );

        // PDF rendered later
        let receipt = decode_receipt(json!({ "orderId": "ORD-1002" })).unwrap();
        assert_eq!(receipt.pdf_url, None);

        assert!(matches!(decode_receipt(json!("ok")), Err(OrderError::Decode(_))));
    }

    #[test]
    fn test_decode_rejection() {
        assert_eq!(
            decode_rejection(422, r#"{ "error": "Variant not printable" }"#),
            OrderError::Rejected("Variant not printable".into())
        );
        assert_eq!(
            decode_rejection(502, "<html>Bad Gateway</html>"),
            OrderError::Rejected("HTTP 502".into())
        );
        assert_eq!(
            decode_rejection(500, r#"{ "error": "" }"#),
            OrderError::Rejected("HTTP 500".into())
        );
    }

    #[test]
    fn test_submitter_requires_webhook() {
        assert!(matches!(
            OrderSubmitter::new(&StorefrontConfig::default()),
            Err(OrderError::NotConfigured(_))
        ));

        let mut config = configured();
        config.order.webhook_url = "not a url".into();
        assert!(matches!(OrderSubmitter::new(&config), Err(OrderError::NotConfigured(_))));

        let submitter = OrderSubmitter::new(&configured()).unwrap();
        assert_eq!(submitter.webhook().host_str(), Some("orders.example.com"));
        assert_eq!(submitter.api_key, None);
    }

    #[tokio::test]
    async fn test_empty_cart_is_not_sent() {
        let submitter = OrderSubmitter::new(&configured()).unwrap();
        let empty = CheckoutData::from_snapshot(&CartSnapshot::empty("c", "u"), None);
        assert_eq!(submitter.submit(&empty).await.unwrap_err(), OrderError::EmptyCart);
    }

    #[test]
    fn test_only_transport_is_retryable() {
        assert!(OrderError::Transport("timeout".into()).is_retryable());
        assert!(!OrderError::Rejected("HTTP 422".into()).is_retryable());
        assert!(!OrderError::EmptyCart.is_retryable());
    }
}
