//! # Storefront Client
//!
//! [`CartBackend`] over the Shopify Storefront GraphQL API.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST https://{domain}/api/{version}/graphql.json                      │
//! │  X-Shopify-Storefront-Access-Token: {token}                            │
//! │  { "query": "...", "variables": { ... } }                              │
//! │                         │                                               │
//! │                         ▼                                               │
//! │  HTTP status != 2xx ─────────────► BackendError::Transport              │
//! │  top-level "errors" ─────────────► BackendError::UserErrors             │
//! │  data.<op>.userErrors non-empty ─► BackendError::UserErrors             │
//! │      (field ["cartId"]) ─────────► BackendError::CartNotFound           │
//! │  data.<op>.cart == null ─────────► BackendError::CartNotFound           │
//! │  data.<op>.cart ─────────────────► RemoteCart                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No retries and no client-side timeout beyond reqwest's defaults.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use label_core::label::{LineAttribute, LineId};
use label_core::Money;

use crate::backend::{CartBackend, CreatedCart, NewLine, RemoteCart, RemoteLine};
use crate::config::StorefrontConfig;
use crate::error::{BackendError, BackendResult, CartError, CartResult};

/// Header carrying the public Storefront token.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";

// =============================================================================
// GraphQL Documents
// =============================================================================

const CART_FRAGMENT: &str = r#"
fragment CartFields on Cart {
  id
  checkoutUrl
  totalQuantity
  cost { totalAmount { amount currencyCode } }
  lines(first: 100) {
    edges {
      node {
        id
        quantity
        attributes { key value }
        cost { totalAmount { amount currencyCode } }
      }
    }
  }
}
"#;

const CART_CREATE: &str = r#"
mutation cartCreate {
  cartCreate {
    cart { id checkoutUrl }
    userErrors { field message }
  }
}
"#;

const CART_QUERY: &str = r#"
query cartQuery($id: ID!) {
  cart(id: $id) { ...CartFields }
}
"#;

const CART_LINES_ADD: &str = r#"
mutation cartLinesAdd($cartId: ID!, $lines: [CartLineInput!]!) {
  cartLinesAdd(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { field message }
  }
}
"#;

const CART_LINES_UPDATE: &str = r#"
mutation cartLinesUpdate($cartId: ID!, $lines: [CartLineUpdateInput!]!) {
  cartLinesUpdate(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { field message }
  }
}
"#;

const CART_LINES_REMOVE: &str = r#"
mutation cartLinesRemove($cartId: ID!, $lineIds: [ID!]!) {
  cartLinesRemove(cartId: $cartId, lineIds: $lineIds) {
    cart { ...CartFields }
    userErrors { field message }
  }
}
"#;

fn with_fragment(operation: &str) -> String {
    format!("{}{}", operation, CART_FRAGMENT)
}

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartPayload<C> {
    cart: Option<C>,
    #[serde(default)]
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
struct UserError {
    #[serde(default)]
    field: Option<Vec<String>>,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartHandle {
    id: String,
    checkout_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartNode {
    id: String,
    checkout_url: String,
    total_quantity: u32,
    cost: Cost,
    lines: Connection<LineNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Cost {
    total_amount: MoneyV2,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoneyV2 {
    amount: String,
    currency_code: String,
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    edges: Vec<Edge<T>>,
}

#[derive(Debug, Deserialize)]
struct Edge<T> {
    node: T,
}

#[derive(Debug, Deserialize)]
struct LineNode {
    id: String,
    quantity: u32,
    #[serde(default)]
    attributes: Vec<AttributeNode>,
    cost: Cost,
}

#[derive(Debug, Deserialize)]
struct AttributeNode {
    key: String,
    value: Option<String>,
}

impl TryFrom<CartNode> for RemoteCart {
    type Error = BackendError;

    fn try_from(node: CartNode) -> BackendResult<Self> {
        let lines = node
            .lines
            .edges
            .into_iter()
            .map(|edge| -> BackendResult<RemoteLine> {
                let line = edge.node;
                Ok(RemoteLine {
                    id: LineId::new(line.id),
                    quantity: line.quantity,
                    attributes: line
                        .attributes
                        .into_iter()
                        .map(|a| LineAttribute::new(a.key, a.value.unwrap_or_default()))
                        .collect(),
                    total_amount: Money::parse_decimal(&line.cost.total_amount.amount)?,
                })
            })
            .collect::<BackendResult<Vec<RemoteLine>>>()?;

        Ok(RemoteCart {
            id: node.id,
            checkout_url: node.checkout_url,
            total_quantity: node.total_quantity,
            total_amount: Money::parse_decimal(&node.cost.total_amount.amount)?,
            currency_code: node.cost.total_amount.currency_code,
            lines,
        })
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Unwraps the GraphQL envelope into its `data` object.
fn decode_envelope(body: Value) -> BackendResult<Value> {
    let response: GraphQlResponse = serde_json::from_value(body)?;
    if !response.errors.is_empty() {
        let messages: Vec<String> = response.errors.into_iter().map(|e| e.message).collect();
        return Err(BackendError::UserErrors(messages));
    }
    response
        .data
        .ok_or_else(|| BackendError::Decode("response has neither data nor errors".into()))
}

/// Extracts `data.<root>` as a mutation payload and applies the userErrors
/// and null-cart rules.
fn decode_payload<C: serde::de::DeserializeOwned>(data: &Value, root: &str) -> BackendResult<C> {
    let field = data
        .get(root)
        .filter(|v| !v.is_null())
        .ok_or_else(|| BackendError::Decode(format!("missing {}", root)))?;
    let payload: CartPayload<C> = serde_json::from_value(field.clone())?;

    if !payload.user_errors.is_empty() {
        let cart_missing = payload.user_errors.iter().any(|e| {
            e.field
                .as_deref()
                .is_some_and(|path| path.iter().any(|segment| segment == "cartId"))
        });
        if cart_missing {
            return Err(BackendError::CartNotFound);
        }
        let messages = payload.user_errors.into_iter().map(|e| e.message).collect();
        return Err(BackendError::UserErrors(messages));
    }

    payload.cart.ok_or(BackendError::CartNotFound)
}

fn decode_cart(data: &Value, root: &str) -> BackendResult<RemoteCart> {
    decode_payload::<CartNode>(data, root)?.try_into()
}

fn decode_query(data: &Value) -> BackendResult<Option<RemoteCart>> {
    match data.get("cart") {
        None | Some(Value::Null) => Ok(None),
        Some(cart) => {
            let node: CartNode = serde_json::from_value(cart.clone())?;
            Ok(Some(node.try_into()?))
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// Storefront GraphQL client.
#[derive(Debug, Clone)]
pub struct StorefrontClient {
    http: reqwest::Client,
    endpoint: Url,
    access_token: String,
    merchandise_id: String,
}

impl StorefrontClient {
    /// Builds a client. Fails when the config lacks credentials.
    pub fn new(config: &StorefrontConfig) -> CartResult<Self> {
        if !config.is_configured() {
            return Err(CartError::Configuration(
                "store domain, access token and variant id are required".into(),
            ));
        }

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| CartError::Configuration(e.to_string()))?;

        Ok(StorefrontClient {
            http,
            endpoint: config.endpoint()?,
            access_token: config.storefront.access_token.clone(),
            merchandise_id: config.merchandise_id(),
        })
    }

    /// The variant reference new lines are added with.
    pub fn merchandise_id(&self) -> &str {
        &self.merchandise_id
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Posts one GraphQL document and returns its `data` object.
    async fn execute(&self, operation: &str, query: String, variables: Value) -> BackendResult<Value> {
        debug!(operation, "Storefront request");

        let response = self
            .http
            .post(self.endpoint.clone())
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(operation, %status, "Storefront request failed");
            return Err(BackendError::Transport(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body: Value = response.json().await?;
        decode_envelope(body).inspect_err(|e| warn!(operation, error = %e, "Storefront rejected request"))
    }
}

impl CartBackend for StorefrontClient {
    async fn create_cart(&self) -> BackendResult<CreatedCart> {
        let data = self.execute("cartCreate", CART_CREATE.to_string(), json!({})).await?;
        let handle: CartHandle = decode_payload(&data, "cartCreate").map_err(|e| match e {
            // a create without a cart is a failed create, not a vanished cart
            BackendError::CartNotFound => BackendError::Decode("cartCreate returned no cart".into()),
            other => other,
        })?;

        Ok(CreatedCart {
            cart_id: handle.id,
            checkout_url: handle.checkout_url,
        })
    }

    async fn query_cart(&self, cart_id: &str) -> BackendResult<Option<RemoteCart>> {
        let data = self
            .execute("cart", with_fragment(CART_QUERY), json!({ "id": cart_id }))
            .await?;
        decode_query(&data)
    }

    async fn add_line(&self, cart_id: &str, line: NewLine) -> BackendResult<RemoteCart> {
        let attributes: Vec<Value> = line
            .attributes
            .iter()
            .map(|a| json!({ "key": a.key, "value": a.value }))
            .collect();
        let variables = json!({
            "cartId": cart_id,
            "lines": [{
                "merchandiseId": line.variant_ref,
                "quantity": line.quantity,
                "attributes": attributes,
            }],
        });

        let data = self
            .execute("cartLinesAdd", with_fragment(CART_LINES_ADD), variables)
            .await?;
        decode_cart(&data, "cartLinesAdd")
    }

    async fn update_line(&self, cart_id: &str, line_id: &LineId, quantity: u32) -> BackendResult<RemoteCart> {
        let variables = json!({
            "cartId": cart_id,
            "lines": [{ "id": line_id.as_str(), "quantity": quantity }],
        });

        let data = self
            .execute("cartLinesUpdate", with_fragment(CART_LINES_UPDATE), variables)
            .await?;
        decode_cart(&data, "cartLinesUpdate")
    }

    async fn remove_lines(&self, cart_id: &str, line_ids: &[LineId]) -> BackendResult<RemoteCart> {
        let ids: Vec<&str> = line_ids.iter().map(LineId::as_str).collect();
        let variables = json!({ "cartId": cart_id, "lineIds": ids });

        let data = self
            .execute("cartLinesRemove", with_fragment(CART_LINES_REMOVE), variables)
            .await?;
        decode_cart(&data, "cartLinesRemove")
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
