//! # Label Types
//!
//! The value objects that travel from the configurator to the cart and on
//! to production.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Label Types                                     │
//! │                                                                         │
//! │  ┌─────────────────────┐        ┌─────────────────────┐                 │
//! │  │ LabelConfiguration  │        │     CartItem        │                 │
//! │  │  ─────────────────  │  +     │  ─────────────────  │                 │
//! │  │  id (UUID)          │ price  │  configuration      │                 │
//! │  │  text (normalized)  │ ─────► │  unit_price         │                 │
//! │  │  font_size_pt/px    │        │  total_price        │                 │
//! │  │  quantity 1..99     │        │  remote_line_id?    │                 │
//! │  └─────────────────────┘        └──────────┬──────────┘                 │
//! │                                            │ many                       │
//! │                                 ┌──────────▼──────────┐                 │
//! │                                 │    CartSnapshot     │                 │
//! │                                 │  items, totals,     │                 │
//! │                                 │  checkout_url       │                 │
//! │                                 └─────────────────────┘                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Memoized Font Size
//! The px/pt pair is captured when the customer presses "add to cart" and
//! stored with the configuration. Production prints `font_size_pt` as-is;
//! it is never recomputed, because the preview box at purchase time may
//! not be the box the customer looked at.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;
use crate::units::px_to_pt;
use crate::validation::{normalize_text, validate_color, validate_quantity, validate_text, ValidationResult};
use crate::{CURRENCY_CODE, DEFAULT_COLOR, DEFAULT_FONT_FAMILY, PRICE_PER_UNIT_CENTS};

// =============================================================================
// Attribute Keys
// =============================================================================

/// Line attribute keys understood by the production pipeline.
pub mod attribute_keys {
    pub const TEXT: &str = "label_text";
    pub const FONT_SIZE_PT: &str = "label_font_size_pt";
    pub const FONT_SIZE_PX: &str = "label_font_size_px";
    pub const FONT_FAMILY: &str = "label_font_family";
    pub const COLOR: &str = "label_color";
    pub const CONFIG_ID: &str = "label_config_id";
}

// =============================================================================
// Font Size
// =============================================================================

/// A font size expressed in both preview pixels and print points.
///
/// Always built through [`FontSize::from_px`], so `pt` is the exact
/// analytic conversion of `px`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FontSize {
    /// Size in device pixels (preview).
    pub px: f64,
    /// Size in points (print).
    pub pt: f64,
}

impl FontSize {
    /// Creates a size from pixels, deriving points.
    pub fn from_px(px: f64) -> Self {
        FontSize { px, pt: px_to_pt(px) }
    }
}

// =============================================================================
// Line Attribute
// =============================================================================

/// One key/value attribute on a remote cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineAttribute {
    pub key: String,
    pub value: String,
}

impl LineAttribute {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        LineAttribute {
            key: key.into(),
            value: value.into(),
        }
    }
}

// =============================================================================
// Line Id
// =============================================================================

/// The remote store's handle for a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineId(String);

impl LineId {
    pub fn new(id: impl Into<String>) -> Self {
        LineId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Label Configuration
// =============================================================================

/// A single text + size + quantity + appearance unit the customer assembles
/// before purchase.
///
/// ## Invariants
/// - `text` is normalized and 1..=20 chars
/// - `font_size_pt == px_to_pt(font_size_px)` at creation
/// - `quantity` is 1..=99
///
/// Fields are private; the value cannot change after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LabelConfiguration {
    id: String,
    text: String,
    font_size_pt: f64,
    font_size_px: f64,
    quantity: u32,
    font_family: String,
    color: String,
    /// Creation instant; `None` when rebuilt from a remote line.
    #[ts(as = "Option<String>")]
    timestamp: Option<DateTime<Utc>>,
}

impl LabelConfiguration {
    /// Creates a configuration with the default print font and color.
    ///
    /// ## Example
    /// ```rust
    /// use label_core::label::{FontSize, LabelConfiguration};
    ///
    /// let config = LabelConfiguration::new(" müller ", FontSize::from_px(48.0), 2).unwrap();
    /// assert_eq!(config.text(), "MÜLLER");
    /// assert_eq!(config.font_size_pt(), 36.0);
    /// ```
    pub fn new(text: &str, size: FontSize, quantity: u32) -> ValidationResult<Self> {
        Self::styled(text, size, quantity, DEFAULT_FONT_FAMILY, DEFAULT_COLOR)
    }

    /// Creates a configuration with an explicit font family and color.
    pub fn styled(
        text: &str,
        size: FontSize,
        quantity: u32,
        font_family: &str,
        color: &str,
    ) -> ValidationResult<Self> {
        let text = normalize_text(text);
        validate_text(&text)?;
        validate_quantity(quantity)?;
        validate_color(color)?;

        Ok(LabelConfiguration {
            id: Uuid::new_v4().to_string(),
            text,
            font_size_pt: size.pt,
            font_size_px: size.px,
            quantity,
            font_family: font_family.to_string(),
            color: color.to_string(),
            timestamp: Some(Utc::now()),
        })
    }

    /// Rebuilds a configuration from the attributes of a remote line.
    ///
    /// Remote data is taken as-is: missing keys fall back to defaults
    /// (empty text, zero sizes, black) and the line id stands in for a
    /// missing configuration id. The remote line carries no creation time,
    /// so two reads of the same line decode to equal values. Nothing is
    /// re-validated here because the remote cart is authoritative about
    /// what it holds.
    pub fn from_line_attributes(line_id: &LineId, quantity: u32, attributes: &[LineAttribute]) -> Self {
        let get = |key: &str| {
            attributes
                .iter()
                .find(|a| a.key == key)
                .map(|a| a.value.as_str())
        };
        let number = |key: &str| get(key).and_then(|v| v.parse::<f64>().ok()).unwrap_or(0.0);

        LabelConfiguration {
            id: get(attribute_keys::CONFIG_ID)
                .map(str::to_string)
                .unwrap_or_else(|| line_id.to_string()),
            text: get(attribute_keys::TEXT).unwrap_or_default().to_string(),
            font_size_pt: number(attribute_keys::FONT_SIZE_PT),
            font_size_px: number(attribute_keys::FONT_SIZE_PX),
            quantity,
            font_family: get(attribute_keys::FONT_FAMILY).unwrap_or_default().to_string(),
            color: get(attribute_keys::COLOR).unwrap_or(DEFAULT_COLOR).to_string(),
            timestamp: None,
        }
    }

    /// Encodes every field as an opaque line attribute, keyed by name.
    pub fn to_attributes(&self) -> Vec<LineAttribute> {
        vec![
            LineAttribute::new(attribute_keys::TEXT, &self.text),
            LineAttribute::new(attribute_keys::FONT_SIZE_PT, self.font_size_pt.to_string()),
            LineAttribute::new(attribute_keys::FONT_SIZE_PX, self.font_size_px.to_string()),
            LineAttribute::new(attribute_keys::FONT_FAMILY, &self.font_family),
            LineAttribute::new(attribute_keys::COLOR, &self.color),
            LineAttribute::new(attribute_keys::CONFIG_ID, &self.id),
        ]
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn font_size_pt(&self) -> f64 {
        self.font_size_pt
    }

    pub fn font_size_px(&self) -> f64 {
        self.font_size_px
    }

    /// The stored size pair.
    pub fn font_size(&self) -> FontSize {
        FontSize {
            px: self.font_size_px,
            pt: self.font_size_pt,
        }
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }
}

// =============================================================================
// Cart Item
// =============================================================================

/// A configuration as it sits in the remote cart.
///
/// ## Invariant
/// An item without `remote_line_id` was never acknowledged by the remote
/// store and cannot be targeted by remove/update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartItem {
    #[serde(flatten)]
    #[ts(flatten)]
    pub configuration: LabelConfiguration,

    /// Price per label.
    pub unit_price: Money,

    /// Line total as reported by the remote store.
    pub total_price: Money,

    /// Remote line handle, present once acknowledged.
    pub remote_line_id: Option<LineId>,
}

impl CartItem {
    /// Builds an item from an acknowledged remote line.
    ///
    /// `line_total` is the remote's figure; a zero total (not yet priced)
    /// falls back to `unit_price × quantity`.
    pub fn from_remote_line(
        line_id: LineId,
        quantity: u32,
        attributes: &[LineAttribute],
        line_total: Money,
        unit_price: Money,
    ) -> Self {
        let configuration = LabelConfiguration::from_line_attributes(&line_id, quantity, attributes);
        let total_price = if line_total.is_zero() {
            unit_price * quantity
        } else {
            line_total
        };

        CartItem {
            configuration,
            unit_price,
            total_price,
            remote_line_id: Some(line_id),
        }
    }

    pub fn quantity(&self) -> u32 {
        self.configuration.quantity()
    }
}

// =============================================================================
// Cart Snapshot
// =============================================================================

/// The locally held, remote-derived view of the cart.
///
/// `total_quantity` and `total_price` come from the remote store's own
/// totals. [`CartSnapshot::derived_total`] sums the lines for display
/// cross-checks only and is never persisted or sent anywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartSnapshot {
    pub cart_id: String,
    pub checkout_url: String,
    pub items: Vec<CartItem>,
    pub total_quantity: u32,
    pub total_price: Money,
    pub currency_code: String,
}

impl CartSnapshot {
    /// An empty cart for the given handle.
    pub fn empty(cart_id: impl Into<String>, checkout_url: impl Into<String>) -> Self {
        CartSnapshot {
            cart_id: cart_id.into(),
            checkout_url: checkout_url.into(),
            items: Vec::new(),
            total_quantity: 0,
            total_price: Money::zero(),
            currency_code: CURRENCY_CODE.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Finds the item carrying the given remote line id.
    pub fn find_line(&self, line_id: &LineId) -> Option<&CartItem> {
        self.items
            .iter()
            .find(|item| item.remote_line_id.as_ref() == Some(line_id))
    }

    /// Every remote line id in the snapshot, in cart order.
    pub fn line_ids(&self) -> Vec<LineId> {
        self.items
            .iter()
            .filter_map(|item| item.remote_line_id.clone())
            .collect()
    }

    /// Sum of the line totals (display-only).
    pub fn derived_total(&self) -> Money {
        self.items.iter().map(|item| item.total_price).sum()
    }

    /// Sum of the line quantities (display-only).
    pub fn derived_quantity(&self) -> u32 {
        self.items.iter().map(CartItem::quantity).sum()
    }
}

/// Unit price of a label as a Money value.
pub fn unit_price() -> Money {
    Money::from_cents(PRICE_PER_UNIT_CENTS)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    #[test]
    fn test_new_normalizes_and_memoizes_size() {
        let size = FontSize::from_px(40.0);
        let config = LabelConfiguration::new("  haus   15a ", size, 3).unwrap();

        assert_eq!(config.text(), "HAUS 15A");
        assert_eq!(config.font_size_px(), 40.0);
        assert_eq!(config.font_size_pt(), px_to_pt(40.0));
        assert_eq!(config.quantity(), 3);
        assert_eq!(config.font_family(), DEFAULT_FONT_FAMILY);
        assert_eq!(config.color(), DEFAULT_COLOR);
    }

    #[test]
    fn test_ids_are_unique() {
        let size = FontSize::from_px(30.0);
        let a = LabelConfiguration::new("A", size, 1).unwrap();
        let b = LabelConfiguration::new("A", size, 1).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_new_rejects_invalid_input() {
        let size = FontSize::from_px(30.0);
        assert!(matches!(
            LabelConfiguration::new("   ", size, 1),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            LabelConfiguration::new("OK", size, 0),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            LabelConfiguration::styled("OK", size, 1, "Impact", "red"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_attributes_carry_every_field() {
        let config = LabelConfiguration::new("MÜLLER", FontSize::from_px(48.0), 2).unwrap();
        let attributes = config.to_attributes();

        let keys: Vec<&str> = attributes.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                attribute_keys::TEXT,
                attribute_keys::FONT_SIZE_PT,
                attribute_keys::FONT_SIZE_PX,
                attribute_keys::FONT_FAMILY,
                attribute_keys::COLOR,
                attribute_keys::CONFIG_ID,
            ]
        );

        let decoded = LabelConfiguration::from_line_attributes(&LineId::new("line-1"), 2, &attributes);
        assert_eq!(decoded.id(), config.id());
        assert_eq!(decoded.text(), "MÜLLER");
        assert_eq!(decoded.font_size(), config.font_size());
    }

    #[test]
    fn test_decoding_is_lenient() {
        let decoded = LabelConfiguration::from_line_attributes(&LineId::new("gid://line/9"), 4, &[]);
        assert_eq!(decoded.id(), "gid://line/9");
        assert_eq!(decoded.text(), "");
        assert_eq!(decoded.font_size_pt(), 0.0);
        assert_eq!(decoded.color(), DEFAULT_COLOR);
        assert_eq!(decoded.quantity(), 4);
        assert_eq!(decoded.timestamp(), None);

        // repeated reads of the same line compare equal
        let again = LabelConfiguration::from_line_attributes(&LineId::new("gid://line/9"), 4, &[]);
        assert_eq!(decoded, again);
    }

    #[test]
    fn test_cart_item_total_falls_back_to_unit_price() {
        let item = CartItem::from_remote_line(LineId::new("l1"), 2, &[], Money::zero(), unit_price());
        assert_eq!(item.total_price.cents(), 2580);

        let item = CartItem::from_remote_line(
            LineId::new("l2"),
            2,
            &[],
            Money::from_cents(2000),
            unit_price(),
        );
        assert_eq!(item.total_price.cents(), 2000);
    }

    #[test]
    fn test_snapshot_lookup_and_derived_totals() {
        let mut snapshot = CartSnapshot::empty("cart-1", "https://shop/checkout");
        assert!(snapshot.is_empty());

        snapshot.items.push(CartItem::from_remote_line(
            LineId::new("l1"),
            2,
            &[],
            Money::from_cents(2580),
            unit_price(),
        ));
        snapshot.items.push(CartItem::from_remote_line(
            LineId::new("l2"),
            1,
            &[],
            Money::from_cents(1290),
            unit_price(),
        ));

        assert!(snapshot.find_line(&LineId::new("l2")).is_some());
        assert!(snapshot.find_line(&LineId::new("nope")).is_none());
        assert_eq!(snapshot.line_ids(), vec![LineId::new("l1"), LineId::new("l2")]);
        assert_eq!(snapshot.derived_total().cents(), 3870);
        assert_eq!(snapshot.derived_quantity(), 3);
    }

    #[test]
    fn test_configuration_serializes_camel_case() {
        let config = LabelConfiguration::new("15A", FontSize::from_px(48.0), 1).unwrap();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["text"], "15A");
        assert_eq!(json["fontSizePt"], 36.0);
        assert_eq!(json["fontSizePx"], 48.0);
    }
}
