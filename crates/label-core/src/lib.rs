//! # label-core: Pure Label Logic for Tonnentext
//!
//! This crate holds everything about a printed bin label that can be
//! computed without touching the network, the disk or a clock-driven
//! event loop.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tonnentext Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Configurator UI (TypeScript)                    │   │
//! │  │    Text input ──► Live preview ──► Size +/- ──► Add to cart     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ bindings (ts-rs)                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ label-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   units   │  │  sizing   │  │   label   │  │   print   │  │   │
//! │  │   │ mm/pt/px  │  │ auto-fit  │  │  config   │  │  layout   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  label-cart (Cart Reconciliation)               │   │
//! │  │        Remote cart, persisted session, snapshot polling         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`units`] - The one shared mm/pt/px conversion table
//! - [`sizing`] - Auto-fit font sizing engine
//! - [`label`] - `LabelConfiguration` and its wire attributes
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`checkout`] - Order payload built from an acknowledged cart
//! - [`print`] - Physical label geometry for the production artifact
//! - [`error`] - Domain error types
//! - [`validation`] - Input rules for text, quantity and color
//!
//! ## Example Usage
//!
//! ```rust
//! use label_core::sizing::{DeterministicTextMeasurer, SizingEngine};
//! use label_core::units::px_to_pt;
//!
//! let engine = SizingEngine::default();
//! let measurer = DeterministicTextMeasurer::default();
//!
//! let size = engine.fit(&measurer, "MÜLLER", 300.0, 16.0, 0, engine.initial_size());
//! assert_eq!(size.pt, px_to_pt(size.px));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod label;
pub mod money;
pub mod print;
pub mod sizing;
pub mod units;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::{CheckoutData, CustomerInfo};
pub use error::{CoreError, CoreResult, ValidationError};
pub use label::{CartItem, CartSnapshot, FontSize, LabelConfiguration};
pub use money::Money;
pub use sizing::{SizingEngine, SizingLimits, SizingState, TextMeasurer};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of characters on a label (after normalization).
///
/// ## Business Reason
/// The physical label is 260 mm of usable width; beyond 20 characters the
/// auto-fit size drops below what is readable from across the street.
pub const MAX_TEXT_CHARS: usize = 20;

/// Minimum quantity of one configuration.
pub const MIN_QUANTITY: u32 = 1;

/// Maximum quantity of one configuration.
pub const MAX_QUANTITY: u32 = 99;

/// Price of one printed label in cents (12.90 EUR).
pub const PRICE_PER_UNIT_CENTS: i64 = 1290;

/// Currency of every price in the shop.
pub const CURRENCY_CODE: &str = "EUR";

/// Font stack used in the preview and in the printed artifact.
pub const DEFAULT_FONT_FAMILY: &str = r#"Impact, Haettenschweiler, "Arial Black", sans-serif"#;

/// Print color (the preview renders white-on-bin, the sticker is black).
pub const DEFAULT_COLOR: &str = "#000000";

/// Text measured when the input is still empty.
pub const PLACEHOLDER_TEXT: &str = "IHR TEXT";
