//! # label-cart: Cart Reconciliation for Tonnentext
//!
//! This crate keeps what the configurator shows about the cart consistent
//! with the shop's remote cart, which is the only source of truth.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cart Layer Architecture                          │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      CartStore (single writer)                   │  │
//! │  │                                                                  │  │
//! │  │  ensure_session → one cart handle per session, persisted         │  │
//! │  │  add / remove / update_quantity / clear → remote, then replace   │  │
//! │  │  snapshot → canonical read                                       │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │  CartBackend   │  │ SessionStorage │  │  CartPoller            │    │
//! │  │                │  │                │  │                        │    │
//! │  │ Storefront     │  │ File in the    │  │ Interval reads and     │    │
//! │  │ GraphQL client │  │ data dir, or   │  │ change notifications   │    │
//! │  │ or in-memory   │  │ in-memory      │  │ into a watch channel   │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! │                                                                         │
//! │  NOTIFICATIONS: CartObserver registrations on the store               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`store`] - `CartStore` session and mutation logic
//! - [`backend`] - Remote cart contract
//! - [`storefront`] - Storefront GraphQL implementation
//! - [`memory`] - In-process implementation (offline demo, tests)
//! - [`session`] - Persisted cart handle
//! - [`observer`] - Change notification
//! - [`poller`] - Background snapshot publishing
//! - [`order`] - Order submission to the production backend
//! - [`config`] - Storefront configuration (TOML + env)
//! - [`error`] - Backend and store error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use label_cart::{CartStore, FileSessionStorage, StorefrontClient, StorefrontConfig};
//!
//! let config = StorefrontConfig::load_or_default(None);
//! let client = StorefrontClient::new(&config)?;
//! let storage = FileSessionStorage::in_data_dir().unwrap();
//! let store = CartStore::from_config(client, storage, &config);
//!
//! let snapshot = store.add(&label).await?;
//! println!("{} items, {} EUR", snapshot.total_quantity, snapshot.total_price);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backend;
pub mod config;
pub mod error;
pub mod memory;
pub mod observer;
pub mod order;
pub mod poller;
pub mod session;
pub mod store;
pub mod storefront;

// =============================================================================
// Re-exports
// =============================================================================

pub use backend::{CartBackend, CreatedCart, NewLine, RemoteCart, RemoteLine};
pub use config::StorefrontConfig;
pub use error::{BackendError, BackendResult, CartError, CartOperation, CartResult, RemoteFailure};
pub use memory::InMemoryBackend;
pub use observer::{CartEvent, CartEventKind, CartObserver, NoOpObserver, ObserverId};
pub use order::{OrderError, OrderReceipt, OrderResult, OrderSubmitter};
pub use poller::{CartPoller, CartPollerHandle};
pub use session::{FileSessionStorage, MemorySessionStorage, SessionStorage};
pub use store::{CartStore, SessionState};
pub use storefront::StorefrontClient;
