//! # Cart Error Types
//!
//! Error types for the remote cart contract and the cart store.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Error Categories                             │
//! │                                                                         │
//! │  BackendError (what the remote service said)                           │
//! │  ├── Transport         HTTP or network failure                         │
//! │  ├── UserErrors        remote rejected the request                     │
//! │  ├── CartNotFound      the cart handle no longer exists                │
//! │  └── Decode            response did not match the contract             │
//! │           │                                                             │
//! │           ▼  CartError::from_backend(operation, err)                    │
//! │                                                                         │
//! │  CartError (what the configurator sees)                                │
//! │  ├── Configuration     → "Shop ist nicht konfiguriert"                 │
//! │  ├── Session           → cart could not be created or validated        │
//! │  ├── Mutation          → add/remove/update/clear failed                │
//! │  ├── Query             → snapshot read failed                          │
//! │  ├── NotFound          → line id unknown to the current snapshot       │
//! │  ├── InvalidQuantity   → quantity outside 1..99                        │
//! │  └── Channel           → poller task stopped                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use thiserror::Error;

/// Result type alias for remote cart calls.
pub type BackendResult<T> = Result<T, BackendError>;

/// Result type alias for cart store operations.
pub type CartResult<T> = Result<T, CartError>;

// =============================================================================
// Backend Error
// =============================================================================

/// Failure reported by a [`crate::backend::CartBackend`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The request did not complete (network, HTTP status, TLS).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote processed the request and rejected it.
    ///
    /// Messages are joined with ", " for display.
    #[error("{}", .0.join(", "))]
    UserErrors(Vec<String>),

    /// The cart handle does not exist (expired or completed).
    #[error("Cart not found")]
    CartNotFound,

    /// The response could not be decoded.
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Decode(err.to_string())
    }
}

impl From<label_core::CoreError> for BackendError {
    fn from(err: label_core::CoreError) -> Self {
        BackendError::Decode(err.to_string())
    }
}

// =============================================================================
// Cart Operation
// =============================================================================

/// The cart operation an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOperation {
    Add,
    Remove,
    Update,
    Clear,
}

impl fmt::Display for CartOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CartOperation::Add => write!(f, "add"),
            CartOperation::Remove => write!(f, "remove"),
            CartOperation::Update => write!(f, "update"),
            CartOperation::Clear => write!(f, "clear"),
        }
    }
}

/// Why a remote call failed, as far as the user is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteFailure {
    /// The request did not get through or the answer was unusable.
    Transport(String),

    /// The remote store rejected the request with a message.
    Remote(String),
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteFailure::Transport(msg) => write!(f, "network error: {}", msg),
            RemoteFailure::Remote(msg) => write!(f, "{}", msg),
        }
    }
}

// =============================================================================
// Cart Error
// =============================================================================

/// Errors surfaced by [`crate::store::CartStore`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CartError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// The remote cart is not configured or the config is invalid.
    #[error("Cart is not configured: {0}")]
    Configuration(String),

    // =========================================================================
    // Session Errors
    // =========================================================================
    /// No cart handle could be established, or the handle vanished.
    #[error("Cart session unavailable: {0}")]
    Session(String),

    // =========================================================================
    // Remote Errors
    // =========================================================================
    /// A mutation failed; the snapshot is unchanged.
    #[error("Cart {operation} failed: {failure}")]
    Mutation {
        operation: CartOperation,
        failure: RemoteFailure,
    },

    /// Reading the remote cart failed.
    #[error("Cart could not be loaded: {0}")]
    Query(RemoteFailure),

    // =========================================================================
    // Input Errors
    // =========================================================================
    /// The line id is not part of the current cart.
    #[error("Cart line not found: {line_id}")]
    NotFound { line_id: String },

    /// Quantity outside 1..=99.
    #[error("Invalid quantity {quantity}: must be between {min} and {max}")]
    InvalidQuantity { quantity: u32, min: u32, max: u32 },

    // =========================================================================
    // Runtime Errors
    // =========================================================================
    /// A background task is gone.
    #[error("Channel error: {0}")]
    Channel(String),
}

impl CartError {
    /// Maps a backend failure during `operation` to what the store reports.
    pub fn from_backend(operation: CartOperation, err: BackendError) -> Self {
        match remote_failure(err) {
            Ok(failure) => CartError::Mutation { operation, failure },
            Err(other) => other,
        }
    }

    /// Maps a backend failure while reading the cart.
    pub fn from_query(err: BackendError) -> Self {
        match remote_failure(err) {
            Ok(failure) => CartError::Query(failure),
            Err(other) => other,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(self, CartError::Configuration(_))
    }

    /// Returns true if repeating the same user action may succeed.
    ///
    /// Transport failures and a vanished session (a new cart is created on
    /// the next call) qualify; remote rejections and bad input do not.
    pub fn is_retryable_by_user(&self) -> bool {
        matches!(
            self,
            CartError::Session(_)
                | CartError::Mutation {
                    failure: RemoteFailure::Transport(_),
                    ..
                }
                | CartError::Query(RemoteFailure::Transport(_))
        )
    }
}

fn remote_failure(err: BackendError) -> Result<RemoteFailure, CartError> {
    match err {
        BackendError::CartNotFound => Err(CartError::Session("cart no longer exists".into())),
        BackendError::Transport(msg) | BackendError::Decode(msg) => Ok(RemoteFailure::Transport(msg)),
        BackendError::UserErrors(messages) => Ok(RemoteFailure::Remote(messages.join(", "))),
    }
}

impl From<std::io::Error> for CartError {
    fn from(err: std::io::Error) -> Self {
        CartError::Configuration(err.to_string())
    }
}

impl From<toml::de::Error> for CartError {
    fn from(err: toml::de::Error) -> Self {
        CartError::Configuration(err.to_string())
    }
}

impl From<toml::ser::Error> for CartError {
    fn from(err: toml::ser::Error) -> Self {
        CartError::Configuration(err.to_string())
    }
}

impl From<url::ParseError> for CartError {
    fn from(err: url::ParseError) -> Self {
        CartError::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_errors_are_joined() {
        let err = BackendError::UserErrors(vec!["Quantity too high".into(), "Line gone".into()]);
        assert_eq!(err.to_string(), "Quantity too high, Line gone");

        let cart_err = CartError::from_backend(CartOperation::Update, err);
        assert_eq!(
            cart_err,
            CartError::Mutation {
                operation: CartOperation::Update,
                failure: RemoteFailure::Remote("Quantity too high, Line gone".into()),
            }
        );
    }

    #[test]
    fn test_backend_mapping() {
        assert!(matches!(
            CartError::from_backend(CartOperation::Add, BackendError::CartNotFound),
            CartError::Session(_)
        ));
        assert!(matches!(
            CartError::from_query(BackendError::Decode("bad json".into())),
            CartError::Query(RemoteFailure::Transport(_))
        ));
    }

    #[test]
    fn test_retryable_by_user() {
        let transport = CartError::from_backend(CartOperation::Add, BackendError::Transport("timeout".into()));
        assert!(transport.is_retryable_by_user());
        assert!(CartError::Session("gone".into()).is_retryable_by_user());

        let rejected = CartError::from_backend(CartOperation::Add, BackendError::UserErrors(vec!["no".into()]));
        assert!(!rejected.is_retryable_by_user());
        assert!(!CartError::NotFound { line_id: "x".into() }.is_retryable_by_user());
    }

    #[test]
    fn test_error_display() {
        let err = CartError::Mutation {
            operation: CartOperation::Add,
            failure: RemoteFailure::Remote("Variant sold out".into()),
        };
        assert_eq!(err.to_string(), "Cart add failed: Variant sold out");

        let err = CartError::InvalidQuantity { quantity: 0, min: 1, max: 99 };
        assert!(err.to_string().contains("between 1 and 99"));
    }
}
