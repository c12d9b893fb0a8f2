//! # Cart Store
//!
//! The single source of truth the configurator reads cart data from. It
//! owns the cart session, sends every mutation to the remote cart and
//! replaces its snapshot with each authoritative response.
//!
//! ## Session States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ┌───────────────┐  ensure_session  ┌────────────┐  handle ok  ┌───────┐│
//! │  │ Uninitialized │ ───────────────► │ Validating │ ──────────► │ Ready ││
//! │  └───────▲───────┘                  └────────────┘             └──┬──▲─┘│
//! │          │                                                        │  │  │
//! │          │ remote reports cart not found          mutation sent   │  │  │
//! │          │                                        ┌──────────┐    │  │  │
//! │          └─────────────────────────────────────── │ Mutating │ ◄──┘  │  │
//! │                                                   └────┬─────┘       │  │
//! │                                                        └─────────────┘  │
//! │                                                        response applied │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ordering
//! Every remote call takes a sequence number before it is sent. A response
//! replaces the snapshot only if no response to a later-issued call has
//! been applied yet, so a slow poll can never overwrite the result of a
//! newer mutation.
//!
//! ## Session Handle
//! The validate-or-create sequence runs under an async mutex. Concurrent
//! first calls wait for the one in flight and reuse its handle instead of
//! creating a second cart.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use label_core::checkout::{CheckoutData, CustomerInfo};
use label_core::label::{unit_price, CartItem, CartSnapshot, LabelConfiguration, LineId};
use label_core::{Money, MAX_QUANTITY, MIN_QUANTITY};

use crate::backend::{CartBackend, NewLine, RemoteCart};
use crate::config::StorefrontConfig;
use crate::error::{BackendError, BackendResult, CartError, CartOperation, CartResult};
use crate::observer::{CartEvent, CartEventKind, CartObserver, ObserverId, ObserverRegistry};
use crate::session::{clear_or_warn, load_or_none, save_or_warn, SessionStorage};

/// Default key of the persisted cart handle.
pub const DEFAULT_STORAGE_KEY: &str = "shopify_cart_id";

// =============================================================================
// Session State
// =============================================================================

/// Lifecycle state of the cart session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Validating,
    Ready,
    Mutating,
}

/// Last applied snapshot and the sequence number of its request.
#[derive(Debug, Default)]
struct Applied {
    seq: u64,
    snapshot: Option<CartSnapshot>,
}

/// Decrements the in-flight counter when the mutation finishes.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        InFlight(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

// =============================================================================
// Cart Store
// =============================================================================

/// Cart store over a remote backend and a session storage.
pub struct CartStore<B, S> {
    backend: B,
    storage: S,
    storage_key: String,
    variant_ref: String,
    unit_price: Money,

    /// Validated cart handle; `None` until established.
    session: Mutex<Option<String>>,
    applied: RwLock<Applied>,
    next_seq: AtomicU64,

    validating: AtomicBool,
    ready: AtomicBool,
    in_flight: AtomicUsize,

    observers: ObserverRegistry,
}

impl<B: CartBackend, S: SessionStorage> CartStore<B, S> {
    /// Creates a store adding lines as `variant_ref`.
    pub fn new(backend: B, storage: S, variant_ref: impl Into<String>) -> Self {
        CartStore {
            backend,
            storage,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            variant_ref: variant_ref.into(),
            unit_price: unit_price(),
            session: Mutex::new(None),
            applied: RwLock::new(Applied::default()),
            next_seq: AtomicU64::new(1),
            validating: AtomicBool::new(false),
            ready: AtomicBool::new(false),
            in_flight: AtomicUsize::new(0),
            observers: ObserverRegistry::default(),
        }
    }

    /// Creates a store with the variant and storage key from `config`.
    pub fn from_config(backend: B, storage: S, config: &StorefrontConfig) -> Self {
        Self::new(backend, storage, config.merchandise_id()).with_storage_key(config.storage_key())
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_unit_price(mut self, price: Money) -> Self {
        self.unit_price = price;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    // =========================================================================
    // Observers
    // =========================================================================

    /// Registers an observer for change notifications.
    pub fn subscribe(&self, observer: Arc<dyn CartObserver>) -> ObserverId {
        self.observers.subscribe(observer)
    }

    /// Removes an observer. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    fn notify(&self, kind: CartEventKind, snapshot: &CartSnapshot) {
        self.observers
            .notify_all(&CartEvent::new(kind, snapshot.cart_id.clone(), snapshot.total_quantity));
    }

    // =========================================================================
    // Read Model
    // =========================================================================

    /// Current session state.
    pub fn state(&self) -> SessionState {
        if self.validating.load(Ordering::SeqCst) {
            SessionState::Validating
        } else if !self.ready.load(Ordering::SeqCst) {
            SessionState::Uninitialized
        } else if self.in_flight.load(Ordering::SeqCst) > 0 {
            SessionState::Mutating
        } else {
            SessionState::Ready
        }
    }

    /// Last applied snapshot, without a remote call. Display only.
    pub async fn cached(&self) -> Option<CartSnapshot> {
        self.applied.read().await.snapshot.clone()
    }

    /// Checkout link of the current cart, if one is known.
    pub async fn checkout_url(&self) -> Option<String> {
        self.applied
            .read()
            .await
            .snapshot
            .as_ref()
            .map(|s| s.checkout_url.clone())
    }

    /// Reads the remote cart and returns its snapshot.
    ///
    /// If the cart vanished remotely, the session is reset and a new empty
    /// cart is created once.
    pub async fn snapshot(&self) -> CartResult<CartSnapshot> {
        let cart_id = self.ensure_session().await?;
        if let Some(snapshot) = self.query(&cart_id).await? {
            return Ok(snapshot);
        }

        info!(%cart_id, "Cart no longer exists remotely, starting a new one");
        self.invalidate_session(&cart_id).await;
        let cart_id = self.ensure_session().await?;
        let snapshot = self
            .query(&cart_id)
            .await?
            .ok_or_else(|| CartError::Session("new cart vanished immediately".into()))?;
        self.notify(CartEventKind::SessionReset, &snapshot);
        Ok(snapshot)
    }

    /// Order payload built from a fresh remote read.
    pub async fn checkout_data(&self, customer_info: Option<CustomerInfo>) -> CartResult<CheckoutData> {
        let snapshot = self.snapshot().await?;
        Ok(CheckoutData::from_snapshot(&snapshot, customer_info))
    }

    async fn query(&self, cart_id: &str) -> CartResult<Option<CartSnapshot>> {
        let seq = self.take_seq();
        match self.backend.query_cart(cart_id).await {
            Ok(Some(cart)) => Ok(Some(self.apply(seq, &cart).await)),
            Ok(None) | Err(BackendError::CartNotFound) => Ok(None),
            Err(e) => {
                warn!(error = %e, %cart_id, "Failed to load cart");
                Err(CartError::from_query(e))
            }
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Returns a validated cart handle, creating a cart when needed.
    ///
    /// ## Flow
    /// 1. Handle already validated in this process → reuse
    /// 2. Persisted handle → `query_cart`; not found or rejected → discard
    ///    it, unreachable remote → `Session` error, handle kept
    /// 3. No usable handle → `create_cart`, persist the new handle
    ///
    /// A failed create is reported as [`CartError::Session`]. A failed
    /// validation call keeps the persisted handle for the next attempt.
    pub async fn ensure_session(&self) -> CartResult<String> {
        let mut session = self.session.lock().await;
        if let Some(cart_id) = session.as_ref() {
            return Ok(cart_id.clone());
        }

        self.validating.store(true, Ordering::SeqCst);
        let established = self.establish().await;
        self.validating.store(false, Ordering::SeqCst);

        let cart_id = established?;
        *session = Some(cart_id.clone());
        self.ready.store(true, Ordering::SeqCst);
        Ok(cart_id)
    }

    async fn establish(&self) -> CartResult<String> {
        if let Some(stored) = load_or_none(&self.storage, &self.storage_key) {
            let seq = self.take_seq();
            match self.backend.query_cart(&stored).await {
                Ok(Some(cart)) => {
                    debug!(cart_id = %stored, "Reusing persisted cart");
                    self.apply(seq, &cart).await;
                    return Ok(stored);
                }
                Ok(None) | Err(BackendError::CartNotFound) => {
                    info!(cart_id = %stored, "Persisted cart not found, discarding handle");
                    clear_or_warn(&self.storage, &self.storage_key);
                }
                // the remote answered and refused the handle
                Err(e @ (BackendError::UserErrors(_) | BackendError::Decode(_))) => {
                    warn!(error = %e, cart_id = %stored, "Persisted cart rejected, discarding handle");
                    clear_or_warn(&self.storage, &self.storage_key);
                }
                // unreachable remote; the handle may still be good
                Err(e @ BackendError::Transport(_)) => {
                    warn!(error = %e, cart_id = %stored, "Could not validate persisted cart");
                    return Err(session_error(e));
                }
            }
        }

        let seq = self.take_seq();
        let created = self.backend.create_cart().await.map_err(|e| {
            warn!(error = %e, "Failed to create cart");
            session_error(e)
        })?;
        info!(cart_id = %created.cart_id, "Created new cart");

        save_or_warn(&self.storage, &self.storage_key, &created.cart_id);
        let empty = CartSnapshot::empty(created.cart_id.clone(), created.checkout_url);
        self.store_snapshot(seq, empty).await;

        Ok(created.cart_id)
    }

    /// Forgets `cart_id` if it is still the current handle.
    async fn invalidate_session(&self, cart_id: &str) {
        let mut session = self.session.lock().await;
        if session.as_deref() != Some(cart_id) {
            return;
        }
        *session = None;
        self.ready.store(false, Ordering::SeqCst);
        clear_or_warn(&self.storage, &self.storage_key);
        self.applied.write().await.snapshot = None;
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds one line for `config`.
    ///
    /// The line carries the quantity and every configuration field as
    /// attributes. The remote answer replaces the snapshot.
    pub async fn add(&self, config: &LabelConfiguration) -> CartResult<CartSnapshot> {
        let line = NewLine {
            variant_ref: self.variant_ref.clone(),
            quantity: config.quantity(),
            attributes: config.to_attributes(),
        };
        info!(text = %config.text(), quantity = config.quantity(), "Adding label to cart");

        self.mutate(CartOperation::Add, CartEventKind::Added, |cart_id| async move {
            self.backend.add_line(&cart_id, line).await
        })
        .await
    }

    /// Removes one line.
    ///
    /// [`CartError::NotFound`] without any remote mutation when the id is
    /// not part of the cart.
    pub async fn remove(&self, line_id: &LineId) -> CartResult<CartSnapshot> {
        self.require_line(line_id).await?;

        self.mutate(CartOperation::Remove, CartEventKind::Removed, |cart_id| async move {
            self.backend
                .remove_lines(&cart_id, std::slice::from_ref(line_id))
                .await
        })
        .await
    }

    /// Removes the line of `item`. Items never acknowledged by the remote
    /// store have no line id and fail with [`CartError::NotFound`].
    pub async fn remove_item(&self, item: &CartItem) -> CartResult<CartSnapshot> {
        match &item.remote_line_id {
            Some(line_id) => self.remove(line_id).await,
            None => Err(CartError::NotFound {
                line_id: item.configuration.id().to_string(),
            }),
        }
    }

    /// Sets the quantity of one line. Quantity 0 is rejected, removal is
    /// always explicit.
    pub async fn update_quantity(&self, line_id: &LineId, quantity: u32) -> CartResult<CartSnapshot> {
        if !(MIN_QUANTITY..=MAX_QUANTITY).contains(&quantity) {
            return Err(CartError::InvalidQuantity {
                quantity,
                min: MIN_QUANTITY,
                max: MAX_QUANTITY,
            });
        }
        self.require_line(line_id).await?;

        self.mutate(CartOperation::Update, CartEventKind::Updated, |cart_id| async move {
            self.backend.update_line(&cart_id, line_id, quantity).await
        })
        .await
    }

    /// Removes every line of the current remote cart in one batch.
    /// An empty cart is a successful no-op.
    pub async fn clear(&self) -> CartResult<CartSnapshot> {
        let current = self.snapshot().await?;
        if current.is_empty() {
            debug!("Cart already empty");
            return Ok(current);
        }

        let line_ids = current.line_ids();
        info!(lines = line_ids.len(), "Clearing cart");
        self.mutate(CartOperation::Clear, CartEventKind::Cleared, |cart_id| async move {
            self.backend.remove_lines(&cart_id, &line_ids).await
        })
        .await
    }

    /// Fails with NotFound unless `line_id` is in the cached snapshot or,
    /// failing that, in a freshly read one.
    async fn require_line(&self, line_id: &LineId) -> CartResult<()> {
        let cached = self.cached().await;
        if cached.as_ref().is_some_and(|s| s.find_line(line_id).is_some()) {
            return Ok(());
        }
        if self.snapshot().await?.find_line(line_id).is_some() {
            return Ok(());
        }
        debug!(%line_id, "Line not in cart");
        Err(CartError::NotFound {
            line_id: line_id.to_string(),
        })
    }

    /// Runs one remote mutation against the current session.
    async fn mutate<F, Fut>(&self, operation: CartOperation, kind: CartEventKind, call: F) -> CartResult<CartSnapshot>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = BackendResult<RemoteCart>>,
    {
        let cart_id = self.ensure_session().await?;
        let seq = self.take_seq();

        let result = {
            let _in_flight = InFlight::enter(&self.in_flight);
            call(cart_id.clone()).await
        };

        match result {
            Ok(cart) => {
                let snapshot = self.apply(seq, &cart).await;
                debug!(%operation, total_quantity = snapshot.total_quantity, "Cart mutation applied");
                self.notify(kind, &snapshot);
                Ok(snapshot)
            }
            Err(BackendError::CartNotFound) => {
                warn!(%operation, %cart_id, "Cart vanished during mutation, session reset");
                self.invalidate_session(&cart_id).await;
                Err(CartError::Session(format!(
                    "cart expired before {} could be applied",
                    operation
                )))
            }
            Err(e) => {
                warn!(%operation, error = %e, "Cart mutation failed");
                Err(CartError::from_backend(operation, e))
            }
        }
    }

    // =========================================================================
    // Sequencing
    // =========================================================================

    fn take_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst)
    }

    /// Derives the snapshot of `cart` and stores it if `seq` is newer than
    /// the last applied response. Returns the derived snapshot either way.
    async fn apply(&self, seq: u64, cart: &RemoteCart) -> CartSnapshot {
        let snapshot = cart.to_snapshot(self.unit_price);
        self.store_snapshot(seq, snapshot.clone()).await;
        snapshot
    }

    async fn store_snapshot(&self, seq: u64, snapshot: CartSnapshot) {
        let mut applied = self.applied.write().await;
        if seq > applied.seq {
            applied.seq = seq;
            applied.snapshot = Some(snapshot);
        } else {
            debug!(seq, last = applied.seq, "Ignoring out-of-order cart response");
        }
    }
}

fn session_error(err: BackendError) -> CartError {
    CartError::Session(err.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================
