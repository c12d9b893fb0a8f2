//! # Cart Poller
//!
//! Keeps a published snapshot of the remote cart current for views that
//! only display it (badge counter, drawer).
//!
//! ## Refresh Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  interval tick (2s) ──────────┐                                         │
//! │  handle.refresh() ────────────┼──► store.snapshot() ──► watch::Sender   │
//! │  store mutation ──► Notify ───┘    (remote read)          │             │
//! │  (observer)                                               ▼             │
//! │                                         handle.snapshots() receivers    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every tick and every successful mutation leads to at least one fresh
//! read. Polling picks up changes made elsewhere (another tab, the
//! checkout). A failed poll is logged and the last published snapshot
//! stays.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Notify};
use tracing::{debug, info, warn};

use label_core::label::CartSnapshot;

use crate::backend::CartBackend;
use crate::error::{CartError, CartResult};
use crate::observer::{CartEvent, CartObserver, ObserverId};
use crate::session::SessionStorage;
use crate::store::CartStore;

/// Wakes the poller whenever the store applied a change.
struct NotifyObserver(Arc<Notify>);

impl CartObserver for NotifyObserver {
    fn cart_changed(&self, _event: &CartEvent) {
        self.0.notify_one();
    }
}

// =============================================================================
// Cart Poller
// =============================================================================

/// Background task publishing cart snapshots.
pub struct CartPoller<B, S> {
    store: Arc<CartStore<B, S>>,

    /// Time between remote reads.
    interval: Duration,

    changed: Arc<Notify>,
    observer_id: ObserverId,

    publish: watch::Sender<Option<CartSnapshot>>,
    refresh_rx: mpsc::Receiver<()>,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for controlling the poller and reading its snapshots.
#[derive(Clone)]
pub struct CartPollerHandle {
    refresh_tx: mpsc::Sender<()>,
    shutdown_tx: mpsc::Sender<()>,
    snapshots: watch::Receiver<Option<CartSnapshot>>,
}

impl CartPollerHandle {
    /// Receiver of published snapshots; `None` until the first read.
    pub fn snapshots(&self) -> watch::Receiver<Option<CartSnapshot>> {
        self.snapshots.clone()
    }

    /// Last published snapshot.
    pub fn current(&self) -> Option<CartSnapshot> {
        self.snapshots.borrow().clone()
    }

    /// Requests a remote read ahead of the next tick.
    pub async fn refresh(&self) -> CartResult<()> {
        // a pending request already covers this one
        match self.refresh_tx.try_send(()) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(())) => Ok(()),
            Err(mpsc::error::TrySendError::Closed(())) => {
                Err(CartError::Channel("Poller refresh channel closed".into()))
            }
        }
    }

    /// Triggers graceful shutdown.
    pub async fn shutdown(&self) -> CartResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| CartError::Channel("Poller shutdown channel closed".into()))
    }
}

impl<B, S> CartPoller<B, S>
where
    B: CartBackend + 'static,
    S: SessionStorage + 'static,
{
    /// Creates a poller over `store` and returns its handle.
    ///
    /// The poller registers itself as an observer of the store until
    /// `run` returns.
    pub fn new(store: Arc<CartStore<B, S>>, interval: Duration) -> (Self, CartPollerHandle) {
        let (refresh_tx, refresh_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let (publish, snapshots) = watch::channel(None);

        let changed = Arc::new(Notify::new());
        let observer_id = store.subscribe(Arc::new(NotifyObserver(Arc::clone(&changed))));

        let poller = CartPoller {
            store,
            interval,
            changed,
            observer_id,
            publish,
            refresh_rx,
            shutdown_rx,
        };

        let handle = CartPollerHandle {
            refresh_tx,
            shutdown_tx,
            snapshots,
        };

        (poller, handle)
    }

    /// Runs the poll loop.
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        info!(interval_ms = self.interval.as_millis() as u64, "Cart poller starting");

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                // Poll on interval
                _ = interval.tick() => {
                    self.poll().await;
                }

                // Explicit refresh
                Some(()) = self.refresh_rx.recv() => {
                    self.poll().await;
                    interval.reset();
                }

                // Local mutation applied
                _ = self.changed.notified() => {
                    self.poll().await;
                }

                // Shutdown
                _ = self.shutdown_rx.recv() => {
                    info!("Cart poller shutting down");
                    break;
                }
            }
        }

        self.store.unsubscribe(self.observer_id);
        info!("Cart poller stopped");
    }

    async fn poll(&self) {
        match self.store.snapshot().await {
            Ok(snapshot) => self.publish(snapshot),
            Err(e) => warn!(?e, "Cart poll failed, keeping last snapshot"),
        }
    }

    fn publish(&self, snapshot: CartSnapshot) {
        let quantity = snapshot.total_quantity;
        let changed = self.publish.send_if_modified(|current| {
            if current.as_ref() == Some(&snapshot) {
                return false;
            }
            *current = Some(snapshot);
            true
        });
        if changed {
            debug!(total_quantity = quantity, "Published cart snapshot");
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NewLine;
    use crate::error::BackendError;
    use crate::memory::InMemoryBackend;
    use crate::session::MemorySessionStorage;
    use label_core::label::{FontSize, LabelConfiguration, LineAttribute};

    type Store = CartStore<InMemoryBackend, MemorySessionStorage>;

    fn store() -> Arc<Store> {
        Arc::new(CartStore::new(
            InMemoryBackend::default(),
            MemorySessionStorage::new(),
            "gid://shopify/ProductVariant/4711",
        ))
    }

    async fn next(rx: &mut watch::Receiver<Option<CartSnapshot>>) -> CartSnapshot {
        rx.changed().await.unwrap();
        rx.borrow_and_update().clone().unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_publishes_snapshot() {
        let store = store();
        let (poller, handle) = CartPoller::new(store, Duration::from_secs(2));
        let mut rx = handle.snapshots();
        assert_eq!(handle.current(), None);

        let task = tokio::spawn(poller.run());
        let snapshot = next(&mut rx).await;
        assert!(snapshot.is_empty());
        assert_eq!(handle.current(), Some(snapshot));

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_local_mutation_published_without_waiting() {
        let store = store();
        let (poller, handle) = CartPoller::new(Arc::clone(&store), Duration::from_secs(60));
        let mut rx = handle.snapshots();
        let task = tokio::spawn(poller.run());
        next(&mut rx).await;

        let config = LabelConfiguration::new("MÜLLER", FontSize::from_px(48.0), 2).unwrap();
        store.add(&config).await.unwrap();

        let snapshot = next(&mut rx).await;
        assert_eq!(snapshot.total_quantity, 2);

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_change_picked_up_on_tick() {
        let store = store();
        let (poller, handle) = CartPoller::new(Arc::clone(&store), Duration::from_secs(2));
        let mut rx = handle.snapshots();
        let task = tokio::spawn(poller.run());
        let first = next(&mut rx).await;

        // another tab adds a line directly
        store
            .backend()
            .add_line(
                &first.cart_id,
                NewLine {
                    variant_ref: "gid://shopify/ProductVariant/4711".into(),
                    quantity: 3,
                    attributes: vec![LineAttribute::new("label_text", "15A")],
                },
            )
            .await
            .unwrap();

        let snapshot = next(&mut rx).await;
        assert_eq!(snapshot.total_quantity, 3);
        assert_eq!(snapshot.total_price.to_decimal_string(), "38.70");

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_poll_keeps_last_snapshot() {
        let store = store();
        let (poller, handle) = CartPoller::new(Arc::clone(&store), Duration::from_secs(2));
        let mut rx = handle.snapshots();
        let task = tokio::spawn(poller.run());
        let first = next(&mut rx).await;

        store
            .backend()
            .fail_next(BackendError::Transport("offline".into()))
            .await;
        handle.refresh().await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(handle.current(), Some(first));

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_errors_after_shutdown() {
        let (poller, handle) = CartPoller::new(store(), Duration::from_secs(2));
        let task = tokio::spawn(poller.run());

        handle.shutdown().await.unwrap();
        task.await.unwrap();

        assert!(matches!(handle.refresh().await, Err(CartError::Channel(_))));
        assert!(matches!(handle.shutdown().await, Err(CartError::Channel(_))));
    }
}
