//! # Cart Observers
//!
//! Explicit change notification. Anything that shows cart data (badge,
//! drawer, poller) registers with the store and is told when the cart
//! changed, instead of listening to a global event bus.
//!
//! ```text
//!  CartStore::add ──► remote OK ──► snapshot replaced ──► notify_all(CartEvent)
//!                                                           │
//!                                   ┌───────────────────────┼──────────────┐
//!                                   ▼                       ▼              ▼
//!                              CartPoller              badge view      drawer view
//! ```

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::warn;

// =============================================================================
// Events
// =============================================================================

/// What happened to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartEventKind {
    Added,
    Removed,
    Updated,
    Cleared,
    /// The previous cart vanished remotely and a new one was created.
    SessionReset,
}

/// Change notification payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CartEvent {
    pub kind: CartEventKind,
    pub cart_id: String,
    pub total_quantity: u32,
    pub at: DateTime<Utc>,
}

impl CartEvent {
    pub fn new(kind: CartEventKind, cart_id: impl Into<String>, total_quantity: u32) -> Self {
        CartEvent {
            kind,
            cart_id: cart_id.into(),
            total_quantity,
            at: Utc::now(),
        }
    }
}

// =============================================================================
// Observer Trait
// =============================================================================

/// Receives cart change notifications.
///
/// Called synchronously on the task that completed the mutation; keep it
/// short (set a flag, wake a task).
pub trait CartObserver: Send + Sync {
    fn cart_changed(&self, event: &CartEvent);
}

/// Observer that ignores everything.
pub struct NoOpObserver;

impl CartObserver for NoOpObserver {
    fn cart_changed(&self, _event: &CartEvent) {}
}

/// Registration handle returned by `subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

// =============================================================================
// Registry
// =============================================================================

#[derive(Default)]
pub(crate) struct ObserverRegistry {
    observers: RwLock<Vec<(ObserverId, Arc<dyn CartObserver>)>>,
    next_id: AtomicU64,
}

impl ObserverRegistry {
    pub(crate) fn subscribe(&self, observer: Arc<dyn CartObserver>) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        match self.observers.write() {
            Ok(mut observers) => observers.push((id, observer)),
            Err(poisoned) => poisoned.into_inner().push((id, observer)),
        }
        id
    }

    pub(crate) fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut observers = match self.observers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.read().map(|o| o.len()).unwrap_or(0)
    }

    /// Calls every observer outside the lock, so observers may subscribe
    /// or unsubscribe from inside `cart_changed`.
    pub(crate) fn notify_all(&self, event: &CartEvent) {
        let snapshot: Vec<Arc<dyn CartObserver>> = match self.observers.read() {
            Ok(observers) => observers.iter().map(|(_, o)| Arc::clone(o)).collect(),
            Err(_) => {
                warn!("Observer registry poisoned, skipping notification");
                return;
            }
        };
        for observer in snapshot {
            observer.cart_changed(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl CartObserver for Counter {
        fn cart_changed(&self, _event: &CartEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_subscribe_notify_unsubscribe() {
        let registry = ObserverRegistry::default();
        let counter = Arc::new(Counter::default());

        let id = registry.subscribe(counter.clone());
        registry.subscribe(Arc::new(NoOpObserver));
        assert_eq!(registry.len(), 2);

        registry.notify_all(&CartEvent::new(CartEventKind::Added, "c1", 2));
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);

        assert!(registry.unsubscribe(id));
        assert!(!registry.unsubscribe(id));
        registry.notify_all(&CartEvent::new(CartEventKind::Cleared, "c1", 0));
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }
}
