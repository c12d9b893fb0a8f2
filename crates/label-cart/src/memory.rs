//! # In-Memory Cart Backend
//!
//! A process-local [`CartBackend`] with the same contract as the
//! Storefront API. Used when no shop is configured (offline demo) and by
//! the tests.
//!
//! Extras for exercising failure paths:
//! - [`InMemoryBackend::expire_cart`] makes a cart vanish, like an
//!   expired or checked-out remote cart
//! - [`InMemoryBackend::fail_next`] makes the next call fail once
//!
//! Cart ids that are not global ids (`gid://...`) are rejected with a user
//! error, as the Storefront API does for a corrupted handle.
//!
//! Clones share the same carts.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use label_core::label::{unit_price, LineAttribute, LineId};
use label_core::{Money, CURRENCY_CODE};

use crate::backend::{CartBackend, CreatedCart, NewLine, RemoteCart, RemoteLine};
use crate::error::{BackendError, BackendResult};

#[derive(Debug, Clone)]
struct StoredLine {
    id: LineId,
    variant_ref: String,
    quantity: u32,
    attributes: Vec<LineAttribute>,
}

#[derive(Debug, Default)]
struct State {
    carts: HashMap<String, Vec<StoredLine>>,
    next_line: u64,
    pending_failure: Option<BackendError>,
    created: usize,
    mutations: usize,
}

/// In-process remote cart.
#[derive(Debug, Clone)]
pub struct InMemoryBackend {
    state: Arc<Mutex<State>>,
    unit_price: Money,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new(unit_price())
    }
}

impl InMemoryBackend {
    pub fn new(unit_price: Money) -> Self {
        InMemoryBackend {
            state: Arc::new(Mutex::new(State::default())),
            unit_price,
        }
    }

    /// Deletes a cart; later queries see it as not found.
    pub async fn expire_cart(&self, cart_id: &str) {
        let mut state = self.state.lock().await;
        if state.carts.remove(cart_id).is_some() {
            debug!(cart_id, "In-memory cart expired");
        }
    }

    /// Makes the next backend call fail with `error`.
    pub async fn fail_next(&self, error: BackendError) {
        self.state.lock().await.pending_failure = Some(error);
    }

    /// Number of carts created so far.
    pub async fn created_count(&self) -> usize {
        self.state.lock().await.created
    }

    /// Number of successful mutations so far.
    pub async fn mutation_count(&self) -> usize {
        self.state.lock().await.mutations
    }

    /// Number of carts currently alive.
    pub async fn cart_count(&self) -> usize {
        self.state.lock().await.carts.len()
    }

    fn render(&self, cart_id: &str, lines: &[StoredLine]) -> RemoteCart {
        let lines: Vec<RemoteLine> = lines
            .iter()
            .map(|line| RemoteLine {
                id: line.id.clone(),
                quantity: line.quantity,
                attributes: line.attributes.clone(),
                total_amount: self.unit_price * line.quantity,
            })
            .collect();

        RemoteCart {
            id: cart_id.to_string(),
            checkout_url: checkout_url(cart_id),
            total_quantity: lines.iter().map(|l| l.quantity).sum(),
            total_amount: lines.iter().map(|l| l.total_amount).sum(),
            currency_code: CURRENCY_CODE.to_string(),
            lines,
        }
    }

    /// Runs `mutate` against an existing cart, honoring injected failures.
    async fn mutate<F>(&self, cart_id: &str, mutate: F) -> BackendResult<RemoteCart>
    where
        F: FnOnce(&mut State, &str) -> BackendResult<()>,
    {
        let mut state = self.state.lock().await;
        if let Some(err) = state.pending_failure.take() {
            return Err(err);
        }
        check_global_id(cart_id)?;
        if !state.carts.contains_key(cart_id) {
            return Err(BackendError::CartNotFound);
        }

        mutate(&mut *state, cart_id)?;
        state.mutations += 1;

        let lines = state.carts.get(cart_id).map(Vec::as_slice).unwrap_or_default();
        Ok(self.render(cart_id, lines))
    }
}

fn checkout_url(cart_id: &str) -> String {
    let token = cart_id.rsplit('/').next().unwrap_or(cart_id);
    format!("https://checkout.invalid/cart/c/{}", token)
}

fn check_global_id(cart_id: &str) -> BackendResult<()> {
    if cart_id.starts_with("gid://") {
        Ok(())
    } else {
        Err(BackendError::UserErrors(vec![format!("Invalid global id `{}`", cart_id)]))
    }
}

fn unknown_line(line_id: &LineId) -> BackendError {
    BackendError::UserErrors(vec![format!(
        "The merchandise line with id {} does not exist.",
        line_id
    )])
}

impl CartBackend for InMemoryBackend {
    async fn create_cart(&self) -> BackendResult<CreatedCart> {
        let mut state = self.state.lock().await;
        if let Some(err) = state.pending_failure.take() {
            return Err(err);
        }

        let cart_id = format!("gid://memory/Cart/{}", Uuid::new_v4());
        state.carts.insert(cart_id.clone(), Vec::new());
        state.created += 1;
        debug!(%cart_id, "In-memory cart created");

        Ok(CreatedCart {
            checkout_url: checkout_url(&cart_id),
            cart_id,
        })
    }

    async fn query_cart(&self, cart_id: &str) -> BackendResult<Option<RemoteCart>> {
        let mut state = self.state.lock().await;
        if let Some(err) = state.pending_failure.take() {
            return Err(err);
        }
        check_global_id(cart_id)?;
        Ok(state.carts.get(cart_id).map(|lines| self.render(cart_id, lines)))
    }

    async fn add_line(&self, cart_id: &str, line: NewLine) -> BackendResult<RemoteCart> {
        if line.quantity == 0 {
            return Err(BackendError::UserErrors(vec![
                "Quantity must be greater than 0.".into(),
            ]));
        }

        self.mutate(cart_id, |state, cart_id| {
            state.next_line += 1;
            let id = LineId::new(format!("gid://memory/CartLine/{}", state.next_line));
            let lines = state.carts.entry(cart_id.to_string()).or_default();
            lines.push(StoredLine {
                id,
                variant_ref: line.variant_ref,
                quantity: line.quantity,
                attributes: line.attributes,
            });
            Ok(())
        })
        .await
    }

    async fn update_line(&self, cart_id: &str, line_id: &LineId, quantity: u32) -> BackendResult<RemoteCart> {
        self.mutate(cart_id, |state, cart_id| {
            let lines = state.carts.entry(cart_id.to_string()).or_default();
            let index = lines
                .iter()
                .position(|l| &l.id == line_id)
                .ok_or_else(|| unknown_line(line_id))?;
            // the remote treats quantity 0 as removal
            if quantity == 0 {
                lines.remove(index);
            } else {
                lines[index].quantity = quantity;
            }
            Ok(())
        })
        .await
    }

    async fn remove_lines(&self, cart_id: &str, line_ids: &[LineId]) -> BackendResult<RemoteCart> {
        self.mutate(cart_id, |state, cart_id| {
            let lines = state.carts.entry(cart_id.to_string()).or_default();
            if let Some(missing) = line_ids.iter().find(|id| !lines.iter().any(|l| &l.id == *id)) {
                return Err(unknown_line(missing));
            }
            lines.retain(|l| !line_ids.contains(&l.id));
            Ok(())
        })
        .await
    }
}

impl InMemoryBackend {
    /// Variant references of every line in a cart, in order.
    pub async fn variant_refs(&self, cart_id: &str) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .carts
            .get(cart_id)
            .map(|lines| lines.iter().map(|l| l.variant_ref.clone()).collect())
            .unwrap_or_default()
    }
}
