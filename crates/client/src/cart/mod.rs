//! The cart store.
//!
//! [`CartStore`] wraps the [`CartState`] state machine from `bistro-core` with
//! the things a running client needs:
//!
//! - an explicit, cloneable handle that the shell and the checkout
//!   orchestrator share (there is no global cart)
//! - fire-and-forget persistence on every mutation (see [`writer`])
//! - "cart changed" notifications for presentation feedback
//!
//! All reads recompute from the current lines; nothing is cached.

mod storage;
mod writer;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bistro_core::{CartState, LineItem, Price, Product, ProductId, QuantityChange};
use tokio::sync::broadcast;
use tracing::{debug, instrument, warn};

pub use storage::{CartStorage, FileCartStorage, MemoryCartStorage, PersistenceError};
use writer::CartWriter;

/// Capacity of the notification channel. Slow subscribers skip old events.
const EVENT_CAPACITY: usize = 64;

/// A change to the cart, for presentation feedback only.
///
/// Every event carries the item count after the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartEvent {
    ItemAdded {
        product_id: ProductId,
        quantity: u32,
        count: u32,
    },
    ItemRemoved {
        product_id: ProductId,
        count: u32,
    },
    QuantityChanged {
        product_id: ProductId,
        quantity: u32,
        count: u32,
    },
    Cleared {
        count: u32,
    },
}

/// Shared handle to the current cart.
///
/// Cloning is cheap; all clones see the same cart. Mutations take a short
/// lock that is never held across an `.await`.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    state: Mutex<CartState>,
    events: broadcast::Sender<CartEvent>,
    writer: Option<CartWriter>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("lines", &self.lock().len())
            .field("persistent", &self.inner.writer.is_some())
            .finish()
    }
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CartStore {
    /// Create an empty, memory-only cart.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(CartState::new(), None)
    }

    /// Restore the cart from `storage` and persist every later change to it.
    ///
    /// An unreadable or corrupt stored cart is logged and replaced by an
    /// empty one. Must be called inside a tokio runtime: the writer runs as a
    /// background task.
    #[instrument(skip(storage))]
    pub fn open<S: CartStorage>(storage: S) -> Self {
        let state = match storage.load() {
            Ok(Some(state)) => {
                debug!(lines = state.len(), "Restored persisted cart");
                state
            }
            Ok(None) => CartState::new(),
            Err(e) => {
                warn!(error = %e, "Failed to restore persisted cart; starting empty");
                CartState::new()
            }
        };

        let writer = CartWriter::spawn(Arc::new(storage));
        Self::with_parts(state, Some(writer))
    }

    fn with_parts(state: CartState, writer: Option<CartWriter>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(CartStoreInner {
                state: Mutex::new(state),
                events,
                writer,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CartState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a mutation, queue the resulting snapshot for persistence and
    /// publish the event it produced.
    fn mutate<R>(&self, apply: impl FnOnce(&mut CartState) -> (R, Option<CartEvent>)) -> R {
        let (result, event) = {
            let mut state = self.lock();
            let (result, event) = apply(&mut state);
            if event.is_some()
                && let Some(writer) = &self.inner.writer
            {
                writer.save(state.clone());
            }
            (result, event)
        };

        if let Some(event) = event {
            // No subscribers is fine: notifications are observational.
            let _ = self.inner.events.send(event);
        }
        result
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of `product`, merging with an existing line.
    ///
    /// Returns the product's new quantity.
    pub fn add_item(&self, product: &Product) -> u32 {
        self.mutate(|cart| {
            let quantity = cart.add(product);
            let event = CartEvent::ItemAdded {
                product_id: product.id,
                quantity,
                count: cart.count(),
            };
            (quantity, Some(event))
        })
    }

    /// Remove the line for `product_id`. Absent products are a no-op.
    pub fn remove_item(&self, product_id: ProductId) -> bool {
        self.mutate(|cart| {
            let removed = cart.remove(product_id);
            let event = removed.then(|| CartEvent::ItemRemoved {
                product_id,
                count: cart.count(),
            });
            (removed, event)
        })
    }

    /// Change a line's quantity by `delta`; zero or below removes the line.
    pub fn set_quantity(&self, product_id: ProductId, delta: i64) -> QuantityChange {
        self.mutate(|cart| {
            let change = cart.adjust_quantity(product_id, delta);
            let event = match change {
                QuantityChange::Updated(quantity) => Some(CartEvent::QuantityChanged {
                    product_id,
                    quantity,
                    count: cart.count(),
                }),
                QuantityChange::Removed => Some(CartEvent::ItemRemoved {
                    product_id,
                    count: cart.count(),
                }),
                QuantityChange::Missing => None,
            };
            (change, event)
        })
    }

    /// Empty the cart unconditionally.
    pub fn clear(&self) {
        self.mutate(|cart| {
            cart.clear();
            ((), Some(CartEvent::Cleared { count: 0 }))
        });
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Σ `unit_price × quantity`, recomputed now.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lock().total()
    }

    /// Σ `quantity`, recomputed now.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.lock().count()
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<LineItem> {
        self.lock().items().to_vec()
    }

    /// A copy of the whole cart.
    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.lock().clone()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Line total for one product, if it is in the cart.
    #[must_use]
    pub fn line_total(&self, product_id: ProductId) -> Option<Price> {
        self.lock().get(product_id).map(LineItem::line_total)
    }

    /// Subscribe to cart change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.inner.events.subscribe()
    }

    /// Wait until every change made so far has been written (or has failed
    /// to write). Returns immediately for memory-only carts.
    pub async fn flush(&self) {
        if let Some(writer) = &self.inner.writer {
            writer.flush().await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: i32, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Dish {id}"),
            description: String::new(),
            price: Price::from_cents(cents),
            image_url: None,
            category: "Mains".to_string(),
            available: true,
        }
    }

    #[test]
    fn test_memory_store_totals() {
        let cart = CartStore::new();
        cart.add_item(&product(1, 2400));
        cart.add_item(&product(1, 2400));
        cart.add_item(&product(2, 1200));

        assert_eq!(cart.count(), 3);
        assert_eq!(cart.total(), Price::from_cents(6000));
        assert_eq!(cart.line_total(ProductId::new(1)), Some(Price::from_cents(4800)));
    }

    #[test]
    fn test_clones_share_state() {
        let cart = CartStore::new();
        let shell = cart.clone();
        shell.add_item(&product(1, 2400));
        assert_eq!(cart.count(), 1);
    }

    #[test]
    fn test_set_quantity_to_zero_removes() {
        let cart = CartStore::new();
        cart.add_item(&product(1, 2400));
        cart.add_item(&product(1, 2400));

        assert_eq!(
            cart.set_quantity(ProductId::new(1), -2),
            QuantityChange::Removed
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_events_published() {
        let cart = CartStore::new();
        let mut events = cart.subscribe();

        cart.add_item(&product(1, 2400));
        cart.set_quantity(ProductId::new(1), 2);
        cart.remove_item(ProductId::new(1));
        cart.remove_item(ProductId::new(1));
        cart.clear();

        let id = ProductId::new(1);
        assert_eq!(
            events.try_recv().unwrap(),
            CartEvent::ItemAdded { product_id: id, quantity: 1, count: 1 }
        );
        assert_eq!(
            events.try_recv().unwrap(),
            CartEvent::QuantityChanged { product_id: id, quantity: 3, count: 3 }
        );
        assert_eq!(
            events.try_recv().unwrap(),
            CartEvent::ItemRemoved { product_id: id, count: 0 }
        );
        // the second removal was a no-op
        assert_eq!(events.try_recv().unwrap(), CartEvent::Cleared { count: 0 });
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_mutations_without_subscribers_do_not_fail() {
        let cart = CartStore::new();
        assert_eq!(cart.add_item(&product(5, 100)), 1);
    }

    #[tokio::test]
    async fn test_persisted_cart_survives_restart() {
        let storage = MemoryCartStorage::new();

        let before = CartStore::open(storage.clone());
        before.add_item(&product(1, 2400));
        before.add_item(&product(2, 1200));
        before.set_quantity(ProductId::new(2), 1);
        before.flush().await;
        let saved = before.snapshot();
        drop(before);

        let after = CartStore::open(storage);
        assert_eq!(after.snapshot(), saved);
        assert_eq!(after.total(), Price::from_cents(4800));
    }

    #[tokio::test]
    async fn test_clear_is_persisted() {
        let storage = MemoryCartStorage::new();
        let cart = CartStore::open(storage.clone());
        cart.add_item(&product(1, 2400));
        cart.clear();
        cart.flush().await;

        assert_eq!(storage.load().unwrap(), Some(CartState::new()));
    }

    #[tokio::test]
    async fn test_write_failure_is_retried_on_next_mutation() {
        let storage = MemoryCartStorage::new();
        let cart = CartStore::open(storage.clone());

        storage.set_fail_writes(true);
        cart.add_item(&product(1, 2400));
        cart.flush().await;
        assert_eq!(cart.count(), 1);
        assert!(storage.raw().is_none());

        storage.set_fail_writes(false);
        cart.add_item(&product(2, 1200));
        cart.flush().await;

        let restored = storage.load().unwrap().unwrap();
        assert_eq!(restored.count(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_storage_starts_empty() {
        let storage = MemoryCartStorage::new();
        storage.set_raw("definitely not a cart");

        let cart = CartStore::open(storage);
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Price::ZERO);
    }
}
