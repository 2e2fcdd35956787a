//! Reconciling overlapping cart mutations.
//!
//! Every mutation takes a [`MutationTicket`] before calling the backend and
//! settles it afterwards. The displayed cart is the payload of the most
//! recently *completed* successful call, whatever order the calls were
//! issued in. Failures leave the last confirmed cart in place.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use crate::shopify::Cart;

/// Carts tracked at once.
const MAX_TRACKED_CARTS: u64 = 10_000;

/// Trackers idle longer than this are dropped.
const TRACKER_IDLE: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Default)]
struct SyncState {
    next_seq: u64,
    in_flight: usize,
    confirmed: Option<Cart>,
    confirmed_seq: Option<u64>,
}

/// The cart to display and whether a mutation is still running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSnapshot {
    pub cart: Option<Cart>,
    pub pending: bool,
}

/// Per-cart reconciliation state.
#[derive(Debug, Default)]
pub struct CartSync {
    state: Mutex<SyncState>,
}

impl CartSync {
    /// Tracker with nothing confirmed yet.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a mutation.
    #[must_use]
    pub fn begin(self: &Arc<Self>) -> MutationTicket {
        let mut state = self.lock();
        state.next_seq += 1;
        state.in_flight += 1;
        MutationTicket {
            sync: Arc::clone(self),
            seq: state.next_seq,
            settled: false,
        }
    }

    /// Record a cart fetched outside a mutation.
    pub fn observe(&self, cart: Cart) -> CartSnapshot {
        let mut state = self.lock();
        state.confirmed = Some(cart);
        Self::snapshot_of(&state)
    }

    /// Current display state.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        Self::snapshot_of(&self.lock())
    }

    /// Whether any mutation is in flight.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.lock().in_flight > 0
    }

    fn snapshot_of(state: &SyncState) -> CartSnapshot {
        CartSnapshot {
            cart: state.confirmed.clone(),
            pending: state.in_flight > 0,
        }
    }

    fn settle(&self, seq: u64, cart: Option<Cart>) -> CartSnapshot {
        let mut state = self.lock();
        state.in_flight = state.in_flight.saturating_sub(1);

        if let Some(cart) = cart {
            if state.confirmed_seq.is_some_and(|s| s > seq) {
                debug!(
                    seq,
                    newer = ?state.confirmed_seq,
                    "Earlier cart mutation completed last, displaying its payload"
                );
            }
            state.confirmed = Some(cart);
            state.confirmed_seq = Some(seq);
        }

        Self::snapshot_of(&state)
    }
}

/// An in-flight cart mutation.
///
/// Dropping a ticket without settling it counts as a failure.
#[derive(Debug)]
pub struct MutationTicket {
    sync: Arc<CartSync>,
    seq: u64,
    settled: bool,
}

impl MutationTicket {
    /// Issue order of this mutation (1-based per tracker).
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// The mutation succeeded with `cart`; it becomes the displayed cart.
    pub fn complete(mut self, cart: Cart) -> CartSnapshot {
        self.settled = true;
        self.sync.settle(self.seq, Some(cart))
    }

    /// The mutation failed; the last confirmed cart stays displayed.
    pub fn fail(mut self) -> CartSnapshot {
        self.settled = true;
        self.sync.settle(self.seq, None)
    }
}

impl Drop for MutationTicket {
    fn drop(&mut self) {
        if !self.settled {
            self.sync.settle(self.seq, None);
        }
    }
}

/// Trackers keyed by cart id.
#[derive(Clone)]
pub struct CartRegistry {
    trackers: Cache<String, Arc<CartSync>>,
}

impl Default for CartRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CartRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            trackers: Cache::builder()
                .max_capacity(MAX_TRACKED_CARTS)
                .time_to_idle(TRACKER_IDLE)
                .build(),
        }
    }

    /// Tracker for `cart_id`, created on first use.
    pub async fn tracker(&self, cart_id: &str) -> Arc<CartSync> {
        self.trackers
            .get_with(cart_id.to_string(), async { CartSync::new() })
            .await
    }

    /// Register the tracker used while creating a cart under its new id.
    pub async fn adopt(&self, cart_id: &str, sync: Arc<CartSync>) {
        self.trackers.insert(cart_id.to_string(), sync).await;
    }

    /// Stop tracking a cart (e.g. after it expired upstream).
    pub async fn forget(&self, cart_id: &str) {
        self.trackers.invalidate(cart_id).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use harbor_core::{CurrencyCode, Money};
    use rust_decimal::Decimal;

    use super::*;
    use crate::shopify::CartCost;

    fn cart(total_quantity: u32) -> Cart {
        let money = Money::new(
            Decimal::from_str("10").unwrap(),
            CurrencyCode::parse("EUR").unwrap(),
        );
        Cart {
            id: "gid://shopify/Cart/1".to_string(),
            checkout_url: "https://shop.example/checkout".to_string(),
            total_quantity,
            note: None,
            updated_at: None,
            cost: CartCost {
                subtotal: money.clone(),
                total: money,
                total_tax: None,
            },
            discount_codes: vec![],
            lines: vec![],
        }
    }

    #[test]
    fn test_last_completed_response_wins() {
        let sync = CartSync::new();
        let first = sync.begin();
        let second = sync.begin();
        assert!(sync.is_pending());

        // The later request finishes first...
        let snapshot = second.complete(cart(2));
        assert_eq!(snapshot.cart.as_ref().unwrap().total_quantity, 2);
        assert!(snapshot.pending);

        // ...then the earlier one; its payload is what the shopper sees.
        let snapshot = first.complete(cart(1));
        assert_eq!(snapshot.cart.unwrap().total_quantity, 1);
        assert!(!snapshot.pending);
    }

    #[test]
    fn test_failure_keeps_confirmed_cart() {
        let sync = CartSync::new();
        sync.begin().complete(cart(3));

        let snapshot = sync.begin().fail();
        assert_eq!(snapshot.cart.unwrap().total_quantity, 3);
        assert!(!snapshot.pending);
    }

    #[test]
    fn test_dropped_ticket_clears_pending() {
        let sync = CartSync::new();
        {
            let ticket = sync.begin();
            assert_eq!(ticket.seq(), 1);
            assert!(sync.is_pending());
        }
        assert!(!sync.is_pending());
        assert_eq!(sync.snapshot().cart, None);
    }

    #[test]
    fn test_observe_updates_display() {
        let sync = CartSync::new();
        let ticket = sync.begin();
        let snapshot = sync.observe(cart(5));
        assert!(snapshot.pending);
        drop(ticket);
        assert_eq!(sync.snapshot().cart.unwrap().total_quantity, 5);
    }

    #[tokio::test]
    async fn test_registry_shares_tracker_per_cart() {
        let registry = CartRegistry::new();
        let a = registry.tracker("cart-a").await;
        let again = registry.tracker("cart-a").await;
        let b = registry.tracker("cart-b").await;

        assert!(Arc::ptr_eq(&a, &again));
        assert!(!Arc::ptr_eq(&a, &b));

        let created = CartSync::new();
        registry.adopt("cart-c", Arc::clone(&created)).await;
        assert!(Arc::ptr_eq(&created, &registry.tracker("cart-c").await));

        registry.forget("cart-a").await;
        assert!(!Arc::ptr_eq(&a, &registry.tracker("cart-a").await));
    }

    #[tokio::test]
    async fn test_concurrent_mutations_across_tasks() {
        let registry = CartRegistry::new();
        let sync = registry.tracker("cart").await;

        let slow = sync.begin();
        let fast = sync.begin();

        let fast_task = tokio::spawn(async move { fast.complete(cart(9)) });
        fast_task.await.unwrap();

        let slow_task = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            slow.complete(cart(4))
        });
        let snapshot = slow_task.await.unwrap();

        assert_eq!(snapshot.cart.unwrap().total_quantity, 4);
        assert!(!registry.tracker("cart").await.is_pending());
    }
}
