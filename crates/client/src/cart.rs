//! Cart synchronization cache.
//!
//! # Architecture
//!
//! The [`CartCache`] keeps a local mirror of the server-side cart for the
//! current session. It never merges locally: every mutation is
//! **write-then-refetch** - the mutation call goes out, and on success the
//! whole cart is fetched again so the mirror always reflects server truth at
//! the cost of an extra round trip. On mutation failure nothing is refetched
//! and the prior state is retained unchanged.
//!
//! The mirror is keyed to the session: a transition to `Authenticated`
//! triggers a full fetch, a transition to `Unauthenticated` clears the mirror
//! without any network call. In-flight fetches carry the session generation
//! they were issued under; if the counter moved while the fetch was
//! suspended, the response is discarded and reconciliation restarts against
//! the new session state, so a dead session's cart can never leak into the
//! current one.
//!
//! Two mutations issued back-to-back may race: their refetches can land out
//! of order, and the visible state after a burst reflects the last-settling
//! refetch, not necessarily the last-issued mutation. That trade-off is part
//! of the contract.

use std::sync::{Arc, RwLock};

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use bazaar_core::ProductId;

use crate::api::{ApiClient, ApiError, CartItem};
use crate::session::{SessionManager, SessionState};

/// Errors surfaced by cart mutations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Mutation attempted without an authenticated session. Reported
    /// synchronously; no network call is made.
    #[error("authentication required")]
    AuthenticationRequired,

    /// The underlying API call failed.
    #[error("api error: {0}")]
    Api(#[from] ApiError),
}

/// Lifecycle phase of the cart mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartStatus {
    /// No session, or the mirror was cleared. Distinct from a fetched cart
    /// that happens to contain nothing (`Ready` with zero items).
    Empty,
    /// A fetch is in flight.
    Loading,
    /// The mirror reflects the last successful fetch.
    Ready,
    /// The last fetch failed; items were cleared and the error recorded.
    Error,
}

/// The cart mirror: items plus the status that qualifies them.
#[derive(Debug, Clone, PartialEq)]
pub struct CartState {
    pub status: CartStatus,
    pub items: Vec<CartItem>,
    /// Message of the last failed fetch, present only in `Error`.
    pub error: Option<String>,
}

impl CartState {
    /// The cleared state used while unauthenticated.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            status: CartStatus::Empty,
            items: Vec::new(),
            error: None,
        }
    }

    /// Sum of price x quantity over the mirrored items.
    ///
    /// Only a `Ready` mirror has a meaningful total; every other status
    /// yields zero. Recomputed on every call, never stored.
    #[must_use]
    pub fn total(&self) -> Decimal {
        if self.status != CartStatus::Ready {
            return Decimal::ZERO;
        }
        self.items.iter().map(CartItem::line_total).sum()
    }
}

// =============================================================================
// CartCache
// =============================================================================

/// Local mirror of the server-side cart for the current session.
///
/// Cheaply cloneable; all clones share one mirror.
#[derive(Clone)]
pub struct CartCache {
    inner: Arc<CartCacheInner>,
}

struct CartCacheInner {
    api: ApiClient,
    session: SessionManager,
    state: RwLock<CartState>,
}

impl CartCache {
    /// Create a cart cache bound to a session manager.
    ///
    /// The mirror starts `Empty`; call [`sync`](Self::sync) (or spawn
    /// [`run`](Self::run)) to reconcile it with the session.
    #[must_use]
    pub fn new(api: ApiClient, session: SessionManager) -> Self {
        Self {
            inner: Arc::new(CartCacheInner {
                api,
                session,
                state: RwLock::new(CartState::empty()),
            }),
        }
    }

    /// A copy of the current mirror.
    #[must_use]
    pub fn state(&self) -> CartState {
        self.inner
            .state
            .read()
            .map_or_else(|_| CartState::empty(), |guard| guard.clone())
    }

    /// The mirrored items.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.state().items
    }

    /// The mirror's lifecycle status.
    #[must_use]
    pub fn status(&self) -> CartStatus {
        self.state().status
    }

    /// Sum of price x quantity over the current `Ready` items; zero for any
    /// other status.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.state().total()
    }

    /// Message of the last failed fetch, if the mirror is in `Error`.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state().error
    }

    fn replace(&self, state: CartState) {
        if let Ok(mut guard) = self.inner.state.write() {
            *guard = state;
        }
    }

    fn mark_loading(&self) {
        if let Ok(mut guard) = self.inner.state.write() {
            guard.status = CartStatus::Loading;
        }
    }

    // =========================================================================
    // Synchronization
    // =========================================================================

    /// Reconcile the mirror with the current session state.
    ///
    /// Authenticated: fetch the cart (`Loading` until the response settles,
    /// then `Ready` or `Error`). Anything else: clear to `Empty` with no
    /// network call. A fetch whose session generation went stale is
    /// discarded and reconciliation restarts.
    #[instrument(skip(self))]
    pub async fn sync(&self) {
        loop {
            let snapshot = self.inner.session.snapshot();
            let session = match &snapshot.state {
                SessionState::Authenticated(session) => session.clone(),
                _ => {
                    self.replace(CartState::empty());
                    return;
                }
            };

            self.mark_loading();
            let result = self.inner.api.fetch_cart(&session.token).await;

            if self.inner.session.generation() != snapshot.generation {
                debug!("Discarding stale cart fetch");
                continue;
            }

            match result {
                Ok(items) => {
                    debug!(count = items.len(), "Cart fetched");
                    self.replace(CartState {
                        status: CartStatus::Ready,
                        items,
                        error: None,
                    });
                }
                Err(e) => {
                    warn!(error = %e, "Cart fetch failed");
                    self.replace(CartState {
                        status: CartStatus::Error,
                        items: Vec::new(),
                        error: Some(e.to_string()),
                    });
                }
            }
            return;
        }
    }

    /// Drive the mirror from session transitions.
    ///
    /// Reconciles once immediately, then again after every generation bump.
    /// Runs until the driving task is dropped; spawn it alongside the UI
    /// loop. Tests that want determinism call [`sync`](Self::sync) directly
    /// instead.
    pub async fn run(&self) {
        let mut rx = self.inner.session.subscribe();
        let mut seen = rx.borrow_and_update().generation;
        self.sync().await;

        loop {
            if rx.changed().await.is_err() {
                return;
            }
            let generation = rx.borrow_and_update().generation;
            if generation == seen {
                // Identity replacement without a credential change; the
                // mirror is still keyed to the same cart.
                continue;
            }
            seen = generation;
            self.sync().await;
        }
    }

    // =========================================================================
    // Mutations (write-then-refetch)
    // =========================================================================

    /// Add a product to the cart.
    ///
    /// # Errors
    ///
    /// `CartError::AuthenticationRequired` without a network call when there
    /// is no session; `CartError::Api` when the server rejects the mutation,
    /// in which case the mirror is left exactly as it was.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add(&self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
        let snapshot = self.inner.session.snapshot();
        let SessionState::Authenticated(session) = snapshot.state else {
            return Err(CartError::AuthenticationRequired);
        };

        self.inner
            .api
            .add_cart_item(&session.token, product_id, quantity)
            .await?;
        self.sync().await;
        Ok(())
    }

    /// Set the quantity of a product already in the cart.
    ///
    /// # Errors
    ///
    /// Same contract as [`add`](Self::add).
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update(&self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
        let snapshot = self.inner.session.snapshot();
        let SessionState::Authenticated(session) = snapshot.state else {
            return Err(CartError::AuthenticationRequired);
        };

        self.inner
            .api
            .update_cart_item(&session.token, product_id, quantity)
            .await?;
        self.sync().await;
        Ok(())
    }

    /// Remove a product from the cart.
    ///
    /// # Errors
    ///
    /// Same contract as [`add`](Self::add).
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: ProductId) -> Result<(), CartError> {
        let snapshot = self.inner.session.snapshot();
        let SessionState::Authenticated(session) = snapshot.state else {
            return Err(CartError::AuthenticationRequired);
        };

        self.inner
            .api
            .remove_cart_item(&session.token, product_id)
            .await?;
        self.sync().await;
        Ok(())
    }

    /// Remove every item from the cart.
    ///
    /// On success the refetch lands on `Ready` with zero items - the cart
    /// was observed from the server, it is not the unauthenticated `Empty`.
    ///
    /// # Errors
    ///
    /// Same contract as [`add`](Self::add).
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), CartError> {
        let snapshot = self.inner.session.snapshot();
        let SessionState::Authenticated(session) = snapshot.state else {
            return Err(CartError::AuthenticationRequired);
        };

        self.inner.api.clear_cart(&session.token).await?;
        self.sync().await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bazaar_core::CartItemId;

    fn item(price: u32, quantity: u32) -> CartItem {
        CartItem {
            id: CartItemId::random(),
            product_id: ProductId::random(),
            product_name: format!("item @ {price}"),
            quantity,
            price: Decimal::from(price),
            image_url: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_total_sums_price_times_quantity() {
        let state = CartState {
            status: CartStatus::Ready,
            items: vec![item(10, 2), item(5, 3)],
            error: None,
        };
        assert_eq!(state.total(), Decimal::from(35));
    }

    #[test]
    fn test_total_is_zero_unless_ready() {
        for status in [CartStatus::Empty, CartStatus::Loading, CartStatus::Error] {
            let state = CartState {
                status,
                items: vec![item(10, 2)],
                error: None,
            };
            assert_eq!(state.total(), Decimal::ZERO);
        }
    }

    #[test]
    fn test_ready_with_no_items_totals_zero() {
        let state = CartState {
            status: CartStatus::Ready,
            items: Vec::new(),
            error: None,
        };
        assert_eq!(state.total(), Decimal::ZERO);
    }

    #[test]
    fn test_empty_state_has_no_items_or_error() {
        let state = CartState::empty();
        assert_eq!(state.status, CartStatus::Empty);
        assert!(state.items.is_empty());
        assert!(state.error.is_none());
    }
}
