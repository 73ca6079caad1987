//! Server-synced cart for signed-in buyers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, instrument, warn};

use artprint_core::{CustomDesign, LineId, LineItem, ProductSnapshot, VariantSelection};

use super::{
    CartError, CartStatus, CartStore, ensure_quantity, ensure_stock_for_add,
    ensure_stock_for_update,
};
use crate::api::{AddLineRequest, ApiError, CartApi};
use crate::models::CartMode;

/// Cart whose source of truth is the backend.
///
/// Local state is a cache of the last server answer. Every view that shows
/// the cart holds a clone and calls [`CartStore::fetch`] when it appears;
/// clones share state, and the most recently started fetch wins.
#[derive(Debug, Clone)]
pub struct AuthenticatedCart<A> {
    api: A,
    state: Arc<Mutex<CartState>>,
}

#[derive(Debug, Default)]
struct CartState {
    status: CartStatus,
    items: Vec<LineItem>,
    /// Bumped by every fetch and clear. Responses tagged with an older
    /// generation are stale and dropped.
    generation: u64,
}

impl<A: CartApi> AuthenticatedCart<A> {
    /// A cart that has not been fetched yet.
    #[must_use]
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(CartState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot items for a mutation, failing unless the cart is `Ready`.
    fn begin_mutation(&self) -> Result<(u64, Vec<LineItem>), CartError> {
        let state = self.state();
        if state.status != CartStatus::Ready {
            return Err(CartError::NotReady(state.status));
        }
        Ok((state.generation, state.items.clone()))
    }

    /// Store a mutation's server answer unless a fetch or clear started
    /// while it was in flight.
    fn apply_mutation(&self, generation: u64, items: Vec<LineItem>) {
        let mut state = self.state();
        if state.generation == generation {
            state.items = items;
        } else {
            debug!(
                started = generation,
                current = state.generation,
                "Discarding cart mutation superseded by a newer fetch"
            );
        }
    }
}

impl<A: CartApi> CartStore for AuthenticatedCart<A> {
    fn mode(&self) -> CartMode {
        CartMode::Authenticated
    }

    fn status(&self) -> CartStatus {
        self.state().status
    }

    fn items(&self) -> Vec<LineItem> {
        self.state().items.clone()
    }

    #[instrument(skip(self, product, variant, custom_design), fields(product_id = %product.id))]
    async fn add_item(
        &self,
        product: &ProductSnapshot,
        quantity: u32,
        variant: VariantSelection,
        custom_design: Option<CustomDesign>,
    ) -> Result<LineId, CartError> {
        ensure_quantity(quantity)?;
        let (generation, items) = self.begin_mutation()?;
        ensure_stock_for_add(&items, product, quantity)?;

        let request = AddLineRequest {
            product_id: product.id.clone(),
            quantity,
            variant: variant.normalized(),
            custom_design,
        };
        let updated = self.api.add_line(&request).await?;

        let line_id = updated
            .iter()
            .find(|line| {
                line.is_same_selection(
                    &request.product_id,
                    &request.variant,
                    request.custom_design.as_ref(),
                )
            })
            .map(|line| line.id.clone())
            .ok_or_else(|| {
                ApiError::InvalidResponse(format!(
                    "cart response has no line for product {}",
                    request.product_id
                ))
            })?;

        self.apply_mutation(generation, updated);
        Ok(line_id)
    }

    #[instrument(skip(self), fields(line_id = %line_id))]
    async fn update_quantity(&self, line_id: &LineId, quantity: u32) -> Result<(), CartError> {
        ensure_quantity(quantity)?;
        let (generation, items) = self.begin_mutation()?;
        ensure_stock_for_update(&items, line_id, quantity)?;

        let updated = self.api.update_line(line_id, quantity).await?;
        self.apply_mutation(generation, updated);
        Ok(())
    }

    #[instrument(skip(self), fields(line_id = %line_id))]
    async fn remove_item(&self, line_id: &LineId) -> Result<(), CartError> {
        let (generation, items) = self.begin_mutation()?;
        if !items.iter().any(|line| line.id == *line_id) {
            return Err(CartError::LineNotFound(line_id.clone()));
        }

        let updated = self.api.remove_line(line_id).await?;
        self.apply_mutation(generation, updated);
        Ok(())
    }

    /// Empty the cart locally, then on the server.
    ///
    /// Allowed in any status. Local state is emptied even when the server
    /// call fails; the error is still returned.
    #[instrument(skip(self))]
    async fn clear(&self) -> Result<(), CartError> {
        {
            let mut state = self.state();
            state.generation += 1;
            state.items.clear();
            state.status = CartStatus::Ready;
        }

        self.api.clear_cart().await.map_err(|e| {
            warn!(error = %e, "Server-side cart clear failed");
            CartError::from(e)
        })
    }

    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<(), CartError> {
        let generation = {
            let mut state = self.state();
            state.generation += 1;
            state.status = CartStatus::Loading;
            state.generation
        };

        let result = self.api.fetch_cart().await;

        let mut state = self.state();
        if state.generation != generation {
            debug!(
                started = generation,
                current = state.generation,
                "Discarding stale cart fetch"
            );
            return result.map(|_| ()).map_err(CartError::from);
        }

        match result {
            Ok(items) => {
                debug!(lines = items.len(), "Cart fetched");
                state.items = items;
                state.status = CartStatus::Ready;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Cart fetch failed");
                state.status = CartStatus::Error;
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use artprint_core::Money;

    use super::*;
    use crate::testing::{FakeBackend, product, server_line};

    #[tokio::test]
    async fn test_mutations_require_fetch() {
        let backend = FakeBackend::new();
        let cart = AuthenticatedCart::new(backend.clone());
        let poster = product("P1", 500, 5);

        assert_eq!(cart.status(), CartStatus::Idle);
        let err = cart
            .add_item(&poster, 1, VariantSelection::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::NotReady(CartStatus::Idle)));
        assert_eq!(backend.cart_mutations(), 0);
    }

    #[tokio::test]
    async fn test_fetch_loads_server_cart() {
        let backend = FakeBackend::new();
        backend.set_server_cart(vec![server_line("P1", 2, 500, 5)]);
        let cart = AuthenticatedCart::new(backend.clone());

        cart.fetch().await.unwrap();

        assert_eq!(cart.status(), CartStatus::Ready);
        assert_eq!(cart.subtotal(), Money::from_whole(1000));
        assert_eq!(cart.mode(), CartMode::Authenticated);

        cart.fetch().await.unwrap();
        assert_eq!(cart.items().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_sets_error_and_can_retry() {
        let backend = FakeBackend::new();
        backend.fail_next_fetch(500);
        let cart = AuthenticatedCart::new(backend.clone());

        assert!(cart.fetch().await.is_err());
        assert_eq!(cart.status(), CartStatus::Error);

        cart.fetch().await.unwrap();
        assert_eq!(cart.status(), CartStatus::Ready);
    }

    #[tokio::test]
    async fn test_add_round_trips_and_returns_server_line_id() {
        let backend = FakeBackend::new();
        let poster = product("P1", 500, 5);
        backend.add_product(poster.clone());
        let cart = AuthenticatedCart::new(backend.clone());
        cart.fetch().await.unwrap();

        let line_id = cart
            .add_item(&poster, 2, VariantSelection::default(), None)
            .await
            .unwrap();

        assert_eq!(cart.items()[0].id, line_id);
        assert_eq!(backend.server_cart()[0].quantity, 2);
        assert_eq!(cart.subtotal(), Money::from_whole(1000));
    }

    #[tokio::test]
    async fn test_add_with_blank_variant_finds_echoed_line() {
        let backend = FakeBackend::new();
        let poster = product("P1", 500, 5);
        backend.add_product(poster.clone());
        let cart = AuthenticatedCart::new(backend.clone());
        cart.fetch().await.unwrap();

        let blank_size = VariantSelection {
            size: Some(String::new()),
            color: Some("Black".to_string()),
            material: None,
        };
        let line_id = cart.add_item(&poster, 1, blank_size, None).await.unwrap();

        let items = cart.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, line_id);
        assert_eq!(items[0].variant.size, None);
        assert_eq!(items[0].variant.color.as_deref(), Some("Black"));
    }

    #[tokio::test]
    async fn test_stock_guard_runs_before_network() {
        let backend = FakeBackend::new();
        backend.set_server_cart(vec![server_line("P1", 4, 500, 5)]);
        let cart = AuthenticatedCart::new(backend.clone());
        cart.fetch().await.unwrap();

        let line_id = cart.items()[0].id.clone();
        assert!(matches!(
            cart.update_quantity(&line_id, 6).await,
            Err(CartError::OutOfStock { .. })
        ));
        assert!(matches!(
            cart.update_quantity(&line_id, 0).await,
            Err(CartError::InvalidQuantity { .. })
        ));
        assert_eq!(backend.cart_mutations(), 0);

        cart.update_quantity(&line_id, 5).await.unwrap();
        assert_eq!(cart.item_count(), 5);

        cart.remove_item(&line_id).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(backend.cart_mutations(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_started_fetch_wins() {
        let backend = FakeBackend::new();
        let cart = AuthenticatedCart::new(backend.clone());

        backend.script_fetch(Duration::from_millis(200), vec![server_line("OLD", 1, 100, 5)]);
        backend.script_fetch(Duration::from_millis(10), vec![server_line("NEW", 1, 100, 5)]);

        let view = cart.clone();
        let (first, second) = tokio::join!(cart.fetch(), async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            view.fetch().await
        });
        first.unwrap();
        second.unwrap();

        let items = cart.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id.as_str(), "NEW");
        assert_eq!(cart.status(), CartStatus::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutation_result_dropped_when_fetch_started() {
        let backend = FakeBackend::new();
        let poster = product("P1", 500, 5);
        backend.add_product(poster.clone());
        let cart = AuthenticatedCart::new(backend.clone());
        cart.fetch().await.unwrap();

        backend.set_mutation_delay(Duration::from_millis(100));
        backend.script_fetch(Duration::from_millis(200), Vec::new());

        let view = cart.clone();
        let (added, fetched) = tokio::join!(
            cart.add_item(&poster, 1, VariantSelection::default(), None),
            async {
                tokio::time::sleep(Duration::from_millis(1)).await;
                view.fetch().await
            }
        );
        added.unwrap();
        fetched.unwrap();

        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_clear_empties_even_when_server_fails() {
        let backend = FakeBackend::new();
        backend.set_server_cart(vec![server_line("P1", 1, 500, 5)]);
        let cart = AuthenticatedCart::new(backend.clone());
        cart.fetch().await.unwrap();

        backend.fail_clear(true);
        assert!(cart.clear().await.is_err());
        assert!(cart.is_empty());
        assert_eq!(cart.status(), CartStatus::Ready);

        backend.fail_clear(false);
        cart.clear().await.unwrap();
        assert!(backend.server_cart().is_empty());
    }
}
