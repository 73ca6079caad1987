//! In-memory backend for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use artprint_core::{
    LineId, LineItem, Money, OrderId, ProductId, ProductSnapshot, VariantSelection,
};

use crate::api::{AddLineRequest, ApiError, CartApi, CatalogApi, Order, OrderApi, OrderPayload};
use crate::models::CartMode;
use crate::submission::Navigator;

/// A product priced at `price` with `stock` units on hand.
pub fn product(id: &str, price: u64, stock: u32) -> ProductSnapshot {
    ProductSnapshot {
        id: ProductId::new(id),
        name: format!("Print {id}"),
        base_price: Money::from_whole(price),
        special_price: None,
        stock,
        sizes: vec!["A4".to_string(), "A3".to_string()],
        colors: Vec::new(),
        materials: Vec::new(),
    }
}

/// A line as the backend would return it.
pub fn server_line(product_id: &str, quantity: u32, price: u64, stock: u32) -> LineItem {
    LineItem {
        id: LineId::generate(),
        product_id: ProductId::new(product_id),
        name: format!("Print {product_id}"),
        quantity,
        unit_price: Money::from_whole(price),
        stock,
        variant: VariantSelection::default(),
        custom_design: None,
    }
}

/// How the fake answers order creation.
#[derive(Debug, Clone, Default)]
pub enum OrderOutcome {
    #[default]
    Accept,
    Reject {
        status: u16,
        message: Option<String>,
    },
    Unreachable,
}

/// Cloneable fake implementing every backend trait.
#[derive(Clone, Default)]
pub struct FakeBackend {
    inner: Arc<FakeInner>,
}

#[derive(Default)]
struct FakeInner {
    cart: Mutex<Vec<LineItem>>,
    catalog: Mutex<HashMap<ProductId, ProductSnapshot>>,
    fetch_script: Mutex<VecDeque<(Duration, Vec<LineItem>)>>,
    fetch_failures: Mutex<VecDeque<u16>>,
    mutation_delay: Mutex<Duration>,
    fail_clear: Mutex<bool>,
    cart_mutations: AtomicUsize,
    order_outcome: Mutex<OrderOutcome>,
    order_delay: Mutex<Duration>,
    order_calls: AtomicUsize,
    placed: Mutex<Vec<(CartMode, OrderPayload)>>,
    fail_conversions: Mutex<bool>,
    conversions: Mutex<Vec<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_server_cart(&self, items: Vec<LineItem>) {
        *lock(&self.inner.cart) = items;
    }

    pub fn server_cart(&self) -> Vec<LineItem> {
        lock(&self.inner.cart).clone()
    }

    pub fn add_product(&self, product: ProductSnapshot) {
        lock(&self.inner.catalog).insert(product.id.clone(), product);
    }

    /// Answer the next un-scripted fetch after `delay` with `items`.
    pub fn script_fetch(&self, delay: Duration, items: Vec<LineItem>) {
        lock(&self.inner.fetch_script).push_back((delay, items));
    }

    pub fn fail_next_fetch(&self, status: u16) {
        lock(&self.inner.fetch_failures).push_back(status);
    }

    pub fn set_mutation_delay(&self, delay: Duration) {
        *lock(&self.inner.mutation_delay) = delay;
    }

    pub fn fail_clear(&self, fail: bool) {
        *lock(&self.inner.fail_clear) = fail;
    }

    pub fn cart_mutations(&self) -> usize {
        self.inner.cart_mutations.load(Ordering::SeqCst)
    }

    pub fn set_order_outcome(&self, outcome: OrderOutcome) {
        *lock(&self.inner.order_outcome) = outcome;
    }

    pub fn set_order_delay(&self, delay: Duration) {
        *lock(&self.inner.order_delay) = delay;
    }

    pub fn order_calls(&self) -> usize {
        self.inner.order_calls.load(Ordering::SeqCst)
    }

    pub fn placed_orders(&self) -> Vec<(CartMode, OrderPayload)> {
        lock(&self.inner.placed).clone()
    }

    pub fn fail_conversions(&self, fail: bool) {
        *lock(&self.inner.fail_conversions) = fail;
    }

    pub fn conversion_calls(&self) -> Vec<String> {
        lock(&self.inner.conversions).clone()
    }

    async fn mutate(&self, apply: impl FnOnce(&mut Vec<LineItem>)) -> Vec<LineItem> {
        self.inner.cart_mutations.fetch_add(1, Ordering::SeqCst);
        let delay = *lock(&self.inner.mutation_delay);
        let items = {
            let mut cart = lock(&self.inner.cart);
            apply(&mut cart);
            cart.clone()
        };
        tokio::time::sleep(delay).await;
        items
    }
}

impl CartApi for FakeBackend {
    async fn fetch_cart(&self) -> Result<Vec<LineItem>, ApiError> {
        let failure = lock(&self.inner.fetch_failures).pop_front();
        if let Some(status) = failure {
            return Err(ApiError::Api {
                status,
                message: None,
            });
        }

        let scripted = lock(&self.inner.fetch_script).pop_front();
        match scripted {
            Some((delay, items)) => {
                tokio::time::sleep(delay).await;
                Ok(items)
            }
            None => Ok(self.server_cart()),
        }
    }

    async fn add_line(&self, request: &AddLineRequest) -> Result<Vec<LineItem>, ApiError> {
        let product = lock(&self.inner.catalog)
            .get(&request.product_id)
            .cloned()
            .ok_or(ApiError::Api {
                status: 404,
                message: Some("Product not found".to_string()),
            })?;

        Ok(self
            .mutate(|cart| {
                if let Some(line) = cart.iter_mut().find(|line| {
                    line.is_same_selection(
                        &request.product_id,
                        &request.variant,
                        request.custom_design.as_ref(),
                    )
                }) {
                    line.quantity += request.quantity;
                } else {
                    cart.push(LineItem {
                        id: LineId::generate(),
                        product_id: product.id.clone(),
                        name: product.name.clone(),
                        quantity: request.quantity,
                        unit_price: product.unit_price(),
                        stock: product.stock,
                        variant: request.variant.clone().normalized(),
                        custom_design: request.custom_design.clone(),
                    });
                }
            })
            .await)
    }

    async fn update_line(
        &self,
        line_id: &LineId,
        quantity: u32,
    ) -> Result<Vec<LineItem>, ApiError> {
        Ok(self
            .mutate(|cart| {
                if let Some(line) = cart.iter_mut().find(|line| line.id == *line_id) {
                    line.quantity = quantity;
                }
            })
            .await)
    }

    async fn remove_line(&self, line_id: &LineId) -> Result<Vec<LineItem>, ApiError> {
        Ok(self
            .mutate(|cart| cart.retain(|line| line.id != *line_id))
            .await)
    }

    async fn clear_cart(&self) -> Result<(), ApiError> {
        if *lock(&self.inner.fail_clear) {
            return Err(ApiError::Api {
                status: 500,
                message: None,
            });
        }
        lock(&self.inner.cart).clear();
        Ok(())
    }
}

impl OrderApi for FakeBackend {
    async fn create_order(
        &self,
        mode: CartMode,
        payload: &OrderPayload,
    ) -> Result<Order, ApiError> {
        let call = self.inner.order_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = *lock(&self.inner.order_delay);
        tokio::time::sleep(delay).await;

        let outcome = lock(&self.inner.order_outcome).clone();
        match outcome {
            OrderOutcome::Accept => {
                lock(&self.inner.placed).push((mode, payload.clone()));
                let body = serde_json::json!({ "_id": format!("order-{call}") });
                Ok(serde_json::from_value(body)?)
            }
            OrderOutcome::Reject { status, message } => Err(ApiError::Api { status, message }),
            OrderOutcome::Unreachable => {
                Err(ApiError::InvalidResponse("connection reset".to_string()))
            }
        }
    }

    async fn record_conversion(&self, slug: &str) -> Result<(), ApiError> {
        lock(&self.inner.conversions).push(slug.to_string());
        if *lock(&self.inner.fail_conversions) {
            return Err(ApiError::Api {
                status: 404,
                message: Some("Landing page not found".to_string()),
            });
        }
        Ok(())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        Ok(Vec::new())
    }

    async fn get_order(&self, order_id: &OrderId) -> Result<Order, ApiError> {
        Ok(serde_json::from_value(serde_json::json!({ "_id": order_id }))?)
    }
}

impl CatalogApi for FakeBackend {
    async fn get_product(&self, product_id: &ProductId) -> Result<ProductSnapshot, ApiError> {
        lock(&self.inner.catalog)
            .get(product_id)
            .cloned()
            .ok_or(ApiError::Api {
                status: 404,
                message: Some("Product not found".to_string()),
            })
    }
}

/// Navigator that records where it was sent.
#[derive(Clone, Default)]
pub struct RecordingNavigator {
    visited: Arc<Mutex<Vec<OrderId>>>,
}

impl RecordingNavigator {
    pub fn visited(&self) -> Vec<OrderId> {
        lock(&self.visited).clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate_to_order(&self, order_id: &OrderId) {
        lock(&self.visited).push(order_id.clone());
    }
}
