//! Integration test harness for the Artprint checkout engine.
//!
//! [`MockBackend`] serves the storefront REST API from memory on an
//! ephemeral local port, so tests drive the real `reqwest` client end to
//! end without an external server.
//!
//! # Example
//!
//! ```rust,ignore
//! let backend = MockBackend::start().await;
//! backend.add_product("P1", "Poster", 500.0, 5);
//!
//! let state = backend.storefront(false);
//! let product = state.client().get_product(&"P1".into()).await?;
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};

use artprint_core::OrderId;
use artprint_storefront::config::{ApiConfig, StorefrontConfig};
use artprint_storefront::models::{CurrentUser, Session};
use artprint_storefront::{Navigator, StorefrontState};

/// Bearer token the mock accepts for the signed-in buyer.
pub const BUYER_TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.buyer.sig";

// =============================================================================
// Recorded state
// =============================================================================

/// A request the mock received for order creation.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    /// `orders` or `orders/guest`
    pub path: String,
    pub authorized: bool,
    pub body: Value,
}

#[derive(Debug, Clone)]
struct CartLine {
    id: String,
    product_id: String,
    quantity: u64,
    size: Option<String>,
    color: Option<String>,
    material: Option<String>,
    custom_design: Option<Value>,
}

#[derive(Default)]
struct Store {
    products: HashMap<String, Value>,
    cart: Vec<CartLine>,
    next_id: u64,
    orders: Vec<Value>,
    order_requests: Vec<OrderRequest>,
    order_rejection: Option<(StatusCode, Option<String>)>,
    order_delay: Duration,
    conversions: Vec<String>,
    fail_conversions: bool,
    cart_clears: usize,
    product_requests: usize,
}

impl Store {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{:04}", self.next_id)
    }

    fn cart_json(&self) -> Value {
        let items: Vec<Value> = self
            .cart
            .iter()
            .map(|line| {
                json!({
                    "_id": line.id,
                    "product": self.products.get(&line.product_id).cloned().unwrap_or(Value::Null),
                    "quantity": line.quantity,
                    "size": line.size,
                    "color": line.color,
                    "material": line.material,
                    "customDesign": line.custom_design,
                })
            })
            .collect();
        json!({ "items": items })
    }

    fn unit_price(&self, product_id: &str) -> f64 {
        let Some(product) = self.products.get(product_id) else {
            return 0.0;
        };
        product["specialPrice"]
            .as_f64()
            .filter(|price| *price > 0.0)
            .or_else(|| product["basePrice"].as_f64())
            .unwrap_or(0.0)
    }
}

#[derive(Clone, Default)]
struct MockState {
    store: Arc<Mutex<Store>>,
}

impl MockState {
    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// Handlers
// =============================================================================

fn data(status: StatusCode, value: Value) -> Response {
    (status, Json(json!({ "data": value }))).into_response()
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn is_authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {BUYER_TOKEN}"))
}

async fn get_product(State(state): State<MockState>, Path(id): Path<String>) -> Response {
    let mut store = state.lock();
    store.product_requests += 1;
    match store.products.get(&id) {
        Some(product) => data(StatusCode::OK, product.clone()),
        None => error(StatusCode::NOT_FOUND, "Product not found"),
    }
}

async fn get_cart(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if !is_authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Not authorized");
    }
    data(StatusCode::OK, state.lock().cart_json())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddLine {
    product_id: String,
    quantity: u64,
    size: Option<String>,
    color: Option<String>,
    material: Option<String>,
    custom_design: Option<Value>,
}

async fn add_line(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<AddLine>,
) -> Response {
    if !is_authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Not authorized");
    }
    let mut store = state.lock();
    if !store.products.contains_key(&body.product_id) {
        return error(StatusCode::NOT_FOUND, "Product not found");
    }

    let existing = store.cart.iter_mut().find(|line| {
        line.product_id == body.product_id
            && line.size == body.size
            && line.color == body.color
            && line.material == body.material
            && line.custom_design == body.custom_design
    });
    if let Some(line) = existing {
        line.quantity += body.quantity;
    } else {
        let id = store.next_id("line-");
        store.cart.push(CartLine {
            id,
            product_id: body.product_id,
            quantity: body.quantity,
            size: body.size,
            color: body.color,
            material: body.material,
            custom_design: body.custom_design,
        });
    }
    data(StatusCode::OK, store.cart_json())
}

#[derive(Deserialize)]
struct UpdateLine {
    quantity: u64,
}

async fn update_line(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(line_id): Path<String>,
    Json(body): Json<UpdateLine>,
) -> Response {
    if !is_authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Not authorized");
    }
    let mut store = state.lock();
    let Some(line) = store.cart.iter_mut().find(|line| line.id == line_id) else {
        return error(StatusCode::NOT_FOUND, "Cart item not found");
    };
    line.quantity = body.quantity;
    data(StatusCode::OK, store.cart_json())
}

async fn remove_line(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(line_id): Path<String>,
) -> Response {
    if !is_authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Not authorized");
    }
    let mut store = state.lock();
    store.cart.retain(|line| line.id != line_id);
    data(StatusCode::OK, store.cart_json())
}

async fn clear_cart(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if !is_authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Not authorized");
    }
    let mut store = state.lock();
    store.cart.clear();
    store.cart_clears += 1;
    (StatusCode::OK, Json(json!({ "message": "Cart cleared" }))).into_response()
}

async fn create_order(state: MockState, path: &str, authorized: bool, body: Value) -> Response {
    let delay = {
        let mut store = state.lock();
        store.order_requests.push(OrderRequest {
            path: path.to_string(),
            authorized,
            body: body.clone(),
        });
        store.order_delay
    };
    tokio::time::sleep(delay).await;

    let mut store = state.lock();
    if let Some((status, message)) = store.order_rejection.clone() {
        return match message {
            Some(message) => error(status, &message),
            None => status.into_response(),
        };
    }

    let items = body["items"].as_array().cloned().unwrap_or_default();
    let subtotal: f64 = items
        .iter()
        .map(|item| {
            let product_id = item["product"].as_str().unwrap_or_default();
            #[allow(clippy::cast_precision_loss)]
            let quantity = item["quantity"].as_u64().unwrap_or(0) as f64;
            store.unit_price(product_id) * quantity
        })
        .sum();
    let delivery_charge = body["deliveryCharge"].as_f64().unwrap_or(0.0);

    let id = store.next_id("order-");
    let order = json!({
        "_id": id,
        "items": items,
        "shippingAddress": body["shippingAddress"],
        "deliveryCharge": delivery_charge,
        "totalAmount": subtotal + delivery_charge,
        "paymentMethod": body["paymentMethod"],
        "status": "pending",
        "createdAt": "2024-03-01T10:00:00Z",
    });
    store.orders.push(order.clone());
    data(StatusCode::CREATED, order)
}

async fn create_user_order(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !is_authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Not authorized");
    }
    create_order(state, "orders", true, body).await
}

async fn create_guest_order(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    create_order(state, "orders/guest", is_authorized(&headers), body).await
}

async fn list_orders(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if !is_authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Not authorized");
    }
    data(StatusCode::OK, Value::Array(state.lock().orders.clone()))
}

async fn get_order(State(state): State<MockState>, Path(id): Path<String>) -> Response {
    let store = state.lock();
    match store.orders.iter().find(|order| order["_id"] == id.as_str()) {
        Some(order) => data(StatusCode::OK, order.clone()),
        None => error(StatusCode::NOT_FOUND, "Order not found"),
    }
}

async fn record_conversion(State(state): State<MockState>, Path(slug): Path<String>) -> Response {
    let mut store = state.lock();
    store.conversions.push(slug);
    if store.fail_conversions {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Tracking unavailable");
    }
    data(StatusCode::OK, json!({ "recorded": true }))
}

fn router(state: MockState) -> Router {
    Router::new()
        .route("/api/products/{id}", get(get_product))
        .route(
            "/api/cart",
            get(get_cart).post(add_line).delete(clear_cart),
        )
        .route("/api/cart/{line_id}", put(update_line).delete(remove_line))
        .route("/api/orders", get(list_orders).post(create_user_order))
        .route("/api/orders/guest", post(create_guest_order))
        .route("/api/orders/{id}", get(get_order))
        .route(
            "/api/landing-pages/{slug}/conversion",
            post(record_conversion),
        )
        .with_state(state)
}

// =============================================================================
// MockBackend
// =============================================================================

/// Storefront backend served from memory on `127.0.0.1`.
pub struct MockBackend {
    /// API base URL, e.g. `http://127.0.0.1:41234/api`
    pub base_url: String,
    state: MockState,
}

impl MockBackend {
    /// Bind an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener can't be bound.
    pub async fn start() -> Self {
        let state = MockState::default();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener
            .local_addr()
            .expect("Failed to read mock backend address");

        let app = router(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}/api"),
            state,
        }
    }

    /// Engine state pointed at this backend, signed in when `signed_in`.
    ///
    /// # Panics
    ///
    /// Panics if the configuration or client can't be built.
    #[must_use]
    pub fn storefront(&self, signed_in: bool) -> StorefrontState {
        let session = signed_in.then(|| {
            Session::new(
                CurrentUser {
                    id: "buyer-1".into(),
                    name: Some("Rahim Uddin".to_string()),
                },
                SecretString::from(BUYER_TOKEN),
            )
        });

        StorefrontState::new(StorefrontConfig {
            api: ApiConfig::new(&self.base_url).expect("Invalid mock base URL"),
            session,
            navigation_delay: Duration::ZERO,
            sentry_dsn: None,
            sentry_environment: None,
        })
        .expect("Failed to build storefront state")
    }

    /// Add a catalog product.
    pub fn add_product(&self, id: &str, name: &str, price: f64, stock: u32) {
        self.state.lock().products.insert(
            id.to_string(),
            json!({
                "_id": id,
                "name": name,
                "basePrice": price,
                "stock": stock,
                "sizes": ["A4", "A3"],
            }),
        );
    }

    /// Make order creation fail with `status` and an optional `{message}`.
    pub fn reject_orders(&self, status: u16, message: Option<&str>) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST);
        self.state.lock().order_rejection = Some((status, message.map(String::from)));
    }

    /// Accept orders again.
    pub fn accept_orders(&self) {
        self.state.lock().order_rejection = None;
    }

    /// Hold each order-creation response for `delay`.
    pub fn delay_orders(&self, delay: Duration) {
        self.state.lock().order_delay = delay;
    }

    /// Make conversion tracking answer 500.
    pub fn fail_conversions(&self) {
        self.state.lock().fail_conversions = true;
    }

    /// Order-creation requests received so far.
    #[must_use]
    pub fn order_requests(&self) -> Vec<OrderRequest> {
        self.state.lock().order_requests.clone()
    }

    /// Landing-page slugs conversions were recorded for.
    #[must_use]
    pub fn conversions(&self) -> Vec<String> {
        self.state.lock().conversions.clone()
    }

    /// Quantities in the server cart, by product ID.
    #[must_use]
    pub fn server_cart(&self) -> Vec<(String, u64)> {
        self.state
            .lock()
            .cart
            .iter()
            .map(|line| (line.product_id.clone(), line.quantity))
            .collect()
    }

    /// Product lookups that reached the backend.
    #[must_use]
    pub fn product_requests(&self) -> usize {
        self.state.lock().product_requests
    }

    /// Times the server cart was cleared.
    #[must_use]
    pub fn cart_clears(&self) -> usize {
        self.state.lock().cart_clears
    }
}

/// Navigator that records the order IDs it was sent to.
#[derive(Clone, Default)]
pub struct RecordingNavigator {
    visited: Arc<Mutex<Vec<OrderId>>>,
}

impl RecordingNavigator {
    /// Order IDs navigated to, in order.
    #[must_use]
    pub fn visited(&self) -> Vec<OrderId> {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate_to_order(&self, order_id: &OrderId) {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(order_id.clone());
    }
}
