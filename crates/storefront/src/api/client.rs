//! `reqwest` implementation of the backend API traits.
//!
//! Product snapshots are cached with `moka` (TTL from configuration).

use std::sync::Arc;

use moka::future::Cache;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use artprint_core::{LineId, LineItem, OrderId, ProductId, ProductSnapshot};

use super::types::{
    AddLineRequest, ApiResponse, ErrorBody, Order, OrderPayload, ServerCart, UpdateLineRequest,
};
use super::{ApiError, CartApi, CatalogApi, OrderApi};
use crate::config::ApiConfig;
use crate::models::{CartMode, Session};

/// How much of an unexpected response body is logged.
const LOGGED_BODY_CHARS: usize = 500;

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront backend.
///
/// Cheap to clone; clones share the HTTP connection pool and product cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    session: Option<Session>,
    products: Cache<ProductId, ProductSnapshot>,
}

impl ApiClient {
    /// Create an anonymous client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let products = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.product_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                session: None,
                products,
            }),
        })
    }

    /// A client that authenticates as `session`, sharing this client's
    /// connection pool and product cache.
    #[must_use]
    pub fn with_session(&self, session: Session) -> Self {
        Self {
            inner: Arc::new(ApiClientInner {
                client: self.inner.client.clone(),
                base_url: self.inner.base_url.clone(),
                session: Some(session),
                products: self.inner.products.clone(),
            }),
        }
    }

    /// The session requests are sent as, if any.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.inner.session.as_ref()
    }

    /// Resolve path segments against the base URL, percent-encoding each.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Start a request, attaching the bearer token when signed in.
    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(segments)?;
        let mut request = self.inner.client.request(method, url);
        if let Some(session) = &self.inner.session {
            request = request.header(AUTHORIZATION, session.bearer());
        }
        Ok(request)
    }

    /// Send a request and unwrap the `{data}` envelope.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let body = Self::send(request).await?;

        serde_json::from_str::<ApiResponse<T>>(&body)
            .map(|envelope| envelope.data)
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    body = %body.chars().take(LOGGED_BODY_CHARS).collect::<String>(),
                    "Failed to parse backend response"
                );
                ApiError::Parse(e)
            })
    }

    /// Send a request whose response body is irrelevant.
    async fn execute_unit(&self, request: RequestBuilder) -> Result<(), ApiError> {
        Self::send(request).await.map(|_| ())
    }

    /// Send a request, mapping non-success statuses to [`ApiError::Api`].
    async fn send(request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|e| e.message);
            tracing::warn!(
                status = %status,
                message = message.as_deref().unwrap_or(""),
                "Backend returned non-success status"
            );
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }
}

// =============================================================================
// Cart
// =============================================================================

impl CartApi for ApiClient {
    #[instrument(skip(self))]
    async fn fetch_cart(&self) -> Result<Vec<LineItem>, ApiError> {
        let cart: Option<ServerCart> = self.execute(self.request(Method::GET, &["cart"])?).await?;
        Ok(cart.unwrap_or_default().into_items())
    }

    #[instrument(
        skip(self, request),
        fields(product_id = %request.product_id, quantity = request.quantity)
    )]
    async fn add_line(&self, request: &AddLineRequest) -> Result<Vec<LineItem>, ApiError> {
        let builder = self.request(Method::POST, &["cart"])?.json(request);
        let cart: ServerCart = self.execute(builder).await?;
        Ok(cart.into_items())
    }

    #[instrument(skip(self), fields(line_id = %line_id))]
    async fn update_line(
        &self,
        line_id: &LineId,
        quantity: u32,
    ) -> Result<Vec<LineItem>, ApiError> {
        let builder = self
            .request(Method::PUT, &["cart", line_id.as_str()])?
            .json(&UpdateLineRequest { quantity });
        let cart: ServerCart = self.execute(builder).await?;
        Ok(cart.into_items())
    }

    #[instrument(skip(self), fields(line_id = %line_id))]
    async fn remove_line(&self, line_id: &LineId) -> Result<Vec<LineItem>, ApiError> {
        let builder = self.request(Method::DELETE, &["cart", line_id.as_str()])?;
        let cart: ServerCart = self.execute(builder).await?;
        Ok(cart.into_items())
    }

    #[instrument(skip(self))]
    async fn clear_cart(&self) -> Result<(), ApiError> {
        self.execute_unit(self.request(Method::DELETE, &["cart"])?)
            .await
    }
}

// =============================================================================
// Orders
// =============================================================================

impl OrderApi for ApiClient {
    #[instrument(skip(self, payload), fields(items = payload.items.len()))]
    async fn create_order(
        &self,
        mode: CartMode,
        payload: &OrderPayload,
    ) -> Result<Order, ApiError> {
        let builder = self.request(Method::POST, mode.order_path())?.json(payload);
        let order: Order = self.execute(builder).await?;
        debug!(order_id = %order.id, "Order created");
        Ok(order)
    }

    #[instrument(skip(self))]
    async fn record_conversion(&self, slug: &str) -> Result<(), ApiError> {
        let builder = self.request(Method::POST, &["landing-pages", slug, "conversion"])?;
        self.execute_unit(builder).await
    }

    #[instrument(skip(self))]
    async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.execute(self.request(Method::GET, &["orders"])?).await
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    async fn get_order(&self, order_id: &OrderId) -> Result<Order, ApiError> {
        self.execute(self.request(Method::GET, &["orders", order_id.as_str()])?)
            .await
    }
}

// =============================================================================
// Catalog
// =============================================================================

impl CatalogApi for ApiClient {
    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn get_product(&self, product_id: &ProductId) -> Result<ProductSnapshot, ApiError> {
        if let Some(product) = self.inner.products.get(product_id).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let product: ProductSnapshot = self
            .execute(self.request(Method::GET, &["products", product_id.as_str()])?)
            .await?;

        self.inner
            .products
            .insert(product_id.clone(), product.clone())
            .await;

        Ok(product)
    }
}
