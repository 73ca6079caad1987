//! Backend REST API access.
//!
//! # Architecture
//!
//! - The backend is the source of truth for authenticated carts and orders
//! - Each concern the engine depends on is a trait (`CartApi`, `OrderApi`,
//!   `CatalogApi`) so carts and the submission pipeline can be driven by an
//!   in-memory backend in tests
//! - [`ApiClient`] implements all three over `reqwest`, caching product
//!   snapshots with `moka`
//!
//! # Example
//!
//! ```rust,ignore
//! use artprint_storefront::api::{ApiClient, CatalogApi};
//!
//! let client = ApiClient::new(&config.api)?;
//! let product = client.get_product(&ProductId::new("65f0")).await?;
//! ```

mod client;
pub mod types;

pub use client::ApiClient;
pub use types::*;

use std::future::Future;

use thiserror::Error;

use artprint_core::{LineId, LineItem, OrderId, ProductId, ProductSnapshot};

use crate::models::CartMode;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("API error: {status} - {}", .message.as_deref().unwrap_or("(no message)"))]
    Api {
        status: u16,
        message: Option<String>,
    },

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Response parsed but is missing something the engine relies on.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// The backend's own `{message}`, if it sent one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } => message.as_deref().filter(|m| !m.trim().is_empty()),
            _ => None,
        }
    }

    /// HTTP status, if the backend answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the request never got a backend answer (connection, timeout,
    /// malformed body) as opposed to an explicit rejection.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        !matches!(self, Self::Api { .. })
    }
}

/// Server-side cart operations. Every mutation answers with the full cart.
pub trait CartApi: Send + Sync {
    /// `GET cart`
    fn fetch_cart(&self) -> impl Future<Output = Result<Vec<LineItem>, ApiError>> + Send;

    /// `POST cart`
    fn add_line(
        &self,
        request: &AddLineRequest,
    ) -> impl Future<Output = Result<Vec<LineItem>, ApiError>> + Send;

    /// `PUT cart/{lineId}`
    fn update_line(
        &self,
        line_id: &LineId,
        quantity: u32,
    ) -> impl Future<Output = Result<Vec<LineItem>, ApiError>> + Send;

    /// `DELETE cart/{lineId}`
    fn remove_line(
        &self,
        line_id: &LineId,
    ) -> impl Future<Output = Result<Vec<LineItem>, ApiError>> + Send;

    /// `DELETE cart`
    fn clear_cart(&self) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Order placement and lookup.
pub trait OrderApi: Send + Sync {
    /// `POST orders` or `POST orders/guest`, depending on `mode`.
    fn create_order(
        &self,
        mode: CartMode,
        payload: &OrderPayload,
    ) -> impl Future<Output = Result<Order, ApiError>> + Send;

    /// `POST landing-pages/{slug}/conversion`
    fn record_conversion(&self, slug: &str) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `GET orders`
    fn list_orders(&self) -> impl Future<Output = Result<Vec<Order>, ApiError>> + Send;

    /// `GET orders/{id}`
    fn get_order(&self, order_id: &OrderId) -> impl Future<Output = Result<Order, ApiError>> + Send;
}

/// Read-only catalog access.
pub trait CatalogApi: Send + Sync {
    /// `GET products/{id}`
    fn get_product(
        &self,
        product_id: &ProductId,
    ) -> impl Future<Output = Result<ProductSnapshot, ApiError>> + Send;
}

impl CartMode {
    /// Path segments of the order-creation endpoint for this mode.
    #[must_use]
    pub const fn order_path(self) -> &'static [&'static str] {
        match self {
            Self::Guest => &["orders", "guest"],
            Self::Authenticated => &["orders"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Api {
            status: 400,
            message: Some("Product out of stock".to_string()),
        };
        assert_eq!(err.to_string(), "API error: 400 - Product out of stock");

        let err = ApiError::Api {
            status: 502,
            message: None,
        };
        assert_eq!(err.to_string(), "API error: 502 - (no message)");
    }

    #[test]
    fn test_server_message_ignores_blank() {
        let err = ApiError::Api {
            status: 400,
            message: Some("  ".to_string()),
        };
        assert_eq!(err.server_message(), None);
        assert!(!err.is_transport());

        let err = ApiError::InvalidResponse("no id".to_string());
        assert_eq!(err.server_message(), None);
        assert!(err.is_transport());
    }

    #[test]
    fn test_order_paths() {
        assert_eq!(CartMode::Guest.order_path(), &["orders", "guest"]);
        assert_eq!(CartMode::Authenticated.order_path(), &["orders"]);
    }
}
