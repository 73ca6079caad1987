//! Unified error handling with Sentry integration.
//!
//! Each layer has its own error enum; `CheckoutError` wraps them for callers
//! that drive a whole checkout. Unexpected failures (the backend could not
//! be reached or answered with garbage) are captured to Sentry. Failures the
//! buyer can fix are not.

use thiserror::Error;

use crate::api::ApiError;
use crate::cart::CartError;
use crate::checkout::ValidationError;
use crate::config::ConfigError;
use crate::submission::{ORDER_FAILED_MESSAGE, SubmitError};

/// Fallback text when the backend gives no reason of its own.
const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Error type for checkout flows.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Backend request outside of cart and order submission failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Form or cart is not ready for submission.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Order submission failed.
    #[error("Submission error: {0}")]
    Submit(#[from] SubmitError),
}

impl CheckoutError {
    /// Text to show the buyer. Never includes transport details.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(_) => "Checkout is unavailable right now.".to_string(),
            Self::Api(e) => server_message_or(e, GENERIC_FAILURE_MESSAGE),
            Self::Cart(e) => match e {
                CartError::OutOfStock { available, .. } => {
                    format!("Only {available} left in stock.")
                }
                CartError::InvalidQuantity { .. } => "Quantity must be at least 1.".to_string(),
                CartError::LineNotFound(_) => "That item is no longer in your cart.".to_string(),
                CartError::NotReady(_) => "Your cart is still loading.".to_string(),
                CartError::Api(e) => {
                    server_message_or(e, "Couldn't update your cart. Please try again.")
                }
            },
            Self::Validation(e) => e.to_string(),
            Self::Submit(e) => match e {
                SubmitError::InProgress => "Your order is already being placed.".to_string(),
                SubmitError::AlreadyPlaced(_) => "This order has already been placed.".to_string(),
                SubmitError::Rejected { message, .. } => message.clone(),
                SubmitError::Network(_) => ORDER_FAILED_MESSAGE.to_string(),
            },
        }
    }

    /// Whether this failure points at a fault outside the buyer's control.
    #[must_use]
    pub const fn is_unexpected(&self) -> bool {
        match self {
            Self::Api(e) | Self::Cart(CartError::Api(e)) => e.is_transport(),
            Self::Submit(SubmitError::Network(_)) => true,
            _ => false,
        }
    }

    /// Capture unexpected failures to Sentry and log them.
    pub fn report(&self) {
        if self.is_unexpected() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Checkout error"
            );
        } else {
            tracing::warn!(error = %self, "Checkout error");
        }
    }
}

fn server_message_or(error: &ApiError, fallback: &str) -> String {
    error.server_message().unwrap_or(fallback).to_string()
}

/// Result type alias for `CheckoutError`.
pub type Result<T> = std::result::Result<T, CheckoutError>;

/// Set the Sentry user context for the signed-in buyer.
pub fn set_sentry_user(user_id: &impl ToString, name: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: name.map(String::from),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for a checkout step.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of steps
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Order submitted", Some(&[("order_id", "65f0")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use artprint_core::{OrderId, ProductId, ShippingField};

    use super::*;
    use crate::cart::CartStatus;

    #[test]
    fn test_user_messages() {
        let err = CheckoutError::from(SubmitError::Rejected {
            status: 400,
            message: "Product out of stock".to_string(),
        });
        assert_eq!(err.user_message(), "Product out of stock");

        let err = CheckoutError::from(SubmitError::Network(ApiError::InvalidResponse(
            "truncated".to_string(),
        )));
        assert_eq!(err.user_message(), "Failed to place order. Please try again.");

        let err = CheckoutError::from(CartError::OutOfStock {
            product_id: ProductId::new("P1"),
            requested: 4,
            available: 3,
        });
        assert_eq!(err.user_message(), "Only 3 left in stock.");

        let err = CheckoutError::from(ValidationError::MissingFields(vec![ShippingField::Phone]));
        assert_eq!(err.user_message(), "Please fill in: phone");
    }

    #[test]
    fn test_transport_details_never_shown() {
        let err = CheckoutError::from(ApiError::InvalidUrl("http://internal:5000".to_string()));
        assert!(!err.user_message().contains("internal"));
        assert!(err.is_unexpected());
    }

    #[test]
    fn test_buyer_fixable_errors_are_expected() {
        let cases = [
            CheckoutError::from(ValidationError::EmptyCart),
            CheckoutError::from(CartError::NotReady(CartStatus::Loading)),
            CheckoutError::from(SubmitError::InProgress),
            CheckoutError::from(SubmitError::AlreadyPlaced(OrderId::new("O1"))),
            CheckoutError::from(ApiError::Api {
                status: 404,
                message: None,
            }),
        ];
        for err in cases {
            assert!(!err.is_unexpected(), "{err}");
        }
    }
}
