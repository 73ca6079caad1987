//! Order submission pipeline.
//!
//! # Flow
//!
//! 1. Reject if an order is already in flight or already placed
//! 2. Validate the form and require a non-empty, loaded cart
//! 3. `Idle | Failed -> Submitting`, then create the order
//! 4. On success: clear the cart, record a landing-page conversion if
//!    configured, wait the navigation delay, then navigate to tracking
//! 5. On failure: `Failed { message }` with the backend's reason or a
//!    generic fallback; the cart is left alone
//!
//! No lock is held across an `.await`; the `Submitting` state itself is what
//! keeps a second submit from reaching the network. A submit abandoned while
//! in flight (timeout, dropped task) leaves the pipeline `Failed`, so a retry
//! is possible.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tracing::{info, instrument, warn};

use artprint_core::OrderId;

use crate::api::{ApiError, Order, OrderApi};
use crate::cart::{CartError, CartStatus, CartStore};
use crate::checkout::{CheckoutForm, ValidationError};
use crate::error::{CheckoutError, add_breadcrumb};

/// Shown when the backend rejects an order without saying why, or can't be
/// reached at all.
pub const ORDER_FAILED_MESSAGE: &str = "Failed to place order. Please try again.";

/// Default pause between a placed order and navigating to its tracking view.
pub const DEFAULT_NAVIGATION_DELAY: Duration = Duration::from_millis(1500);

/// Where a buyer tracks `order_id`.
#[must_use]
pub fn tracking_path(order_id: &OrderId) -> String {
    format!("/orders/track/{order_id}")
}

/// Moves the buyer to another view once an order is placed.
pub trait Navigator: Send + Sync {
    /// Show the tracking view for `order_id`.
    fn navigate_to_order(&self, order_id: &OrderId);
}

/// Submission lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Succeeded {
        order_id: OrderId,
    },
    Failed {
        message: String,
    },
}

/// Errors from the submission step itself.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("An order submission is already in progress")]
    InProgress,

    #[error("Order {0} has already been placed")]
    AlreadyPlaced(OrderId),

    /// The backend answered and refused the order.
    #[error("Order rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The backend could not be reached or answered with something unusable.
    #[error("Order request failed: {0}")]
    Network(#[source] ApiError),
}

impl From<ApiError> for SubmitError {
    fn from(error: ApiError) -> Self {
        match error.status() {
            Some(status) => Self::Rejected {
                status,
                message: error
                    .server_message()
                    .unwrap_or(ORDER_FAILED_MESSAGE)
                    .to_string(),
            },
            None => Self::Network(error),
        }
    }
}

/// Best-effort landing-page conversion failure. Logged, never surfaced.
#[derive(Debug, Error)]
#[error("Conversion tracking failed for landing page {slug}: {source}")]
pub struct ConversionTrackingError {
    slug: String,
    #[source]
    source: ApiError,
}

/// Places one order.
///
/// Single-shot: once an order succeeds, further submits are rejected until
/// [`OrderPipeline::reset`].
pub struct OrderPipeline<A, N> {
    api: A,
    navigator: N,
    state: Mutex<SubmissionState>,
    conversion_slug: Option<String>,
    navigation_delay: Duration,
}

impl<A: OrderApi, N: Navigator> OrderPipeline<A, N> {
    /// A pipeline in the `Idle` state.
    #[must_use]
    pub fn new(api: A, navigator: N) -> Self {
        Self {
            api,
            navigator,
            state: Mutex::new(SubmissionState::Idle),
            conversion_slug: None,
            navigation_delay: DEFAULT_NAVIGATION_DELAY,
        }
    }

    /// Record a conversion for this landing page after a successful order.
    #[must_use]
    pub fn with_conversion_tracking(mut self, slug: impl Into<String>) -> Self {
        self.conversion_slug = Some(slug.into()).filter(|s: &String| !s.trim().is_empty());
        self
    }

    /// Override the pause before navigating to order tracking.
    #[must_use]
    pub const fn with_navigation_delay(mut self, delay: Duration) -> Self {
        self.navigation_delay = delay;
        self
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SubmissionState {
        self.lock().clone()
    }

    /// Return to `Idle` so another order can be placed.
    ///
    /// Has no effect while a submission is in flight.
    pub fn reset(&self) {
        let mut state = self.lock();
        if *state != SubmissionState::Submitting {
            *state = SubmissionState::Idle;
        }
    }

    fn lock(&self) -> MutexGuard<'_, SubmissionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim the pipeline for one submission.
    fn begin(&self) -> Result<InFlight<'_>, SubmitError> {
        let mut state = self.lock();
        Self::ensure_accepting(&state)?;
        *state = SubmissionState::Submitting;
        Ok(InFlight { state: &self.state })
    }

    fn ensure_accepting(state: &SubmissionState) -> Result<(), SubmitError> {
        match state {
            SubmissionState::Submitting => Err(SubmitError::InProgress),
            SubmissionState::Succeeded { order_id } => {
                Err(SubmitError::AlreadyPlaced(order_id.clone()))
            }
            SubmissionState::Idle | SubmissionState::Failed { .. } => Ok(()),
        }
    }

    /// Place an order for the contents of `cart`.
    ///
    /// # Errors
    ///
    /// - `Submit(InProgress | AlreadyPlaced)` if this pipeline is busy or done
    /// - `Validation` for blank fields or an empty cart
    /// - `Cart(NotReady)` if the cart hasn't loaded
    /// - `Submit(Rejected | Network)` if order creation failed
    #[instrument(skip_all, fields(mode = ?cart.mode()))]
    pub async fn submit<C: CartStore>(
        &self,
        form: &CheckoutForm,
        cart: &C,
    ) -> crate::error::Result<Order> {
        Self::ensure_accepting(&self.lock())?;

        form.validate()?;
        if cart.status() != CartStatus::Ready {
            return Err(CartError::NotReady(cart.status()).into());
        }
        let items = cart.items();
        if items.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }
        let payload = form.build_order_payload(&items, form.delivery_charge());

        let _in_flight = self.begin()?;
        add_breadcrumb("checkout", "Submitting order", None);

        match self.api.create_order(cart.mode(), &payload).await {
            Ok(order) => {
                self.complete(&order, cart).await;
                Ok(order)
            }
            Err(e) => {
                let error = SubmitError::from(e);
                let message = match &error {
                    SubmitError::Rejected { message, .. } => message.clone(),
                    _ => ORDER_FAILED_MESSAGE.to_string(),
                };
                *self.lock() = SubmissionState::Failed { message };

                let error = CheckoutError::from(error);
                error.report();
                Err(error)
            }
        }
    }

    /// Success side effects, in order: clear cart, conversion, navigation.
    async fn complete<C: CartStore>(&self, order: &Order, cart: &C) {
        *self.lock() = SubmissionState::Succeeded {
            order_id: order.id.clone(),
        };
        info!(order_id = %order.id, "Order placed");
        add_breadcrumb(
            "checkout",
            "Order placed",
            Some(&[("order_id", order.id.as_str())]),
        );

        if let Err(e) = cart.clear().await {
            warn!(order_id = %order.id, error = %e, "Failed to clear cart after order");
        }

        if let Some(slug) = &self.conversion_slug
            && let Err(source) = self.api.record_conversion(slug).await
        {
            let error = ConversionTrackingError {
                slug: slug.clone(),
                source,
            };
            warn!(error = %error, "Ignoring conversion tracking failure");
        }

        tokio::time::sleep(self.navigation_delay).await;
        self.navigator.navigate_to_order(&order.id);
    }
}

/// Held for the duration of a submission. If the submit future is dropped
/// before it settles, the pipeline moves from `Submitting` to `Failed`.
struct InFlight<'a> {
    state: &'a Mutex<SubmissionState>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == SubmissionState::Submitting {
            warn!("Order submission abandoned while in flight");
            *state = SubmissionState::Failed {
                message: ORDER_FAILED_MESSAGE.to_string(),
            };
        }
    }
}
