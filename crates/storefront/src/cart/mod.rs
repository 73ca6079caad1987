//! Shopping carts.
//!
//! # Architecture
//!
//! - [`CartStore`] is the interface checkout works against
//! - [`GuestCart`] lives only in memory and is always `Ready`
//! - [`AuthenticatedCart`] mirrors the backend cart and must be fetched first
//! - [`ActiveCart`] picks one of the two from the presence of a session
//!
//! Both implementations share the same local guards: quantities are at least
//! one, and the total units of a product across all lines never exceed the
//! stock known for it.

mod active;
mod authenticated;
mod guest;

pub use active::ActiveCart;
pub use authenticated::AuthenticatedCart;
pub use guest::GuestCart;

use std::fmt;
use std::future::Future;

use thiserror::Error;

use artprint_core::{
    CustomDesign, LineId, LineItem, Money, ProductId, ProductSnapshot, VariantSelection,
    product_quantity, subtotal,
};

use crate::api::ApiError;
use crate::models::CartMode;

/// Lifecycle of a cart's local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CartStatus {
    /// Never fetched.
    #[default]
    Idle,
    /// A fetch is in flight.
    Loading,
    /// Local state reflects the last successful fetch or mutation.
    Ready,
    /// The last fetch failed; fetching again is allowed.
    Error,
}

impl fmt::Display for CartStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Loading => write!(f, "loading"),
            Self::Ready => write!(f, "ready"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Only {available} of product {product_id} in stock (requested {requested})")]
    OutOfStock {
        product_id: ProductId,
        requested: u64,
        available: u32,
    },

    #[error("Quantity must be at least 1 (got {quantity})")]
    InvalidQuantity { quantity: u32 },

    #[error("Cart line not found: {0}")]
    LineNotFound(LineId),

    #[error("Cart is not ready (status: {0})")]
    NotReady(CartStatus),

    #[error("Cart sync failed: {0}")]
    Api(#[from] ApiError),
}

/// A cart that checkout can read from and clear.
///
/// Reads are synchronous snapshots of local state. Mutations are async
/// because the authenticated cart round-trips through the backend.
pub trait CartStore: Send + Sync {
    /// Which order endpoint this cart checks out through.
    fn mode(&self) -> CartMode;

    /// Current lifecycle status.
    fn status(&self) -> CartStatus;

    /// Snapshot of the current lines, in insertion order.
    fn items(&self) -> Vec<LineItem>;

    /// Σ(unit price × quantity), recomputed from the current lines.
    fn subtotal(&self) -> Money {
        subtotal(&self.items())
    }

    /// Total units across all lines.
    fn item_count(&self) -> u64 {
        self.items().iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Whether the cart has no lines.
    fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Add `quantity` of a product, merging into an existing line with the
    /// same variant and custom design.
    fn add_item(
        &self,
        product: &ProductSnapshot,
        quantity: u32,
        variant: VariantSelection,
        custom_design: Option<CustomDesign>,
    ) -> impl Future<Output = Result<LineId, CartError>> + Send;

    /// Set a line's quantity.
    fn update_quantity(
        &self,
        line_id: &LineId,
        quantity: u32,
    ) -> impl Future<Output = Result<(), CartError>> + Send;

    /// Remove a line.
    fn remove_item(&self, line_id: &LineId) -> impl Future<Output = Result<(), CartError>> + Send;

    /// Remove every line.
    fn clear(&self) -> impl Future<Output = Result<(), CartError>> + Send;

    /// Replace local state with the backend's. A no-op for carts without a
    /// backing store.
    fn fetch(&self) -> impl Future<Output = Result<(), CartError>> + Send;
}

// =============================================================================
// Shared guards
// =============================================================================

/// Reject quantities below one.
pub(crate) const fn ensure_quantity(quantity: u32) -> Result<(), CartError> {
    if quantity == 0 {
        return Err(CartError::InvalidQuantity { quantity });
    }
    Ok(())
}

/// Check that adding `quantity` of `product` to `items` stays within stock.
pub(crate) fn ensure_stock_for_add(
    items: &[LineItem],
    product: &ProductSnapshot,
    quantity: u32,
) -> Result<(), CartError> {
    let requested = product_quantity(items, &product.id, None) + u64::from(quantity);
    ensure_within(&product.id, requested, product.stock)
}

/// Check that setting `line_id` to `quantity` keeps its product within stock.
///
/// Returns the line being updated.
pub(crate) fn ensure_stock_for_update<'a>(
    items: &'a [LineItem],
    line_id: &LineId,
    quantity: u32,
) -> Result<&'a LineItem, CartError> {
    let line = items
        .iter()
        .find(|line| line.id == *line_id)
        .ok_or_else(|| CartError::LineNotFound(line_id.clone()))?;

    let requested = product_quantity(items, &line.product_id, Some(line_id)) + u64::from(quantity);
    ensure_within(&line.product_id, requested, line.stock)?;
    Ok(line)
}

fn ensure_within(product_id: &ProductId, requested: u64, available: u32) -> Result<(), CartError> {
    if requested > u64::from(available) {
        return Err(CartError::OutOfStock {
            product_id: product_id.clone(),
            requested,
            available,
        });
    }
    Ok(())
}

/// A new line for `product`, priced and stocked from its snapshot.
pub(crate) fn new_line(
    product: &ProductSnapshot,
    quantity: u32,
    variant: VariantSelection,
    custom_design: Option<CustomDesign>,
) -> LineItem {
    LineItem {
        id: LineId::generate(),
        product_id: product.id.clone(),
        name: product.name.clone(),
        quantity,
        unit_price: product.unit_price(),
        stock: product.stock,
        variant,
        custom_design,
    }
}
