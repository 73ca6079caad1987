//! Signed-in cart commands.
//!
//! # Environment Variables
//!
//! - `ARTPRINT_API_TOKEN` / `ARTPRINT_USER_ID` - Buyer session (required)

use artprint_core::{LineId, LineItem, ProductId};
use artprint_storefront::api::CatalogApi;
use artprint_storefront::{ActiveCart, CartStore, StorefrontState};

use super::{CommandError, VariantArgs, require_session};

/// Fetch the server cart for the configured session.
async fn load(state: &StorefrontState) -> Result<ActiveCart, CommandError> {
    require_session(state)?;
    let cart = state.active_cart();
    cart.fetch().await?;
    Ok(cart)
}

pub(super) fn log_lines(items: &[LineItem]) {
    for line in items {
        let variant = [&line.variant.size, &line.variant.color, &line.variant.material]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" / ");
        tracing::info!(
            "{}  {} x{} @ {} = {}{}{}",
            line.id,
            line.name,
            line.quantity,
            line.unit_price,
            line.line_total(),
            if variant.is_empty() { "" } else { "  " },
            variant
        );
    }
}

/// Show cart lines, item count and subtotal.
pub async fn show(state: &StorefrontState) -> Result<(), CommandError> {
    let cart = load(state).await?;

    if cart.is_empty() {
        tracing::info!("Cart is empty");
        return Ok(());
    }

    log_lines(&cart.items());
    tracing::info!("Items:    {}", cart.item_count());
    tracing::info!("Subtotal: {}", cart.subtotal());
    Ok(())
}

/// Add a product, merging with a matching line.
pub async fn add(
    state: &StorefrontState,
    product_id: &ProductId,
    quantity: u32,
    variant: VariantArgs,
) -> Result<(), CommandError> {
    let cart = load(state).await?;
    let product = state.client().get_product(product_id).await?;

    let line_id = cart
        .add_item(&product, quantity, variant.into(), None)
        .await?;

    tracing::info!(line_id = %line_id, "Added {quantity} x {}", product.name);
    tracing::info!("Subtotal: {}", cart.subtotal());
    Ok(())
}

/// Set a line's quantity.
pub async fn update(
    state: &StorefrontState,
    line_id: &LineId,
    quantity: u32,
) -> Result<(), CommandError> {
    let cart = load(state).await?;
    cart.update_quantity(line_id, quantity).await?;

    tracing::info!(line_id = %line_id, "Quantity set to {quantity}");
    tracing::info!("Subtotal: {}", cart.subtotal());
    Ok(())
}

/// Remove a line.
pub async fn remove(state: &StorefrontState, line_id: &LineId) -> Result<(), CommandError> {
    let cart = load(state).await?;
    cart.remove_item(line_id).await?;

    tracing::info!(line_id = %line_id, "Removed");
    tracing::info!("Subtotal: {}", cart.subtotal());
    Ok(())
}
