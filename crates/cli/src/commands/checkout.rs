//! Order placement commands.

use artprint_core::ProductId;
use artprint_storefront::api::CatalogApi;
use artprint_storefront::{CartStore, CheckoutForm, GuestCart, StorefrontState};

use super::cart::log_lines;
use super::{CommandError, LogNavigator, ShippingArgs, VariantArgs, require_session};

fn log_quote(form: &CheckoutForm, cart: &impl CartStore) {
    let subtotal = cart.subtotal();
    tracing::info!("Delivery area:   {}", form.delivery_area());
    tracing::info!("Subtotal:        {subtotal}");
    tracing::info!("Delivery charge: {}", form.delivery_charge());
    tracing::info!("Total:           {}", form.grand_total(subtotal));
}

async fn place(
    state: &StorefrontState,
    form: &CheckoutForm,
    cart: &impl CartStore,
    landing_page: Option<&str>,
) -> Result<(), CommandError> {
    log_lines(&cart.items());
    log_quote(form, cart);

    let mut pipeline = state.pipeline(LogNavigator);
    if let Some(slug) = landing_page {
        pipeline = pipeline.with_conversion_tracking(slug);
    }

    let order = pipeline.submit(form, cart).await?;
    tracing::info!(order_id = %order.id, status = %order.status, "Order placed");
    Ok(())
}

/// Guest checkout of a single product.
pub async fn express(
    state: &StorefrontState,
    product_id: &ProductId,
    quantity: u32,
    variant: VariantArgs,
    shipping: &ShippingArgs,
    landing_page: Option<&str>,
) -> Result<(), CommandError> {
    let product = state.client().get_product(product_id).await?;
    let cart = GuestCart::express(&product, quantity, variant.into())?;
    place(state, &shipping.to_form(), &cart, landing_page).await
}

/// Check out the signed-in buyer's server cart.
pub async fn checkout(
    state: &StorefrontState,
    shipping: &ShippingArgs,
) -> Result<(), CommandError> {
    require_session(state)?;
    let cart = state.active_cart();
    cart.fetch().await?;

    place(state, &shipping.to_form(), &cart, None).await
}
