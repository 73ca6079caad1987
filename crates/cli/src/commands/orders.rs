//! Order history and tracking.

use artprint_core::OrderId;
use artprint_storefront::api::{Order, OrderApi};
use artprint_storefront::{StorefrontState, tracking_path};

use super::{CommandError, require_session};

fn log_order(order: &Order) {
    let placed = order
        .created_at
        .map_or_else(|| "-".to_string(), |at| at.format("%Y-%m-%d %H:%M").to_string());
    let total = order
        .total_amount
        .map_or_else(|| "-".to_string(), |total| total.to_string());

    tracing::info!("{}  {}  {}  {}", order.id, placed, order.status, total);
}

/// List the signed-in buyer's orders.
pub async fn list(state: &StorefrontState) -> Result<(), CommandError> {
    require_session(state)?;
    let orders = state.client().list_orders().await?;

    if orders.is_empty() {
        tracing::info!("No orders yet");
    }
    for order in &orders {
        log_order(order);
    }
    Ok(())
}

/// Show one order with its lines.
pub async fn track(state: &StorefrontState, order_id: &OrderId) -> Result<(), CommandError> {
    let order = state.client().get_order(order_id).await?;

    log_order(&order);
    for line in &order.items {
        tracing::info!(
            "  {} x{}{}",
            line.product.name().unwrap_or_else(|| line.product.id().as_str()),
            line.quantity,
            line.price
                .map(|price| format!(" @ {price}"))
                .unwrap_or_default()
        );
    }
    if let Some(charge) = order.delivery_charge {
        tracing::info!("  Delivery: {charge}");
    }
    if order.status.is_final() {
        tracing::info!("Order is {}", order.status);
    } else {
        tracing::info!("Follow along at {}", tracking_path(&order.id));
    }
    Ok(())
}
