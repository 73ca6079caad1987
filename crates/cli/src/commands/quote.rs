//! Offline delivery quote.

use artprint_core::{DeliveryArea, Money, classify_delivery, grand_total};

/// Log the delivery tier, charge and grand total for `city`.
pub fn run(city: &str, subtotal: Money, area: Option<DeliveryArea>) {
    let area = area.unwrap_or_else(|| classify_delivery(city));
    let charge = area.charge();

    tracing::info!("City:            {city}");
    tracing::info!("Delivery area:   {area}");
    tracing::info!("Subtotal:        {subtotal}");
    tracing::info!("Delivery charge: {charge}");
    tracing::info!("Total:           {}", grand_total(subtotal, charge));
}
