//! Checkout form state.
//!
//! Holds the shipping address and the delivery tier. The tier follows the
//! city text automatically until the buyer picks one by hand; editing the
//! city again hands control back to the classifier.

use thiserror::Error;

use artprint_core::{
    DeliveryArea, LineItem, Money, PaymentMethod, ShippingAddress, ShippingField,
    classify_delivery, grand_total,
};

use crate::api::{OrderItemPayload, OrderPayload};

/// Reasons an order can't be submitted, found without contacting the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill in: {}", join_fields(.0))]
    MissingFields(Vec<ShippingField>),

    #[error("Your cart is empty")]
    EmptyCart,
}

fn join_fields(fields: &[ShippingField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Shipping details and delivery tier for one checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutForm {
    address: ShippingAddress,
    area: DeliveryArea,
    area_overridden: bool,
}

impl CheckoutForm {
    /// An empty form. The tier starts as inside Dhaka.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The address as entered so far.
    #[must_use]
    pub const fn address(&self) -> &ShippingAddress {
        &self.address
    }

    /// Set a shipping field. City edits go through [`Self::set_city`].
    pub fn set_field(&mut self, field: ShippingField, value: impl Into<String>) {
        if field == ShippingField::City {
            self.set_city(value);
        } else {
            *self.address.get_mut(field) = value.into();
        }
    }

    /// Set the city, reclassifying the tier and dropping any manual choice.
    ///
    /// Setting the same text again changes nothing.
    pub fn set_city(&mut self, value: impl Into<String>) {
        let value = value.into();
        if value == self.address.city {
            return;
        }
        self.area = classify_delivery(&value);
        self.area_overridden = false;
        self.address.city = value;
    }

    /// Pick the tier by hand. Holds until the city text changes.
    pub const fn select_area(&mut self, area: DeliveryArea) {
        self.area = area;
        self.area_overridden = true;
    }

    /// Current delivery tier.
    #[must_use]
    pub const fn delivery_area(&self) -> DeliveryArea {
        self.area
    }

    /// Whether the tier was picked by hand.
    #[must_use]
    pub const fn is_area_overridden(&self) -> bool {
        self.area_overridden
    }

    /// Flat charge for the current tier.
    #[must_use]
    pub fn delivery_charge(&self) -> Money {
        self.area.charge()
    }

    /// `subtotal` plus the current delivery charge.
    #[must_use]
    pub fn grand_total(&self, subtotal: Money) -> Money {
        grand_total(subtotal, self.delivery_charge())
    }

    /// Check that every required field has non-blank text.
    ///
    /// # Errors
    ///
    /// Returns `MissingFields` listing the blank fields in form order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let missing = self.address.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::MissingFields(missing))
        }
    }

    /// Snapshot `items` and the address into an order request.
    #[must_use]
    pub fn build_order_payload(&self, items: &[LineItem], delivery_charge: Money) -> OrderPayload {
        OrderPayload {
            items: items.iter().map(OrderItemPayload::from).collect(),
            shipping_address: self.address.clone(),
            delivery_charge,
            payment_method: PaymentMethod::CashOnDelivery,
        }
    }
}
