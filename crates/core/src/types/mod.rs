//! Core types for Artprint.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod id;
pub mod line_item;
pub mod price;
pub mod product;
pub mod status;

pub use address::{DEFAULT_COUNTRY, ShippingAddress, ShippingField};
pub use id::*;
pub use line_item::{
    CustomDesign, DesignPosition, LineItem, VariantSelection, product_quantity, subtotal,
};
pub use price::{CURRENCY_SYMBOL, Money, MoneyError};
pub use product::ProductSnapshot;
pub use status::*;
