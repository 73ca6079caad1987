//! Artprint Core - Shared domain types and delivery pricing.
//!
//! This crate provides the types shared by every Artprint component:
//! - `storefront` - Cart store, checkout form and order submission engine
//! - `cli` - Command-line driver for quotes, carts and checkout
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, money, addresses, line items and statuses
//! - [`pricing`] - Delivery-area classification and order totals

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pricing;
pub mod types;

pub use pricing::{DeliveryArea, classify_delivery, grand_total};
pub use types::*;
