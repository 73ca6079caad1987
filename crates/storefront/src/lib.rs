//! Artprint checkout engine.
//!
//! Carts, the checkout form and the order submission pipeline of the
//! Artprint storefront, driven against its REST backend. Guest buyers get an
//! in-memory cart and the guest order endpoint; signed-in buyers get a
//! server-synced cart.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod submission;

#[cfg(test)]
mod testing;

pub use cart::{ActiveCart, AuthenticatedCart, CartError, CartStatus, CartStore, GuestCart};
pub use checkout::{CheckoutForm, ValidationError};
pub use error::CheckoutError;
pub use state::StorefrontState;
pub use submission::{Navigator, OrderPipeline, SubmissionState, SubmitError, tracking_path};
