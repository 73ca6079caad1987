//! Domain models for the storefront engine.

pub mod session;

pub use session::{CartMode, CurrentUser, Session};
