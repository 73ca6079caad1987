//! Cart selection by session.

use artprint_core::{CustomDesign, LineId, LineItem, ProductSnapshot, VariantSelection};

use super::{AuthenticatedCart, CartError, CartStatus, CartStore, GuestCart};
use crate::api::{ApiClient, CartApi};
use crate::models::{CartMode, Session};

/// The cart a checkout uses: server-synced when signed in, in-memory
/// otherwise.
#[derive(Debug, Clone)]
pub enum ActiveCart<A = ApiClient> {
    Guest(GuestCart),
    Authenticated(AuthenticatedCart<A>),
}

impl<A: CartApi> ActiveCart<A> {
    /// Pick the cart implementation for `session`.
    ///
    /// `api` must already carry the session's credentials.
    #[must_use]
    pub fn for_session(session: Option<&Session>, api: A) -> Self {
        match CartMode::for_session(session) {
            CartMode::Guest => Self::Guest(GuestCart::new()),
            CartMode::Authenticated => Self::Authenticated(AuthenticatedCart::new(api)),
        }
    }
}

impl<A: CartApi> CartStore for ActiveCart<A> {
    fn mode(&self) -> CartMode {
        match self {
            Self::Guest(cart) => cart.mode(),
            Self::Authenticated(cart) => cart.mode(),
        }
    }

    fn status(&self) -> CartStatus {
        match self {
            Self::Guest(cart) => cart.status(),
            Self::Authenticated(cart) => cart.status(),
        }
    }

    fn items(&self) -> Vec<LineItem> {
        match self {
            Self::Guest(cart) => cart.items(),
            Self::Authenticated(cart) => cart.items(),
        }
    }

    async fn add_item(
        &self,
        product: &ProductSnapshot,
        quantity: u32,
        variant: VariantSelection,
        custom_design: Option<CustomDesign>,
    ) -> Result<LineId, CartError> {
        match self {
            Self::Guest(cart) => cart.add_item(product, quantity, variant, custom_design).await,
            Self::Authenticated(cart) => {
                cart.add_item(product, quantity, variant, custom_design)
                    .await
            }
        }
    }

    async fn update_quantity(&self, line_id: &LineId, quantity: u32) -> Result<(), CartError> {
        match self {
            Self::Guest(cart) => cart.update_quantity(line_id, quantity).await,
            Self::Authenticated(cart) => cart.update_quantity(line_id, quantity).await,
        }
    }

    async fn remove_item(&self, line_id: &LineId) -> Result<(), CartError> {
        match self {
            Self::Guest(cart) => cart.remove_item(line_id).await,
            Self::Authenticated(cart) => cart.remove_item(line_id).await,
        }
    }

    async fn clear(&self) -> Result<(), CartError> {
        match self {
            Self::Guest(cart) => cart.clear().await,
            Self::Authenticated(cart) => cart.clear().await,
        }
    }

    async fn fetch(&self) -> Result<(), CartError> {
        match self {
            Self::Guest(cart) => cart.fetch().await,
            Self::Authenticated(cart) => cart.fetch().await,
        }
    }
}
