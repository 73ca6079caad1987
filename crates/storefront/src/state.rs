//! Engine state shared across views.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::cart::ActiveCart;
use crate::config::StorefrontConfig;
use crate::models::{CartMode, Session};
use crate::submission::{Navigator, OrderPipeline};

/// Configuration plus a backend client carrying the buyer's session.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct StorefrontState {
    inner: Arc<StorefrontStateInner>,
}

struct StorefrontStateInner {
    config: StorefrontConfig,
    client: ApiClient,
}

impl StorefrontState {
    /// Create the engine state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let client = ApiClient::new(&config.api)?;
        let client = match &config.session {
            Some(session) => client.with_session(session.clone()),
            None => client,
        };

        Ok(Self {
            inner: Arc::new(StorefrontStateInner { config, client }),
        })
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend client.
    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    /// The signed-in buyer's session, if any.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.inner.config.session.as_ref()
    }

    /// Guest or authenticated, from the session.
    #[must_use]
    pub fn cart_mode(&self) -> CartMode {
        CartMode::for_session(self.session())
    }

    /// A fresh cart for the current session. Authenticated carts still need
    /// a fetch before use.
    #[must_use]
    pub fn active_cart(&self) -> ActiveCart {
        ActiveCart::for_session(self.session(), self.inner.client.clone())
    }

    /// A submission pipeline using the configured navigation delay.
    #[must_use]
    pub fn pipeline<N: Navigator>(&self, navigator: N) -> OrderPipeline<ApiClient, N> {
        OrderPipeline::new(self.inner.client.clone(), navigator)
            .with_navigation_delay(self.inner.config.navigation_delay)
    }
}
