//! Session-related types.
//!
//! The authentication module owns sign-in; the engine only needs to know who
//! is signed in and which bearer token to send.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use artprint_core::UserId;

/// Identity of the signed-in buyer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Backend user ID.
    pub id: UserId,
    /// Display name, when the auth module provides one.
    pub name: Option<String>,
}

/// An authenticated session.
///
/// Its presence selects the server-synced cart and the authenticated order
/// endpoint; its absence means guest checkout.
#[derive(Debug, Clone)]
pub struct Session {
    user: CurrentUser,
    token: SecretString,
}

impl Session {
    /// Create a session from the auth module's user and bearer token.
    #[must_use]
    pub const fn new(user: CurrentUser, token: SecretString) -> Self {
        Self { user, token }
    }

    /// The signed-in buyer.
    #[must_use]
    pub const fn user(&self) -> &CurrentUser {
        &self.user
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }
}

/// Which cart and order endpoint a checkout uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartMode {
    /// No session: ephemeral in-memory cart, guest order endpoint.
    Guest,
    /// Signed in: server-persisted cart, authenticated order endpoint.
    Authenticated,
}

impl CartMode {
    /// Mode implied by the presence of a session.
    #[must_use]
    pub const fn for_session(session: Option<&Session>) -> Self {
        if session.is_some() {
            Self::Authenticated
        } else {
            Self::Guest
        }
    }
}
