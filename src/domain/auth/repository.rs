//! Auth repository trait

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use super::entity::User;
use super::subscription::{AuthStateListener, Subscription};
use crate::domain::DomainError;

/// Raw result of starting an OAuth handshake
///
/// `url` is whatever the provider handed back; the sign-in use-case decides
/// whether it is usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthRedirect {
    pub url: Option<String>,
}

impl OAuthRedirect {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
        }
    }
}

/// Capability interface over an external identity provider
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AuthRepository: Send + Sync {
    /// Begin a Google OAuth handshake and return the redirect URL
    async fn sign_in_with_google(&self) -> Result<OAuthRedirect, DomainError>;

    /// Invalidate the current session
    async fn sign_out(&self) -> Result<(), DomainError>;

    /// Current principal, or `None` when nobody is signed in
    ///
    /// "Not signed in" is never an error; only genuine infrastructure
    /// failures are.
    async fn get_current_user(&self) -> Result<Option<User>, DomainError>;

    /// Register a listener for auth-state changes
    ///
    /// Implementations may fetch the current user for each notification. Any
    /// failure during that fetch is delivered to the listener as `None`
    /// rather than surfaced.
    fn on_auth_state_change(&self, listener: AuthStateListener) -> Subscription;
}
