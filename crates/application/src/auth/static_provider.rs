//! Provider holding a fixed token in memory.

use std::future::Future;
use std::pin::Pin;

use dataspine_domain::{AuthenticationStatus, AuthorizedStatus, TokenIdentity, UnauthorizedReason};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;

use super::provider::TokenProvider;

/// Token provider backed by a token set by the caller.
///
/// With no token it reports `Unauthorized(NoCredentials)`; this is also the
/// provider handed out when no auth type is configured.
#[derive(Debug)]
pub struct StaticTokenProvider {
    identity: TokenIdentity,
    token: RwLock<Option<SecretString>>,
}

impl StaticTokenProvider {
    /// Create a provider with an optional initial token.
    #[must_use]
    pub fn new(identity: TokenIdentity, token: Option<SecretString>) -> Self {
        Self {
            identity,
            token: RwLock::new(token),
        }
    }

    /// Replace the held token.
    pub async fn set_token(&self, token: SecretString) {
        *self.token.write().await = Some(token);
    }

    /// Drop the held token.
    pub async fn clear_token(&self) {
        *self.token.write().await = None;
    }
}

impl TokenProvider for StaticTokenProvider {
    fn identity(&self) -> &TokenIdentity {
        &self.identity
    }

    fn get_authentication_status<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = AuthenticationStatus> + Send + 'a>> {
        Box::pin(async move {
            let token = self.token.read().await;
            token
                .as_ref()
                .and_then(|t| AuthorizedStatus::new(t.expose_secret(), None, false))
                .map_or(
                    AuthenticationStatus::Unauthorized(UnauthorizedReason::NoCredentials),
                    AuthenticationStatus::Authorized,
                )
        })
    }

    fn set_token<'a>(&'a self, token: SecretString) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(Self::set_token(self, token))
    }
}
