//! Token provider trait.

use std::future::Future;
use std::pin::Pin;

use dataspine_domain::{AuthenticationStatus, TokenIdentity};
use secrecy::SecretString;

/// One authentication relationship for one identity triple.
///
/// Implementations are `Send + Sync` and independent of each other; a
/// failure in one provider never affects another.
pub trait TokenProvider: Send + Sync + std::fmt::Debug {
    /// The identity this provider is bound to.
    fn identity(&self) -> &TokenIdentity;

    /// Resolve the current authentication status.
    ///
    /// This may reuse a cached token or perform a remote exchange. It does
    /// not complete before a definitive outcome is known, and rejection,
    /// transport failure or timeout all come back as
    /// [`AuthenticationStatus::Unauthorized`] rather than as an error.
    fn get_authentication_status<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = AuthenticationStatus> + Send + 'a>>;

    /// Supply a token after construction.
    ///
    /// A static provider serves `token` as its bearer token. An exchanging
    /// provider presents it as the input token of its next exchange and
    /// drops any token it issued before.
    fn set_token<'a>(&'a self, token: SecretString) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}
