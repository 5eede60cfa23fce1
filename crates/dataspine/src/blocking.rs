//! Synchronous access to token providers.

use std::sync::Arc;

use dataspine_application::TokenProvider;
use dataspine_domain::{AuthenticationStatus, ConfigurationError, ConfigurationResult, TokenIdentity};
use secrecy::SecretString;
use tokio::runtime::{Builder, Runtime};

/// Runs a [`TokenProvider`] on a private current-thread runtime.
///
/// Must not be used from inside an async runtime; `block_on` panics there.
#[derive(Debug)]
pub struct BlockingTokenProvider {
    runtime: Runtime,
    provider: Arc<dyn TokenProvider>,
}

impl BlockingTokenProvider {
    /// Wrap `provider`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Runtime`] if the runtime cannot be
    /// started.
    pub fn new(provider: Arc<dyn TokenProvider>) -> ConfigurationResult<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ConfigurationError::Runtime(e.to_string()))?;
        Ok(Self { runtime, provider })
    }

    /// Identity of the wrapped provider.
    #[must_use]
    pub fn identity(&self) -> &TokenIdentity {
        self.provider.identity()
    }

    /// Blocking form of [`TokenProvider::get_authentication_status`].
    pub fn get_authentication_status(&self) -> AuthenticationStatus {
        self.runtime
            .block_on(self.provider.get_authentication_status())
    }

    /// Blocking form of [`TokenProvider::set_token`].
    pub fn set_token(&self, token: SecretString) {
        self.runtime.block_on(self.provider.set_token(token));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::ConfigLoader;
    use dataspine_domain::AuthType;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_blocking_static_token() {
        let mut loader = ConfigLoader::default();
        loader.auth_type = AuthType::StaticToken;
        loader.auth_token = Some(SecretString::from("static:abc123".to_string()));
        let provider = loader
            .build()
            .unwrap()
            .create_token_provider(
                "eu-west-1",
                "0195d8a4-7c3e-7b21-9f4e-2a6c1d8e5f30",
                "6f9619ff-8b86-d011-b42d-00c04fc964ff",
            )
            .unwrap();

        let blocking = BlockingTokenProvider::new(provider).unwrap();
        assert_eq!(blocking.identity().region.as_str(), "eu-west-1");
        assert_eq!(
            blocking.get_authentication_status().last_valid_token(),
            Some("abc123")
        );
    }

    #[test]
    fn test_blocking_set_token() {
        let provider = ConfigLoader::default()
            .build()
            .unwrap()
            .create_token_provider(
                "eu-west-1",
                "0195d8a4-7c3e-7b21-9f4e-2a6c1d8e5f30",
                "6f9619ff-8b86-d011-b42d-00c04fc964ff",
            )
            .unwrap();

        let blocking = BlockingTokenProvider::new(provider).unwrap();
        assert!(!blocking.get_authentication_status().is_authorized());
        blocking.set_token(SecretString::from("manual".to_string()));
        assert_eq!(
            blocking.get_authentication_status().last_valid_token(),
            Some("manual")
        );
    }
}
