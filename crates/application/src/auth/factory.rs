//! Token provider factory.

use std::sync::Arc;
use std::time::Duration;

use dataspine_domain::{Component, ConfigurationResult, EndpointTemplate, TokenIdentity};
use secrecy::SecretString;

use super::exchanging_provider::{DEFAULT_EXCHANGE_TIMEOUT, ExchangingTokenProvider};
use super::provider::TokenProvider;
use super::static_provider::StaticTokenProvider;
use super::token_cache::TokenCachePolicy;
use crate::ports::{Clock, SubjectTokenSource, TokenExchanger};

/// How providers built by a factory obtain their token.
#[derive(Debug, Clone)]
pub enum AuthStrategy {
    /// Never authorized.
    None,
    /// A fixed token.
    Static(SecretString),
    /// STS exchange of a subject token.
    Exchange {
        /// Adapter talking to the STS.
        exchanger: Arc<dyn TokenExchanger>,
        /// Producer of the subject token; `None` leaves providers unauthorized.
        subject: Option<Arc<dyn SubjectTokenSource>>,
    },
}

/// Builds token providers bound to one identity triple each.
///
/// The factory holds only immutable wiring; every call returns a new,
/// independent provider and nothing is sent over the network until a
/// provider is asked for its status.
#[derive(Debug, Clone)]
pub struct TokenProviderFactory {
    strategy: AuthStrategy,
    sts_endpoint: EndpointTemplate,
    cache_policy: TokenCachePolicy,
    timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenProviderFactory {
    /// Create a factory with the default STS template, cache policy and timeout.
    #[must_use]
    pub fn new(strategy: AuthStrategy, clock: Arc<dyn Clock>) -> Self {
        Self {
            strategy,
            sts_endpoint: EndpointTemplate::default(),
            cache_policy: TokenCachePolicy::default(),
            timeout: DEFAULT_EXCHANGE_TIMEOUT,
            clock,
        }
    }

    /// Set the STS endpoint template.
    #[must_use]
    pub fn with_sts_endpoint(mut self, template: EndpointTemplate) -> Self {
        self.sts_endpoint = template;
        self
    }

    /// Set the cache policy of exchanging providers.
    #[must_use]
    pub const fn with_cache_policy(mut self, policy: TokenCachePolicy) -> Self {
        self.cache_policy = policy;
        self
    }

    /// Set the exchange timeout of exchanging providers.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The strategy providers are built with.
    #[must_use]
    pub const fn strategy(&self) -> &AuthStrategy {
        &self.strategy
    }

    /// The cache policy handed to exchanging providers.
    #[must_use]
    pub const fn cache_policy(&self) -> TokenCachePolicy {
        self.cache_policy
    }

    /// The exchange timeout handed to exchanging providers.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build a provider from textual identity parts.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the region is empty or malformed,
    /// if either id is not a non-nil UUID, or if the STS endpoint does not
    /// render to a valid URL for this identity.
    pub fn create_token_provider(
        &self,
        region: &str,
        data_product_id: &str,
        application_id: &str,
    ) -> ConfigurationResult<Arc<dyn TokenProvider>> {
        let identity = TokenIdentity::parse(region, data_product_id, application_id)?;
        self.create_token_provider_for(identity)
    }

    /// Build a provider for an already validated identity.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the STS endpoint does not render to
    /// a valid URL for this identity.
    pub fn create_token_provider_for(
        &self,
        identity: TokenIdentity,
    ) -> ConfigurationResult<Arc<dyn TokenProvider>> {
        let provider: Arc<dyn TokenProvider> = match &self.strategy {
            AuthStrategy::None => Arc::new(StaticTokenProvider::new(identity, None)),
            AuthStrategy::Static(token) => {
                Arc::new(StaticTokenProvider::new(identity, Some(token.clone())))
            }
            AuthStrategy::Exchange { exchanger, subject } => {
                let sts_endpoint = self.sts_endpoint.resolve(
                    Component::Sts,
                    &identity.region,
                    Some(&identity.application_id),
                    None,
                )?;
                tracing::debug!(%identity, %sts_endpoint, "creating exchanging token provider");
                Arc::new(
                    ExchangingTokenProvider::new(
                        identity,
                        sts_endpoint,
                        subject.clone(),
                        exchanger.clone(),
                        self.clock.clone(),
                    )
                    .with_cache_policy(self.cache_policy)
                    .with_timeout(self.timeout),
                )
            }
        };
        Ok(provider)
    }
}
