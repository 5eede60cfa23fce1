//! Configuration loader.
//!
//! [`ConfigLoader`] gathers raw settings, lets the caller adjust them through
//! its public fields and validates everything in [`ConfigLoader::build`].

use std::sync::Arc;
use std::time::Duration;

use dataspine_application::{
    AuthStrategy, Clock, DEFAULT_EXCHANGE_TIMEOUT, StaticSubjectToken, SubjectTokenSource,
    TokenCachePolicy, TokenExchanger, TokenProviderFactory,
};
use dataspine_domain::{
    ApplicationId, AuthType, BehaviorVersion, ConfigurationError, ConfigurationResult,
    DEFAULT_ENDPOINT_URL, EndpointTemplate, Region,
};
use dataspine_infrastructure::{
    AwsCredentialsSource, AwsSigV4SubjectToken, DEFAULT_AWS_SIGNING_REGION, ReqwestTokenExchanger,
    Settings, SettingsLoader, SystemClock,
};
use secrecy::{ExposeSecret, SecretString};

use crate::configuration::{Configuration, ServiceEndpoints};

/// Scheme of the only supported auth token source.
const STATIC_TOKEN_PREFIX: &str = "static:";

/// Mutable configuration, turned into a [`Configuration`] by [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Behavior version of the client.
    pub behavior_version: BehaviorVersion,
    /// Default region.
    pub region: Option<String>,
    /// Endpoint template the component templates were seeded from.
    pub endpoint_url: String,
    /// Template of the ingest endpoint.
    pub ingest_endpoint_url: String,
    /// Template of the outlet endpoint.
    pub outlet_endpoint_url: String,
    /// Template of the management API endpoint.
    pub api_endpoint_url: String,
    /// Template of the STS endpoint.
    pub token_exchange_endpoint_url: String,
    /// Verify the STS certificate.
    pub verify_tls: bool,
    /// Auth token source, `static:<token>`.
    pub auth_token: Option<SecretString>,
    /// How providers authenticate.
    pub auth_type: AuthType,
    /// Free-form client name.
    pub client_name: Option<String>,
    /// Default application id.
    pub application_id: Option<String>,
    /// AWS region the caller identity is signed for.
    pub aws_signing_region: String,
    /// Where AWS credentials are read from.
    pub aws_credentials: AwsCredentialsSource,
    /// Upper bound of one exchange.
    pub exchange_timeout: Duration,
    /// Token reuse policy of exchanging providers.
    pub token_cache: TokenCachePolicy,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(BehaviorVersion::latest())
    }
}

impl ConfigLoader {
    /// Loader with every endpoint on the default template and no auth.
    #[must_use]
    pub fn new(behavior_version: BehaviorVersion) -> Self {
        Self {
            behavior_version,
            region: None,
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            ingest_endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            outlet_endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            api_endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            token_exchange_endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            verify_tls: true,
            auth_token: None,
            auth_type: AuthType::None,
            client_name: None,
            application_id: None,
            aws_signing_region: DEFAULT_AWS_SIGNING_REGION.to_string(),
            aws_credentials: AwsCredentialsSource::DefaultChain,
            exchange_timeout: DEFAULT_EXCHANGE_TIMEOUT,
            token_cache: TokenCachePolicy::default(),
        }
    }

    /// Load from `DATASPINE_*` variables and an optional `dataspine` settings file.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be read or name an unknown
    /// auth type or cache policy.
    pub fn load() -> ConfigurationResult<Self> {
        Self::load_with(&SettingsLoader::new())
    }

    /// Load through a custom [`SettingsLoader`].
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn load_with(loader: &SettingsLoader) -> ConfigurationResult<Self> {
        Self::from_settings(loader.load()?)
    }

    /// Apply raw settings over the defaults.
    ///
    /// `endpoint_url` seeds every component template; the component keys
    /// override it.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown auth type or cache policy.
    pub fn from_settings(settings: Settings) -> ConfigurationResult<Self> {
        let mut loader = Self::default();

        if let Some(endpoint_url) = settings.endpoint_url {
            loader.ingest_endpoint_url.clone_from(&endpoint_url);
            loader.outlet_endpoint_url.clone_from(&endpoint_url);
            loader.api_endpoint_url.clone_from(&endpoint_url);
            loader.token_exchange_endpoint_url.clone_from(&endpoint_url);
            loader.endpoint_url = endpoint_url;
        }
        if let Some(url) = settings.ingest_endpoint_url {
            loader.ingest_endpoint_url = url;
        }
        if let Some(url) = settings.outlet_endpoint_url {
            loader.outlet_endpoint_url = url;
        }
        if let Some(url) = settings.api_endpoint_url {
            loader.api_endpoint_url = url;
        }
        if let Some(url) = settings.token_exchange_endpoint {
            loader.token_exchange_endpoint_url = url;
        }

        if let Some(auth_type) = settings.auth_type {
            loader.auth_type = auth_type.parse()?;
        }
        if let Some(cache) = settings.token_cache {
            loader.token_cache = parse_cache_policy(&cache, settings.token_refresh_buffer_secs)?;
        } else if let Some(secs) = settings.token_refresh_buffer_secs {
            loader.token_cache = TokenCachePolicy::ReuseValid {
                refresh_buffer: Duration::from_secs(secs),
            };
        }
        if let Some(secs) = settings.exchange_timeout_secs {
            loader.exchange_timeout = Duration::from_secs(secs);
        }
        if let Some(region) = settings.aws_signing_region {
            loader.aws_signing_region = region;
        }

        loader.region = settings.region;
        loader.verify_tls = settings.verify_tls.unwrap_or(true);
        loader.auth_token = settings.auth_token_source;
        loader.client_name = settings.client_name;
        loader.application_id = settings.application_id;

        Ok(loader)
    }

    /// Validate the loader and wire the token provider factory.
    ///
    /// Nothing is sent over the network; providers exchange lazily.
    ///
    /// # Errors
    ///
    /// Returns an error if the region, application id or an endpoint
    /// template is malformed, or if the auth token source does not suit the
    /// auth type.
    pub fn build(&self) -> ConfigurationResult<Configuration> {
        self.build_with_clock(Arc::new(SystemClock::new()))
    }

    /// [`build`](Self::build) with an explicit clock.
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn build_with_clock(&self, clock: Arc<dyn Clock>) -> ConfigurationResult<Configuration> {
        let region = self.region.as_deref().map(Region::parse).transpose()?;
        let application_id = self
            .application_id
            .as_deref()
            .map(ApplicationId::parse)
            .transpose()?;

        let endpoints = ServiceEndpoints {
            ingest: EndpointTemplate::new(&self.ingest_endpoint_url),
            outlet: EndpointTemplate::new(&self.outlet_endpoint_url),
            api: EndpointTemplate::new(&self.api_endpoint_url),
            sts: EndpointTemplate::new(&self.token_exchange_endpoint_url),
        };

        let strategy = self.strategy(&clock)?;
        tracing::debug!(
            auth_type = %self.auth_type,
            behavior_version = %self.behavior_version,
            "building configuration"
        );

        let factory = TokenProviderFactory::new(strategy, clock)
            .with_sts_endpoint(endpoints.sts.clone())
            .with_cache_policy(self.token_cache)
            .with_timeout(self.exchange_timeout);

        let configuration = Configuration::new(
            self.behavior_version,
            region,
            application_id,
            self.client_name.clone(),
            EndpointTemplate::new(&self.endpoint_url),
            endpoints,
            self.verify_tls,
            factory,
        );
        configuration.validate_endpoints()?;
        Ok(configuration)
    }

    fn strategy(&self, clock: &Arc<dyn Clock>) -> ConfigurationResult<AuthStrategy> {
        match self.auth_type {
            AuthType::None => Ok(AuthStrategy::None),
            AuthType::StaticToken => {
                let source = self
                    .auth_token
                    .as_ref()
                    .ok_or_else(|| ConfigurationError::MissingAuthToken(self.auth_type.to_string()))?;
                Ok(AuthStrategy::Static(self.static_token(source)?))
            }
            AuthType::TokenExchange => {
                let subject = match &self.auth_token {
                    Some(source) => {
                        let token = self.static_token(source)?;
                        Some(Arc::new(StaticSubjectToken::new(token)) as Arc<dyn SubjectTokenSource>)
                    }
                    None => {
                        tracing::warn!(
                            "token exchange configured without an input token; supply it with TokenProvider::set_token"
                        );
                        None
                    }
                };
                Ok(AuthStrategy::Exchange {
                    exchanger: self.exchanger(clock)?,
                    subject,
                })
            }
            AuthType::AwsTokenExchange => {
                let subject = AwsSigV4SubjectToken::new(self.aws_credentials.clone(), clock.clone())
                    .with_signing_region(self.aws_signing_region.clone());
                Ok(AuthStrategy::Exchange {
                    exchanger: self.exchanger(clock)?,
                    subject: Some(Arc::new(subject)),
                })
            }
        }
    }

    fn exchanger(&self, clock: &Arc<dyn Clock>) -> ConfigurationResult<Arc<dyn TokenExchanger>> {
        Ok(Arc::new(ReqwestTokenExchanger::new(
            self.verify_tls,
            clock.clone(),
        )?))
    }

    /// Token of a `static:<token>` source.
    ///
    /// The token ends at the next colon, so `static:abc:def` yields `abc`.
    fn static_token(&self, source: &SecretString) -> ConfigurationResult<SecretString> {
        let token = source
            .expose_secret()
            .strip_prefix(STATIC_TOKEN_PREFIX)
            .and_then(|rest| rest.split(':').next())
            .ok_or(ConfigurationError::UnsupportedAuthTokenSource)?;
        if token.is_empty() {
            return Err(ConfigurationError::MissingAuthToken(
                self.auth_type.to_string(),
            ));
        }
        Ok(SecretString::from(token.to_string()))
    }
}

fn parse_cache_policy(value: &str, refresh_buffer_secs: Option<u64>) -> ConfigurationResult<TokenCachePolicy> {
    match value.trim().to_ascii_lowercase().as_str() {
        "reuse" | "reuse-valid" => Ok(refresh_buffer_secs.map_or_else(
            TokenCachePolicy::default,
            |secs| TokenCachePolicy::ReuseValid {
                refresh_buffer: Duration::from_secs(secs),
            },
        )),
        "always" | "always-exchange" => Ok(TokenCachePolicy::AlwaysExchange),
        _ => Err(ConfigurationError::InvalidSetting {
            key: "token_cache".to_string(),
            value: value.to_string(),
        }),
    }
}
