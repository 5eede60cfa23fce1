//! AWS credentials used to sign the subject token.

use std::sync::OnceLock;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_credential_types::provider::error::CredentialsError;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use dataspine_domain::AuthError;
use secrecy::SecretString;

/// The default chain, loaded once per process.
static DEFAULT_CHAIN: OnceLock<Option<SharedCredentialsProvider>> = OnceLock::new();

/// A frozen set of AWS credentials.
#[derive(Debug, Clone)]
pub struct AwsCredentials {
    /// Access key id, sent in clear inside the `Authorization` header.
    pub access_key_id: String,
    /// Secret access key, only used to derive the signing key.
    pub secret_access_key: SecretString,
    /// Session token of temporary credentials.
    pub session_token: Option<SecretString>,
}

impl AwsCredentials {
    /// Create credentials from their parts.
    #[must_use]
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: SecretString,
        session_token: Option<SecretString>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key,
            session_token,
        }
    }
}

impl From<&Credentials> for AwsCredentials {
    fn from(credentials: &Credentials) -> Self {
        Self::new(
            credentials.access_key_id(),
            SecretString::from(credentials.secret_access_key().to_string()),
            credentials
                .session_token()
                .filter(|token| !token.is_empty())
                .map(|token| SecretString::from(token.to_string())),
        )
    }
}

/// Where signing credentials come from.
#[derive(Debug, Clone, Default)]
pub enum AwsCredentialsSource {
    /// The AWS default credential chain: environment variables, shared
    /// config and credentials files, SSO, web identity, container and
    /// instance roles. Asked again on every exchange.
    #[default]
    DefaultChain,
    /// A fixed set of credentials.
    Static(AwsCredentials),
    /// Any `aws-config` credentials provider.
    Provider(SharedCredentialsProvider),
}

impl AwsCredentialsSource {
    /// Wrap an `aws-config` credentials provider.
    pub fn provider(provider: impl ProvideCredentials + 'static) -> Self {
        Self::Provider(SharedCredentialsProvider::new(provider))
    }

    /// Resolve the credentials for one signature.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredentials`] when no provider in the
    /// chain holds credentials, and [`AuthError::Signing`] when a provider
    /// fails while loading them.
    pub async fn resolve(&self) -> Result<AwsCredentials, AuthError> {
        match self {
            Self::Static(credentials) => Ok(credentials.clone()),
            Self::Provider(provider) => provide(provider).await,
            Self::DefaultChain => match default_chain().await {
                Some(provider) => provide(&provider).await,
                None => Err(AuthError::MissingCredentials {
                    message: "AWS credentials not found: no credentials provider configured"
                        .to_string(),
                }),
            },
        }
    }
}

async fn default_chain() -> Option<SharedCredentialsProvider> {
    if let Some(provider) = DEFAULT_CHAIN.get() {
        return provider.clone();
    }
    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    DEFAULT_CHAIN
        .get_or_init(|| config.credentials_provider())
        .clone()
}

async fn provide(provider: &SharedCredentialsProvider) -> Result<AwsCredentials, AuthError> {
    let credentials = provider
        .provide_credentials()
        .await
        .map_err(|e| match e {
            CredentialsError::CredentialsNotLoaded(_) => AuthError::MissingCredentials {
                message: format!("AWS credentials not found: {e}"),
            },
            other => AuthError::Signing {
                message: format!("Failed to load AWS credentials: {other}"),
            },
        })?;
    Ok(AwsCredentials::from(&credentials))
}
