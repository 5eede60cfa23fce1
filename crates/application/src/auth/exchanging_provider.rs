//! Provider that obtains tokens from the Dataspine STS.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use dataspine_domain::{
    AuthError, AuthenticationStatus, IssuedToken, TokenIdentity, UnauthorizedReason,
    token_preview,
};
use secrecy::SecretString;
use tokio::sync::{Mutex, RwLock};

use super::provider::TokenProvider;
use super::token_cache::{CacheLookup, TokenCache, TokenCachePolicy};
use crate::ports::{
    Clock, ExchangeRequest, StaticSubjectToken, SubjectContext, SubjectTokenSource, TokenExchanger,
};

/// Upper bound on one subject-token-plus-exchange round.
pub const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Token provider performing STS token exchanges.
///
/// Concurrent callers on one provider are serialized so that at most one
/// exchange is in flight; the second caller sees the first caller's token.
#[derive(Debug)]
pub struct ExchangingTokenProvider {
    identity: TokenIdentity,
    sts_endpoint: String,
    subject: RwLock<Option<Arc<dyn SubjectTokenSource>>>,
    exchanger: Arc<dyn TokenExchanger>,
    clock: Arc<dyn Clock>,
    cache: TokenCache,
    timeout: Duration,
    in_flight: Mutex<()>,
}

impl ExchangingTokenProvider {
    /// Create a provider for `identity` talking to `sts_endpoint`.
    ///
    /// Nothing is sent until the status is first requested. Without a
    /// subject source the provider reports `Unauthorized(NoCredentials)`.
    #[must_use]
    pub fn new(
        identity: TokenIdentity,
        sts_endpoint: impl Into<String>,
        subject: Option<Arc<dyn SubjectTokenSource>>,
        exchanger: Arc<dyn TokenExchanger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            identity,
            sts_endpoint: sts_endpoint.into(),
            subject: RwLock::new(subject),
            exchanger,
            clock,
            cache: TokenCache::default(),
            timeout: DEFAULT_EXCHANGE_TIMEOUT,
            in_flight: Mutex::new(()),
        }
    }

    /// Set the cache policy.
    #[must_use]
    pub fn with_cache_policy(mut self, policy: TokenCachePolicy) -> Self {
        self.cache = TokenCache::new(policy);
        self
    }

    /// Set the exchange timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The STS endpoint this provider exchanges against.
    #[must_use]
    pub fn sts_endpoint(&self) -> &str {
        &self.sts_endpoint
    }

    /// The last issued token, valid or not.
    pub async fn cached_token(&self) -> Option<IssuedToken> {
        self.cache.get().await
    }

    /// Forget the cached token so the next call exchanges again.
    pub async fn invalidate(&self) {
        self.cache.clear().await;
    }

    /// Replace the subject token source.
    ///
    /// Waits for a running exchange, then drops the cached token so the
    /// next call exchanges with the new subject.
    pub async fn set_subject(&self, subject: Arc<dyn SubjectTokenSource>) {
        let _guard = self.in_flight.lock().await;
        *self.subject.write().await = Some(subject);
        self.cache.clear().await;
        tracing::debug!(identity = %self.identity, "subject token replaced");
    }

    async fn exchange(&self) -> Result<IssuedToken, AuthError> {
        let subject = self.subject.read().await.clone();
        let Some(subject) = subject else {
            return Err(AuthError::MissingCredentials {
                message: "no subject token configured".to_string(),
            });
        };

        let round = async {
            let subject_token = subject
                .subject_token(SubjectContext {
                    identity: &self.identity,
                    sts_endpoint: &self.sts_endpoint,
                })
                .await?;
            let request = ExchangeRequest {
                endpoint: self.sts_endpoint.clone(),
                subject_token,
                subject_token_type: subject.subject_token_type().to_string(),
            };
            self.exchanger.exchange(&request).await
        };

        tokio::time::timeout(self.timeout, round)
            .await
            .unwrap_or_else(|_| {
                Err(AuthError::Timeout {
                    seconds: self.timeout.as_secs(),
                })
            })
    }

    async fn resolve(&self) -> AuthenticationStatus {
        let _guard = self.in_flight.lock().await;

        let (stale, expired) = match self.cache.lookup(self.clock.now()).await {
            CacheLookup::Fresh(token) => {
                tracing::debug!(identity = %self.identity, "reusing cached token");
                return AuthenticationStatus::from_issued(&token, true);
            }
            CacheLookup::Expiring(token) => (Some(token), false),
            CacheLookup::Expired => (None, true),
            CacheLookup::Empty => (None, false),
        };

        match self.exchange().await {
            Ok(token) => {
                tracing::debug!(
                    identity = %self.identity,
                    token = %token_preview(&token.access_token),
                    expires_at = ?token.expires_at,
                    "token exchanged"
                );
                let status = AuthenticationStatus::from_issued(&token, true);
                if status.is_authorized() {
                    self.cache.store(token).await;
                }
                status
            }
            Err(error) => {
                tracing::error!(identity = %self.identity, %error, "error exchanging token");
                match stale {
                    Some(token) => match AuthenticationStatus::from_issued(&token, true) {
                        AuthenticationStatus::Authorized(status) => {
                            AuthenticationStatus::Authorized(status.with_last_error(error))
                        }
                        unauthorized @ AuthenticationStatus::Unauthorized(_) => unauthorized,
                    },
                    None if expired => {
                        AuthenticationStatus::Unauthorized(UnauthorizedReason::Expired { error })
                    }
                    None => AuthenticationStatus::Unauthorized(UnauthorizedReason::from_error(error)),
                }
            }
        }
    }
}

impl TokenProvider for ExchangingTokenProvider {
    fn identity(&self) -> &TokenIdentity {
        &self.identity
    }

    fn get_authentication_status<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = AuthenticationStatus> + Send + 'a>> {
        Box::pin(self.resolve())
    }

    fn set_token<'a>(&'a self, token: SecretString) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(self.set_subject(Arc::new(StaticSubjectToken::new(token))))
    }
}
