//! In-memory token cache with expiry tracking.

use std::time::Duration;

use chrono::{DateTime, Utc};
use dataspine_domain::IssuedToken;
use tokio::sync::RwLock;

/// Refresh this long before a cached token expires.
pub const DEFAULT_REFRESH_BUFFER: Duration = Duration::from_secs(60);

/// Whether a provider may answer from a previously issued token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCachePolicy {
    /// Reuse a token until it is within `refresh_buffer` of expiring. Tokens
    /// without an expiry are reused indefinitely.
    ReuseValid {
        /// How long before expiry a refresh is attempted.
        refresh_buffer: Duration,
    },
    /// Exchange on every call.
    AlwaysExchange,
}

impl Default for TokenCachePolicy {
    fn default() -> Self {
        Self::ReuseValid {
            refresh_buffer: DEFAULT_REFRESH_BUFFER,
        }
    }
}

/// Cache state as seen at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// Usable without a refresh.
    Fresh(IssuedToken),
    /// Still valid, but inside the refresh buffer.
    Expiring(IssuedToken),
    /// A token was cached and has expired.
    Expired,
    /// Nothing cached, or caching is disabled.
    Empty,
}

/// Thread-safe holder of a provider's last issued token.
#[derive(Debug, Default)]
pub struct TokenCache {
    token: RwLock<Option<IssuedToken>>,
    policy: TokenCachePolicy,
}

impl TokenCache {
    /// Create an empty cache governed by `policy`.
    #[must_use]
    pub fn new(policy: TokenCachePolicy) -> Self {
        Self {
            token: RwLock::new(None),
            policy,
        }
    }

    /// The policy in force.
    #[must_use]
    pub const fn policy(&self) -> TokenCachePolicy {
        self.policy
    }

    /// Store a newly issued token, replacing the previous one.
    pub async fn store(&self, token: IssuedToken) {
        let mut slot = self.token.write().await;
        *slot = Some(token);
    }

    /// Get the cached token regardless of validity.
    pub async fn get(&self) -> Option<IssuedToken> {
        self.token.read().await.clone()
    }

    /// Remove the cached token.
    pub async fn clear(&self) -> Option<IssuedToken> {
        self.token.write().await.take()
    }

    /// Classify the cached token at `now` according to the policy.
    pub async fn lookup(&self, now: DateTime<Utc>) -> CacheLookup {
        let TokenCachePolicy::ReuseValid { refresh_buffer } = self.policy else {
            return CacheLookup::Empty;
        };
        let buffer = chrono::Duration::from_std(refresh_buffer).unwrap_or(chrono::Duration::MAX);

        let slot = self.token.read().await;
        match slot.as_ref() {
            None => CacheLookup::Empty,
            Some(token) if token.is_expired_or_expiring(now, chrono::Duration::zero()) => {
                CacheLookup::Expired
            }
            Some(token) if token.is_expired_or_expiring(now, buffer) => {
                CacheLookup::Expiring(token.clone())
            }
            Some(token) => CacheLookup::Fresh(token.clone()),
        }
    }
}
