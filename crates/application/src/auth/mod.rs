//! Token providers for the Dataspine client.
//!
//! This module provides:
//! - The `TokenProvider` contract and its two implementations
//! - Per-provider token caching with expiry tracking
//! - The factory binding providers to an identity triple

mod exchanging_provider;
mod factory;
mod provider;
mod static_provider;
mod token_cache;

#[cfg(test)]
mod test_support;

pub use exchanging_provider::{DEFAULT_EXCHANGE_TIMEOUT, ExchangingTokenProvider};
pub use factory::{AuthStrategy, TokenProviderFactory};
pub use provider::TokenProvider;
pub use static_provider::StaticTokenProvider;
pub use token_cache::{CacheLookup, DEFAULT_REFRESH_BUFFER, TokenCache, TokenCachePolicy};
