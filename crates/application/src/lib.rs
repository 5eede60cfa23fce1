//! Dataspine Application - Token providers and ports
//!
//! This crate defines the application layer with:
//! - Port traits (interfaces for the STS, subject token sources and time)
//! - Token providers and their cache
//! - The token provider factory

pub mod auth;
pub mod ports;

pub use auth::{
    AuthStrategy, CacheLookup, DEFAULT_EXCHANGE_TIMEOUT, DEFAULT_REFRESH_BUFFER,
    ExchangingTokenProvider, StaticTokenProvider, TokenCache, TokenCachePolicy, TokenProvider,
    TokenProviderFactory,
};
pub use ports::{
    Clock, ExchangeRequest, GRANT_TYPE_TOKEN_EXCHANGE, ID_TOKEN_TYPE, StaticSubjectToken,
    SubjectContext, SubjectTokenSource, TokenExchanger,
};
