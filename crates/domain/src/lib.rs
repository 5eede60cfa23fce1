//! Dataspine Domain - Core authentication types
//!
//! This crate defines the domain model of the Dataspine client.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod behavior;
pub mod endpoint;
pub mod error;
pub mod id;

pub use auth::{
    AuthError, AuthType, AuthenticationStatus, AuthorizedStatus, IssuedToken, UnauthorizedReason,
    token_preview,
};
pub use behavior::BehaviorVersion;
pub use endpoint::{Component, DEFAULT_ENDPOINT_URL, EndpointTemplate};
pub use error::{ConfigurationError, ConfigurationResult};
pub use id::{ApplicationId, DataProductId, Region, TokenIdentity, uuid_to_base32};
