//! Dataspine client - authentication against the Dataspine platform
//!
//! Load a [`ConfigLoader`], adjust it, [`build`](ConfigLoader::build) a
//! [`Configuration`] and ask its factory for a token provider per
//! region, data product and application:
//!
//! ```no_run
//! # async fn run() -> Result<(), dataspine::ConfigurationError> {
//! use dataspine::{AuthType, AuthenticationStatus, ConfigLoader};
//!
//! let mut loader = ConfigLoader::load()?;
//! loader.auth_type = AuthType::AwsTokenExchange;
//! let configuration = loader.build()?;
//!
//! let provider = configuration.token_provider_factory().create_token_provider(
//!     "eu-west-1",
//!     "0195d8a4-7c3e-7b21-9f4e-2a6c1d8e5f30",
//!     "6f9619ff-8b86-d011-b42d-00c04fc964ff",
//! )?;
//! match provider.get_authentication_status().await {
//!     AuthenticationStatus::Authorized(status) => println!("token {}", status.last_valid_token()),
//!     AuthenticationStatus::Unauthorized(reason) => eprintln!("unauthorized: {reason}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod blocking;
pub mod configuration;
pub mod loader;

pub use blocking::BlockingTokenProvider;
pub use configuration::{Configuration, ServiceEndpoints};
pub use loader::ConfigLoader;

pub use dataspine_application::{TokenCachePolicy, TokenProvider, TokenProviderFactory};
pub use dataspine_domain::{
    ApplicationId, AuthError, AuthType, AuthenticationStatus, AuthorizedStatus, BehaviorVersion,
    Component, ConfigurationError, ConfigurationResult, DataProductId, Region, TokenIdentity,
    UnauthorizedReason,
};
pub use dataspine_infrastructure::{AwsCredentials, AwsCredentialsSource, SettingsLoader};
