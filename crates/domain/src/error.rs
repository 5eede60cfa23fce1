//! Domain error types

use thiserror::Error;

/// Configuration errors.
///
/// These are raised eagerly, while building the configuration or a token
/// provider, and never degrade into an unauthorized status.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// No region was given where one is required.
    #[error("region is required")]
    MissingRegion,

    /// The region identifier is malformed.
    #[error("invalid region: {0:?}")]
    InvalidRegion(String),

    /// No application id was given where one is required.
    #[error("application id is required")]
    MissingApplicationId,

    /// The application id is not a valid UUID.
    #[error("invalid application id: {0:?}")]
    InvalidApplicationId(String),

    /// The data product id is not a valid UUID.
    #[error("invalid data product id: {0:?}")]
    InvalidDataProductId(String),

    /// The auth type is not one of the supported values.
    #[error("unknown auth type: {0:?}")]
    UnknownAuthType(String),

    /// The selected auth type needs an auth token source.
    #[error("auth token is required for auth type {0}")]
    MissingAuthToken(String),

    /// The auth token source uses an unsupported scheme.
    #[error("only static auth tokens are supported (expected \"static:<token>\")")]
    UnsupportedAuthTokenSource,

    /// An endpoint URL template does not render to a valid URL.
    #[error("invalid endpoint URL {url:?}: {message}")]
    InvalidEndpoint {
        /// The rendered URL.
        url: String,
        /// Parser message.
        message: String,
    },

    /// Settings could not be loaded from their source.
    #[error("failed to load settings: {0}")]
    Load(String),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    /// A setting has a value outside its accepted set.
    #[error("invalid value {value:?} for setting {key}")]
    InvalidSetting {
        /// Setting name.
        key: String,
        /// Rejected value.
        value: String,
    },

    /// The runtime backing the blocking client could not be started.
    #[error("failed to start runtime: {0}")]
    Runtime(String),
}

/// Result type alias for configuration operations.
pub type ConfigurationResult<T> = Result<T, ConfigurationError>;
