//! Dataspine Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus settings loading.

pub mod adapters;
pub mod auth;
pub mod settings;

pub use adapters::SystemClock;
pub use auth::{
    AWS_SIGV4_TOKEN_TYPE, AwsCredentials, AwsCredentialsSource, AwsSigV4SubjectToken,
    DEFAULT_AWS_SIGNING_REGION, ReqwestTokenExchanger,
};
pub use settings::{DEFAULT_SETTINGS_FILE, ENV_PREFIX, Settings, SettingsLoader};
