//! Settings loading from the environment and an optional settings file.
//!
//! Variables prefixed with `DATASPINE_` override values from the settings
//! file, which is looked up as `dataspine.{toml,yaml,json}` in the working
//! directory unless another path is given.

use std::collections::HashMap;
use std::path::PathBuf;

use config::{Config, Environment, File};
use dataspine_domain::{ConfigurationError, ConfigurationResult};
use secrecy::SecretString;
use serde::Deserialize;

/// Prefix of the environment variables read by [`SettingsLoader`].
pub const ENV_PREFIX: &str = "DATASPINE";

/// Settings file name, without extension.
pub const DEFAULT_SETTINGS_FILE: &str = "dataspine";

/// Raw client settings; every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default region for providers built from the configuration.
    pub region: Option<String>,
    /// Endpoint template seeding every component endpoint.
    pub endpoint_url: Option<String>,
    /// Template of the STS endpoint.
    pub token_exchange_endpoint: Option<String>,
    /// Template of the ingest endpoint.
    pub ingest_endpoint_url: Option<String>,
    /// Template of the outlet endpoint.
    pub outlet_endpoint_url: Option<String>,
    /// Template of the management API endpoint.
    pub api_endpoint_url: Option<String>,
    /// Free-form client name.
    pub client_name: Option<String>,
    /// Default application id.
    pub application_id: Option<String>,
    /// Token source, `static:<token>`.
    pub auth_token_source: Option<SecretString>,
    /// `none`, `static-token`, `token-exchange` or `aws-token-exchange`.
    pub auth_type: Option<String>,
    /// Verify the STS certificate, on unless set to false.
    pub verify_tls: Option<bool>,
    /// AWS region the caller identity is signed for.
    pub aws_signing_region: Option<String>,
    /// Upper bound of one exchange, in seconds.
    pub exchange_timeout_secs: Option<u64>,
    /// `reuse` (default) or `always`.
    pub token_cache: Option<String>,
    /// Seconds before expiry at which a cached token is refreshed.
    pub token_refresh_buffer_secs: Option<u64>,
}

/// Reads [`Settings`] with the `config` crate.
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    file: Option<PathBuf>,
    environment: Option<HashMap<String, String>>,
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsLoader {
    /// Loader reading the process environment and `./dataspine.*`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            file: Some(PathBuf::from(DEFAULT_SETTINGS_FILE)),
            environment: None,
        }
    }

    /// Read the settings file from `path` instead; the extension may be
    /// omitted.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Skip the settings file.
    #[must_use]
    pub fn without_file(mut self) -> Self {
        self.file = None;
        self
    }

    /// Read variables from `vars` instead of the process environment.
    #[must_use]
    pub fn with_environment(mut self, vars: HashMap<String, String>) -> Self {
        self.environment = Some(vars);
        self
    }

    /// Load the settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Load`] if the settings file is
    /// malformed or a value has the wrong type. A missing file is not an
    /// error.
    pub fn load(&self) -> ConfigurationResult<Settings> {
        let mut builder = Config::builder();

        if let Some(path) = &self.file {
            tracing::debug!(path = %path.display(), "reading optional settings file");
            builder = builder.add_source(File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .ignore_empty(true)
                .source(self.environment.clone()),
        );

        builder
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|e| ConfigurationError::Load(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;
    use std::fs;
    use tempfile::TempDir;

    fn env(vars: &[(&str, &str)]) -> HashMap<String, String> {
        vars.iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_environment_only() {
        let settings = SettingsLoader::new()
            .without_file()
            .with_environment(env(&[
                ("DATASPINE_REGION", "eu-west-1"),
                ("DATASPINE_AUTH_TYPE", "aws-token-exchange"),
                ("DATASPINE_APPLICATION_ID", "6f9619ff-8b86-d011-b42d-00c04fc964ff"),
                ("DATASPINE_VERIFY_TLS", "false"),
                ("DATASPINE_EXCHANGE_TIMEOUT_SECS", "5"),
                ("OTHER_REGION", "us-east-1"),
            ]))
            .load()
            .unwrap();

        assert_eq!(settings.region.as_deref(), Some("eu-west-1"));
        assert_eq!(settings.auth_type.as_deref(), Some("aws-token-exchange"));
        assert_eq!(
            settings.application_id.as_deref(),
            Some("6f9619ff-8b86-d011-b42d-00c04fc964ff")
        );
        assert_eq!(settings.verify_tls, Some(false));
        assert_eq!(settings.exchange_timeout_secs, Some(5));
        assert!(settings.endpoint_url.is_none());
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        let settings = SettingsLoader::new()
            .without_file()
            .with_environment(HashMap::new())
            .load()
            .unwrap();
        assert!(settings.region.is_none());
        assert!(settings.auth_type.is_none());
        assert!(settings.auth_token_source.is_none());
    }

    #[test]
    fn test_empty_variables_are_ignored() {
        let settings = SettingsLoader::new()
            .without_file()
            .with_environment(env(&[("DATASPINE_REGION", "")]))
            .load()
            .unwrap();
        assert!(settings.region.is_none());
    }

    #[test]
    fn test_file_is_overridden_by_environment() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("dataspine.toml"),
            r#"
region = "eu-central-1"
client_name = "ingest-job"
auth_token_source = "static:file-token"
endpoint_url = "https://{{component}}.{{region}}.example.test"
"#,
        )
        .unwrap();

        let settings = SettingsLoader::new()
            .with_file(dir.path().join("dataspine"))
            .with_environment(env(&[("DATASPINE_REGION", "eu-west-1")]))
            .load()
            .unwrap();

        assert_eq!(settings.region.as_deref(), Some("eu-west-1"));
        assert_eq!(settings.client_name.as_deref(), Some("ingest-job"));
        assert_eq!(
            settings.auth_token_source.unwrap().expose_secret(),
            "static:file-token"
        );
        assert_eq!(
            settings.endpoint_url.as_deref(),
            Some("https://{{component}}.{{region}}.example.test")
        );
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let settings = SettingsLoader::new()
            .with_file(dir.path().join("absent"))
            .with_environment(HashMap::new())
            .load()
            .unwrap();
        assert!(settings.region.is_none());
    }

    #[test]
    fn test_malformed_file_is_load_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("dataspine.toml"), "region = [unterminated").unwrap();

        let err = SettingsLoader::new()
            .with_file(dir.path().join("dataspine"))
            .with_environment(HashMap::new())
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::Load(_)));
    }

    #[test]
    fn test_wrong_type_is_load_error() {
        let err = SettingsLoader::new()
            .without_file()
            .with_environment(env(&[("DATASPINE_VERIFY_TLS", "sometimes")]))
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::Load(_)));
    }
}
