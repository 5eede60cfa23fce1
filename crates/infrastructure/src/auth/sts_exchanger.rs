//! Dataspine STS token exchange over HTTP.

use std::sync::Arc;

use async_trait::async_trait;
use dataspine_application::{Clock, ExchangeRequest, GRANT_TYPE_TOKEN_EXCHANGE, TokenExchanger};
use dataspine_domain::{AuthError, ConfigurationError, ConfigurationResult, IssuedToken};
use secrecy::ExposeSecret;
use serde::Deserialize;

/// Path of the exchange below the STS endpoint.
const TOKEN_PATH: &str = "/token";

/// Token response from the STS.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// OAuth-style error response.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// [`TokenExchanger`] speaking to the Dataspine STS with reqwest.
///
/// The subject token, grant type and subject token type travel as query
/// parameters of a `POST {endpoint}/token`.
#[derive(Debug, Clone)]
pub struct ReqwestTokenExchanger {
    http_client: reqwest::Client,
    clock: Arc<dyn Clock>,
}

impl ReqwestTokenExchanger {
    /// Create an exchanger with its own HTTP client.
    ///
    /// `verify_tls = false` disables certificate validation and must not be
    /// used in production.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(verify_tls: bool, clock: Arc<dyn Clock>) -> ConfigurationResult<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("dataspine-rust/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::none());

        if !verify_tls {
            tracing::warn!("TLS certificate verification is disabled for the token exchange");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http_client = builder
            .build()
            .map_err(|e| ConfigurationError::HttpClient(e.to_string()))?;

        Ok(Self { http_client, clock })
    }

    /// Create an exchanger with a custom reqwest client.
    #[must_use]
    pub fn with_client(http_client: reqwest::Client, clock: Arc<dyn Clock>) -> Self {
        Self { http_client, clock }
    }

    fn exchange_url(request: &ExchangeRequest) -> Result<String, AuthError> {
        let params = [
            ("subject_token", request.subject_token.expose_secret()),
            ("grant_type", GRANT_TYPE_TOKEN_EXCHANGE),
            ("subject_token_type", request.subject_token_type.as_str()),
        ];
        let query = serde_urlencoded::to_string(params).map_err(|e| AuthError::Network {
            message: format!("Failed to encode query: {e}"),
        })?;

        Ok(format!(
            "{}{TOKEN_PATH}?{query}",
            request.endpoint.trim_end_matches('/')
        ))
    }

    fn rejection(status: reqwest::StatusCode, body: &str) -> AuthError {
        let message = serde_json::from_str::<TokenErrorResponse>(body).map_or_else(
            |_| format!("Token request failed: {body}"),
            |error| error.error_description.unwrap_or(error.error),
        );

        if status.is_client_error() {
            AuthError::Rejected {
                status: status.as_u16(),
                message,
            }
        } else {
            AuthError::Network {
                message: format!("{status}: {message}"),
            }
        }
    }
}

#[async_trait]
impl TokenExchanger for ReqwestTokenExchanger {
    async fn exchange(&self, request: &ExchangeRequest) -> Result<IssuedToken, AuthError> {
        let url = Self::exchange_url(request)?;
        tracing::debug!(endpoint = %request.endpoint, subject_token_type = %request.subject_token_type, "exchanging token");

        let response = self
            .http_client
            .post(url)
            .send()
            .await
            .map_err(|e: reqwest::Error| AuthError::Network {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Self::rejection(status, &error_text));
        }

        let token_response: TokenResponse =
            response
                .json()
                .await
                .map_err(|e: reqwest::Error| AuthError::InvalidResponse {
                    message: format!("Failed to parse token response: {e}"),
                })?;

        Ok(IssuedToken::new(
            token_response.access_token,
            token_response
                .token_type
                .unwrap_or_else(|| "Bearer".to_string()),
            token_response.expires_in,
            self.clock.now(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::SystemClock;
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;
    use secrecy::SecretString;
    use serde_json::json;

    fn exchanger() -> ReqwestTokenExchanger {
        ReqwestTokenExchanger::new(true, Arc::new(SystemClock::new())).unwrap()
    }

    fn request(endpoint: String) -> ExchangeRequest {
        ExchangeRequest {
            endpoint,
            subject_token: SecretString::from("subject value".to_string()),
            subject_token_type: "urn:ietf:params:oauth:token-type:id_token".to_string(),
        }
    }

    #[test]
    fn test_exchange_url_encodes_parameters() {
        let url = ReqwestTokenExchanger::exchange_url(&request(
            "https://sts.eu-west-1.cloud.dataspine.tech/".to_string(),
        ))
        .unwrap();
        assert_eq!(
            url,
            "https://sts.eu-west-1.cloud.dataspine.tech/token?subject_token=subject+value\
             &grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Atoken-exchange\
             &subject_token_type=urn%3Aietf%3Aparams%3Aoauth%3Atoken-type%3Aid_token"
        );
    }

    #[tokio::test]
    async fn test_successful_exchange() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/sts/token")
                    .query_param("subject_token", "subject value")
                    .query_param("grant_type", GRANT_TYPE_TOKEN_EXCHANGE)
                    .query_param(
                        "subject_token_type",
                        "urn:ietf:params:oauth:token-type:id_token",
                    );
                then.status(200).json_body(json!({
                    "access_token": "dsp-access",
                    "token_type": "Bearer",
                    "expires_in": 900
                }));
            })
            .await;

        let token = exchanger()
            .exchange(&request(server.url("/sts")))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(token.access_token, "dsp-access");
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(
            token.expires_at,
            Some(token.issued_at + chrono::Duration::seconds(900))
        );
    }

    #[tokio::test]
    async fn test_missing_token_type_defaults_to_bearer() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/token");
                then.status(200)
                    .json_body(json!({ "access_token": "dsp-access" }));
            })
            .await;

        let token = exchanger()
            .exchange(&request(server.base_url()))
            .await
            .unwrap();
        assert_eq!(token.token_type, "Bearer");
        assert!(token.expires_at.is_none());
    }

    #[tokio::test]
    async fn test_rejection_carries_error_description() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/token");
                then.status(401).json_body(json!({
                    "error": "invalid_grant",
                    "error_description": "trust relationship expired"
                }));
            })
            .await;

        let err = exchanger()
            .exchange(&request(server.base_url()))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AuthError::Rejected {
                status: 401,
                message: "trust relationship expired".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_server_error_is_network_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/token");
                then.status(503).body("unavailable");
            })
            .await;

        let err = exchanger()
            .exchange(&request(server.base_url()))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Network { .. }));
    }

    #[tokio::test]
    async fn test_garbage_response_is_invalid() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/token");
                then.status(200).body("<html>not json</html>");
            })
            .await;

        let err = exchanger()
            .exchange(&request(server.base_url()))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidResponse { .. }));
    }
}
