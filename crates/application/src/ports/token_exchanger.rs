//! STS token exchange port.

use async_trait::async_trait;
use dataspine_domain::{AuthError, IssuedToken};
use secrecy::SecretString;

/// Grant type of an RFC 8693 token exchange.
pub const GRANT_TYPE_TOKEN_EXCHANGE: &str = "urn:ietf:params:oauth:grant-type:token-exchange";

/// One exchange of a subject token for a Dataspine token.
#[derive(Debug, Clone)]
pub struct ExchangeRequest {
    /// Base URL of the STS; the adapter appends its token path.
    pub endpoint: String,
    /// The credential being exchanged.
    pub subject_token: SecretString,
    /// URN describing `subject_token`.
    pub subject_token_type: String,
}

/// Port for the remote security token service.
///
/// Implementations perform exactly one exchange per call and report
/// rejections as [`AuthError`]; they do not cache.
#[async_trait]
pub trait TokenExchanger: Send + Sync + std::fmt::Debug {
    /// Exchange `request.subject_token` for an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the STS cannot be reached, rejects the subject
    /// token or answers with something other than a token.
    async fn exchange(&self, request: &ExchangeRequest) -> Result<IssuedToken, AuthError>;
}
