//! Subject token source port.

use async_trait::async_trait;
use dataspine_domain::{AuthError, TokenIdentity};
use secrecy::SecretString;

/// Subject token type for a plain identity token.
pub const ID_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:id_token";

/// What a subject token is being produced for.
#[derive(Debug, Clone, Copy)]
pub struct SubjectContext<'a> {
    /// The provider's identity triple.
    pub identity: &'a TokenIdentity,
    /// The STS endpoint the token will be presented to.
    pub sts_endpoint: &'a str,
}

/// Port producing the credential that is presented to the STS.
#[async_trait]
pub trait SubjectTokenSource: Send + Sync + std::fmt::Debug {
    /// URN sent as `subject_token_type`.
    fn subject_token_type(&self) -> &str;

    /// Produce a subject token for one exchange.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredentials`] when no credential is
    /// available, or [`AuthError::Signing`] when one cannot be prepared.
    async fn subject_token(&self, context: SubjectContext<'_>) -> Result<SecretString, AuthError>;
}

/// A fixed input token, exchanged as an identity token.
#[derive(Debug, Clone)]
pub struct StaticSubjectToken {
    token: SecretString,
}

impl StaticSubjectToken {
    /// Wraps a fixed input token.
    #[must_use]
    pub const fn new(token: SecretString) -> Self {
        Self { token }
    }
}

#[async_trait]
impl SubjectTokenSource for StaticSubjectToken {
    fn subject_token_type(&self) -> &str {
        ID_TOKEN_TYPE
    }

    async fn subject_token(&self, _context: SubjectContext<'_>) -> Result<SecretString, AuthError> {
        Ok(self.token.clone())
    }
}
