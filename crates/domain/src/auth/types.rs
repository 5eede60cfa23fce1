//! Authentication status and token types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ConfigurationError;

/// Authentication strategy selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AuthType {
    /// No authentication; every status is unauthorized.
    #[default]
    None,
    /// A fixed token held in memory.
    StaticToken,
    /// An input token exchanged at the Dataspine STS.
    TokenExchange,
    /// AWS credentials exchanged at the Dataspine STS via a SigV4 proof.
    AwsTokenExchange,
}

impl AuthType {
    /// Returns the configuration spelling of this auth type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::StaticToken => "static-token",
            Self::TokenExchange => "token-exchange",
            Self::AwsTokenExchange => "aws-token-exchange",
        }
    }

    /// Returns true if this strategy talks to the STS endpoint.
    #[must_use]
    pub const fn is_exchange(&self) -> bool {
        matches!(self, Self::TokenExchange | Self::AwsTokenExchange)
    }
}

impl FromStr for AuthType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "none" => Ok(Self::None),
            "static-token" => Ok(Self::StaticToken),
            "token-exchange" => Ok(Self::TokenExchange),
            "aws-token-exchange" => Ok(Self::AwsTokenExchange),
            other => Err(ConfigurationError::UnknownAuthType(other.to_string())),
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A token issued by the Dataspine STS, with metadata for expiry tracking.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    /// The access token string.
    pub access_token: String,
    /// Token type (usually "Bearer").
    pub token_type: String,
    /// When the token expires (if known).
    pub expires_at: Option<DateTime<Utc>>,
    /// When this token was obtained.
    pub issued_at: DateTime<Utc>,
}

impl IssuedToken {
    /// Create a token issued at `issued_at`, expiring `expires_in_secs` later.
    #[must_use]
    pub fn new(
        access_token: String,
        token_type: String,
        expires_in_secs: Option<u64>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        let expires_at = expires_in_secs
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime));

        Self {
            access_token,
            token_type,
            expires_at,
            issued_at,
        }
    }

    /// Check if the token is expired or will expire within the given buffer.
    #[must_use]
    pub fn is_expired_or_expiring(&self, now: DateTime<Utc>, buffer: Duration) -> bool {
        self.expires_at.is_some_and(|expires_at| {
            now.checked_add_signed(buffer)
                .is_none_or(|deadline| deadline >= expires_at)
        })
    }

    /// Returns the Authorization header value.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("access_token", &token_preview(&self.access_token))
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// Shortest token whose first characters may be shown.
const PREVIEW_MIN_CHARS: usize = 24;

/// Get a preview of an access token (first 8 chars + ...).
///
/// Tokens shorter than 24 characters are masked completely.
#[must_use]
pub fn token_preview(token: &str) -> String {
    if token.chars().count() < PREVIEW_MIN_CHARS {
        return "***".to_string();
    }
    let head: String = token.chars().take(8).collect();
    format!("{head}...")
}

/// Errors raised while obtaining a token.
///
/// These never escape a token provider; they are folded into
/// [`UnauthorizedReason`] or [`AuthorizedStatus::last_error`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No credentials were available to start an exchange.
    #[error("no credentials available: {message}")]
    MissingCredentials {
        /// Error description.
        message: String,
    },

    /// The STS rejected the exchange.
    #[error("token exchange rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code returned by the STS.
        status: u16,
        /// Error description.
        message: String,
    },

    /// The STS answered with a body that is not a token response.
    #[error("invalid token response: {message}")]
    InvalidResponse {
        /// Error description.
        message: String,
    },

    /// The exchange did not complete in time.
    #[error("token exchange timed out after {seconds}s")]
    Timeout {
        /// The timeout that elapsed.
        seconds: u64,
    },

    /// The subject token could not be produced.
    #[error("failed to sign subject token: {message}")]
    Signing {
        /// Error description.
        message: String,
    },

    /// Network error.
    #[error("network error: {message}")]
    Network {
        /// Error description.
        message: String,
    },
}

/// Why a provider holds no usable token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnauthorizedReason {
    /// Nothing to authenticate with.
    NoCredentials,
    /// The STS refused the credentials.
    Rejected(AuthError),
    /// The STS could not be reached or answered garbage.
    Transport(AuthError),
    /// The exchange did not finish within the configured timeout.
    TimedOut,
    /// The last token expired and could not be renewed.
    Expired {
        /// The refresh failure.
        error: AuthError,
    },
}

impl UnauthorizedReason {
    /// Classify an exchange failure.
    #[must_use]
    pub fn from_error(error: AuthError) -> Self {
        match error {
            AuthError::MissingCredentials { .. } => Self::NoCredentials,
            AuthError::Timeout { .. } => Self::TimedOut,
            AuthError::Rejected { .. } => Self::Rejected(error),
            AuthError::InvalidResponse { .. }
            | AuthError::Signing { .. }
            | AuthError::Network { .. } => Self::Transport(error),
        }
    }

    /// The underlying error, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&AuthError> {
        match self {
            Self::NoCredentials | Self::TimedOut => None,
            Self::Rejected(error) | Self::Transport(error) | Self::Expired { error } => {
                Some(error)
            }
        }
    }
}

impl fmt::Display for UnauthorizedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => f.write_str("no credentials"),
            Self::Rejected(error) | Self::Transport(error) => error.fmt(f),
            Self::TimedOut => f.write_str("token exchange timed out"),
            Self::Expired { error } => write!(f, "token expired: {error}"),
        }
    }
}

/// A token the caller may use right now.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizedStatus {
    last_valid_token: String,
    expires_at: Option<DateTime<Utc>>,
    is_refreshing: bool,
    last_error: Option<AuthError>,
}

impl AuthorizedStatus {
    /// Wraps a token. Returns `None` for an empty token, which is never usable.
    #[must_use]
    pub fn new(
        last_valid_token: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
        is_refreshing: bool,
    ) -> Option<Self> {
        let last_valid_token = last_valid_token.into();
        if last_valid_token.is_empty() {
            return None;
        }
        Some(Self {
            last_valid_token,
            expires_at,
            is_refreshing,
            last_error: None,
        })
    }

    /// Attach the error of a refresh that failed while this token was still valid.
    #[must_use]
    pub fn with_last_error(mut self, error: AuthError) -> Self {
        self.last_error = Some(error);
        self
    }

    /// The opaque credential string.
    #[must_use]
    pub fn last_valid_token(&self) -> &str {
        &self.last_valid_token
    }

    /// End of the validity window, if the STS reported one.
    #[must_use]
    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Whether the provider renews this token on its own.
    #[must_use]
    pub const fn is_refreshing(&self) -> bool {
        self.is_refreshing
    }

    /// The most recent refresh failure, if the token is being served stale.
    #[must_use]
    pub const fn last_error(&self) -> Option<&AuthError> {
        self.last_error.as_ref()
    }
}

impl fmt::Debug for AuthorizedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizedStatus")
            .field("last_valid_token", &token_preview(&self.last_valid_token))
            .field("expires_at", &self.expires_at)
            .field("is_refreshing", &self.is_refreshing)
            .field("last_error", &self.last_error)
            .finish()
    }
}

/// Outcome of an authentication attempt.
///
/// Exactly one variant is produced per call. Match on it instead of probing
/// for a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationStatus {
    /// A valid token is available.
    Authorized(AuthorizedStatus),
    /// No usable token.
    Unauthorized(UnauthorizedReason),
}

impl AuthenticationStatus {
    /// Build an authorized status from an issued token.
    ///
    /// An empty access token cannot authorize anything and yields
    /// `Unauthorized`.
    #[must_use]
    pub fn from_issued(token: &IssuedToken, is_refreshing: bool) -> Self {
        AuthorizedStatus::new(token.access_token.clone(), token.expires_at, is_refreshing)
            .map_or_else(
                || {
                    Self::Unauthorized(UnauthorizedReason::Transport(
                        AuthError::InvalidResponse {
                            message: "empty access token".to_string(),
                        },
                    ))
                },
                Self::Authorized,
            )
    }

    /// Returns true for the authorized variant.
    #[must_use]
    pub const fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized(_))
    }

    /// The token of an authorized status.
    #[must_use]
    pub fn last_valid_token(&self) -> Option<&str> {
        match self {
            Self::Authorized(status) => Some(status.last_valid_token()),
            Self::Unauthorized(_) => None,
        }
    }
}
