//! Test doubles for the provider ports.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use dataspine_domain::{AuthError, IssuedToken, TokenIdentity};
use secrecy::{ExposeSecret, SecretString};

use crate::ports::{Clock, ExchangeRequest, SubjectContext, SubjectTokenSource, TokenExchanger};

pub const REGION: &str = "eu-west-1";
pub const APPLICATION_ID: &str = "6f9619ff-8b86-d011-b42d-00c04fc964ff";
pub const DATA_PRODUCT_ID: &str = "0195d8a4-7c3e-7b21-9f4e-2a6c1d8e5f30";
pub const OTHER_DATA_PRODUCT_ID: &str = "0195d8a4-7c3e-7b21-9f4e-2a6c1d8e5f31";

#[allow(clippy::unwrap_used)]
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

#[allow(clippy::unwrap_used)]
pub fn identity() -> TokenIdentity {
    TokenIdentity::parse(REGION, DATA_PRODUCT_ID, APPLICATION_ID).unwrap()
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    #[allow(clippy::unwrap_used)]
    pub fn set(&self, now: DateTime<Utc>) {
        *self.0.lock().unwrap() = now;
    }
}

impl Clock for ManualClock {
    #[allow(clippy::unwrap_used)]
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Exchanger answering from a script, one entry per call.
#[derive(Debug, Default)]
pub struct ScriptedExchanger {
    script: Mutex<VecDeque<Result<IssuedToken, AuthError>>>,
    requests: Mutex<Vec<(String, String, String)>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedExchanger {
    pub fn new(script: impl IntoIterator<Item = Result<IssuedToken, AuthError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(endpoint, subject_token, subject_token_type)` of every call.
    #[allow(clippy::unwrap_used)]
    pub fn requests(&self) -> Vec<(String, String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenExchanger for ScriptedExchanger {
    #[allow(clippy::unwrap_used)]
    async fn exchange(&self, request: &ExchangeRequest) -> Result<IssuedToken, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push((
            request.endpoint.clone(),
            request.subject_token.expose_secret().to_string(),
            request.subject_token_type.clone(),
        ));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(AuthError::Network {
                    message: "script exhausted".to_string(),
                })
            })
    }
}

/// Subject source that always fails to produce a credential.
#[derive(Debug)]
pub struct NoCredentials;

#[async_trait]
impl SubjectTokenSource for NoCredentials {
    fn subject_token_type(&self) -> &str {
        "urn:test:none"
    }

    async fn subject_token(&self, _context: SubjectContext<'_>) -> Result<SecretString, AuthError> {
        Err(AuthError::MissingCredentials {
            message: "nothing configured".to_string(),
        })
    }
}

pub fn issued(token: &str, expires_in: Option<u64>, issued_at: DateTime<Utc>) -> IssuedToken {
    IssuedToken::new(token.to_string(), "Bearer".to_string(), expires_in, issued_at)
}

pub fn rejected() -> AuthError {
    AuthError::Rejected {
        status: 401,
        message: "invalid_grant".to_string(),
    }
}
