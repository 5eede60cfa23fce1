//! AWS SigV4 subject token.
//!
//! The subject token is a base64 JSON document carrying the headers of a
//! signed `sts:GetCallerIdentity` request. The request is never sent by the
//! client; the Dataspine STS replays it to learn the caller's IAM role. The
//! signed `X-Dataspine-STS` header binds the signature to one STS endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use dataspine_application::{Clock, SubjectContext, SubjectTokenSource};
use dataspine_domain::AuthError;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::aws_credentials::{AwsCredentials, AwsCredentialsSource};

type HmacSha256 = Hmac<Sha256>;

/// Subject token type of a SigV4 signed caller identity.
pub const AWS_SIGV4_TOKEN_TYPE: &str =
    "urn:dataspine:params:oauth:grant-type:aws-iam-role-sigv4-token-exchange";

/// Region the caller identity request is signed for.
pub const DEFAULT_AWS_SIGNING_REGION: &str = "eu-central-1";

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "sts";
const HOST: &str = "sts.amazonaws.com";
const CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const BODY: &str = "Action=GetCallerIdentity&Version=2011-06-15";

/// Headers of the signed request, in the order they are emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedHeaders {
    /// Always `application/x-www-form-urlencoded`.
    #[serde(rename = "Content-Type")]
    pub content_type: String,
    /// STS endpoint the token is meant for.
    #[serde(rename = "X-Dataspine-STS")]
    pub dataspine_sts: String,
    /// Signing time, `YYYYMMDDTHHMMSSZ`.
    #[serde(rename = "X-Amz-Date")]
    pub amz_date: String,
    /// Session token of temporary credentials.
    #[serde(rename = "X-Amz-Security-Token", skip_serializing_if = "Option::is_none")]
    pub security_token: Option<String>,
    /// The SigV4 authorization header.
    #[serde(rename = "Authorization")]
    pub authorization: String,
}

#[derive(Serialize)]
struct Payload<'a> {
    headers: &'a SignedHeaders,
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, AuthError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| AuthError::Signing {
        message: format!("Invalid HMAC key: {e}"),
    })?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Derive the SigV4 signing key for one day, region and service.
///
/// # Errors
///
/// Returns [`AuthError::Signing`] if the HMAC cannot be initialised.
pub fn signing_key(
    secret_access_key: &str,
    date: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, AuthError> {
    let k_date = hmac_sha256(format!("AWS4{secret_access_key}").as_bytes(), date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

/// Sign a `GetCallerIdentity` request bound to `sts_endpoint`.
///
/// # Errors
///
/// Returns [`AuthError::Signing`] if the signature cannot be computed.
pub fn sign_caller_identity(
    credentials: &AwsCredentials,
    region: &str,
    sts_endpoint: &str,
    signed_at: DateTime<Utc>,
) -> Result<SignedHeaders, AuthError> {
    let amz_date = signed_at.format("%Y%m%dT%H%M%SZ").to_string();
    let date = signed_at.format("%Y%m%d").to_string();
    let security_token = credentials
        .session_token
        .as_ref()
        .map(|t| t.expose_secret().to_string());

    let mut canonical_headers = vec![
        ("content-type", CONTENT_TYPE),
        ("host", HOST),
        ("x-amz-date", amz_date.as_str()),
    ];
    if let Some(token) = &security_token {
        canonical_headers.push(("x-amz-security-token", token.as_str()));
    }
    canonical_headers.push(("x-dataspine-sts", sts_endpoint));

    let signed_header_names = canonical_headers
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(";");
    let header_block: String = canonical_headers
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect();

    let canonical_request = format!(
        "POST\n/\n\n{header_block}\n{signed_header_names}\n{}",
        sha256_hex(BODY.as_bytes())
    );
    let scope = format!("{date}/{region}/{SERVICE}/aws4_request");
    let string_to_sign = format!(
        "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
        sha256_hex(canonical_request.as_bytes())
    );

    let key = signing_key(
        credentials.secret_access_key.expose_secret(),
        &date,
        region,
        SERVICE,
    )?;
    let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes())?);

    Ok(SignedHeaders {
        content_type: CONTENT_TYPE.to_string(),
        dataspine_sts: sts_endpoint.to_string(),
        amz_date,
        security_token,
        authorization: format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_header_names}, Signature={signature}",
            credentials.access_key_id
        ),
    })
}

/// Encode signed headers as the subject token.
///
/// # Errors
///
/// Returns [`AuthError::Signing`] if the payload cannot be serialized.
pub fn encode_subject_token(headers: &SignedHeaders) -> Result<String, AuthError> {
    let json = serde_json::to_vec(&Payload { headers }).map_err(|e| AuthError::Signing {
        message: format!("Failed to serialize signed headers: {e}"),
    })?;
    Ok(STANDARD.encode(json))
}

/// [`SubjectTokenSource`] signing a fresh caller identity per exchange.
#[derive(Debug, Clone)]
pub struct AwsSigV4SubjectToken {
    credentials: AwsCredentialsSource,
    signing_region: String,
    clock: Arc<dyn Clock>,
}

impl AwsSigV4SubjectToken {
    /// Create a source signing for [`DEFAULT_AWS_SIGNING_REGION`].
    #[must_use]
    pub fn new(credentials: AwsCredentialsSource, clock: Arc<dyn Clock>) -> Self {
        Self {
            credentials,
            signing_region: DEFAULT_AWS_SIGNING_REGION.to_string(),
            clock,
        }
    }

    /// Sign for another AWS region.
    #[must_use]
    pub fn with_signing_region(mut self, region: impl Into<String>) -> Self {
        self.signing_region = region.into();
        self
    }

    /// The AWS region requests are signed for.
    #[must_use]
    pub fn signing_region(&self) -> &str {
        &self.signing_region
    }
}

#[async_trait]
impl SubjectTokenSource for AwsSigV4SubjectToken {
    fn subject_token_type(&self) -> &str {
        AWS_SIGV4_TOKEN_TYPE
    }

    async fn subject_token(&self, context: SubjectContext<'_>) -> Result<SecretString, AuthError> {
        let credentials = self.credentials.resolve().await?;
        let headers = sign_caller_identity(
            &credentials,
            &self.signing_region,
            context.sts_endpoint,
            self.clock.now(),
        )?;
        tracing::debug!(
            identity = %context.identity,
            signing_region = %self.signing_region,
            "signed AWS caller identity"
        );
        encode_subject_token(&headers).map(SecretString::from)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::SystemClock;
    use chrono::TimeZone;
    use dataspine_domain::TokenIdentity;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    const SECRET: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";
    const STS_ENDPOINT: &str = "https://sts-abc.eu-west-1.cloud.dataspine.tech";

    fn credentials(session_token: Option<&str>) -> AwsCredentials {
        AwsCredentials::new(
            "AKIDEXAMPLE",
            SecretString::from(SECRET.to_string()),
            session_token.map(|t| SecretString::from(t.to_string())),
        )
    }

    fn signed_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_signing_key_derivation() {
        let key = signing_key(SECRET, "20120215", "us-east-1", "iam").unwrap();
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn test_sign_without_session_token() {
        let headers = sign_caller_identity(
            &credentials(None),
            DEFAULT_AWS_SIGNING_REGION,
            STS_ENDPOINT,
            signed_at(),
        )
        .unwrap();

        assert_eq!(headers.amz_date, "20250120T120000Z");
        assert_eq!(headers.dataspine_sts, STS_ENDPOINT);
        assert!(headers.security_token.is_none());
        assert_eq!(
            headers.authorization,
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20250120/eu-central-1/sts/aws4_request, \
             SignedHeaders=content-type;host;x-amz-date;x-dataspine-sts, \
             Signature=1c57e38cfcc3bfcee275bae8a43d990a7b732d6998b5d878c01fc9f50e5cdb5f"
        );
    }

    #[test]
    fn test_sign_with_session_token() {
        let headers = sign_caller_identity(
            &credentials(Some("session-token")),
            DEFAULT_AWS_SIGNING_REGION,
            STS_ENDPOINT,
            signed_at(),
        )
        .unwrap();

        assert_eq!(headers.security_token.as_deref(), Some("session-token"));
        assert_eq!(
            headers.authorization,
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20250120/eu-central-1/sts/aws4_request, \
             SignedHeaders=content-type;host;x-amz-date;x-amz-security-token;x-dataspine-sts, \
             Signature=872ccb9e2cfcd3c69533ecfaa7fd815d78e684ca4dbf571c381e4643d6f47a77"
        );
    }

    #[test]
    fn test_subject_token_payload_shape() {
        let headers = sign_caller_identity(
            &credentials(None),
            DEFAULT_AWS_SIGNING_REGION,
            STS_ENDPOINT,
            signed_at(),
        )
        .unwrap();
        let token = encode_subject_token(&headers).unwrap();

        let decoded: Value = serde_json::from_slice(&STANDARD.decode(token).unwrap()).unwrap();
        let object = decoded["headers"].as_object().unwrap();
        assert_eq!(object["Content-Type"], CONTENT_TYPE);
        assert_eq!(object["X-Dataspine-STS"], STS_ENDPOINT);
        assert_eq!(object["X-Amz-Date"], "20250120T120000Z");
        assert!(!object.contains_key("X-Amz-Security-Token"));
        assert!(object["Authorization"].as_str().unwrap().starts_with(ALGORITHM));
    }

    #[tokio::test]
    async fn test_source_binds_to_sts_endpoint() {
        let identity = TokenIdentity::parse(
            "eu-west-1",
            "0195d8a4-7c3e-7b21-9f4e-2a6c1d8e5f30",
            "6f9619ff-8b86-d011-b42d-00c04fc964ff",
        )
        .unwrap();
        let source = AwsSigV4SubjectToken::new(
            AwsCredentialsSource::Static(credentials(None)),
            Arc::new(SystemClock::new()),
        );
        assert_eq!(source.subject_token_type(), AWS_SIGV4_TOKEN_TYPE);
        assert_eq!(source.signing_region(), DEFAULT_AWS_SIGNING_REGION);

        let token = source
            .subject_token(SubjectContext {
                identity: &identity,
                sts_endpoint: STS_ENDPOINT,
            })
            .await
            .unwrap();
        let decoded: Value =
            serde_json::from_slice(&STANDARD.decode(token.expose_secret()).unwrap()).unwrap();
        assert_eq!(decoded["headers"]["X-Dataspine-STS"], STS_ENDPOINT);
    }
}
