//! Authentication adapters.

mod aws_credentials;
mod aws_sigv4;
mod sts_exchanger;

pub use aws_credentials::{AwsCredentials, AwsCredentialsSource};
pub use aws_sigv4::{
    AWS_SIGV4_TOKEN_TYPE, AwsSigV4SubjectToken, DEFAULT_AWS_SIGNING_REGION, SignedHeaders,
    encode_subject_token, sign_caller_identity, signing_key,
};
pub use sts_exchanger::ReqwestTokenExchanger;
