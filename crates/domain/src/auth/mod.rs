//! Authentication domain types

mod types;

pub use types::{
    AuthError, AuthType, AuthenticationStatus, AuthorizedStatus, IssuedToken, UnauthorizedReason,
    token_preview,
};
