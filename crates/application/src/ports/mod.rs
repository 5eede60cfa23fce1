//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the token providers and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod clock;
mod subject_token;
mod token_exchanger;

pub use clock::Clock;
pub use subject_token::{ID_TOKEN_TYPE, StaticSubjectToken, SubjectContext, SubjectTokenSource};
pub use token_exchanger::{ExchangeRequest, GRANT_TYPE_TOKEN_EXCHANGE, TokenExchanger};
