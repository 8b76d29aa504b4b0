//! Identity provider abstraction for resolving bearer credentials.

use crate::domain::{PartnerId, Role};
use async_trait::async_trait;
use std::fmt;

pub mod http;
pub mod mock;

pub use http::HttpIdentityProvider;
pub use mock::MockIdentityProvider;

/// The authenticated caller a bearer credential resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Profile id of the caller; doubles as the partner id for partner roles.
    pub profile_id: PartnerId,
    /// Role as returned by the identity service. Trusted as-is.
    pub role: Role,
}

/// Identity provider trait for exchanging a bearer credential for a caller
/// identity and role.
///
/// Implementations must handle retry/backoff for transient failures.
#[async_trait]
pub trait IdentityProvider: Send + Sync + fmt::Debug {
    /// Resolve a bearer token to a caller.
    ///
    /// # Returns
    /// The caller identity, or `IdentityError::InvalidCredential` when the
    /// token is unknown, expired, or revoked.
    async fn resolve(&self, bearer_token: &str) -> Result<Caller, IdentityError>;
}

/// Error type for identity operations.
#[derive(Debug, Clone)]
pub enum IdentityError {
    /// The credential is unknown, expired, or revoked.
    InvalidCredential,
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error from the identity service (5xx after retries)
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON or malformed response)
    ParseError(String),
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityError::InvalidCredential => write!(f, "Invalid credential"),
            IdentityError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            IdentityError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            IdentityError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for IdentityError {}
