//! Error kinds surfaced by the auth core.
//!
//! Every variant is a per-call failure. Transport adapters map them to
//! transport-specific rejections; nothing here is retried automatically.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Token payload decoded but its claims have the wrong shape
    #[error("malformed claims: {0}")]
    MalformedClaims(String),

    /// Verification material could not be obtained from the key source
    #[error("verification key unavailable: {0}")]
    SecretUnavailable(String),

    /// Signature, structure or claims failure, collapsed into one kind
    #[error("invalid token")]
    InvalidToken,

    /// gRPC inbound call carried no metadata container at all
    #[error("metadata is not provided")]
    MetadataMissing,

    /// Mutation attempted by an anonymous caller
    #[error("identity required")]
    IdentityRequired,

    /// Caller context was read before any transport adapter populated it
    #[error("identity not provided")]
    IdentityNotProvided,

    /// Auth variant cannot produce outbound credentials
    #[error("outbound credentials not supported by {0} auth")]
    OutboundUnsupported(&'static str),

    /// Configured key material could not be parsed
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AuthError {
    /// True for failures caused by the credentials the caller presented
    ///
    /// Transport adapters log these at `debug` and everything else, such as an
    /// unreachable key service, at `error`.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            AuthError::MalformedClaims(_)
                | AuthError::InvalidToken
                | AuthError::MetadataMissing
                | AuthError::IdentityRequired
        )
    }
}
