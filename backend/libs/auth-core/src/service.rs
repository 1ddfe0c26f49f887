//! Auth service capability
//!
//! Every transport adapter authorizes calls through [`AuthService`], so the
//! same identity semantics hold for HTTP, unary gRPC, streaming gRPC and
//! outbound gRPC calls.
//!
//! ## Variants
//!
//! - [`JwtAuthService`]: the `authorization` value is a signed token,
//!   optionally prefixed with `Bearer `. Cannot produce outbound credentials.
//! - [`TrustAuthService`]: the `authorization` value is the subject itself.
//!   Only for calls between services inside a trusted network boundary.

use crate::error::{AuthError, Result};
use crate::identity::Identity;
use crate::metadata::{CallMetadata, AUTHORIZATION};
use crate::verifier::TokenVerifier;
use async_trait::async_trait;
use tracing::{debug, error};

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Resolve the caller identity from inbound metadata
    ///
    /// A missing `authorization` key is an anonymous call (`Ok(None)`). A
    /// present but unverifiable value is an error and must be treated as an
    /// authentication failure, never as anonymous.
    async fn resolve_inbound(&self, metadata: &CallMetadata) -> Result<Option<Identity>>;

    /// Produce metadata for an outbound call made on behalf of `identity`
    ///
    /// Anonymous calls get empty metadata.
    fn encode_outbound(&self, identity: Option<&Identity>) -> Result<CallMetadata>;

    /// Short name used in logs and configuration
    fn kind(&self) -> &'static str;
}

/// Strip an optional, case-insensitive `Bearer ` scheme
pub fn strip_bearer(value: &str) -> &str {
    let value = value.trim();
    match value.split_once(char::is_whitespace) {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim_start(),
        _ => value,
    }
}

// ============================================================================
// JWT
// ============================================================================

pub struct JwtAuthService {
    verifier: TokenVerifier,
}

impl JwtAuthService {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }
}

#[async_trait]
impl AuthService for JwtAuthService {
    async fn resolve_inbound(&self, metadata: &CallMetadata) -> Result<Option<Identity>> {
        let Some(value) = metadata.authorization() else {
            debug!("No authorization metadata, resolving as anonymous");
            return Ok(None);
        };

        let token = strip_bearer(value);
        if token.is_empty() {
            return Ok(None);
        }

        self.verifier.verify(token).await.map(Some)
    }

    fn encode_outbound(&self, identity: Option<&Identity>) -> Result<CallMetadata> {
        // Issuing tokens is the identity provider's job; a JWT-configured
        // client has nothing it could forward.
        error!(
            subject = identity.map(Identity::subject).unwrap_or_default(),
            "JWT auth service cannot encode outbound credentials"
        );
        Err(AuthError::OutboundUnsupported(self.kind()))
    }

    fn kind(&self) -> &'static str {
        "jwt"
    }
}

// ============================================================================
// Trust passthrough
// ============================================================================

/// Treats the `authorization` value as an already-verified subject
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustAuthService;

impl TrustAuthService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuthService for TrustAuthService {
    async fn resolve_inbound(&self, metadata: &CallMetadata) -> Result<Option<Identity>> {
        match metadata.authorization() {
            Some(subject) if !subject.is_empty() => Ok(Some(Identity::new(subject))),
            _ => Ok(None),
        }
    }

    fn encode_outbound(&self, identity: Option<&Identity>) -> Result<CallMetadata> {
        let mut metadata = CallMetadata::new();
        if let Some(identity) = identity {
            metadata.append(AUTHORIZATION, identity.subject());
        }
        Ok(metadata)
    }

    fn kind(&self) -> &'static str {
        "trust"
    }
}
