//! Authentication core for marketplace services
//!
//! Verifies caller identities and carries them through a request, independent
//! of the transport the request arrived on.
//!
//! ## Core Components
//!
//! - **ClaimSet**: normalized token payload (string or integer subjects)
//! - **SecretResolver**: verification key from a key source, cached for the
//!   process lifetime
//! - **TokenVerifier**: signature and claims validation
//! - **AuthService**: capability shared by every transport adapter, with the
//!   `JwtAuthService` and `TrustAuthService` variants
//! - **CallerContext**: per-request identity state (unset, anonymous,
//!   authenticated)
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use auth_core::{AuthConfig, AuthMode, CallMetadata, CallerContext};
//!
//! # async fn example() -> Result<(), auth_core::AuthError> {
//! let config = AuthConfig::from_env()?;
//! let auth = config.build_service(AuthMode::Jwt)?;
//!
//! let metadata = CallMetadata::with_authorization("Bearer eyJhbGc...");
//! let context = CallerContext::resolved(auth.resolve_inbound(&metadata).await?);
//! let identity = context.require_identity()?;
//! println!("caller: {}", identity.subject());
//! # Ok(())
//! # }
//! ```

pub mod claims;
pub mod config;
pub mod context;
pub mod error;
pub mod identity;
pub mod metadata;
pub mod secret;
pub mod service;
pub mod verifier;

pub use claims::ClaimSet;
pub use config::{AuthConfig, AuthMode, KeyConfig};
pub use context::CallerContext;
pub use error::{AuthError, Result};
pub use identity::Identity;
pub use metadata::{CallMetadata, AUTHORIZATION};
pub use secret::{KeyCache, KeySource, RemoteKeySource, SecretResolver, StaticKeySource};
pub use service::{AuthService, JwtAuthService, TrustAuthService};
pub use verifier::TokenVerifier;

// Re-exported so that callers can name algorithms without a direct dependency
pub use jsonwebtoken::Algorithm;
