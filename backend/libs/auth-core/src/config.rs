//! Auth configuration
//!
//! Loads verification settings from environment variables and builds the
//! configured [`AuthService`] variant for each transport.
//!
//! **Environment Variables**:
//! - `APP_ENV`: deployment environment (default: development)
//! - `JWT_SECRET`: HMAC shared secret, takes precedence over other key settings
//! - `JWT_PUBLIC_KEY_PEM`: RSA public key in PEM format
//! - `KEY_SERVICE_URL`: key-distribution endpoint fetched on first verification
//! - `JWT_ALG`: signature algorithm (default: HS256 with a secret, RS256 otherwise)
//! - `KEY_FETCH_TIMEOUT_MS`: key endpoint timeout (default: 5000)

use crate::error::{AuthError, Result};
use crate::secret::{KeyCache, KeySource, RemoteKeySource, SecretResolver, StaticKeySource};
use crate::service::{AuthService, JwtAuthService, TrustAuthService};
use crate::verifier::TokenVerifier;
use jsonwebtoken::Algorithm;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_KEY_FETCH_TIMEOUT_MS: u64 = 5000;

/// Which [`AuthService`] variant a transport uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Jwt,
    Trust,
}

impl AuthMode {
    /// Read a mode from `var`, falling back to `default` when unset
    pub fn from_env(var: &str, default: AuthMode) -> Result<Self> {
        match std::env::var(var) {
            Ok(value) => value
                .parse()
                .map_err(|e| AuthError::Configuration(format!("{var}: {e}"))),
            Err(_) => Ok(default),
        }
    }
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jwt" => Ok(AuthMode::Jwt),
            "trust" | "userid" => Ok(AuthMode::Trust),
            other => Err(format!("unknown auth mode '{other}' (expected jwt or trust)")),
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::Jwt => f.write_str("jwt"),
            AuthMode::Trust => f.write_str("trust"),
        }
    }
}

/// Where verification material comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyConfig {
    Secret(String),
    PublicKeyPem(String),
    Remote { url: String, timeout: Duration },
}

/// Verification settings for one process
///
/// Every JWT service built from a configuration, or from any of its clones,
/// shares one [`KeyCache`], so the key is fetched at most once per process.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub app_env: String,
    pub algorithm: Algorithm,
    pub key: Option<KeyConfig>,
    key_cache: Arc<KeyCache>,
}

impl AuthConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let app_env = var("APP_ENV").unwrap_or_else(|| "development".to_string());

        let timeout_ms = match var("KEY_FETCH_TIMEOUT_MS") {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                AuthError::Configuration(format!("KEY_FETCH_TIMEOUT_MS is not a number: {raw}"))
            })?,
            None => DEFAULT_KEY_FETCH_TIMEOUT_MS,
        };

        let key = if let Some(secret) = var("JWT_SECRET") {
            Some(KeyConfig::Secret(secret))
        } else if let Some(pem) = var("JWT_PUBLIC_KEY_PEM") {
            Some(KeyConfig::PublicKeyPem(pem))
        } else {
            var("KEY_SERVICE_URL").map(|url| KeyConfig::Remote {
                url,
                timeout: Duration::from_millis(timeout_ms),
            })
        };

        let algorithm = match var("JWT_ALG") {
            Some(raw) => Algorithm::from_str(raw.trim())
                .map_err(|_| AuthError::Configuration(format!("unsupported JWT_ALG: {raw}")))?,
            None => match key {
                Some(KeyConfig::Secret(_)) => Algorithm::HS256,
                _ => Algorithm::RS256,
            },
        };

        Ok(Self {
            app_env,
            algorithm,
            key,
            key_cache: Arc::new(KeyCache::new()),
        })
    }

    pub fn is_production(&self) -> bool {
        matches!(
            self.app_env.to_ascii_lowercase().as_str(),
            "production" | "prod"
        )
    }

    /// Build the auth service for `mode`
    ///
    /// ## Errors
    ///
    /// - trust mode requested in production
    /// - JWT mode without any key configuration
    /// - unparseable key material
    pub fn build_service(&self, mode: AuthMode) -> Result<Arc<dyn AuthService>> {
        match mode {
            AuthMode::Trust => {
                if self.is_production() {
                    return Err(AuthError::Configuration(
                        "trust auth mode is not allowed in production".to_string(),
                    ));
                }
                warn!(env = %self.app_env, "Trust auth mode enabled; caller identities are not verified");
                Ok(Arc::new(TrustAuthService::new()))
            }
            AuthMode::Jwt => {
                let verifier = TokenVerifier::new(
                    SecretResolver::with_shared_cache(
                        self.key_source()?,
                        Arc::clone(&self.key_cache),
                    ),
                    self.algorithm,
                );
                info!(algorithm = ?self.algorithm, "JWT auth mode enabled");
                Ok(Arc::new(JwtAuthService::new(verifier)))
            }
        }
    }

    fn key_source(&self) -> Result<Arc<dyn KeySource>> {
        match &self.key {
            Some(KeyConfig::Secret(secret)) => {
                Ok(Arc::new(StaticKeySource::hmac_secret(secret.as_bytes())))
            }
            Some(KeyConfig::PublicKeyPem(pem)) => Ok(Arc::new(StaticKeySource::rsa_pem(pem)?)),
            Some(KeyConfig::Remote { url, timeout }) => {
                Ok(Arc::new(RemoteKeySource::new(url.clone(), *timeout)?))
            }
            None => Err(AuthError::Configuration(
                "JWT auth requires JWT_SECRET, JWT_PUBLIC_KEY_PEM or KEY_SERVICE_URL".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AuthConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AuthConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.app_env, "development");
        assert_eq!(config.algorithm, Algorithm::RS256);
        assert!(config.key.is_none());
    }

    #[test]
    fn test_secret_defaults_to_hs256() {
        let config = config(&[("JWT_SECRET", "secret"), ("KEY_SERVICE_URL", "http://keys")]).unwrap();
        assert_eq!(config.algorithm, Algorithm::HS256);
        assert_eq!(config.key, Some(KeyConfig::Secret("secret".into())));
    }

    #[test]
    fn test_remote_key_with_timeout() {
        let config = config(&[
            ("KEY_SERVICE_URL", "http://keys/public"),
            ("KEY_FETCH_TIMEOUT_MS", "250"),
        ])
        .unwrap();

        assert_eq!(
            config.key,
            Some(KeyConfig::Remote {
                url: "http://keys/public".into(),
                timeout: Duration::from_millis(250),
            })
        );
        assert_eq!(config.algorithm, Algorithm::RS256);
    }

    #[test]
    fn test_explicit_algorithm() {
        let explicit = config(&[("JWT_SECRET", "s"), ("JWT_ALG", "HS512")]).unwrap();
        assert_eq!(explicit.algorithm, Algorithm::HS512);

        assert!(matches!(
            config(&[("JWT_ALG", "ROT13")]),
            Err(AuthError::Configuration(_))
        ));
    }

    #[test]
    fn test_invalid_timeout() {
        assert!(matches!(
            config(&[("KEY_FETCH_TIMEOUT_MS", "soon")]),
            Err(AuthError::Configuration(_))
        ));
    }

    #[test]
    fn test_trust_refused_in_production() {
        let config = config(&[("APP_ENV", "production")]).unwrap();
        assert!(matches!(
            config.build_service(AuthMode::Trust),
            Err(AuthError::Configuration(_))
        ));
    }

    #[test]
    fn test_build_services() {
        let config = config(&[("JWT_SECRET", "secret")]).unwrap();
        assert_eq!(config.build_service(AuthMode::Jwt).unwrap().kind(), "jwt");
        assert_eq!(config.build_service(AuthMode::Trust).unwrap().kind(), "trust");
    }

    #[test]
    fn test_jwt_without_key_is_error() {
        let config = config(&[]).unwrap();
        assert!(matches!(
            config.build_service(AuthMode::Jwt),
            Err(AuthError::Configuration(_))
        ));
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!("JWT".parse::<AuthMode>(), Ok(AuthMode::Jwt));
        assert_eq!("trust".parse::<AuthMode>(), Ok(AuthMode::Trust));
        assert_eq!("userid".parse::<AuthMode>(), Ok(AuthMode::Trust));
        assert!("oauth".parse::<AuthMode>().is_err());
    }

    #[test]
    #[serial]
    fn test_mode_from_env() {
        std::env::remove_var("AUTH_CORE_TEST_MODE");
        assert_eq!(
            AuthMode::from_env("AUTH_CORE_TEST_MODE", AuthMode::Trust),
            Ok(AuthMode::Trust)
        );

        std::env::set_var("AUTH_CORE_TEST_MODE", "jwt");
        assert_eq!(
            AuthMode::from_env("AUTH_CORE_TEST_MODE", AuthMode::Trust),
            Ok(AuthMode::Jwt)
        );

        std::env::set_var("AUTH_CORE_TEST_MODE", "bogus");
        assert!(AuthMode::from_env("AUTH_CORE_TEST_MODE", AuthMode::Trust).is_err());
        std::env::remove_var("AUTH_CORE_TEST_MODE");
    }
}
