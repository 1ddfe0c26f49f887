//! Secret resolver
//!
//! Obtains the verification key used by [`TokenVerifier`](crate::TokenVerifier).
//! Keys come from a [`KeySource`] and are held in a [`KeyCache`] owned by the
//! resolver for the lifetime of the process.
//!
//! ## Key sources
//!
//! - [`RemoteKeySource`]: HTTP GET against a key-distribution endpoint. The
//!   body is either an RSA JWK (`{"kty":"RSA","n":"..","e":".."}`) or a
//!   component document `{"N": <decimal modulus>, "E": <exponent>}`.
//! - [`StaticKeySource`]: HMAC shared secret or RSA public key PEM provided
//!   through configuration.
//!
//! ## Caching
//!
//! Reads take a shared lock. A cache miss joins the in-flight fetch if there
//! is one and starts it otherwise, so N concurrent callers trigger one fetch
//! and all of them receive its outcome, success or failure, within the one
//! source timeout. A failed fetch leaves the slot empty and the next call
//! tries again. Cached keys are never refreshed.
//!
//! A [`KeyCache`] can be shared between resolvers with
//! [`SecretResolver::with_shared_cache`], which is how one process keeps a
//! single key across several auth services.

use crate::error::{AuthError, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use futures::future::{BoxFuture, FutureExt, Shared};
use jsonwebtoken::DecodingKey;
use parking_lot::{Mutex, RwLock};
use rsa::BigUint;
use serde::Deserialize;
use serde_json::value::RawValue;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

// ============================================================================
// Key Sources
// ============================================================================

/// Origin of verification material
#[async_trait]
pub trait KeySource: Send + Sync {
    async fn fetch(&self) -> Result<DecodingKey>;
}

/// Fetches the verification key from a key-distribution endpoint
pub struct RemoteKeySource {
    url: String,
    client: reqwest::Client,
}

impl RemoteKeySource {
    /// Create a source bound to `url`
    ///
    /// Every fetch is bounded by `timeout`; expiry surfaces as
    /// `AuthError::SecretUnavailable`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Configuration(format!("key service client: {e}")))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl KeySource for RemoteKeySource {
    async fn fetch(&self) -> Result<DecodingKey> {
        debug!(url = %self.url, "Fetching verification key");

        let response = self.client.get(&self.url).send().await.map_err(|e| {
            warn!(url = %self.url, error = %e, "Key service request failed");
            AuthError::SecretUnavailable(format!("request failed: {e}"))
        })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!(url = %self.url, status = %status, "Key service returned unexpected status");
            return Err(AuthError::SecretUnavailable(format!(
                "unexpected status {status}"
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            warn!(url = %self.url, error = %e, "Failed to read key service response");
            AuthError::SecretUnavailable(format!("reading body: {e}"))
        })?;

        parse_key_document(&body)
    }
}

/// Verification material configured out-of-band
#[derive(Clone)]
pub struct StaticKeySource {
    key: DecodingKey,
}

impl StaticKeySource {
    /// Shared secret for HMAC algorithms
    pub fn hmac_secret(secret: &[u8]) -> Self {
        Self {
            key: DecodingKey::from_secret(secret),
        }
    }

    /// RSA public key in PEM format (PKCS#1 or SPKI)
    pub fn rsa_pem(pem: &str) -> Result<Self> {
        let key = DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| AuthError::InvalidKey(format!("RSA public key PEM: {e}")))?;
        Ok(Self { key })
    }

    /// Key document in either of the shapes served by the key endpoint
    pub fn key_document(body: &[u8]) -> Result<Self> {
        parse_key_document(body)
            .map(|key| Self { key })
            .map_err(|e| AuthError::InvalidKey(e.to_string()))
    }
}

#[async_trait]
impl KeySource for StaticKeySource {
    async fn fetch(&self) -> Result<DecodingKey> {
        Ok(self.key.clone())
    }
}

// ============================================================================
// Key Document Parsing
// ============================================================================

#[derive(Deserialize)]
struct KeyDocument {
    // RSA JWK members
    kty: Option<String>,
    n: Option<String>,
    e: Option<String>,
    // Component document members. The modulus stays raw so that its digits
    // are never routed through a float.
    #[serde(rename = "N")]
    modulus: Option<Box<RawValue>>,
    #[serde(rename = "E")]
    exponent: Option<u64>,
}

/// Parse a key document returned by the key endpoint
pub fn parse_key_document(body: &[u8]) -> Result<DecodingKey> {
    let document: KeyDocument = serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, "Key document is not valid JSON");
        AuthError::SecretUnavailable(format!("undecodable key document: {e}"))
    })?;

    match document {
        KeyDocument {
            n: Some(n),
            e: Some(e),
            kty,
            ..
        } => {
            if let Some(kty) = kty.as_deref() {
                if kty != "RSA" {
                    return Err(AuthError::SecretUnavailable(format!(
                        "unsupported key type {kty}"
                    )));
                }
            }
            rsa_components(&n, &e)
        }
        KeyDocument {
            modulus: Some(modulus),
            exponent: Some(exponent),
            ..
        } => {
            let digits = modulus.get().trim_matches('"');
            let n = BigUint::parse_bytes(digits.as_bytes(), 10).ok_or_else(|| {
                AuthError::SecretUnavailable("modulus is not a decimal integer".to_string())
            })?;
            let e = BigUint::from(exponent);
            rsa_components(
                &URL_SAFE_NO_PAD.encode(n.to_bytes_be()),
                &URL_SAFE_NO_PAD.encode(e.to_bytes_be()),
            )
        }
        _ => Err(AuthError::SecretUnavailable(
            "key document carries no RSA public key".to_string(),
        )),
    }
}

fn rsa_components(n: &str, e: &str) -> Result<DecodingKey> {
    DecodingKey::from_rsa_components(n, e)
        .map_err(|err| AuthError::SecretUnavailable(format!("invalid RSA components: {err}")))
}

// ============================================================================
// Key Cache
// ============================================================================

type InFlightFetch = Shared<BoxFuture<'static, Result<Arc<DecodingKey>>>>;

/// Process-lifetime slot for verification material
#[derive(Default)]
pub struct KeyCache {
    slot: RwLock<Option<Arc<DecodingKey>>>,
    in_flight: Mutex<Option<InFlightFetch>>,
}

impl KeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached key, if any
    pub fn get(&self) -> Option<Arc<DecodingKey>> {
        self.slot.read().clone()
    }

    /// Return the cached key or populate the slot with `fetch`
    ///
    /// `fetch` is only invoked when no other fetch is in flight. Callers that
    /// arrive during a fetch wait for it and share its result.
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<Arc<DecodingKey>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<DecodingKey>> + Send + 'static,
    {
        if let Some(key) = self.get() {
            return Ok(key);
        }

        let attempt = {
            let mut in_flight = self.in_flight.lock();

            // The slot may have been filled while we took the lock.
            if let Some(key) = self.get() {
                return Ok(key);
            }

            match in_flight.as_ref() {
                Some(attempt) => attempt.clone(),
                None => {
                    let attempt = fetch().map(|r| r.map(Arc::new)).boxed().shared();
                    *in_flight = Some(attempt.clone());
                    attempt
                }
            }
        };

        let result = attempt.clone().await;

        if let Ok(key) = &result {
            *self.slot.write() = Some(Arc::clone(key));
        }

        // Only the attempt we awaited is cleared; a newer one stays.
        let mut in_flight = self.in_flight.lock();
        if in_flight
            .as_ref()
            .is_some_and(|current| current.ptr_eq(&attempt))
        {
            *in_flight = None;
        }

        result
    }
}

impl fmt::Debug for KeyCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyCache")
            .field("cached", &self.get().is_some())
            .finish()
    }
}

// ============================================================================
// Resolver
// ============================================================================

pub struct SecretResolver {
    source: Arc<dyn KeySource>,
    cache: Arc<KeyCache>,
}

impl SecretResolver {
    pub fn new(source: Arc<dyn KeySource>, cache: KeyCache) -> Self {
        Self::with_shared_cache(source, Arc::new(cache))
    }

    /// Resolver backed by a cache other resolvers may also hold
    pub fn with_shared_cache(source: Arc<dyn KeySource>, cache: Arc<KeyCache>) -> Self {
        Self { source, cache }
    }

    /// Verification key, fetched on first use
    pub async fn resolve(&self) -> Result<Arc<DecodingKey>> {
        let source = Arc::clone(&self.source);
        self.cache
            .get_or_fetch(|| async move {
                let key = source.fetch().await?;
                info!("Verification key loaded");
                Ok(key)
            })
            .await
    }

    pub fn cache(&self) -> &KeyCache {
        &self.cache
    }
}
