//! Server-side authentication layer
//!
//! Resolves the caller of every inbound gRPC call and stores the resulting
//! [`CallerContext`] in request extensions before the handler runs.
//!
//! ## Design
//!
//! - **One path for all call shapes**: the layer wraps the HTTP/2 request, so
//!   unary and streaming calls are authenticated identically. For streams the
//!   context is resolved once and stays attached for the whole stream.
//! - **Async resolution**: unlike a tonic `Interceptor`, a tower layer can
//!   await key fetches on the first verification.
//! - **Anonymous is not failure**: a call without an `authorization` key
//!   reaches the handler as `CallerContext::Anonymous`. A call whose
//!   credentials fail verification is rejected with `UNAUTHENTICATED`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use grpc_auth_propagation::AuthLayer;
//! use auth_core::TrustAuthService;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let layer = AuthLayer::new(Arc::new(TrustAuthService::new()));
//! // tonic::transport::Server::builder()
//! //     .layer(layer)
//! //     .add_service(ProductServiceServer::new(service))
//! //     .serve(addr)
//! //     .await?;
//! # Ok(())
//! # }
//! ```

use crate::metadata::to_call_metadata;
use auth_core::{AuthError, AuthService, CallerContext};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tonic::body::BoxBody;
use tonic::codegen::http;
use tonic::metadata::MetadataMap;
use tonic::Status;
use tower::{Layer, Service};
use tracing::{debug, error, warn};

/// Resolve the caller context for an inbound call
///
/// ## Errors
///
/// Returns `Status::unauthenticated` if:
/// - the call carries no metadata container at all
/// - the auth service fails to resolve the `authorization` value
pub async fn authenticate(
    auth: &dyn AuthService,
    metadata: Option<&MetadataMap>,
) -> Result<CallerContext, Status> {
    let Some(metadata) = metadata else {
        warn!("Rejecting gRPC call without metadata");
        return Err(Status::unauthenticated(AuthError::MetadataMissing.to_string()));
    };

    let identity = auth
        .resolve_inbound(&to_call_metadata(metadata))
        .await
        .map_err(|e| {
            // Credential failures are already logged with their cause by the verifier
            if e.is_authentication_failure() {
                debug!(auth = auth.kind(), error = %e, "gRPC caller authentication failed");
            } else {
                error!(auth = auth.kind(), error = %e, "gRPC caller could not be resolved");
            }
            Status::unauthenticated(e.to_string())
        })?;

    let context = CallerContext::resolved(identity);
    debug!(subject = context.subject(), "gRPC caller resolved");
    Ok(context)
}

/// Tower layer installing [`AuthMiddleware`] on every service of a server
#[derive(Clone)]
pub struct AuthLayer {
    auth: Arc<dyn AuthService>,
}

impl AuthLayer {
    pub fn new(auth: Arc<dyn AuthService>) -> Self {
        Self { auth }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            auth: Arc::clone(&self.auth),
        }
    }
}

#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    auth: Arc<dyn AuthService>,
}

impl<S, ReqBody> Service<http::Request<ReqBody>> for AuthMiddleware<S>
where
    S: Service<http::Request<ReqBody>, Response = http::Response<BoxBody>>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: http::Request<ReqBody>) -> Self::Future {
        // The clone is not guaranteed ready; keep the one that was polled.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let auth = Arc::clone(&self.auth);

        Box::pin(async move {
            let metadata = MetadataMap::from_headers(req.headers().clone());

            let context = match authenticate(auth.as_ref(), Some(&metadata)).await {
                Ok(context) => context,
                Err(status) => return Ok(status.into_http()),
            };

            let (mut parts, body) = req.into_parts();
            parts.extensions.insert(context);
            inner.call(http::Request::from_parts(parts, body)).await
        })
    }
}
