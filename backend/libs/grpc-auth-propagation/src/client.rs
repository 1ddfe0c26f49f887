//! Client-side auth interceptor
//!
//! Encodes the caller's identity into outgoing gRPC metadata so that the
//! downstream service resolves the same identity.

use crate::metadata::apply_call_metadata;
use auth_core::{AuthService, CallerContext};
use std::sync::Arc;
use tonic::metadata::{MetadataMap, MetadataValue};
use tonic::service::Interceptor;
use tonic::{Code, Request, Status};
use tracing::{debug, error, warn};

/// Status metadata key set on rejections produced by [`ClientAuthInterceptor`]
///
/// Such a status never reached the remote service; it reports a local
/// wiring or configuration fault rather than a caller credential problem.
pub const OUTBOUND_REJECTION_KEY: &str = "x-outbound-auth-rejected";

fn outbound_rejection(message: String) -> Status {
    let mut metadata = MetadataMap::new();
    metadata.insert(OUTBOUND_REJECTION_KEY, MetadataValue::from_static("true"));
    Status::with_metadata(Code::Unauthenticated, message, metadata)
}

/// True if `status` was produced by [`ClientAuthInterceptor`] before the call
/// left the process
pub fn is_outbound_rejection(status: &Status) -> bool {
    status.metadata().contains_key(OUTBOUND_REJECTION_KEY)
}

/// Client-side interceptor that forwards the caller identity
///
/// The caller context must have been attached to the outgoing request (see
/// [`CallerContextExt::set_caller_context`](crate::CallerContextExt)). A
/// missing or `Unset` context is a programming error and fails the call with
/// `Status::unauthenticated` instead of silently calling as anonymous. Every
/// rejection is marked, see [`is_outbound_rejection`].
///
/// Applies to unary and streaming calls alike; tonic runs interceptors on the
/// initial request of every call.
///
/// ## Usage
///
/// ```rust,no_run
/// use auth_core::TrustAuthService;
/// use grpc_auth_propagation::ClientAuthInterceptor;
/// use std::sync::Arc;
/// use tonic::transport::Channel;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let interceptor = ClientAuthInterceptor::new(Arc::new(TrustAuthService::new()));
///
/// let channel = Channel::from_static("http://[::1]:50051")
///     .connect()
///     .await?;
///
/// // let mut client = ProductServiceClient::with_interceptor(channel, interceptor);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ClientAuthInterceptor {
    auth: Arc<dyn AuthService>,
}

impl ClientAuthInterceptor {
    pub fn new(auth: Arc<dyn AuthService>) -> Self {
        Self { auth }
    }
}

impl Interceptor for ClientAuthInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        let context = request
            .extensions()
            .get::<CallerContext>()
            .cloned()
            .unwrap_or_default();

        let identity = context.identity().map_err(|e| {
            warn!("Outbound gRPC call without caller context");
            outbound_rejection(e.to_string())
        })?;

        let metadata = self.auth.encode_outbound(identity).map_err(|e| {
            error!(auth = self.auth.kind(), error = %e, "Failed to encode outbound credentials");
            outbound_rejection(e.to_string())
        })?;

        apply_call_metadata(&metadata, request.metadata_mut())?;

        debug!(subject = context.subject(), "Outbound caller attached");
        Ok(request)
    }
}
