//! Caller Identity Propagation for gRPC Services
//!
//! Authenticates inbound gRPC calls and forwards the caller identity on
//! outbound calls, using the shared [`auth_core::AuthService`] capability so
//! that gRPC and HTTP apply the same identity semantics.
//!
//! ## Core Components
//!
//! - **AuthLayer**: tower layer resolving the caller of every inbound call
//!   (unary and streaming) into a `CallerContext` request extension
//! - **ClientAuthInterceptor**: encodes the caller context of an outgoing
//!   request into `authorization` metadata
//! - **CallerContextExt**: request extension trait for reading and attaching
//!   the caller context
//!
//! ## Failure Semantics
//!
//! - No metadata container = `Status::unauthenticated`
//! - No `authorization` key = anonymous caller
//! - Unverifiable credentials = `Status::unauthenticated`
//! - Outbound call without caller context = `Status::unauthenticated`
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use grpc_auth_propagation::CallerContextExt;
//! use tonic::{Request, Response, Status};
//!
//! async fn delete_product(request: Request<()>) -> Result<Response<()>, Status> {
//!     // Stored by AuthLayer before the handler runs
//!     let caller = request.require_caller()?;
//!     tracing::info!(subject = caller.subject(), "delete requested");
//!     Ok(Response::new(()))
//! }
//! ```

mod client;
mod extensions;
mod metadata;
mod server;

pub use client::{is_outbound_rejection, ClientAuthInterceptor, OUTBOUND_REJECTION_KEY};
pub use extensions::{request_with_context, CallerContextExt};
pub use metadata::{apply_call_metadata, to_call_metadata};
pub use server::{authenticate, AuthLayer, AuthMiddleware};

// Re-export for convenience
pub use auth_core::CallerContext;
pub use tonic::Status;
