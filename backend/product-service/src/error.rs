/// Error types for Product Service
///
/// Errors are converted to HTTP responses for API clients and to
/// `tonic::Status` for gRPC callers.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use auth_core::AuthError;
use grpc_auth_propagation::is_outbound_rejection;
use thiserror::Error;
use tonic::{Code, Status};

/// Result type for product-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// Product does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not the owner of the product
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Mutation attempted by an anonymous caller
    #[error("identity required")]
    IdentityRequired,

    /// Caller context was never populated by a transport adapter
    #[error("identity not provided")]
    IdentityNotProvided,

    /// Request failed validation
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Storage operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Remote product service failed
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::IdentityRequired => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::IdentityNotProvided | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_msg = self.to_string();

        HttpResponse::build(status).json(serde_json::json!({
            "error": error_msg,
            "status": status.as_u16(),
        }))
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::IdentityRequired => AppError::IdentityRequired,
            AuthError::IdentityNotProvided => AppError::IdentityNotProvided,
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<AppError> for Status {
    fn from(err: AppError) -> Self {
        match err {
            AppError::NotFound(msg) => Status::not_found(msg),
            AppError::PermissionDenied(msg) => Status::permission_denied(msg),
            AppError::IdentityRequired => Status::unauthenticated("identity required"),
            AppError::BadRequest(msg) => Status::invalid_argument(msg),
            AppError::IdentityNotProvided => {
                tracing::error!("Product operation reached without caller context");
                Status::internal("identity not provided")
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                Status::internal("Storage operation failed")
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {}", msg);
                Status::unavailable("Upstream product service failed")
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                Status::internal("Internal server error")
            }
        }
    }
}

impl From<Status> for AppError {
    /// Map a remote status back to the product error it was produced from
    ///
    /// Rejections raised by the local client interceptor are configuration
    /// faults of this process, not caller errors.
    fn from(status: Status) -> Self {
        let msg = status.message().to_string();
        if is_outbound_rejection(&status) {
            return AppError::Internal(format!("outbound call rejected: {msg}"));
        }
        match status.code() {
            Code::NotFound => AppError::NotFound(msg),
            Code::PermissionDenied => AppError::PermissionDenied(msg),
            Code::Unauthenticated => AppError::IdentityRequired,
            Code::InvalidArgument => AppError::BadRequest(msg),
            code => AppError::Upstream(format!("{:?}: {}", code, msg)),
        }
    }
}
