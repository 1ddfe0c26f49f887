//! Request extension trait for caller context access
//!
//! Server handlers read the context stored by [`AuthLayer`](crate::AuthLayer);
//! clients attach it before a call so that
//! [`ClientAuthInterceptor`](crate::ClientAuthInterceptor) can forward it.

use auth_core::{CallerContext, Identity};
use tonic::{Request, Status};

pub trait CallerContextExt {
    /// Caller context stored on the request
    ///
    /// Returns `CallerContext::Unset` if no adapter ran.
    fn caller_context(&self) -> CallerContext;

    /// Attach a caller context, replacing any previous one
    fn set_caller_context(&mut self, context: CallerContext);

    /// Identity of the caller
    ///
    /// ## Errors
    ///
    /// Returns `Status::unauthenticated` for anonymous callers and
    /// `Status::internal` if the context was never set.
    fn require_caller(&self) -> Result<Identity, Status>;
}

impl<T> CallerContextExt for Request<T> {
    fn caller_context(&self) -> CallerContext {
        self.extensions()
            .get::<CallerContext>()
            .cloned()
            .unwrap_or_default()
    }

    fn set_caller_context(&mut self, context: CallerContext) {
        self.extensions_mut().insert(context);
    }

    fn require_caller(&self) -> Result<Identity, Status> {
        match self.caller_context() {
            CallerContext::Authenticated(identity) => Ok(identity),
            CallerContext::Anonymous => Err(Status::unauthenticated("identity required")),
            CallerContext::Unset => Err(Status::internal(
                "No caller context found. Ensure AuthLayer is installed.",
            )),
        }
    }
}

/// Build a request carrying `context`
pub fn request_with_context<T>(message: T, context: CallerContext) -> Request<T> {
    let mut request = Request::new(message);
    request.set_caller_context(context);
    request
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_context_missing_is_unset() {
        let request = Request::new(());
        assert_eq!(request.caller_context(), CallerContext::Unset);

        let status = request.require_caller().unwrap_err();
        assert_eq!(status.code(), tonic::Code::Internal);
        assert!(status.message().contains("No caller context found"));
    }

    #[test]
    fn test_caller_context_present() {
        let request = request_with_context((), CallerContext::authenticated("A"));

        assert_eq!(request.caller_context(), CallerContext::authenticated("A"));
        assert_eq!(request.require_caller().unwrap(), Identity::new("A"));
    }

    #[test]
    fn test_anonymous_caller_is_unauthenticated() {
        let request = request_with_context((), CallerContext::Anonymous);

        let status = request.require_caller().unwrap_err();
        assert_eq!(status.code(), tonic::Code::Unauthenticated);
    }
}
