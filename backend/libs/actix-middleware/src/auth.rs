use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderMap, AUTHORIZATION},
    Error, HttpMessage,
};
use auth_core::{AuthService, CallMetadata, CallerContext};
use futures::future::{ready, Ready};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

/// Caller context stored by [`HttpAuthMiddleware`]
///
/// Extracting it never fails: handlers outside the middleware see
/// `CallerContext::Unset` and the business layer reports the usage error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller(pub CallerContext);

impl Caller {
    pub fn into_inner(self) -> CallerContext {
        self.0
    }
}

/// HTTP Authentication Middleware
///
/// - No `Authorization` header: the request continues as anonymous.
/// - Header not shaped `Bearer <token>`: 400, the auth service is not called.
/// - Token rejected by the auth service: 401.
#[derive(Clone)]
pub struct HttpAuthMiddleware {
    auth: Arc<dyn AuthService>,
}

impl HttpAuthMiddleware {
    pub fn new(auth: Arc<dyn AuthService>) -> Self {
        Self { auth }
    }
}

impl<S, B> Transform<S, ServiceRequest> for HttpAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = HttpAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(HttpAuthMiddlewareService {
            service: Rc::new(service),
            auth: Arc::clone(&self.auth),
        }))
    }
}

pub struct HttpAuthMiddlewareService<S> {
    service: Rc<S>,
    auth: Arc<dyn AuthService>,
}

impl<S, B> Service<ServiceRequest> for HttpAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let auth = self.auth.clone();

        Box::pin(async move {
            // Shape errors are rejected before the auth service sees anything
            let token = bearer_token(req.headers()).map_err(|msg| {
                tracing::debug!(path = %req.path(), "{}", msg);
                actix_web::error::ErrorBadRequest(msg)
            })?;

            let context = match token {
                None => CallerContext::Anonymous,
                Some(token) => {
                    let metadata = CallMetadata::with_authorization(token);
                    let identity = auth.resolve_inbound(&metadata).await.map_err(|e| {
                        if e.is_authentication_failure() {
                            tracing::debug!(auth = auth.kind(), error = %e, "HTTP caller authentication failed");
                        } else {
                            tracing::error!(auth = auth.kind(), error = %e, "HTTP caller could not be resolved");
                        }
                        actix_web::error::ErrorUnauthorized(e.to_string())
                    })?;
                    CallerContext::resolved(identity)
                }
            };

            req.extensions_mut().insert(context);

            service.call(req).await
        })
    }
}

/// Extract the bearer token from an `Authorization` header
///
/// Returns `Ok(None)` when the header is absent.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, &'static str> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| "malformed Authorization header")?;

    let mut fields = value.split_whitespace();
    match (fields.next(), fields.next(), fields.next()) {
        (Some(scheme), Some(token), None) => {
            if scheme.eq_ignore_ascii_case("bearer") {
                Ok(Some(token.to_string()))
            } else {
                Err("authorization type is not Bearer")
            }
        }
        _ => Err("malformed Authorization header"),
    }
}

/// FromRequest implementation for Caller
impl actix_web::FromRequest for Caller {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        let context = req
            .extensions()
            .get::<CallerContext>()
            .cloned()
            .unwrap_or_default();
        ready(Ok(Caller(context)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_absent_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), Ok(None));
    }

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        for value in ["Bearer abc", "bearer abc", "BEARER abc", "Bearer   abc"] {
            assert_eq!(bearer_token(&headers(value)), Ok(Some("abc".to_string())));
        }
    }

    #[test]
    fn test_wrong_field_count() {
        for value in ["Bearer", "abc", "Bearer a b", ""] {
            assert_eq!(
                bearer_token(&headers(value)),
                Err("malformed Authorization header")
            );
        }
    }

    #[test]
    fn test_wrong_scheme() {
        assert_eq!(
            bearer_token(&headers("Basic dXNlcjpwYXNz")),
            Err("authorization type is not Bearer")
        );
    }
}
