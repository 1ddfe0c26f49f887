//! Remote product backend
//!
//! [`GrpcProductClient`] implements [`ProductApi`] by calling a product-service
//! gRPC server on behalf of the current caller. The caller identity travels in
//! `authorization` metadata written by [`ClientAuthInterceptor`].

use super::server::market::product as proto;
use crate::error::{AppError, Result};
use crate::models::{CreateRequest, FindRequest, Product, UpdateRequest};
use crate::services::ProductApi;
use async_trait::async_trait;
use auth_core::{AuthService, CallerContext};
use grpc_auth_propagation::{request_with_context, ClientAuthInterceptor};
use proto::product_service_client::ProductServiceClient;
use std::sync::Arc;
use tonic::codegen::InterceptedService;
use tonic::transport::{Channel, Endpoint};
use tonic::Request;

type Inner = ProductServiceClient<InterceptedService<Channel, ClientAuthInterceptor>>;

#[derive(Clone)]
pub struct GrpcProductClient {
    inner: Inner,
}

impl GrpcProductClient {
    pub fn new(channel: Channel, auth: Arc<dyn AuthService>) -> Self {
        Self {
            inner: ProductServiceClient::with_interceptor(channel, ClientAuthInterceptor::new(auth)),
        }
    }

    /// Client whose channel connects on first use
    pub fn connect_lazy(endpoint: &str, auth: Arc<dyn AuthService>) -> Result<Self> {
        let channel = Endpoint::from_shared(endpoint.to_string())
            .map_err(|e| AppError::Internal(format!("invalid product endpoint {endpoint}: {e}")))?
            .connect_lazy();
        Ok(Self::new(channel, auth))
    }

    pub async fn connect(endpoint: &str, auth: Arc<dyn AuthService>) -> Result<Self> {
        let channel = Endpoint::from_shared(endpoint.to_string())
            .map_err(|e| AppError::Internal(format!("invalid product endpoint {endpoint}: {e}")))?
            .connect()
            .await
            .map_err(|e| AppError::Upstream(format!("connect {endpoint}: {e}")))?;
        Ok(Self::new(channel, auth))
    }
}

/// Outgoing request carrying the caller
///
/// A caller that was never resolved is a wiring bug on this side and is not
/// sent over the wire.
fn outbound<T>(caller: &CallerContext, message: T) -> Result<Request<T>> {
    if !caller.is_set() {
        tracing::error!("Remote product call without caller context");
        return Err(AppError::IdentityNotProvided);
    }
    Ok(request_with_context(message, caller.clone()))
}

#[async_trait]
impl ProductApi for GrpcProductClient {
    async fn find(&self, caller: &CallerContext, request: FindRequest) -> Result<Vec<Product>> {
        let request = outbound(caller, proto::ListRequest::from(request))?;
        let mut stream = self.inner.clone().list(request).await?.into_inner();

        let mut products = Vec::new();
        while let Some(product) = stream.message().await? {
            products.push(product.into());
        }
        Ok(products)
    }

    async fn find_one(&self, caller: &CallerContext, id: &str) -> Result<Product> {
        let request = outbound(caller, proto::GetRequest { id: id.to_string() })?;
        let product = self.inner.clone().get(request).await?.into_inner();
        Ok(product.into())
    }

    async fn create(&self, caller: &CallerContext, request: CreateRequest) -> Result<Product> {
        let request = outbound(
            caller,
            proto::CreateRequest {
                name: request.name,
                price: request.price,
            },
        )?;
        let product = self.inner.clone().create(request).await?.into_inner();
        Ok(product.into())
    }

    async fn update(&self, caller: &CallerContext, request: UpdateRequest) -> Result<Product> {
        let request = outbound(
            caller,
            proto::UpdateRequest {
                id: request.id,
                name: request.name,
                price: request.price,
            },
        )?;
        let product = self.inner.clone().update(request).await?.into_inner();
        Ok(product.into())
    }

    async fn delete(&self, caller: &CallerContext, id: &str) -> Result<Product> {
        let request = outbound(caller, proto::DeleteRequest { id: id.to_string() })?;
        let product = self.inner.clone().delete(request).await?.into_inner();
        Ok(product.into())
    }
}
