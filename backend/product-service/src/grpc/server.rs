// gRPC service implementation for product service
use crate::error::AppError;
use crate::models::{self, CreateRequest, FindRequest, PriceRange, UpdateRequest, DEFAULT_LIMIT};
use crate::services::ProductApi;
use auth_core::AuthService;
use futures::Stream;
use grpc_auth_propagation::{AuthLayer, CallerContextExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{Request, Response, Status};

// Import generated proto code
pub mod market {
    pub mod product {
        pub mod v1 {
            tonic::include_proto!("market.product.v1");
        }
        pub use v1::*;
    }
}

use market::product as proto;
use proto::product_service_server::{ProductService as ProductRpc, ProductServiceServer};

/// ProductService gRPC implementation
///
/// The caller context is stored on each request by [`AuthLayer`] and passed
/// to the product backend unchanged.
pub struct ProductServiceImpl {
    api: Arc<dyn ProductApi>,
}

impl ProductServiceImpl {
    pub fn new(api: Arc<dyn ProductApi>) -> Self {
        Self { api }
    }
}

impl From<models::Product> for proto::Product {
    fn from(product: models::Product) -> Self {
        proto::Product {
            id: product.id,
            name: product.name,
            price: product.price,
            seller: product.seller,
        }
    }
}

impl From<proto::Product> for models::Product {
    fn from(product: proto::Product) -> Self {
        models::Product {
            id: product.id,
            name: product.name,
            price: product.price,
            seller: product.seller,
        }
    }
}

impl From<proto::ListRequest> for FindRequest {
    /// A zero limit is the proto3 default and means "server default"
    fn from(req: proto::ListRequest) -> Self {
        let price_range = req
            .price_range
            .map(|range| PriceRange {
                from: range.from,
                to: range.to,
            })
            .filter(|range| !range.is_unbounded());

        FindRequest {
            offset: req.offset,
            limit: if req.limit == 0 { DEFAULT_LIMIT } else { req.limit },
            name: req.name,
            price_range,
            seller: req.seller,
        }
    }
}

impl From<FindRequest> for proto::ListRequest {
    fn from(req: FindRequest) -> Self {
        proto::ListRequest {
            offset: req.offset,
            limit: req.limit,
            name: req.name,
            price_range: req.price_range.map(|range| proto::PriceRange {
                from: range.from,
                to: range.to,
            }),
            seller: req.seller,
        }
    }
}

fn map_app_error(err: AppError, context: &str) -> Status {
    tracing::debug!(context, error = %err, "Product gRPC call failed");
    Status::from(err)
}

type ProductStream = Pin<Box<dyn Stream<Item = Result<proto::Product, Status>> + Send + 'static>>;

#[tonic::async_trait]
impl ProductRpc for ProductServiceImpl {
    type ListStream = ProductStream;

    async fn list(
        &self,
        request: Request<proto::ListRequest>,
    ) -> Result<Response<Self::ListStream>, Status> {
        let caller = request.caller_context();
        let products = self
            .api
            .find(&caller, request.into_inner().into())
            .await
            .map_err(|e| map_app_error(e, "list products"))?;

        let stream = tokio_stream::iter(
            products
                .into_iter()
                .map(|p| Ok::<_, Status>(proto::Product::from(p))),
        );
        Ok(Response::new(Box::pin(stream)))
    }

    async fn get(
        &self,
        request: Request<proto::GetRequest>,
    ) -> Result<Response<proto::Product>, Status> {
        let caller = request.caller_context();
        let product = self
            .api
            .find_one(&caller, &request.get_ref().id)
            .await
            .map_err(|e| map_app_error(e, "get product"))?;

        Ok(Response::new(product.into()))
    }

    async fn create(
        &self,
        request: Request<proto::CreateRequest>,
    ) -> Result<Response<proto::Product>, Status> {
        let caller = request.caller_context();
        let req = request.into_inner();
        let product = self
            .api
            .create(
                &caller,
                CreateRequest {
                    name: req.name,
                    price: req.price,
                    seller: None,
                },
            )
            .await
            .map_err(|e| map_app_error(e, "create product"))?;

        Ok(Response::new(product.into()))
    }

    async fn update(
        &self,
        request: Request<proto::UpdateRequest>,
    ) -> Result<Response<proto::Product>, Status> {
        let caller = request.caller_context();
        let req = request.into_inner();
        let product = self
            .api
            .update(
                &caller,
                UpdateRequest {
                    id: req.id,
                    name: req.name,
                    price: req.price,
                },
            )
            .await
            .map_err(|e| map_app_error(e, "update product"))?;

        Ok(Response::new(product.into()))
    }

    async fn delete(
        &self,
        request: Request<proto::DeleteRequest>,
    ) -> Result<Response<proto::Product>, Status> {
        let caller = request.caller_context();
        let product = self
            .api
            .delete(&caller, &request.get_ref().id)
            .await
            .map_err(|e| map_app_error(e, "delete product"))?;

        Ok(Response::new(product.into()))
    }
}

/// Serve the product gRPC API and the standard health service on `listener`
///
/// Every call, unary or streaming, is authenticated by [`AuthLayer`] before it
/// reaches [`ProductServiceImpl`].
pub async fn start_grpc_server(
    listener: TcpListener,
    api: Arc<dyn ProductApi>,
    auth: Arc<dyn AuthService>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use tonic::transport::Server;
    use tonic_health::server::health_reporter;

    tracing::info!(
        addr = ?listener.local_addr().ok(),
        auth = auth.kind(),
        "Starting gRPC server"
    );

    // Health service
    let (mut health, health_service) = health_reporter();
    health
        .set_serving::<ProductServiceServer<ProductServiceImpl>>()
        .await;

    Server::builder()
        .layer(AuthLayer::new(auth))
        .add_service(health_service)
        .add_service(ProductServiceServer::new(ProductServiceImpl::new(api)))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
            // Wait for shutdown notification; ignore errors if sender dropped.
            let _ = shutdown.recv().await;
        })
        .await?;

    Ok(())
}
