/// Product service - listing, retrieval and seller-gated mutations
use crate::db::ProductStorage;
use crate::error::{AppError, Result};
use crate::middleware::permissions::{check_product_mutation, require_seller};
use crate::models::{CreateRequest, FindRequest, NewProduct, Product, UpdateRequest};
use async_trait::async_trait;
use auth_core::CallerContext;

/// Product operations as seen by transport handlers
///
/// Implemented locally by [`ProductService`] and remotely by
/// [`GrpcProductClient`](crate::grpc::GrpcProductClient). The caller context is
/// always passed explicitly.
#[async_trait]
pub trait ProductApi: Send + Sync {
    async fn find(&self, caller: &CallerContext, request: FindRequest) -> Result<Vec<Product>>;

    async fn find_one(&self, caller: &CallerContext, id: &str) -> Result<Product>;

    async fn create(&self, caller: &CallerContext, request: CreateRequest) -> Result<Product>;

    async fn update(&self, caller: &CallerContext, request: UpdateRequest) -> Result<Product>;

    async fn delete(&self, caller: &CallerContext, id: &str) -> Result<Product>;
}

pub struct ProductService<S> {
    storage: S,
}

impl<S: ProductStorage> ProductService<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[async_trait]
impl<S: ProductStorage> ProductApi for ProductService<S> {
    async fn find(&self, _caller: &CallerContext, request: FindRequest) -> Result<Vec<Product>> {
        request.validate()?;
        self.storage.find(&request).await
    }

    async fn find_one(&self, _caller: &CallerContext, id: &str) -> Result<Product> {
        self.storage
            .find_one(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {}", id)))
    }

    async fn create(&self, caller: &CallerContext, request: CreateRequest) -> Result<Product> {
        let identity = require_seller(caller)?;
        request.validate()?;

        if let Some(claimed) = request.seller.as_deref() {
            if !identity.owns(claimed) {
                tracing::warn!(
                    subject = identity.subject(),
                    claimed_seller = claimed,
                    "Ignoring seller supplied in create request"
                );
            }
        }

        let product = self
            .storage
            .create(NewProduct {
                name: request.name,
                price: request.price,
                seller: identity.subject().to_string(),
            })
            .await?;

        tracing::info!(product_id = %product.id, seller = %product.seller, "Product created");
        Ok(product)
    }

    async fn update(&self, caller: &CallerContext, request: UpdateRequest) -> Result<Product> {
        let identity = require_seller(caller)?;

        let existing = self.storage.find_one(&request.id).await?;
        check_product_mutation(identity, &request.id, existing)?;
        request.validate()?;

        let product = self
            .storage
            .update(&request)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {}", request.id)))?;

        tracing::info!(product_id = %product.id, seller = %product.seller, "Product updated");
        Ok(product)
    }

    async fn delete(&self, caller: &CallerContext, id: &str) -> Result<Product> {
        let identity = require_seller(caller)?;

        let existing = self.storage.find_one(id).await?;
        check_product_mutation(identity, id, existing)?;

        let product = self
            .storage
            .delete(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {}", id)))?;

        tracing::info!(product_id = %product.id, seller = %product.seller, "Product deleted");
        Ok(product)
    }
}
