/// Storage layer for products
///
/// `ProductStorage` is the contract the business layer depends on;
/// `MemoryProductStorage` keeps products in process memory.
use crate::error::Result;
use crate::models::{FindRequest, NewProduct, Product, UpdateRequest};
use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductStorage: Send + Sync {
    /// Products passing the request filters, paginated after filtering
    async fn find(&self, request: &FindRequest) -> Result<Vec<Product>>;

    async fn find_one(&self, id: &str) -> Result<Option<Product>>;

    /// Persist a product and return it with its generated id
    async fn create(&self, product: NewProduct) -> Result<Product>;

    /// Apply `request`; `None` if the product does not exist
    async fn update(&self, request: &UpdateRequest) -> Result<Option<Product>>;

    /// Remove a product and return it; `None` if it did not exist
    async fn delete(&self, id: &str) -> Result<Option<Product>>;
}

/// In-memory product storage, insertion ordered
#[derive(Debug, Default)]
pub struct MemoryProductStorage {
    products: RwLock<Vec<Product>>,
}

impl MemoryProductStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with `products`
    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products: RwLock::new(products),
        }
    }

    pub fn len(&self) -> usize {
        self.products.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.read().is_empty()
    }
}

#[async_trait]
impl ProductStorage for MemoryProductStorage {
    async fn find(&self, request: &FindRequest) -> Result<Vec<Product>> {
        let offset = usize::try_from(request.offset).unwrap_or(0);
        let limit = usize::try_from(request.limit).unwrap_or(0);

        Ok(self
            .products
            .read()
            .iter()
            .filter(|product| request.matches(product))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_one(&self, id: &str) -> Result<Option<Product>> {
        Ok(self
            .products
            .read()
            .iter()
            .find(|product| product.id == id)
            .cloned())
    }

    async fn create(&self, product: NewProduct) -> Result<Product> {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: product.name,
            price: product.price,
            seller: product.seller,
        };
        self.products.write().push(product.clone());
        Ok(product)
    }

    async fn update(&self, request: &UpdateRequest) -> Result<Option<Product>> {
        let mut products = self.products.write();
        Ok(products
            .iter_mut()
            .find(|product| product.id == request.id)
            .map(|product| {
                request.apply(product);
                product.clone()
            }))
    }

    async fn delete(&self, id: &str) -> Result<Option<Product>> {
        let mut products = self.products.write();
        Ok(products
            .iter()
            .position(|product| product.id == id)
            .map(|index| products.remove(index)))
    }
}
