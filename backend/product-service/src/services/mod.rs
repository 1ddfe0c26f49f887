/// Business logic layer for product-service
pub mod products;

pub use products::{ProductApi, ProductService};
