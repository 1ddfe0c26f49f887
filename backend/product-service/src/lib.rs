/// Product Service Library
///
/// Marketplace product listings with seller-gated mutations, served over HTTP
/// and gRPC with the same caller identity semantics on both transports.
///
/// # Modules
///
/// - `handlers`: Product-related HTTP request handlers
/// - `models`: Data structures for products and requests
/// - `services`: Business logic layer (`ProductApi`)
/// - `db`: Storage contract and in-memory storage
/// - `middleware`: Product ownership checks
/// - `grpc`: gRPC server and client
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `telemetry`: Tracing subscriber setup for the binaries
pub mod config;
pub mod db;
pub mod error;
pub mod grpc;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, Result};
