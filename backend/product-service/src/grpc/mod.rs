//! gRPC implementations for inter-service communication
//!
//! This module contains:
//! - Server implementation (ProductService gRPC server)
//! - Client implementation (`GrpcProductClient`, a remote `ProductApi`)

pub mod client;
pub mod server;

pub use client::GrpcProductClient;
pub use server::*;
