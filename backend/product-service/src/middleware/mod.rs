/// Authorization helpers for product-service
///
/// Caller authentication itself lives in the shared `actix-middleware` and
/// `grpc-auth-propagation` crates; this module holds the product ownership
/// rules applied once a caller is known.
pub mod permissions;

pub use permissions::*;
