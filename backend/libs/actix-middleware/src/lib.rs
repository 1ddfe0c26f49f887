//! # Actix Middleware Library
//!
//! Shared middleware components for marketplace Actix services
//!
//! ## Modules
//! - `auth`: caller authentication through the shared `AuthService`
//! - `logging`: structured request logging

pub mod auth;
pub mod logging;

pub use auth::{bearer_token, Caller, HttpAuthMiddleware};
pub use logging::Logging;
