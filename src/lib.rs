//! Bearer Authorizer Library
//!
//! Stateless bearer-token authorizer for API gateways: the validation core
//! (`auth`), secret retrieval, the gateway adapter, and its HTTP surface.

pub mod api;
pub mod auth;
pub mod authorizer;
pub mod config;
pub mod lambda;
pub mod secrets;

pub use authorizer::{Authorizer, AuthorizerError};
pub use config::AuthorizerConfig;
