//! Core traits for the reconciler
//!
//! - [`ApiGateway`]: Invoke Synology web API methods

pub mod api_gateway;

pub use api_gateway::{ApiGateway, ApiGatewayFactory, ApiResponse};
