//! Plugin-based gateway registry
//!
//! The registry maps transport type names (`local`, `ssh`) to gateway
//! factories, so the binary never hard-codes which crate
//! provides which transport.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use synorp_core::registry::GatewayRegistry;
//! use synorp_core::config::SynorpConfig;
//!
//! let registry = GatewayRegistry::new();
//! synorp_gateway_webapi::register(&registry);
//!
//! let gateway = registry.create_gateway(&SynorpConfig::default())?;
//! ```

use crate::config::SynorpConfig;
use crate::error::{Error, Result};
use crate::traits::{ApiGateway, ApiGatewayFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Registry of gateway factories keyed by transport type name
#[derive(Default)]
pub struct GatewayRegistry {
    gateways: RwLock<HashMap<String, Box<dyn ApiGatewayFactory>>>,
}

impl GatewayRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a gateway factory
    ///
    /// # Parameters
    ///
    /// - `name`: Transport type name (e.g., "local", "ssh")
    /// - `factory`: Factory object for creating gateway instances
    ///
    /// Registering a name twice replaces the previous factory.
    pub fn register_gateway(&self, name: impl Into<String>, factory: Box<dyn ApiGatewayFactory>) {
        let mut gateways = self.gateways.write().unwrap_or_else(PoisonError::into_inner);
        gateways.insert(name.into(), factory);
    }

    /// Create a gateway from configuration
    ///
    /// The configuration is validated first.
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn ApiGateway>)`: Created gateway instance
    /// - `Err(Error)`: If the transport type is not registered or creation fails
    pub fn create_gateway(&self, config: &SynorpConfig) -> Result<Box<dyn ApiGateway>> {
        config.validate()?;

        let transport_type = config.transport.type_name();
        let gateways = self.gateways.read().unwrap_or_else(PoisonError::into_inner);

        let factory = gateways
            .get(transport_type)
            .ok_or_else(|| Error::config(format!("Unknown transport type: {}", transport_type)))?;

        factory.create(config)
    }

    /// List all registered transport types, sorted
    pub fn list_gateways(&self) -> Vec<String> {
        let gateways = self.gateways.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = gateways.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a transport type is registered
    pub fn has_gateway(&self, name: &str) -> bool {
        let gateways = self.gateways.read().unwrap_or_else(PoisonError::into_inner);
        gateways.contains_key(name)
    }
}
