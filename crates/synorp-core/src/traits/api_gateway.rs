// # API Gateway Trait
//
// Defines the interface for invoking Synology web API methods.
//
// ## Implementations
//
// - `synowebapi` over a local process or ssh: `synorp-gateway-webapi` crate
// - Test doubles: `crates/synorp-core/tests/common`
//
// ## Usage
//
// ```rust,ignore
// use synorp_core::ApiGateway;
//
// async fn entries(gateway: &dyn ApiGateway) -> synorp_core::Result<()> {
//     let response = gateway
//         .invoke("SYNO.Core.AppPortal.ReverseProxy", "list", &Default::default(), false)
//         .await?;
//     println!("{:?}", response.data);
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decoded response of a single API call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Whether the device reported success
    pub success: bool,

    /// The `data` section, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ApiResponse {
    /// A successful response carrying `data`
    pub fn ok(data: Option<Value>) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Trait for Synology API gateway implementations
///
/// A gateway turns an `(api, method, params)` triple into one remote call
/// and decodes its JSON answer.
///
/// Gateways are single-shot: they must not retry, cache, or decide whether
/// a call is needed. Those decisions belong to the
/// [`Reconciler`](crate::Reconciler).
#[async_trait]
pub trait ApiGateway: Send + Sync {
    /// Invoke an API method
    ///
    /// # Parameters
    ///
    /// - `api`: API name, e.g. `SYNO.Core.AppPortal.ReverseProxy`
    /// - `method`: method name, e.g. `list`
    /// - `params`: keyword parameters; each value is sent JSON-encoded
    /// - `ignore_error`: when `true`, a `success: false` answer is returned
    ///   instead of being turned into [`Error::ApiFailure`](crate::Error::ApiFailure)
    ///
    /// # Returns
    ///
    /// - `Ok(ApiResponse)`: the decoded response
    /// - `Err(Error)`: the command failed, the response was malformed, or
    ///   the device reported failure and `ignore_error` was `false`
    async fn invoke(
        &self,
        api: &str,
        method: &str,
        params: &Map<String, Value>,
        ignore_error: bool,
    ) -> Result<ApiResponse, crate::Error>;

    /// Get the gateway name (for logging/debugging)
    fn gateway_name(&self) -> &'static str;
}

/// Helper trait for constructing gateways from configuration
pub trait ApiGatewayFactory: Send + Sync {
    /// Create an ApiGateway instance from configuration
    fn create(
        &self,
        config: &crate::config::SynorpConfig,
    ) -> Result<Box<dyn ApiGateway>, crate::Error>;
}
