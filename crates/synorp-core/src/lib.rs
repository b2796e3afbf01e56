// # synorp-core
//
// Core library for reconciling Synology reverse proxy entries.
//
// ## Architecture Overview
//
// - **ReverseProxyArgs / ProxyEntry**: declared arguments and their normalized
//   form (integer protocol flags, concrete frontend port)
// - **ApiGateway**: Trait for invoking Synology web API methods
// - **Reconciler**: list → match by description → diff → create/update
// - **InvocationContext**: validated arguments and result reporting
// - **GatewayRegistry**: Plugin-based registry for gateway transports
//
// ## Design Principles
//
// 1. **Library-First**: the binary is a thin shell around this crate
// 2. **Plugin-Based**: transports are registered by name
// 3. **Idempotency**: a second run against an unchanged device reports `changed: false`
// 4. **Fail Fast**: the first error aborts the run, nothing is retried

pub mod config;
pub mod context;
pub mod entry;
pub mod error;
pub mod lookup;
pub mod reconciler;
pub mod registry;
pub mod traits;

// Re-export core types for convenience
pub use config::{SynorpConfig, TransportConfig};
pub use context::{InvocationContext, ModuleResult};
pub use entry::{BackendArgs, ExistingEntry, FrontendArgs, Header, ProxyEntry, ReverseProxyArgs};
pub use error::{Error, Result};
pub use reconciler::{Action, Diff, ReconcileReport, Reconciler, REVERSE_PROXY_API};
pub use registry::GatewayRegistry;
pub use traits::{ApiGateway, ApiGatewayFactory, ApiResponse};
