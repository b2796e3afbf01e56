//! Declared module arguments and the normalized reverse proxy entry
//!
//! [`ReverseProxyArgs`] is what the operator writes. [`ProxyEntry`] is the
//! record shape the `SYNO.Core.AppPortal.ReverseProxy` API expects:
//! protocols become `0`/`1` and the frontend port is always concrete.
//!
//! ```json
//! {
//!   "name": "DSM",
//!   "backend": {"fqdn": "localhost", "port": 5000},
//!   "frontend": {"fqdn": "dsm.my.local.network", "https": true},
//!   "customize_headers": [
//!     {"name": "Upgrade", "value": "$http_upgrade"},
//!     {"name": "Connection", "value": "$connection_upgrade"}
//!   ]
//! }
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default frontend port for https entries
pub const DEFAULT_HTTPS_PORT: u16 = 443;

/// Default frontend port for plain http entries
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// Declared reverse proxy entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReverseProxyArgs {
    /// Entry name, stored as the remote `description` and used as identifier
    pub name: String,

    /// Endpoint to direct traffic to
    pub backend: BackendArgs,

    /// Public-facing endpoint
    pub frontend: FrontendArgs,

    /// Extra headers passed to the backend, in order
    #[serde(default)]
    pub customize_headers: Vec<Header>,
}

/// Declared backend endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendArgs {
    /// Hostname
    pub fqdn: String,
    /// Port number
    pub port: u16,
    /// Whether to use https
    #[serde(default)]
    pub https: bool,
}

/// Declared frontend endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrontendArgs {
    /// Hostname
    pub fqdn: String,
    /// Port number, defaults to 443 or 80 depending on `https`
    #[serde(default)]
    pub port: Option<u16>,
    /// Whether to use https
    #[serde(default)]
    pub https: bool,
}

/// A custom header name/value pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl ReverseProxyArgs {
    /// Parse and validate arguments from a JSON document
    pub fn from_json(input: &str) -> Result<Self> {
        let args: Self = serde_json::from_str(input)
            .map_err(|e| Error::invalid_input(format!("Invalid module arguments: {}", e)))?;
        args.validate()?;
        Ok(args)
    }

    /// Validate the arguments
    ///
    /// Ports are already bounded by `u16`; a zero port is rejected here.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_input("name cannot be empty"));
        }
        if self.backend.fqdn.trim().is_empty() {
            return Err(Error::invalid_input("backend.fqdn cannot be empty"));
        }
        if self.backend.port == 0 {
            return Err(Error::invalid_input("backend.port must be between 1 and 65535"));
        }
        if self.frontend.fqdn.trim().is_empty() {
            return Err(Error::invalid_input("frontend.fqdn cannot be empty"));
        }
        if self.frontend.port == Some(0) {
            return Err(Error::invalid_input("frontend.port must be between 1 and 65535"));
        }
        for (i, header) in self.customize_headers.iter().enumerate() {
            if header.name.is_empty() {
                return Err(Error::invalid_input(format!(
                    "customize_headers[{}].name cannot be empty",
                    i
                )));
            }
        }
        Ok(())
    }
}

/// Normalized endpoint as stored on the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub fqdn: String,
    pub port: u16,
    /// `1` for https, `0` for http
    pub protocol: u8,
}

/// Normalized reverse proxy entry, ready to be sent as the `entry` parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyEntry {
    pub description: String,
    pub backend: Endpoint,
    pub frontend: Endpoint,

    /// `None` when no headers were declared, so the key is left out entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customize_headers: Option<Vec<Header>>,

    /// Remote primary key, only present when updating an existing entry
    #[serde(rename = "UUID", default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

fn protocol(https: bool) -> u8 {
    if https { 1 } else { 0 }
}

impl ProxyEntry {
    /// Build the normalized entry from declared arguments
    pub fn from_args(args: &ReverseProxyArgs) -> Self {
        let frontend_port = args.frontend.port.unwrap_or(if args.frontend.https {
            DEFAULT_HTTPS_PORT
        } else {
            DEFAULT_HTTP_PORT
        });

        let customize_headers = if args.customize_headers.is_empty() {
            None
        } else {
            Some(args.customize_headers.clone())
        };

        Self {
            description: args.name.clone(),
            backend: Endpoint {
                fqdn: args.backend.fqdn.clone(),
                port: args.backend.port,
                protocol: protocol(args.backend.https),
            },
            frontend: Endpoint {
                fqdn: args.frontend.fqdn.clone(),
                port: frontend_port,
                protocol: protocol(args.frontend.https),
            },
            customize_headers,
            uuid: None,
        }
    }

    /// Carry over the primary key of the entry being replaced
    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    /// JSON form used for diffing and as the API parameter
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Entry as returned by the device's `list` call
///
/// The record is kept verbatim so every remote-side field shows up in the
/// `before` diff.
#[derive(Debug, Clone, PartialEq)]
pub struct ExistingEntry(Map<String, Value>);

impl ExistingEntry {
    /// Wrap a raw `list` item, which must be a JSON object
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::malformed(format!(
                "reverse proxy entry is not an object: {}",
                other
            ))),
        }
    }

    /// The `description` field, if it is a string
    pub fn description(&self) -> Option<&str> {
        self.0.get("description").and_then(Value::as_str)
    }

    /// The remote primary key
    pub fn uuid(&self) -> Result<&str> {
        self.0
            .get("UUID")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::malformed("existing entry has no UUID"))
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}
