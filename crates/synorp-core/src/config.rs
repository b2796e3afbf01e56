//! Configuration types for the reconciler
//!
//! This module defines how the tool reaches the device. The declared entry
//! itself lives in [`crate::entry`].

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default location of the vendor binary on DSM
pub const DEFAULT_WEBAPI_PATH: &str = "/usr/syno/bin/synowebapi";

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynorpConfig {
    /// How `synowebapi` is executed
    #[serde(default)]
    pub transport: TransportConfig,

    /// Path of `synowebapi` on the device
    #[serde(default = "default_webapi_path")]
    pub webapi_path: String,
}

impl SynorpConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            transport: TransportConfig::default(),
            webapi_path: default_webapi_path(),
        }
    }

    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            crate::Error::config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.webapi_path.is_empty() {
            return Err(crate::Error::config("webapi_path cannot be empty"));
        }

        self.transport.validate()
    }
}

impl Default for SynorpConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Transport configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportConfig {
    /// Run `synowebapi` on this machine (the tool runs on the NAS itself)
    Local {
        /// Arguments placed before the binary, e.g. `["sudo", "-n"]`
        #[serde(default)]
        command_prefix: Vec<String>,
    },

    /// Run `synowebapi` on the NAS over ssh (key-based, non-interactive)
    Ssh {
        /// NAS hostname or address
        host: String,
        /// Login user (ssh default when absent)
        #[serde(default)]
        user: Option<String>,
        /// ssh port (ssh default when absent)
        #[serde(default)]
        port: Option<u16>,
        /// Private key file
        #[serde(default)]
        identity_file: Option<String>,
        /// ssh client binary
        #[serde(default = "default_ssh_binary")]
        ssh_binary: String,
        /// Extra `-o` options, e.g. `StrictHostKeyChecking=accept-new`
        #[serde(default)]
        ssh_options: Vec<String>,
        /// Prefix the remote command with `sudo -n`
        #[serde(default)]
        sudo: bool,
    },
}

impl TransportConfig {
    /// Validate the transport configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            TransportConfig::Local { command_prefix } => {
                if command_prefix.iter().any(|arg| arg.is_empty()) {
                    return Err(crate::Error::config(
                        "Local command_prefix cannot contain empty arguments",
                    ));
                }
                Ok(())
            }
            TransportConfig::Ssh {
                host,
                user,
                port,
                ssh_binary,
                ..
            } => {
                if host.is_empty() {
                    return Err(crate::Error::config("ssh host cannot be empty"));
                }
                if host.starts_with('-') {
                    return Err(crate::Error::config(format!(
                        "ssh host cannot start with '-': {}",
                        host
                    )));
                }
                if user.as_deref().is_some_and(|u| u.is_empty() || u.contains('@')) {
                    return Err(crate::Error::config("ssh user must be non-empty and contain no '@'"));
                }
                if *port == Some(0) {
                    return Err(crate::Error::config("ssh port must be between 1 and 65535"));
                }
                if ssh_binary.is_empty() {
                    return Err(crate::Error::config("ssh_binary cannot be empty"));
                }
                Ok(())
            }
        }
    }

    /// Get the transport type name
    pub fn type_name(&self) -> &'static str {
        match self {
            TransportConfig::Local { .. } => "local",
            TransportConfig::Ssh { .. } => "ssh",
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig::Local {
            command_prefix: Vec::new(),
        }
    }
}

fn default_webapi_path() -> String {
    DEFAULT_WEBAPI_PATH.to_string()
}

fn default_ssh_binary() -> String {
    "ssh".to_string()
}
