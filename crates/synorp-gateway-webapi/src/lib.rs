// # synowebapi Gateway
//
// This crate provides the `ApiGateway` implementation that talks to DSM
// through the `synowebapi` binary instead of the HTTP web API. Running the
// binary sidesteps web session handling entirely: authentication is plain
// ssh public keys plus, when needed, a sudoers rule for `synowebapi`.
//
// ## Command Line
//
// ```text
// /usr/syno/bin/synowebapi --exec api=SYNO.Core.AppPortal.ReverseProxy method=update entry='{"UUID":"..."}'
// ```
//
// Every parameter value is JSON-encoded. The binary prints one JSON object:
//
// ```json
// {"success": true, "data": {"entries": [...]}}
// ```
//
// ## Transports
//
// - **local**: exec the binary directly (optionally behind a prefix such as `sudo -n`)
// - **ssh**: `ssh -o BatchMode=yes ... -- [user@]host '<quoted command>'`
//
// ## Behavior
//
// - One process per call, no retry, no caching
// - Non-zero exit → `Error::CommandFailed`
// - Unparseable stdout → `Error::MalformedResponse`
// - `success: false` → `Error::ApiFailure` unless the caller ignores errors

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::process::Stdio;
use synorp_core::config::{SynorpConfig, TransportConfig};
use synorp_core::registry::GatewayRegistry;
use synorp_core::traits::{ApiGateway, ApiGatewayFactory, ApiResponse};
use synorp_core::{Error, Result};

/// How the binary is reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// Run on this machine
    Local {
        /// Arguments placed before the binary
        command_prefix: Vec<String>,
    },
    /// Run on a remote machine over ssh
    Ssh(SshTarget),
}

/// ssh connection parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub host: String,
    pub user: Option<String>,
    pub port: Option<u16>,
    pub identity_file: Option<String>,
    pub ssh_binary: String,
    pub ssh_options: Vec<String>,
    pub sudo: bool,
}

impl SshTarget {
    /// `user@host`, or `host` when no user is set
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.host),
            None => self.host.clone(),
        }
    }
}

/// Gateway running `synowebapi --exec`
#[derive(Debug, Clone)]
pub struct WebApiGateway {
    webapi_path: String,
    transport: Transport,
}

/// Response as printed by the binary
#[derive(Debug, Deserialize)]
struct RawResponse {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
}

impl WebApiGateway {
    pub fn new(webapi_path: impl Into<String>, transport: Transport) -> Self {
        Self {
            webapi_path: webapi_path.into(),
            transport,
        }
    }

    /// Build a gateway from configuration
    pub fn from_config(config: &SynorpConfig) -> Self {
        let transport = match &config.transport {
            TransportConfig::Local { command_prefix } => Transport::Local {
                command_prefix: command_prefix.clone(),
            },
            TransportConfig::Ssh {
                host,
                user,
                port,
                identity_file,
                ssh_binary,
                ssh_options,
                sudo,
            } => Transport::Ssh(SshTarget {
                host: host.clone(),
                user: user.clone(),
                port: *port,
                identity_file: identity_file.clone(),
                ssh_binary: ssh_binary.clone(),
                ssh_options: ssh_options.clone(),
                sudo: *sudo,
            }),
        };

        Self::new(config.webapi_path.clone(), transport)
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Arguments of `synowebapi` for one call
    pub fn webapi_args(
        &self,
        api: &str,
        method: &str,
        params: &Map<String, Value>,
    ) -> Result<Vec<String>> {
        let mut args = vec![
            self.webapi_path.clone(),
            "--exec".to_string(),
            format!("api={}", api),
            format!("method={}", method),
        ];
        for (key, value) in params {
            args.push(format!("{}={}", key, serde_json::to_string(value)?));
        }
        Ok(args)
    }

    /// Program and arguments actually executed for the given webapi args
    pub fn command_line(&self, webapi_args: Vec<String>) -> Result<(String, Vec<String>)> {
        if webapi_args.is_empty() {
            return Err(Error::invalid_input("synowebapi command line cannot be empty"));
        }

        match &self.transport {
            Transport::Local { command_prefix } => {
                let argv: Vec<String> = command_prefix.iter().cloned().chain(webapi_args).collect();
                let Some((program, args)) = argv.split_first() else {
                    return Err(Error::invalid_input("synowebapi command line cannot be empty"));
                };
                Ok((program.clone(), args.to_vec()))
            }
            Transport::Ssh(target) => {
                let mut args = vec!["-o".to_string(), "BatchMode=yes".to_string()];
                if let Some(port) = target.port {
                    args.push("-p".to_string());
                    args.push(port.to_string());
                }
                if let Some(ref identity) = target.identity_file {
                    args.push("-i".to_string());
                    args.push(identity.clone());
                }
                for option in &target.ssh_options {
                    args.push("-o".to_string());
                    args.push(option.clone());
                }
                args.push("--".to_string());
                args.push(target.destination());

                let mut remote: Vec<String> = Vec::new();
                if target.sudo {
                    remote.push("sudo".to_string());
                    remote.push("-n".to_string());
                }
                remote.extend(webapi_args.iter().map(|arg| shell_quote(arg)));
                args.push(remote.join(" "));

                Ok((target.ssh_binary.clone(), args))
            }
        }
    }

    async fn run(&self, program: &str, args: &[String]) -> Result<String> {
        let output = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!("failed to run {}: {}", program, e),
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(Error::command_failed(output.status.code(), stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Decode the binary's stdout
pub fn parse_response(
    stdout: &str,
    api: &str,
    method: &str,
    ignore_error: bool,
) -> Result<ApiResponse> {
    let raw: RawResponse = serde_json::from_str(stdout.trim()).map_err(|e| {
        Error::malformed(format!(
            "{} {} did not print a JSON response ({}): {}",
            api, method, e, stdout
        ))
    })?;

    if !raw.success && !ignore_error {
        return Err(Error::api_failure(api, method, stdout.trim()));
    }

    Ok(ApiResponse {
        success: raw.success,
        data: raw.data,
    })
}

/// Quote an argument for a POSIX shell
///
/// Arguments made only of safe characters are left alone; anything else is
/// wrapped in single quotes with embedded quotes written as `'\''`.
pub fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-+=/.,:@%".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

#[async_trait]
impl ApiGateway for WebApiGateway {
    async fn invoke(
        &self,
        api: &str,
        method: &str,
        params: &Map<String, Value>,
        ignore_error: bool,
    ) -> Result<ApiResponse> {
        let webapi_args = self.webapi_args(api, method, params)?;
        let (program, args) = self.command_line(webapi_args)?;

        tracing::debug!("Running {} {:?}", program, args);

        let stdout = self.run(&program, &args).await?;
        let response = parse_response(&stdout, api, method, ignore_error)?;

        if !response.success {
            tracing::warn!("{} {} returned failure (ignored)", api, method);
        } else {
            tracing::debug!("{} {} succeeded", api, method);
        }

        Ok(response)
    }

    fn gateway_name(&self) -> &'static str {
        match self.transport {
            Transport::Local { .. } => "local",
            Transport::Ssh(_) => "ssh",
        }
    }
}

/// Factory for both built-in transports
pub struct WebApiGatewayFactory;

impl ApiGatewayFactory for WebApiGatewayFactory {
    fn create(&self, config: &SynorpConfig) -> Result<Box<dyn ApiGateway>> {
        Ok(Box::new(WebApiGateway::from_config(config)))
    }
}

/// Register the `local` and `ssh` transports with a registry
///
/// # Example
///
/// ```rust
/// use synorp_core::GatewayRegistry;
///
/// let registry = GatewayRegistry::new();
/// synorp_gateway_webapi::register(&registry);
/// assert!(registry.has_gateway("ssh"));
/// ```
pub fn register(registry: &GatewayRegistry) {
    registry.register_gateway("local", Box::new(WebApiGatewayFactory));
    registry.register_gateway("ssh", Box::new(WebApiGatewayFactory));
}
