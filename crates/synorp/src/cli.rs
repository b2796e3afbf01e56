//! Command-line interface
//!
//! Every flag can also be set through a `SYNORP_*` environment variable.

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use std::io::Read;
use std::path::PathBuf;
use synorp_core::config::{SynorpConfig, TransportConfig};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "synorp")]
#[command(about = "Reconcile a Synology reverse proxy entry through synowebapi")]
#[command(version)]
pub struct Cli {
    /// JSON file holding the declared entry ("-" reads stdin)
    #[arg(env = "SYNORP_ARGS_FILE")]
    pub args_file: String,

    /// Report what would change without applying it
    #[arg(long, env = "SYNORP_CHECK_MODE")]
    pub check: bool,

    /// JSON configuration file for the transport
    #[arg(short, long, env = "SYNORP_CONFIG")]
    pub config: Option<PathBuf>,

    /// How synowebapi is reached (overrides the config file)
    #[arg(long, env = "SYNORP_TRANSPORT")]
    pub transport: Option<TransportKind>,

    /// NAS hostname for the ssh transport
    #[arg(long, env = "SYNORP_HOST")]
    pub host: Option<String>,

    /// ssh login user
    #[arg(short, long, env = "SYNORP_USER")]
    pub user: Option<String>,

    /// ssh port
    #[arg(short, long, env = "SYNORP_PORT")]
    pub port: Option<u16>,

    /// ssh private key
    #[arg(short, long, env = "SYNORP_IDENTITY_FILE")]
    pub identity_file: Option<String>,

    /// ssh client binary
    #[arg(long, env = "SYNORP_SSH_BINARY")]
    pub ssh_binary: Option<String>,

    /// Extra ssh `-o` option (repeatable, one option per flag)
    #[arg(long = "ssh-option", env = "SYNORP_SSH_OPTION")]
    pub ssh_options: Vec<String>,

    /// Run synowebapi through `sudo -n`
    #[arg(long, env = "SYNORP_SUDO")]
    pub sudo: bool,

    /// Path of synowebapi on the NAS
    #[arg(long, env = "SYNORP_WEBAPI_PATH")]
    pub webapi_path: Option<String>,

    /// Log level (logs go to stderr)
    #[arg(long, env = "SYNORP_LOG_LEVEL", default_value = "warn")]
    pub log_level: LogLevel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    /// Run synowebapi on this machine
    Local,
    /// Run synowebapi on the NAS over ssh
    Ssh,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl Cli {
    /// Read the declared entry document
    pub fn read_args(&self) -> Result<String> {
        if self.args_file == "-" {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read module arguments from stdin")?;
            return Ok(input);
        }

        std::fs::read_to_string(&self.args_file)
            .with_context(|| format!("Failed to read module arguments from {}", self.args_file))
    }

    /// Load the config file (if any) and apply command-line overrides
    pub fn resolve_config(&self) -> Result<SynorpConfig> {
        let mut config = match &self.config {
            Some(path) => SynorpConfig::from_file(path)?,
            None => SynorpConfig::default(),
        };

        if let Some(ref path) = self.webapi_path {
            config.webapi_path = path.clone();
        }

        let kind = match (self.transport, &config.transport) {
            (Some(kind), _) => kind,
            (None, _) if self.host.is_some() => TransportKind::Ssh,
            (None, TransportConfig::Ssh { .. }) => TransportKind::Ssh,
            (None, TransportConfig::Local { .. }) => TransportKind::Local,
        };

        config.transport = match kind {
            TransportKind::Local => self.local_transport(config.transport),
            TransportKind::Ssh => self.ssh_transport(config.transport)?,
        };

        Ok(config)
    }

    fn local_transport(&self, base: TransportConfig) -> TransportConfig {
        let mut command_prefix = match base {
            TransportConfig::Local { command_prefix } => command_prefix,
            TransportConfig::Ssh { .. } => Vec::new(),
        };
        if self.sudo && command_prefix.is_empty() {
            command_prefix = vec!["sudo".to_string(), "-n".to_string()];
        }
        TransportConfig::Local { command_prefix }
    }

    fn ssh_transport(&self, base: TransportConfig) -> Result<TransportConfig> {
        let (host, user, port, identity_file, ssh_binary, mut ssh_options, sudo) = match base {
            TransportConfig::Ssh {
                host,
                user,
                port,
                identity_file,
                ssh_binary,
                ssh_options,
                sudo,
            } => (Some(host), user, port, identity_file, ssh_binary, ssh_options, sudo),
            TransportConfig::Local { .. } => {
                (None, None, None, None, "ssh".to_string(), Vec::new(), false)
            }
        };

        let Some(host) = self.host.clone().or(host) else {
            bail!("The ssh transport needs a host. Set it via --host or SYNORP_HOST");
        };
        ssh_options.extend(self.ssh_options.iter().cloned());

        Ok(TransportConfig::Ssh {
            host,
            user: self.user.clone().or(user),
            port: self.port.or(port),
            identity_file: self.identity_file.clone().or(identity_file),
            ssh_binary: self.ssh_binary.clone().unwrap_or(ssh_binary),
            ssh_options,
            sudo: self.sudo || sudo,
        })
    }
}
