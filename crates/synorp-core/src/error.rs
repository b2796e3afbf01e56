//! Error types for the reverse proxy reconciler
//!
//! This module defines all error types used throughout the crate.
//! None of them are retried: the first error aborts the invocation.

use thiserror::Error;

/// Result type alias for reconciler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the reconciler
#[derive(Error, Debug)]
pub enum Error {
    /// More than one remote entry shares the declared description
    #[error(
        "Found more than one existing entry matching description '{0}'. \
         Please rename one of them manually."
    )]
    AmbiguousMatch(String),

    /// The remote API answered with `success: false`
    #[error("synowebapi returned failure.\nFull response: {response}")]
    ApiFailure {
        /// API name, e.g. `SYNO.Core.AppPortal.ReverseProxy`
        api: String,
        /// Method name, e.g. `list`
        method: String,
        /// Raw response body as printed by the binary
        response: String,
    },

    /// The command (local or over ssh) exited with a non-zero status
    #[error("Command failed with {}: {stderr}", exit_status(.code))]
    CommandFailed {
        /// Exit code, `None` when the process was killed by a signal
        code: Option<i32>,
        /// Captured standard error
        stderr: String,
    },

    /// The response could not be interpreted
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Process spawn or file I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid module arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

fn exit_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl Error {
    /// Create an ambiguous match error for the given description
    pub fn ambiguous_match(description: impl Into<String>) -> Self {
        Self::AmbiguousMatch(description.into())
    }

    /// Create an API failure error
    pub fn api_failure(
        api: impl Into<String>,
        method: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Self::ApiFailure {
            api: api.into(),
            method: method.into(),
            response: response.into(),
        }
    }

    /// Create a command failure error
    pub fn command_failed(code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self::CommandFailed {
            code,
            stderr: stderr.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error was caused by the caller rather than the device
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::InvalidInput(_))
    }
}
