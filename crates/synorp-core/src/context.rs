//! Invocation context
//!
//! Holds the validated arguments of one run and turns its outcome into the
//! result object printed by the binary:
//!
//! - success: `{"changed": bool, "diff": {"before": {...}, "after": {...}}}`
//! - failure: `{"failed": true, "msg": "..."}`

use crate::entry::ReverseProxyArgs;
use crate::error::{Error, Result};
use crate::reconciler::{Diff, ReconcileReport, Reconciler};
use serde::Serialize;
use tracing::error;

/// Validated parameters plus run mode
#[derive(Debug, Clone)]
pub struct InvocationContext {
    args: ReverseProxyArgs,
    check_mode: bool,
}

impl InvocationContext {
    /// Create a context from already-parsed arguments
    pub fn new(args: ReverseProxyArgs, check_mode: bool) -> Result<Self> {
        args.validate()?;
        Ok(Self { args, check_mode })
    }

    /// Create a context from a JSON argument document
    pub fn from_json(input: &str, check_mode: bool) -> Result<Self> {
        let args = ReverseProxyArgs::from_json(input)?;
        Ok(Self { args, check_mode })
    }

    pub fn args(&self) -> &ReverseProxyArgs {
        &self.args
    }

    pub fn check_mode(&self) -> bool {
        self.check_mode
    }

    /// Run the reconciler and report either outcome
    pub async fn run(&self, reconciler: &Reconciler) -> ModuleResult {
        match reconciler.reconcile(&self.args, self.check_mode).await {
            Ok(report) => self.exit_json(report),
            Err(e) => self.fail_json(&e),
        }
    }

    /// Successful result
    pub fn exit_json(&self, report: ReconcileReport) -> ModuleResult {
        ModuleResult::Success {
            changed: report.changed,
            diff: report.diff,
        }
    }

    /// Failed result
    pub fn fail_json(&self, err: &Error) -> ModuleResult {
        error!("Reconciliation of '{}' failed: {}", self.args.name, err);
        ModuleResult::failed(err.to_string())
    }
}

/// Result object of one invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ModuleResult {
    Success { changed: bool, diff: Diff },
    Failed { failed: bool, msg: String },
}

impl ModuleResult {
    /// Failure with a human-readable message
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed {
            failed: true,
            msg: msg.into(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Render as a single-line JSON document
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
