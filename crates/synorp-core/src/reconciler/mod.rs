//! Reverse proxy reconciler
//!
//! The Reconciler is responsible for:
//! - Listing the entries currently configured on the device
//! - Locating the entry whose description matches the declared name
//! - Computing the before/after diff and the `changed` flag
//! - Creating or updating the entry (unless running in check mode)
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐  list   ┌─────────────┐
//! │  Reconciler  │────────▶│ ApiGateway  │
//! └──────────────┘         └─────────────┘
//!        │
//!        ├─ match by description (more than one → abort)
//!        ├─ diff six scalar fields + header set
//!        │
//!        ├─ check mode → report only
//!        └─ create / update ─────▶ ApiGateway
//! ```
//!
//! At most two remote calls are made, one after the other.

use crate::entry::{ExistingEntry, ProxyEntry, ReverseProxyArgs};
use crate::error::{Error, Result};
use crate::lookup::{list_different, lookup};
use crate::traits::ApiGateway;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

/// API managing reverse proxy entries
pub const REVERSE_PROXY_API: &str = "SYNO.Core.AppPortal.ReverseProxy";

/// Scalar fields that decide whether an entry changed
pub const COMPARED_FIELDS: [&str; 6] = [
    "backend.fqdn",
    "backend.port",
    "backend.protocol",
    "frontend.fqdn",
    "frontend.port",
    "frontend.protocol",
];

/// What the reconciler did with the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// A new entry was created
    Created,
    /// The matching entry was overwritten
    Updated,
    /// Check mode: nothing was sent
    CheckOnly,
}

/// Before/after view of the entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diff {
    pub before: Value,
    pub after: Value,
}

/// Outcome of one reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub changed: bool,
    pub diff: Diff,
    #[serde(skip, default = "default_action")]
    pub action: Action,
}

fn default_action() -> Action {
    Action::CheckOnly
}

/// Reconciles one declared entry against the device
pub struct Reconciler {
    gateway: Box<dyn ApiGateway>,
}

impl Reconciler {
    pub fn new(gateway: Box<dyn ApiGateway>) -> Self {
        Self { gateway }
    }

    /// Run the reconciliation
    ///
    /// # Parameters
    ///
    /// - `args`: declared entry
    /// - `check_mode`: when `true`, compute the report without mutating
    ///
    /// # Returns
    ///
    /// - `Ok(ReconcileReport)`: the diff, the `changed` flag and the action taken
    /// - `Err(Error)`: ambiguous match, gateway failure, or malformed response.
    ///   No mutation has been issued when the error comes from the `list` step.
    pub async fn reconcile(
        &self,
        args: &ReverseProxyArgs,
        check_mode: bool,
    ) -> Result<ReconcileReport> {
        let mut desired = ProxyEntry::from_args(args);

        let entries = self.list_entries().await?;
        debug!("Device has {} reverse proxy entries", entries.len());

        let existing = find_by_description(entries, &args.name)?;

        if let Some(ref existing) = existing {
            desired = desired.with_uuid(existing.uuid()?);
        }

        let desired_value = desired.to_value()?;
        let existing_value = existing.map(ExistingEntry::into_value);

        let changed = has_changed(existing_value.as_ref(), &desired_value);
        let diff = Diff {
            before: with_presence(existing_value.as_ref()),
            after: with_presence(Some(&desired_value)),
        };

        if check_mode {
            if changed {
                warn!("Check mode: entry '{}' would be changed", args.name);
            } else {
                debug!("Check mode: entry '{}' is up to date", args.name);
            }
            return Ok(ReconcileReport {
                changed,
                diff,
                action: Action::CheckOnly,
            });
        }

        let (method, action) = match existing_value {
            Some(_) => ("update", Action::Updated),
            None => ("create", Action::Created),
        };

        info!(
            "Sending {} for entry '{}' via {} (changed: {})",
            method,
            args.name,
            self.gateway.gateway_name(),
            changed
        );

        let mut params = Map::new();
        params.insert("entry".to_string(), desired_value);
        self.gateway
            .invoke(REVERSE_PROXY_API, method, &params, false)
            .await?;

        Ok(ReconcileReport {
            changed,
            diff,
            action,
        })
    }

    async fn list_entries(&self) -> Result<Vec<Value>> {
        let response = self
            .gateway
            .invoke(REVERSE_PROXY_API, "list", &Map::new(), false)
            .await?;

        match response.data.as_ref().and_then(|data| data.get("entries")) {
            Some(Value::Array(entries)) => Ok(entries.clone()),
            _ => Err(Error::malformed(
                "list response does not contain a data.entries array",
            )),
        }
    }
}

/// Pick the single entry whose description equals `name`
fn find_by_description(entries: Vec<Value>, name: &str) -> Result<Option<ExistingEntry>> {
    let mut found = None;

    for value in entries {
        let entry = ExistingEntry::from_value(value)?;
        if entry.description() != Some(name) {
            continue;
        }
        if found.is_some() {
            return Err(Error::ambiguous_match(name));
        }
        found = Some(entry);
    }

    Ok(found)
}

/// Whether the desired entry differs from the existing one
///
/// Only [`COMPARED_FIELDS`] and the header set are authoritative; other
/// remote-side fields are ignored.
pub fn has_changed(existing: Option<&Value>, desired: &Value) -> bool {
    let desired = Some(desired);

    let scalar_changed = COMPARED_FIELDS.iter().any(|field| {
        let differs = lookup(existing, field) != lookup(desired, field);
        if differs {
            debug!("Field {} differs", field);
        }
        differs
    });

    let headers_changed = list_different(
        lookup(desired, "customize_headers"),
        lookup(existing, "customize_headers"),
    );
    if headers_changed {
        debug!("customize_headers differ");
    }

    scalar_changed || headers_changed
}

fn with_presence(entry: Option<&Value>) -> Value {
    match entry {
        Some(Value::Object(fields)) => {
            let mut out = Map::new();
            out.insert("present".to_string(), Value::Bool(true));
            out.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
            Value::Object(out)
        }
        _ => json!({ "present": false }),
    }
}
