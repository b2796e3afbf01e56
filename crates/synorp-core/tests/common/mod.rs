//! Test doubles and common utilities for reconciler contract tests

#![allow(dead_code)]

use serde_json::{Map, Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use synorp_core::error::{Error, Result};
use synorp_core::traits::{ApiGateway, ApiResponse};
use synorp_core::ReverseProxyArgs;

/// A recorded gateway call
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub api: String,
    pub method: String,
    pub params: Map<String, Value>,
}

/// A gateway backed by an in-memory entry list
///
/// `create` appends the entry with a fresh UUID and `update` replaces the
/// entry with the same UUID, so repeated runs see the persisted result.
/// Clones share the same store and call log.
#[derive(Clone, Default)]
pub struct StoreGateway {
    entries: Arc<Mutex<Vec<Value>>>,
    calls: Arc<Mutex<Vec<Call>>>,
    next_uuid: Arc<AtomicUsize>,
    failing_method: Arc<Mutex<Option<String>>>,
}

impl StoreGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the given remote entries
    pub fn with_entries(entries: Vec<Value>) -> Self {
        let gateway = Self::new();
        *gateway.entries.lock().unwrap() = entries;
        gateway
    }

    /// Make `method` answer `success: false`
    pub fn fail_on(&self, method: &str) {
        *self.failing_method.lock().unwrap() = Some(method.to_string());
    }

    pub fn entries(&self) -> Vec<Value> {
        self.entries.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.method).collect()
    }

    /// Number of `create`/`update` calls
    pub fn mutation_count(&self) -> usize {
        self.methods()
            .iter()
            .filter(|m| *m == "create" || *m == "update")
            .count()
    }

    /// The `entry` parameter of the last mutation
    pub fn last_sent_entry(&self) -> Option<Value> {
        self.calls()
            .into_iter()
            .rev()
            .find(|c| c.method == "create" || c.method == "update")
            .and_then(|c| c.params.get("entry").cloned())
    }
}

#[async_trait::async_trait]
impl ApiGateway for StoreGateway {
    async fn invoke(
        &self,
        api: &str,
        method: &str,
        params: &Map<String, Value>,
        ignore_error: bool,
    ) -> Result<ApiResponse> {
        self.calls.lock().unwrap().push(Call {
            api: api.to_string(),
            method: method.to_string(),
            params: params.clone(),
        });

        if self.failing_method.lock().unwrap().as_deref() == Some(method) {
            let response = json!({"success": false, "error": {"code": 400}});
            if ignore_error {
                return Ok(ApiResponse {
                    success: false,
                    data: None,
                });
            }
            return Err(Error::api_failure(api, method, response.to_string()));
        }

        let mut entries = self.entries.lock().unwrap();
        match method {
            "list" => Ok(ApiResponse::ok(Some(json!({
                "entries": entries.clone(),
                "total": entries.len(),
            })))),
            "create" => {
                let mut entry = params.get("entry").cloned().unwrap_or(Value::Null);
                let n = self.next_uuid.fetch_add(1, Ordering::SeqCst);
                entry["UUID"] = json!(format!("uuid-{}", n));
                entries.push(entry);
                Ok(ApiResponse::ok(None))
            }
            "update" => {
                let entry = params.get("entry").cloned().unwrap_or(Value::Null);
                let uuid = entry["UUID"].clone();
                match entries.iter_mut().find(|e| e["UUID"] == uuid) {
                    Some(slot) => {
                        *slot = entry;
                        Ok(ApiResponse::ok(None))
                    }
                    None => Err(Error::api_failure(api, method, "unknown UUID")),
                }
            }
            other => Err(Error::api_failure(api, other, "unsupported method")),
        }
    }

    fn gateway_name(&self) -> &'static str {
        "store"
    }
}

/// Declared arguments for the DSM example entry
pub fn dsm_args() -> ReverseProxyArgs {
    serde_json::from_value(json!({
        "name": "DSM",
        "backend": {"fqdn": "localhost", "port": 5000, "https": false},
        "frontend": {"fqdn": "dsm.my.local.network", "https": true},
    }))
    .expect("valid arguments")
}

/// A remote entry as the device reports it
pub fn remote_entry(description: &str, uuid: &str) -> Value {
    json!({
        "description": description,
        "UUID": uuid,
        "backend": {"fqdn": "localhost", "port": 5000, "protocol": 0},
        "frontend": {
            "fqdn": "dsm.my.local.network",
            "port": 443,
            "protocol": 1,
            "https": {"hsts": false},
            "acl": null
        },
        "customize_headers": [],
        "proxy_connect_timeout": 60,
        "proxy_read_timeout": 60,
        "proxy_send_timeout": 60,
        "proxy_http_version": 1,
        "proxy_intercept_errors": false
    })
}
