//! Runs the gateway against a fake `synowebapi` shell script.
//!
//! The script is interpreted by `sh` through the local `command_prefix`, so
//! it never needs to be executable.

#![cfg(unix)]

use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use synorp_core::{ApiGateway, Error, Reconciler, ReverseProxyArgs};
use synorp_gateway_webapi::{Transport, WebApiGateway};
use tempfile::TempDir;

const API: &str = "SYNO.Core.AppPortal.ReverseProxy";

/// A fake binary that logs its arguments and answers per method
struct FakeWebApi {
    dir: TempDir,
}

impl FakeWebApi {
    /// `responses` maps a method name to `(stdout, exit code)`
    fn new(responses: &[(&str, &str, i32)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");

        let mut script = format!(
            "printf '%s\\n' \"$@\" >> '{}'\nprintf '%s\\n' '---' >> '{}'\ncase \"$3\" in\n",
            log.display(),
            log.display()
        );
        for (method, stdout, code) in responses {
            let body = dir.path().join(format!("{}.out", method));
            std::fs::write(&body, stdout).unwrap();
            script.push_str(&format!(
                "  method={}) cat '{}'; echo 'fake stderr' >&2; exit {} ;;\n",
                method,
                body.display(),
                code
            ));
        }
        script.push_str("  *) echo 'unexpected method' >&2; exit 64 ;;\nesac\n");
        std::fs::write(dir.path().join("synowebapi"), script).unwrap();

        Self { dir }
    }

    fn path(&self) -> PathBuf {
        self.dir.path().join("synowebapi")
    }

    fn gateway(&self) -> WebApiGateway {
        WebApiGateway::new(
            self.path().display().to_string(),
            Transport::Local {
                command_prefix: vec!["sh".to_string()],
            },
        )
    }

    /// Argument lists of every call, in order
    fn calls(&self) -> Vec<Vec<String>> {
        read_calls(&self.dir.path().join("calls.log"))
    }
}

fn read_calls(log: &Path) -> Vec<Vec<String>> {
    let content = std::fs::read_to_string(log).unwrap_or_default();
    content
        .split("---\n")
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| chunk.lines().map(str::to_string).collect())
        .collect()
}

#[tokio::test]
async fn list_returns_data() {
    let fake = FakeWebApi::new(&[(
        "list",
        r#"{"success": true, "data": {"entries": [{"description": "DSM"}], "total": 1}}"#,
        0,
    )]);

    let response = fake
        .gateway()
        .invoke(API, "list", &Map::new(), false)
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.data.unwrap()["entries"][0]["description"], json!("DSM"));
    assert_eq!(
        fake.calls(),
        vec![vec![
            "--exec".to_string(),
            format!("api={}", API),
            "method=list".to_string(),
        ]]
    );
}

#[tokio::test]
async fn params_are_passed_json_encoded() {
    let fake = FakeWebApi::new(&[("create", r#"{"success": true}"#, 0)]);
    let entry = json!({
        "description": "DSM",
        "customize_headers": [{"name": "Upgrade", "value": "$http_upgrade"}]
    });
    let mut params = Map::new();
    params.insert("entry".to_string(), entry.clone());

    fake.gateway().invoke(API, "create", &params, false).await.unwrap();

    let calls = fake.calls();
    let entry_arg = calls[0].iter().find(|a| a.starts_with("entry=")).unwrap();
    let sent: Value = serde_json::from_str(&entry_arg["entry=".len()..]).unwrap();
    assert_eq!(sent, entry);
}

#[tokio::test]
async fn non_zero_exit_is_command_failure() {
    let fake = FakeWebApi::new(&[("list", "", 3)]);

    let err = fake
        .gateway()
        .invoke(API, "list", &Map::new(), false)
        .await
        .unwrap_err();

    match err {
        Error::CommandFailed { code, stderr } => {
            assert_eq!(code, Some(3));
            assert_eq!(stderr, "fake stderr");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn failure_response_respects_ignore_error() {
    let fake = FakeWebApi::new(&[("update", r#"{"success": false, "error": {"code": 400}}"#, 0)]);
    let gateway = fake.gateway();

    let err = gateway
        .invoke(API, "update", &Map::new(), false)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ApiFailure { .. }));
    assert!(err.to_string().contains(r#""code": 400"#));

    let response = gateway
        .invoke(API, "update", &Map::new(), true)
        .await
        .unwrap();
    assert!(!response.success);
}

#[tokio::test]
async fn garbage_output_is_malformed() {
    let fake = FakeWebApi::new(&[("list", "not json at all", 0)]);

    let err = fake
        .gateway()
        .invoke(API, "list", &Map::new(), false)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MalformedResponse(_)));
}

#[tokio::test]
async fn missing_binary_is_io_error() {
    let gateway = WebApiGateway::new(
        "/nonexistent/synowebapi",
        Transport::Local {
            command_prefix: Vec::new(),
        },
    );

    let err = gateway
        .invoke(API, "list", &Map::new(), false)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Io(_)));
}

#[tokio::test]
async fn reconciler_creates_entry_through_binary() {
    let fake = FakeWebApi::new(&[
        ("list", r#"{"success": true, "data": {"entries": []}}"#, 0),
        ("create", r#"{"success": true}"#, 0),
    ]);
    let reconciler = Reconciler::new(Box::new(fake.gateway()));
    let args = ReverseProxyArgs::from_json(
        r#"{
            "name": "DSM",
            "backend": {"fqdn": "localhost", "port": 5000},
            "frontend": {"fqdn": "dsm.my.local.network", "https": true}
        }"#,
    )
    .unwrap();

    let report = reconciler.reconcile(&args, false).await.unwrap();
    assert!(report.changed);

    let calls = fake.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1][2], "method=create");
    let sent: Value = serde_json::from_str(&calls[1][3]["entry=".len()..]).unwrap();
    assert_eq!(sent["frontend"], json!({"fqdn": "dsm.my.local.network", "port": 443, "protocol": 1}));
    assert_eq!(sent["backend"], json!({"fqdn": "localhost", "port": 5000, "protocol": 0}));
}
