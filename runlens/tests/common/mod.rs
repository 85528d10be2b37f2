pub use runlens_common::testing::init_test_logging;

use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

#[macro_export]
macro_rules! test_log {
    ($($arg:tt)*) => {
        tracing::info!(target: "test", $($arg)*);
    };
}

const POSTMAN_VARS: &[&str] = &[
    "POSTMAN_BASE_URL",
    "POSTMAN_ENABLE_HTML_REPORT",
    "POSTMAN_HTML_REPORT_FILE",
    "POSTMAN_HEADK_K",
    "POSTMAN_HEADK_THRESHOLD",
    "POSTMAN_HEADK_GATE_ON",
];

/// The runlens binary with a clean `POSTMAN_*` environment.
pub fn runlens() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_runlens"));
    for var in POSTMAN_VARS {
        cmd.env_remove(var);
    }
    cmd.env_remove("RUNLENS_LOG_FILE");
    cmd
}

fn execution(id: &str, name: &str, path: &str, code: u16, time: u64, failed: bool) -> Value {
    let assertion = if failed {
        json!({"assertion": "status_is_200", "error": {"name": "AssertionError", "message": "expected 200"}})
    } else {
        json!({"assertion": "status_is_200"})
    };
    json!({
        "item": {"id": id, "name": name},
        "request": {"method": "GET", "url": format!("https://api.example.com{path}")},
        "response": {"code": code, "responseTime": time},
        "assertions": [assertion]
    })
}

/// A two-request run; `failing` adds one assertion failure on `/orders`.
pub fn run_json(failing: bool) -> Value {
    let failures = if failing {
        json!([{
            "error": {"name": "AssertionError", "test": "status_is_200", "message": "expected 200 but got 500 request 12345678"},
            "at": "assertion",
            "source": {"id": "o1", "name": "List orders"}
        }])
    } else {
        json!([])
    };
    json!({
        "collection": {
            "info": {"name": "Shop API"},
            "item": [
                {"name": "Orders", "item": [{"id": "o1", "name": "List orders"}]},
                {"id": "h1", "name": "Health"}
            ]
        },
        "run": {
            "stats": {
                "requests": {"total": 2, "failed": 0},
                "assertions": {"total": 2, "failed": if failing { 1 } else { 0 }}
            },
            "executions": [
                execution("o1", "List orders", "/api/orders", if failing { 500 } else { 200 }, 240, failing),
                execution("h1", "Health", "/health", 200, 20, false)
            ],
            "failures": failures
        }
    })
}

pub fn write_json(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

pub fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

pub fn assert_contains(haystack: &str, needle: &str) {
    assert!(
        haystack.contains(needle),
        "Expected '{needle}' in output, got: {haystack}"
    );
}

pub fn assert_exit(output: &Output, code: i32) {
    assert_eq!(
        output.status.code(),
        Some(code),
        "stdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}
