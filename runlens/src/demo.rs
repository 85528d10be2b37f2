//! Synthetic run used to try the report and the concentration gate without
//! a live API.

use runlens_common::{NormalizationConfig, ReportingConfig, TestRunResult};
use serde_json::{Value, json};

pub const DEMO_COLLECTION: &str = "Demo collection";

/// (item id, method, path, status, response time, failed test and message)
type DemoRequest = (
    &'static str,
    &'static str,
    &'static str,
    u16,
    u64,
    Option<(&'static str, &'static str)>,
);

const REQUESTS: &[DemoRequest] = &[
    (
        "itm-1",
        "GET",
        "/api/v1/users",
        500,
        420,
        Some((
            "status_is_200",
            "期望 status 200 实际 500 - traceId=123e4567-e89b-12d3-a456-426614174000",
        )),
    ),
    (
        "itm-1",
        "GET",
        "/api/v1/users",
        500,
        385,
        Some((
            "status_is_200",
            "期望 status 200 实际 500 - traceId=9b2f6c1e-8d4a-4f3b-a7e5-2c9d0b1a6f34",
        )),
    ),
    ("itm-2", "POST", "/api/v1/users", 201, 140, None),
    (
        "itm-3",
        "POST",
        "/api/v1/login",
        400,
        95,
        Some(("ip_format", "IP 地址非法: 192.168.10.25")),
    ),
    (
        "itm-4",
        "GET",
        "/api/v1/orders",
        422,
        210,
        Some(("phone_format", "手机号不合法: +86-13800138000")),
    ),
    (
        "itm-5",
        "GET",
        "/api/v1/search?q=foo&uid=987654",
        400,
        60,
        Some(("url_query", "查询参数错误: /search?q=foo&uid=987654")),
    ),
    ("itm-2", "POST", "/api/v1/users", 201, 150, None),
    ("itm-4", "GET", "/api/v1/orders", 200, 180, None),
];

fn collection() -> Value {
    json!({
        "info": {"name": DEMO_COLLECTION},
        "item": [
            {"name": "Auth", "item": [
                {"name": "Users", "item": [
                    {"id": "itm-1", "name": "GET /api/v1/users"},
                    {"id": "itm-2", "name": "POST /api/v1/users"}
                ]},
                {"name": "Login", "item": [
                    {"id": "itm-3", "name": "POST /api/v1/login"}
                ]}
            ]},
            {"name": "Order", "item": [
                {"name": "List", "item": [
                    {"id": "itm-4", "name": "GET /api/v1/orders"}
                ]}
            ]},
            {"name": "Search", "item": [
                {"id": "itm-5", "name": "GET /api/v1/search"}
            ]}
        ]
    })
}

/// Eight requests against a demo API, five of them failing one assertion.
pub fn demo_run() -> Result<TestRunResult, serde_json::Error> {
    let mut executions = Vec::new();
    let mut failures = Vec::new();

    for &(id, method, path, code, time, failed) in REQUESTS {
        let item_name = format!("{method} {}", path.split('?').next().unwrap_or(path));
        let assertion = match failed {
            Some((test, message)) => json!({
                "assertion": test,
                "error": {"name": "AssertionError", "test": test, "message": message}
            }),
            None => json!({"assertion": "status_ok"}),
        };
        executions.push(json!({
            "item": {"id": id, "name": item_name},
            "request": {"method": method, "url": format!("https://demo.local{path}")},
            "response": {"code": code, "responseTime": time},
            "assertions": [assertion]
        }));

        if let Some((test, message)) = failed {
            failures.push(json!({
                "error": {"name": "AssertionError", "test": test, "message": message},
                "at": "assertion",
                "source": {"id": id, "name": item_name, "type": "Item"}
            }));
        }
    }

    serde_json::from_value(json!({
        "collection": collection(),
        "run": {
            "stats": {
                "requests": {"total": REQUESTS.len(), "failed": 0},
                "assertions": {"total": REQUESTS.len(), "failed": failures.len()}
            },
            "executions": executions,
            "failures": failures
        }
    }))
}

/// Gate on at K=3, 70%, with every normalization rule.
pub fn demo_reporting() -> ReportingConfig {
    let mut config = ReportingConfig::default();
    let clusters = &mut config.failure_clusters;
    clusters.head_k = 3;
    clusters.head_k_threshold_percent = 70.0;
    clusters.fail_on_head_k_threshold_breach = true;
    clusters.normalization = NormalizationConfig::all();
    config
}
