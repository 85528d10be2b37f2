//! Newman test-run model.
//!
//! Mirrors the JSON summary newman exports (`--reporter-json-export`). The
//! export is loosely typed across newman versions, so every field is optional
//! and the numeric fields keep their raw JSON value until an accessor decides
//! whether they are usable. A field of an unexpected type decodes as absent
//! instead of rejecting the whole run.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading a test-run export.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to read test run {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed test run JSON in {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A complete newman run summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestRunResult {
    #[serde(default, deserialize_with = "lenient")]
    pub collection: Option<CollectionNode>,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub run: RunSection,
}

impl TestRunResult {
    /// Parse a run summary from a JSON string.
    pub fn from_json_str(raw: &str, origin: &str) -> Result<Self, InputError> {
        serde_json::from_str(raw).map_err(|source| InputError::Parse {
            origin: origin.to_string(),
            source,
        })
    }

    /// Collection display name, preferring the SDK `name` over `info.name`.
    pub fn collection_name(&self) -> String {
        self.collection
            .as_ref()
            .and_then(|c| {
                non_empty(c.name.as_deref())
                    .or_else(|| c.info.as_ref().and_then(|i| non_empty(i.name.as_deref())))
            })
            .unwrap_or("collection")
            .to_string()
    }

    pub fn executions(&self) -> &[Execution] {
        self.run.executions.as_deref().unwrap_or_default()
    }

    pub fn failures(&self) -> &[Failure] {
        self.run.failures.as_deref().unwrap_or_default()
    }
}

/// Read and parse a newman JSON export from disk.
pub fn load_run(path: &Path) -> Result<TestRunResult, InputError> {
    let raw = std::fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    TestRunResult::from_json_str(&raw, &path.display().to_string())
}

/// A node of the collection tree: a folder when `item` is present, a request
/// otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionNode {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub info: Option<CollectionInfo>,
    /// Only an array makes the node a folder.
    #[serde(
        default,
        deserialize_with = "lenient_vec",
        skip_serializing_if = "Option::is_none"
    )]
    pub item: Option<Vec<CollectionNode>>,
}

impl CollectionNode {
    pub fn folder(name: &str, children: Vec<CollectionNode>) -> Self {
        Self {
            name: Some(name.to_string()),
            item: Some(children),
            ..Self::default()
        }
    }

    pub fn request(id: &str, name: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn is_folder(&self) -> bool {
        self.item.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSection {
    #[serde(default, deserialize_with = "lenient")]
    pub stats: Option<RunStats>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub executions: Option<Vec<Execution>>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub failures: Option<Vec<Failure>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    #[serde(default, deserialize_with = "lenient")]
    pub requests: Option<StatCounter>,
    #[serde(default, deserialize_with = "lenient")]
    pub assertions: Option<StatCounter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatCounter {
    #[serde(default, deserialize_with = "lenient_count")]
    pub total: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub failed: Option<u64>,
}

/// Reference to the collection item an execution or failure came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemRef {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    pub kind: Option<String>,
}

impl ItemRef {
    pub fn id(&self) -> Option<&str> {
        non_empty(self.id.as_deref())
    }

    pub fn name(&self) -> Option<&str> {
        non_empty(self.name.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub method: Option<String>,
    /// Either a raw URL string or an SDK URL object.
    #[serde(default)]
    pub url: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseInfo {
    #[serde(default)]
    pub code: Option<Value>,
    #[serde(default, rename = "responseTime")]
    pub response_time: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub timings: Option<ResponseTimings>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseTimings {
    #[serde(default)]
    pub response: Option<Value>,
}

/// Outcome of one assertion inside an execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssertionOutcome {
    #[serde(default, deserialize_with = "lenient_string")]
    pub assertion: Option<String>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl AssertionOutcome {
    /// An assertion failed when it carries a truthy `error`.
    pub fn is_failed(&self) -> bool {
        match &self.error {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
            Some(_) => true,
        }
    }
}

/// One executed request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    #[serde(default, deserialize_with = "lenient")]
    pub item: Option<ItemRef>,
    #[serde(default, deserialize_with = "lenient")]
    pub request: Option<RequestInfo>,
    #[serde(default, deserialize_with = "lenient")]
    pub response: Option<ResponseInfo>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub assertions: Option<Vec<AssertionOutcome>>,
}

impl Execution {
    pub fn item_id(&self) -> Option<&str> {
        self.item.as_ref().and_then(ItemRef::id)
    }

    pub fn item_name(&self) -> Option<&str> {
        self.item.as_ref().and_then(ItemRef::name)
    }

    /// Uppercased HTTP method, `(UNKNOWN)` when absent.
    pub fn method(&self) -> String {
        non_empty(self.request.as_ref().and_then(|r| r.method.as_deref()))
            .unwrap_or("(UNKNOWN)")
            .to_uppercase()
    }

    pub fn url(&self) -> Option<&Value> {
        self.request.as_ref().and_then(|r| r.url.as_ref())
    }

    /// Numeric HTTP status code, if the response carried one.
    pub fn status_code(&self) -> Option<u16> {
        self.response
            .as_ref()
            .and_then(|r| r.code.as_ref())
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok())
    }

    /// Response time in milliseconds.
    ///
    /// `responseTime` wins over `timings.response` whenever it is present,
    /// even if it turns out not to be numeric.
    pub fn response_time(&self) -> Option<f64> {
        let response = self.response.as_ref()?;
        let raw = response.response_time.as_ref().or_else(|| {
            response
                .timings
                .as_ref()
                .and_then(|t| t.response.as_ref())
        })?;
        raw.as_f64().filter(|t| t.is_finite())
    }

    pub fn assertion_count(&self) -> u64 {
        self.assertions.as_ref().map_or(0, |a| a.len() as u64)
    }

    pub fn failed_assertion_count(&self) -> u64 {
        self.assertions
            .as_ref()
            .map_or(0, |a| a.iter().filter(|x| x.is_failed()).count() as u64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FailureError {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub test: Option<String>,
}

/// One failed assertion as reported in `run.failures`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    /// A bare string or scalar `error` becomes the message.
    #[serde(default, deserialize_with = "failure_error")]
    pub error: Option<FailureError>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub source: Option<ItemRef>,
}

impl Failure {
    pub fn source_id(&self) -> Option<&str> {
        self.source.as_ref().and_then(ItemRef::id)
    }

    /// Assertion identifier: the test name, then the error name.
    pub fn assertion_name(&self) -> &str {
        self.error
            .as_ref()
            .and_then(|e| non_empty(e.test.as_deref()).or_else(|| non_empty(e.name.as_deref())))
            .unwrap_or("unknown-assert")
    }

    pub fn message(&self) -> Option<&str> {
        self.error
            .as_ref()
            .and_then(|e| non_empty(e.message.as_deref()))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

/// An array keeps every element; elements of the wrong shape become defaults.
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match Value::deserialize(deserializer)? {
        Value::Array(values) => Ok(Some(
            values
                .into_iter()
                .map(|v| serde_json::from_value(v).unwrap_or_default())
                .collect(),
        )),
        _ => Ok(None),
    }
}

/// Strings as-is, numbers in their JSON spelling.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Non-negative integral numbers, including `2.0`.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|n| n.is_finite() && *n >= 0.0 && n.fract() == 0.0 && *n <= u64::MAX as f64)
            .map(|n| n as u64)
    }))
}

fn failure_error<'de, D>(deserializer: D) -> Result<Option<FailureError>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        value @ Value::Object(_) => serde_json::from_value(value).ok(),
        Value::String(message) => Some(FailureError {
            message: Some(message),
            ..FailureError::default()
        }),
        other => Some(FailureError {
            message: Some(other.to_string()),
            ..FailureError::default()
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn execution(value: Value) -> Execution {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_response_time_prefers_response_time_field() {
        let ex = execution(json!({"response": {"responseTime": 42, "timings": {"response": 7}}}));
        assert_eq!(ex.response_time(), Some(42.0));
    }

    #[test]
    fn test_response_time_falls_back_to_timings() {
        let ex = execution(json!({"response": {"timings": {"response": 7.5}}}));
        assert_eq!(ex.response_time(), Some(7.5));
    }

    #[test]
    fn test_non_numeric_response_time_is_skipped() {
        let ex = execution(json!({"response": {"responseTime": "fast", "timings": {"response": 7}}}));
        assert_eq!(ex.response_time(), None);
    }

    #[test]
    fn test_status_code_requires_integer() {
        assert_eq!(execution(json!({"response": {"code": 201}})).status_code(), Some(201));
        assert_eq!(execution(json!({"response": {"code": "201"}})).status_code(), None);
        assert_eq!(execution(json!({})).status_code(), None);
    }

    #[test]
    fn test_method_uppercased_with_unknown_fallback() {
        assert_eq!(execution(json!({"request": {"method": "get"}})).method(), "GET");
        assert_eq!(execution(json!({"request": {}})).method(), "(UNKNOWN)");
    }

    #[test]
    fn test_failed_assertions_follow_error_truthiness() {
        let ex = execution(json!({"assertions": [
            {"assertion": "ok"},
            {"assertion": "null", "error": null},
            {"assertion": "boom", "error": {"name": "AssertionError"}},
            {"assertion": "text", "error": "bad"},
            {"assertion": "empty", "error": ""}
        ]}));
        assert_eq!(ex.assertion_count(), 5);
        assert_eq!(ex.failed_assertion_count(), 2);
    }

    #[test]
    fn test_assertion_name_priority() {
        let f: Failure = serde_json::from_value(json!({"error": {"name": "AssertionError", "test": "status_is_200"}})).unwrap();
        assert_eq!(f.assertion_name(), "status_is_200");
        let f: Failure = serde_json::from_value(json!({"error": {"name": "AssertionError"}})).unwrap();
        assert_eq!(f.assertion_name(), "AssertionError");
        let f = Failure::default();
        assert_eq!(f.assertion_name(), "unknown-assert");
    }

    #[test]
    fn test_collection_name_from_info() {
        let run: TestRunResult =
            serde_json::from_value(json!({"collection": {"info": {"name": "Billing"}, "item": []}})).unwrap();
        assert_eq!(run.collection_name(), "Billing");
        assert_eq!(TestRunResult::default().collection_name(), "collection");
    }

    #[test]
    fn test_malformed_json_is_input_error() {
        let err = TestRunResult::from_json_str("{not json", "inline").unwrap_err();
        assert!(matches!(err, InputError::Parse { .. }));
        assert!(err.to_string().contains("inline"));
    }

    #[test]
    fn test_string_error_becomes_message() {
        let run = TestRunResult::from_json_str(r#"{"run":{"failures":[{"error":"boom"}]}}"#, "inline")
            .unwrap();
        assert_eq!(run.failures().len(), 1);
        assert_eq!(run.failures()[0].message(), Some("boom"));
        assert_eq!(run.failures()[0].assertion_name(), "unknown-assert");
    }

    #[test]
    fn test_numeric_item_id_is_stringified() {
        let ex = execution(json!({"item": {"id": 42, "name": ["not", "a", "name"]}}));
        assert_eq!(ex.item_id(), Some("42"));
        assert_eq!(ex.item_name(), None);
    }

    #[test]
    fn test_float_stat_counts_are_accepted() {
        let run: TestRunResult = serde_json::from_value(json!({"run": {"stats": {
            "requests": {"total": 2.0, "failed": "x"},
            "assertions": {"total": -1, "failed": 1.5}
        }}}))
        .unwrap();
        let stats = run.run.stats.unwrap();
        let requests = stats.requests.unwrap();
        assert_eq!(requests.total, Some(2));
        assert_eq!(requests.failed, None);
        let assertions = stats.assertions.unwrap();
        assert_eq!(assertions.total, None);
        assert_eq!(assertions.failed, None);
    }

    #[test]
    fn test_non_array_item_is_a_request() {
        let run: TestRunResult = serde_json::from_value(json!({"collection": {"item": [
            {"name": "Odd", "item": {}},
            {"name": "Auth", "item": [{"id": "itm-1", "name": "Login"}, "junk"]}
        ]}}))
        .unwrap();
        let children = run.collection.unwrap().item.unwrap();
        assert!(!children[0].is_folder());
        assert!(children[1].is_folder());
        let auth = children[1].item.as_ref().unwrap();
        assert_eq!(auth.len(), 2);
        assert_eq!(auth[1], CollectionNode::default());
    }

    #[test]
    fn test_wrong_typed_sections_do_not_fail_the_run() {
        let run = TestRunResult::from_json_str(
            r#"{"collection": "x", "run": {"executions": {"a": 1}, "failures": [null, {"source": 7}]}}"#,
            "inline",
        )
        .unwrap();
        assert!(run.collection.is_none());
        assert!(run.executions().is_empty());
        assert_eq!(run.failures().len(), 2);
        assert_eq!(run.failures()[1].source_id(), None);
    }

    #[test]
    fn test_load_run_missing_file() {
        let err = load_run(Path::new("/nonexistent/run.json")).unwrap_err();
        assert!(matches!(err, InputError::Read { .. }));
    }
}
