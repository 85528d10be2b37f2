//! Execution aggregation by folder, HTTP method and URL path prefix.

use crate::bucket::{BucketAggregate, BucketMap, finalize_all};
use crate::index::{CollectionIndex, folder_key};
use crate::number;
use crate::percentile::{PercentileSummary, sort_samples};
use runlens_common::Execution;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Number of entries kept in `topSlowRequests`.
pub const TOP_SLOW_REQUESTS: usize = 5;

/// Path-prefix key for executions whose URL could not be read.
pub const UNKNOWN_PREFIX: &str = "(unknown)";

/// Number of leading path segments that make up a prefix key.
const PREFIX_DEPTH: usize = 2;

/// One entry of `topSlowRequests`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlowRequest {
    pub name: Option<String>,
    pub code: Option<u16>,
    #[serde(serialize_with = "number::num")]
    pub response_time: f64,
}

/// Everything derived from `run.executions`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionAggregates {
    pub status_codes: BTreeMap<u16, u64>,
    pub top_slow_requests: Vec<SlowRequest>,
    pub response_time_percentiles: PercentileSummary,
    pub folders: BTreeMap<String, BucketAggregate>,
    pub methods: BTreeMap<String, BucketAggregate>,
    pub paths: BTreeMap<String, BucketAggregate>,
}

/// Fold all executions into the three bucket families plus the global views.
pub fn aggregate_executions(executions: &[Execution], index: &CollectionIndex) -> ExecutionAggregates {
    let mut status_codes = BTreeMap::new();
    let mut slow = Vec::new();
    let mut folders = BucketMap::new();
    let mut methods = BucketMap::new();
    let mut paths = BucketMap::new();

    for execution in executions {
        let code = execution.status_code();
        if let Some(code) = code {
            *status_codes.entry(code).or_insert(0) += 1;
        }
        if let Some(time) = execution.response_time() {
            slow.push(SlowRequest {
                name: execution.item_name().map(str::to_string),
                code,
                response_time: time,
            });
        }

        let folder = folder_key(index.resolve(execution.item_id(), execution.item_name()));
        let prefix = prefix_from_segments(extract_path_segments(execution.url()).as_deref());

        record(&mut folders, folder, execution);
        record(&mut methods, execution.method(), execution);
        record(&mut paths, prefix, execution);
    }

    let mut all_times: Vec<f64> = slow.iter().map(|s| s.response_time).collect();
    sort_samples(&mut all_times);

    // Stable sort keeps input order among equal times.
    slow.sort_by(|a, b| b.response_time.total_cmp(&a.response_time));
    slow.truncate(TOP_SLOW_REQUESTS);

    tracing::debug!(
        executions = executions.len(),
        folders = folders.len(),
        methods = methods.len(),
        paths = paths.len(),
        samples = all_times.len(),
        "aggregated executions"
    );

    ExecutionAggregates {
        status_codes,
        top_slow_requests: slow,
        response_time_percentiles: PercentileSummary::from_sorted(&all_times),
        folders: finalize_all(&folders),
        methods: finalize_all(&methods),
        paths: finalize_all(&paths),
    }
}

fn record(buckets: &mut BucketMap, key: String, execution: &Execution) {
    buckets.entry(key).or_default().record(execution);
}

/// Non-empty path segments of a request URL.
///
/// Accepts a URL string or an SDK URL object. Objects are read from
/// `path.segments`, then `path` (array or string), then `raw`. Returns `None`
/// when the value carries no usable URL.
pub fn extract_path_segments(url: Option<&Value>) -> Option<Vec<String>> {
    match url? {
        Value::String(raw) => Some(segments_from_str(raw)),
        Value::Object(obj) => {
            let path = obj.get("path");
            let listed = path
                .and_then(|p| p.get("segments"))
                .and_then(Value::as_array)
                .or_else(|| path.and_then(Value::as_array));
            if let Some(list) = listed {
                return Some(
                    list.iter()
                        .filter_map(Value::as_str)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect(),
                );
            }
            if let Some(p) = path.and_then(Value::as_str) {
                return Some(split_segments(p));
            }
            obj.get("raw").and_then(Value::as_str).map(segments_from_str)
        }
        _ => None,
    }
}

fn segments_from_str(raw: &str) -> Vec<String> {
    match url::Url::parse(raw) {
        Ok(parsed) => split_segments(parsed.path()),
        Err(_) => {
            let path = raw.split('?').next().unwrap_or_default();
            let path = path.split('#').next().unwrap_or_default();
            split_segments(path)
        }
    }
}

fn split_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Bucket key for a segment list: `/a/b` from the first two segments.
pub fn prefix_from_segments(segments: Option<&[String]>) -> String {
    match segments {
        None => UNKNOWN_PREFIX.to_string(),
        Some([]) => "/".to_string(),
        Some(segs) => {
            let depth = segs.len().min(PREFIX_DEPTH);
            format!("/{}", segs[..depth].join("/"))
        }
    }
}
