//! Per-key execution buckets.

use crate::number;
use crate::percentile::{PercentileSummary, sort_samples};
use runlens_common::Execution;
use serde::Serialize;
use std::collections::BTreeMap;

/// Running totals for one folder, method or path prefix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bucket {
    pub requests: u64,
    pub assertions_total: u64,
    pub assertions_failed: u64,
    pub status_codes: BTreeMap<u16, u64>,
    pub response_times: Vec<f64>,
}

impl Bucket {
    /// Fold one execution into the bucket.
    pub fn record(&mut self, execution: &Execution) {
        self.requests += 1;
        self.assertions_total += execution.assertion_count();
        self.assertions_failed += execution.failed_assertion_count();
        if let Some(code) = execution.status_code() {
            *self.status_codes.entry(code).or_insert(0) += 1;
        }
        if let Some(time) = execution.response_time() {
            self.response_times.push(time);
        }
    }

    /// Compute the aggregate. Leaves the bucket untouched, so repeated calls
    /// agree.
    pub fn finalize(&self) -> BucketAggregate {
        let mut sorted = self.response_times.clone();
        sort_samples(&mut sorted);
        BucketAggregate {
            requests: self.requests,
            assertions_total: self.assertions_total,
            assertions_failed: self.assertions_failed,
            status_codes: self.status_codes.clone(),
            response_time: ResponseTimeStats::from_sorted(&sorted),
        }
    }
}

/// Finalized bucket as written to the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketAggregate {
    pub requests: u64,
    pub assertions_total: u64,
    pub assertions_failed: u64,
    pub status_codes: BTreeMap<u16, u64>,
    pub response_time: ResponseTimeStats,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ResponseTimeStats {
    #[serde(serialize_with = "number::opt")]
    pub min: Option<f64>,
    #[serde(serialize_with = "number::opt")]
    pub max: Option<f64>,
    #[serde(serialize_with = "number::opt")]
    pub avg: Option<f64>,
    #[serde(flatten)]
    pub percentiles: PercentileSummary,
}

impl ResponseTimeStats {
    pub fn from_sorted(sorted: &[f64]) -> Self {
        let avg = if sorted.is_empty() {
            None
        } else {
            let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;
            Some(number::round_half_up(mean))
        };
        Self {
            min: sorted.first().copied(),
            max: sorted.last().copied(),
            avg,
            percentiles: PercentileSummary::from_sorted(sorted),
        }
    }
}

/// Buckets keyed by name, in key order.
pub type BucketMap = BTreeMap<String, Bucket>;

/// Finalize every bucket of a family.
pub fn finalize_all(buckets: &BucketMap) -> BTreeMap<String, BucketAggregate> {
    buckets
        .iter()
        .map(|(key, bucket)| (key.clone(), bucket.finalize()))
        .collect()
}
