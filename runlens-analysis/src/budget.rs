//! Response-time budget checks.

use crate::bucket::BucketAggregate;
use crate::number;
use crate::percentile::PercentileSummary;
use runlens_common::{BudgetConfig, PercentilePoint, PercentileThresholds};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Key used for global breaches.
pub const GLOBAL_KEY: &str = "responseTime";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetScope {
    Global,
    Folder,
    Method,
    Path,
}

impl fmt::Display for BudgetScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Global => "global",
            Self::Folder => "folder",
            Self::Method => "method",
            Self::Path => "path",
        };
        f.write_str(s)
    }
}

/// A percentile above its configured threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetBreach {
    pub scope: BudgetScope,
    pub key: String,
    pub point: PercentilePoint,
    #[serde(serialize_with = "number::num")]
    pub actual: f64,
    #[serde(serialize_with = "number::num")]
    pub threshold: f64,
}

impl fmt::Display for BudgetBreach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}: {}ms > {}ms",
            self.scope, self.key, self.point, self.actual, self.threshold
        )
    }
}

/// Check one percentile summary against its thresholds, in point order.
fn evaluate(
    scope: BudgetScope,
    key: &str,
    actual: &PercentileSummary,
    thresholds: &PercentileThresholds,
    out: &mut Vec<BudgetBreach>,
) {
    for point in PercentilePoint::ALL {
        let (Some(threshold), Some(value)) = (thresholds.get(point), actual.get(point)) else {
            continue;
        };
        if value > threshold {
            out.push(BudgetBreach {
                scope,
                key: key.to_string(),
                point,
                actual: value,
                threshold,
            });
        }
    }
}

fn evaluate_family<'a>(
    scope: BudgetScope,
    aggregates: &BTreeMap<String, BucketAggregate>,
    lookup: impl Fn(&str) -> Option<&'a PercentileThresholds>,
    out: &mut Vec<BudgetBreach>,
) {
    for (key, aggregate) in aggregates {
        if let Some(thresholds) = lookup(key) {
            evaluate(scope, key, &aggregate.response_time.percentiles, thresholds, out);
        }
    }
}

/// Collect every budget breach: global first, then folders, methods and
/// paths, each in key order.
pub fn collect_budget_breaches(
    global: &PercentileSummary,
    folders: &BTreeMap<String, BucketAggregate>,
    methods: &BTreeMap<String, BucketAggregate>,
    paths: &BTreeMap<String, BucketAggregate>,
    config: &BudgetConfig,
) -> Vec<BudgetBreach> {
    let mut breaches = Vec::new();
    if let Some(thresholds) = config.global_thresholds() {
        evaluate(BudgetScope::Global, GLOBAL_KEY, global, thresholds, &mut breaches);
    }
    evaluate_family(BudgetScope::Folder, folders, |k| config.folder_thresholds(k), &mut breaches);
    evaluate_family(BudgetScope::Method, methods, |k| config.method_thresholds(k), &mut breaches);
    evaluate_family(BudgetScope::Path, paths, |k| config.path_thresholds(k), &mut breaches);

    if !breaches.is_empty() {
        tracing::info!(count = breaches.len(), "response-time budget breaches found");
    }
    breaches
}
