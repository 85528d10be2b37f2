//! Response-time budget configuration.
//!
//! ```json
//! {
//!   "failOnBudgetBreach": false,
//!   "global":  { "responseTime": { "p95": 300 } },
//!   "folders": { "Auth": { "responseTime": { "p95": 250 } } },
//!   "methods": { "GET": { "responseTime": { "p95": 200 } } },
//!   "paths":   { "/api/v1": { "responseTime": { "p95": 250 } } }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A percentile point that budgets can be set on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PercentilePoint {
    P50,
    P90,
    P95,
    P99,
}

impl PercentilePoint {
    /// All points in evaluation order.
    pub const ALL: [PercentilePoint; 4] = [Self::P50, Self::P90, Self::P95, Self::P99];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::P50 => "p50",
            Self::P90 => "p90",
            Self::P95 => "p95",
            Self::P99 => "p99",
        }
    }

    /// The percentile as a number in (0, 100].
    pub fn percent(self) -> f64 {
        match self {
            Self::P50 => 50.0,
            Self::P90 => 90.0,
            Self::P95 => 95.0,
            Self::P99 => 99.0,
        }
    }
}

impl fmt::Display for PercentilePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper bounds per percentile point. Unset points are not checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PercentileThresholds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p50: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p90: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p95: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p99: Option<f64>,
}

impl PercentileThresholds {
    pub fn get(&self, point: PercentilePoint) -> Option<f64> {
        match point {
            PercentilePoint::P50 => self.p50,
            PercentilePoint::P90 => self.p90,
            PercentilePoint::P95 => self.p95,
            PercentilePoint::P99 => self.p99,
        }
    }
}

/// Budget for a single scope key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeBudget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<PercentileThresholds>,
}

/// Performance budget configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetConfig {
    /// Whether a breach should fail the process (exit code 2).
    #[serde(default)]
    pub fail_on_budget_breach: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<ScopeBudget>,
    /// Keyed by folder path (`Auth/Users`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub folders: BTreeMap<String, ScopeBudget>,
    /// Keyed by uppercased HTTP method.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub methods: BTreeMap<String, ScopeBudget>,
    /// Keyed by path prefix (`/api/v1`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub paths: BTreeMap<String, ScopeBudget>,
}

impl BudgetConfig {
    pub fn global_thresholds(&self) -> Option<&PercentileThresholds> {
        self.global.as_ref().and_then(|g| g.response_time.as_ref())
    }

    pub fn folder_thresholds(&self, folder: &str) -> Option<&PercentileThresholds> {
        scoped(&self.folders, folder)
    }

    pub fn method_thresholds(&self, method: &str) -> Option<&PercentileThresholds> {
        scoped(&self.methods, method)
    }

    pub fn path_thresholds(&self, prefix: &str) -> Option<&PercentileThresholds> {
        scoped(&self.paths, prefix)
    }
}

fn scoped<'a>(
    map: &'a BTreeMap<String, ScopeBudget>,
    key: &str,
) -> Option<&'a PercentileThresholds> {
    map.get(key).and_then(|b| b.response_time.as_ref())
}
