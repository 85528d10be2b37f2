//! Gate evaluation and process outcome.
//!
//! Gates are evaluated after the report is built and never affect its
//! contents. Outcome priority: assertion failures, then the budget gate, then
//! the failure concentration gate.

use crate::budget::BudgetBreach;
use crate::cluster::{FailureCluster, head_share};
use crate::number;
use crate::report::AnalysisReport;
use runlens_common::config::reporting::{DEFAULT_HEAD_K, DEFAULT_HEAD_K_THRESHOLD_PERCENT};
use runlens_common::{BudgetConfig, FailureClusterConfig};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Final result of a run, mapped one-to-one onto the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Passed,
    AssertionFailures,
    BudgetBreached,
    ConcentrationBreached,
}

impl RunOutcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Passed => 0,
            Self::AssertionFailures => 1,
            Self::BudgetBreached => 2,
            Self::ConcentrationBreached => 3,
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Passed
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Passed => "passed",
            Self::AssertionFailures => "assertion failures",
            Self::BudgetBreached => "budget breached",
            Self::ConcentrationBreached => "failure concentration breached",
        };
        f.write_str(s)
    }
}

/// Combine the gate signals by priority.
pub fn decide_outcome(failure_count: usize, budget_fires: bool, concentration_fires: bool) -> RunOutcome {
    if failure_count > 0 {
        RunOutcome::AssertionFailures
    } else if budget_fires {
        RunOutcome::BudgetBreached
    } else if concentration_fires {
        RunOutcome::ConcentrationBreached
    } else {
        RunOutcome::Passed
    }
}

pub fn budget_gate_fires(breaches: &[BudgetBreach], config: &BudgetConfig) -> bool {
    !breaches.is_empty() && config.fail_on_budget_breach
}

/// Head-K share of the largest clusters against the configured threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcentrationVerdict {
    /// Number of clusters actually summed: `min(headK, clusters)`.
    pub head_k: usize,
    #[serde(serialize_with = "number::num")]
    pub head_share: f64,
    #[serde(serialize_with = "number::num")]
    pub threshold: f64,
    pub enabled: bool,
}

impl ConcentrationVerdict {
    pub fn breached(&self) -> bool {
        self.head_share >= self.threshold
    }

    pub fn fires(&self) -> bool {
        self.enabled && self.breached()
    }
}

impl fmt::Display for ConcentrationVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "threshold {}%, K={}, head share {}%, gate {}, result {}",
            self.threshold,
            self.head_k,
            self.head_share,
            if self.enabled { "on" } else { "off" },
            if self.fires() { "FAIL" } else { "PASS" }
        )
    }
}

/// Evaluate the concentration gate; `None` when there are no clusters.
pub fn evaluate_concentration(
    clusters: &[FailureCluster],
    config: &FailureClusterConfig,
) -> Option<ConcentrationVerdict> {
    if clusters.is_empty() {
        return None;
    }
    let k = config.effective_head_k().min(clusters.len());
    Some(ConcentrationVerdict {
        head_k: k,
        head_share: head_share(clusters, k),
        threshold: config.effective_threshold(),
        enabled: config.fail_on_head_k_threshold_breach,
    })
}

/// Evaluate the concentration gate from a previously written report.
///
/// Reads `reporting.config.failureClusters` and `failureClusters[].share`
/// leniently: missing or non-numeric settings take their defaults and
/// non-numeric shares count as zero.
pub fn concentration_from_report(report: &Value) -> Option<ConcentrationVerdict> {
    let clusters = report.get("failureClusters").and_then(Value::as_array)?;
    if clusters.is_empty() {
        return None;
    }
    let cfg = report
        .pointer("/reporting/config/failureClusters")
        .unwrap_or(&Value::Null);

    let head_k = cfg
        .get("headK")
        .and_then(Value::as_f64)
        .filter(|k| k.is_finite() && *k >= 1.0)
        .map_or(DEFAULT_HEAD_K, |k| k as usize);
    let threshold = cfg
        .get("headKThresholdPercent")
        .and_then(Value::as_f64)
        .filter(|t| t.is_finite() && *t != 0.0)
        .unwrap_or(DEFAULT_HEAD_K_THRESHOLD_PERCENT);
    let enabled = cfg
        .get("failOnHeadKThresholdBreach")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let k = head_k.min(clusters.len());
    let sum: f64 = clusters
        .iter()
        .take(k)
        .map(|c| c.get("share").and_then(Value::as_f64).unwrap_or(0.0))
        .sum();

    Some(ConcentrationVerdict {
        head_k: k,
        head_share: number::round1(sum),
        threshold,
        enabled,
    })
}

/// Every gate signal for one report.
#[derive(Debug, Clone, PartialEq)]
pub struct GateEvaluation {
    pub failure_count: usize,
    pub budget_breaches: usize,
    pub budget_gate: bool,
    pub concentration: Option<ConcentrationVerdict>,
    pub outcome: RunOutcome,
}

/// Evaluate all gates against a built report.
pub fn evaluate_gates(report: &AnalysisReport) -> GateEvaluation {
    let failure_count = report.failures.len();
    let budget_gate = budget_gate_fires(&report.budget_breaches, &report.budgets.config);
    let concentration =
        evaluate_concentration(&report.failure_clusters, &report.reporting.config.failure_clusters);
    let concentration_fires = concentration.is_some_and(|v| v.fires());

    if budget_gate {
        tracing::warn!(breaches = report.budget_breaches.len(), "response-time budget gate fired");
    }
    if let Some(verdict) = concentration.filter(|v| v.fires()) {
        tracing::warn!(
            head_k = verdict.head_k,
            head_share = verdict.head_share,
            threshold = verdict.threshold,
            "failure concentration gate fired"
        );
    }

    GateEvaluation {
        failure_count,
        budget_breaches: report.budget_breaches.len(),
        budget_gate,
        concentration,
        outcome: decide_outcome(failure_count, budget_gate, concentration_fires),
    }
}
