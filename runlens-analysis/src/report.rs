//! Analysis report assembly and output.

use crate::aggregate::{ExecutionAggregates, SlowRequest, aggregate_executions};
use crate::budget::{BudgetBreach, collect_budget_breaches};
use crate::bucket::BucketAggregate;
use crate::cluster::{ClusterMeta, FailureCluster, cluster_failures};
use crate::error::{AnalysisError, Result};
use crate::index::CollectionIndex;
use crate::percentile::PercentileSummary;
use chrono::{DateTime, SecondsFormat, Utc};
use runlens_common::{
    BudgetConfig, Failure, Loaded, ReportingConfig, ReportingMeta, TestRunResult,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The JSON summary written after every run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub collection: String,
    /// ISO-8601 UTC with millisecond precision.
    pub timestamp: String,
    pub stats: ReportStats,
    pub failures: Vec<FailureRecord>,
    pub distributions: Distributions,
    pub top_slow_requests: Vec<SlowRequest>,
    pub response_time_percentiles: PercentileSummary,
    pub folder_aggregates: BTreeMap<String, BucketAggregate>,
    pub method_aggregates: BTreeMap<String, BucketAggregate>,
    pub path_aggregates: BTreeMap<String, BucketAggregate>,
    pub failure_clusters: Vec<FailureCluster>,
    pub failure_clusters_meta: ClusterMeta,
    pub budgets: ConfigEcho<BudgetConfig>,
    pub reporting: ReportingEcho,
    pub budget_breaches: Vec<BudgetBreach>,
    pub reports: ReportPaths,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    pub failure_count: u64,
    pub requests_total: Option<u64>,
    pub assertions_total: Option<u64>,
    /// Runner-reported count, or the number of failures when absent.
    pub assertions_failed: Option<u64>,
}

/// One entry of `run.failures`, flattened with its resolved folder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    pub name: Option<String>,
    pub message: Option<String>,
    pub test: Option<String>,
    pub at: Option<String>,
    pub source: FailureSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureSource {
    pub item: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub id: Option<String>,
    /// `/`-joined folder path when the source id is known; empty at the root.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Distributions {
    pub status_codes: BTreeMap<u16, u64>,
}

/// A configuration echoed into the report with the file it came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigEcho<T> {
    pub config_path: Option<PathBuf>,
    pub config: T,
}

impl<T> From<Loaded<T>> for ConfigEcho<T> {
    fn from(loaded: Loaded<T>) -> Self {
        Self {
            config_path: loaded.config_path,
            config: loaded.config,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportingEcho {
    pub config_path: Option<PathBuf>,
    pub config: ReportingConfig,
    pub meta: ReportingMeta,
}

/// Paths of the other artifacts produced by the runner.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportPaths {
    pub junit: Option<PathBuf>,
    pub html: Option<PathBuf>,
}

/// Everything besides the run that goes into a report.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    pub budgets: Loaded<BudgetConfig>,
    /// Reporting config with environment overrides already applied.
    pub reporting: Loaded<ReportingConfig>,
    pub reporting_meta: ReportingMeta,
    pub reports: ReportPaths,
    /// Fixed report time; the current time when unset.
    pub timestamp: Option<DateTime<Utc>>,
}

/// Run every analysis stage over a test run.
pub fn analyze(run: &TestRunResult, options: &AnalysisOptions) -> AnalysisReport {
    let index = CollectionIndex::build(run.collection.as_ref());
    let failures = run.failures();

    let ExecutionAggregates {
        status_codes,
        top_slow_requests,
        response_time_percentiles,
        folders,
        methods,
        paths,
    } = aggregate_executions(run.executions(), &index);

    let cluster_config = &options.reporting.config.failure_clusters;
    let (failure_clusters, failure_clusters_meta) = cluster_failures(failures, &index, cluster_config);

    let budget_breaches = collect_budget_breaches(
        &response_time_percentiles,
        &folders,
        &methods,
        &paths,
        &options.budgets.config,
    );

    let timestamp = options
        .timestamp
        .unwrap_or_else(Utc::now)
        .to_rfc3339_opts(SecondsFormat::Millis, true);

    let report = AnalysisReport {
        collection: run.collection_name(),
        timestamp,
        stats: report_stats(run),
        failures: failures.iter().map(|f| flatten_failure(f, &index)).collect(),
        distributions: Distributions { status_codes },
        top_slow_requests,
        response_time_percentiles,
        folder_aggregates: folders,
        method_aggregates: methods,
        path_aggregates: paths,
        failure_clusters,
        failure_clusters_meta,
        budgets: options.budgets.clone().into(),
        reporting: ReportingEcho {
            config_path: options.reporting.config_path.clone(),
            config: options.reporting.config.clone(),
            meta: options.reporting_meta.clone(),
        },
        budget_breaches,
        reports: options.reports.clone(),
    };

    tracing::info!(
        collection = %report.collection,
        executions = run.executions().len(),
        failures = report.stats.failure_count,
        clusters = report.failure_clusters.len(),
        breaches = report.budget_breaches.len(),
        "analysis complete"
    );
    report
}

fn report_stats(run: &TestRunResult) -> ReportStats {
    let stats = run.run.stats.as_ref();
    let failure_count = run.failures().len() as u64;
    ReportStats {
        failure_count,
        requests_total: stats.and_then(|s| s.requests.as_ref()).and_then(|r| r.total),
        assertions_total: stats.and_then(|s| s.assertions.as_ref()).and_then(|a| a.total),
        assertions_failed: Some(
            stats
                .and_then(|s| s.assertions.as_ref())
                .and_then(|a| a.failed)
                .unwrap_or(failure_count),
        ),
    }
}

fn flatten_failure(failure: &Failure, index: &CollectionIndex) -> FailureRecord {
    let error = failure.error.as_ref();
    let source = failure.source.as_ref();
    FailureRecord {
        name: error.and_then(|e| e.name.clone()),
        message: error.and_then(|e| e.message.clone()),
        test: error.and_then(|e| e.test.clone()),
        at: failure.at.clone(),
        source: FailureSource {
            item: source.and_then(|s| s.name.clone()),
            kind: source.and_then(|s| s.kind.clone()),
            id: source.and_then(|s| s.id.clone()),
            path: failure
                .source_id()
                .and_then(|id| index.get_by_id(id))
                .map(|item| item.path.join("/")),
        },
    }
}

impl AnalysisReport {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Write a report as pretty JSON, creating parent directories.
pub fn write_report(report: &AnalysisReport, path: &Path) -> Result<PathBuf> {
    let json = report.to_json_pretty()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| AnalysisError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, json).map_err(|source| AnalysisError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "wrote analysis report");
    Ok(path.to_path_buf())
}
