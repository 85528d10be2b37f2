//! Aggregation and failure clustering for newman test runs.
//!
//! A run flows through the stages in order:
//!
//! 1. [`index`]: folder paths by request id and name
//! 2. [`aggregate`]: folder, method and path-prefix buckets
//! 3. [`percentile`]: nearest-rank p50/p90/p95/p99
//! 4. [`cluster`]: failures grouped by folder and assertion
//! 5. [`budget`] and [`gate`]: response-time budgets and exit outcome
//!
//! [`report::analyze`] runs all of them and assembles an [`AnalysisReport`].

pub mod aggregate;
pub mod bucket;
pub mod budget;
pub mod cluster;
pub mod error;
pub mod gate;
pub mod index;
pub mod normalize;
pub mod number;
pub mod percentile;
pub mod report;

pub use aggregate::{ExecutionAggregates, SlowRequest, aggregate_executions};
pub use bucket::{Bucket, BucketAggregate, ResponseTimeStats};
pub use budget::{BudgetBreach, BudgetScope, collect_budget_breaches};
pub use cluster::{ClusterMeta, FailureCluster, cluster_failures};
pub use error::{AnalysisError, Result};
pub use gate::{
    ConcentrationVerdict, GateEvaluation, RunOutcome, concentration_from_report, decide_outcome,
    evaluate_concentration, evaluate_gates,
};
pub use index::{CollectionIndex, IndexedItem, ROOT_FOLDER, folder_key};
pub use normalize::MessageNormalizer;
pub use percentile::{PercentileSummary, percentile};
pub use report::{AnalysisOptions, AnalysisReport, ReportPaths, analyze, write_report};
