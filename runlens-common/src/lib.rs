//! Shared types and utilities for runlens.
//!
//! - [`types`]: the newman test-run model consumed by the analysis engine
//! - [`config`]: budget/reporting configuration files and `POSTMAN_*` overrides
//! - [`logging`]: tracing subscriber setup shared by the binaries
//! - [`testing`]: test logging helpers

pub mod config;
pub mod logging;
pub mod testing;
pub mod types;

pub use config::{
    BudgetConfig, ConfigError, ConfigSource, EnvError, EnvParser, FailureClusterConfig, Loaded,
    NormalizationConfig, PercentilePoint, PercentileThresholds, ReportingConfig, ReportingMeta,
    ScopeBudget, Sourced,
};
pub use logging::{LogConfig, LogFormat, LoggingGuards, init_logging};
pub use types::{
    AssertionOutcome, CollectionNode, Execution, Failure, FailureError, InputError, ItemRef,
    RunSection, TestRunResult, load_run,
};
