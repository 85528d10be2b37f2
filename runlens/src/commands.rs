//! Subcommand implementations.

use crate::demo::{demo_reporting, demo_run};
use crate::settings::{RunnerSettings, SUMMARY_FILE};
use crate::source::{JsonFileSource, RunSource, select_source};
use crate::summary::RunSummary;
use anyhow::{Context, Result};
use runlens_analysis::{
    AnalysisOptions, ReportPaths, RunOutcome, analyze, concentration_from_report, evaluate_gates,
    write_report,
};
use runlens_common::config::{
    apply_failure_cluster_overrides, load_budget_config, load_reporting_config,
};
use runlens_common::{EnvParser, Loaded, TestRunResult};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Load both config files from `config_dir` and apply `POSTMAN_HEADK_*`.
///
/// Unreadable or malformed files are logged and replaced by defaults.
pub fn load_analysis_options(config_dir: &Path, env: &mut EnvParser) -> AnalysisOptions {
    let budgets = load_budget_config(config_dir).unwrap_or_else(|err| {
        warn!("{err}; using default budgets");
        Loaded::defaults()
    });
    let mut reporting = load_reporting_config(config_dir).unwrap_or_else(|err| {
        warn!("{err}; using default reporting config");
        Loaded::defaults()
    });
    let reporting_meta =
        apply_failure_cluster_overrides(&mut reporting.config.failure_clusters, env);

    AnalysisOptions {
        budgets,
        reporting,
        reporting_meta,
        ..AnalysisOptions::default()
    }
}

fn report_and_gate(
    run: &TestRunResult,
    options: &AnalysisOptions,
    output: &Path,
) -> Result<RunOutcome> {
    let report = analyze(run, options);
    let path = write_report(&report, output)?;
    info!(path = %path.display(), "wrote report");

    let gates = evaluate_gates(&report);
    print!("{}", RunSummary::new(&report, &gates));
    println!("Report: {}", path.display());
    Ok(gates.outcome)
}

/// Run a collection (or reuse the last CLI export) and analyze it.
pub fn run(collection: &Path, reports_dir: &Path, config_dir: &Path) -> Result<RunOutcome> {
    let mut env = EnvParser::new();
    let settings = RunnerSettings::from_env(&mut env);

    std::fs::create_dir_all(reports_dir)
        .with_context(|| format!("Failed to create {}", reports_dir.display()))?;

    let source = select_source(collection, reports_dir, &settings)?;
    info!(source = source.name(), "collecting test run");
    let test_run = source.fetch()?;

    let options = AnalysisOptions {
        reports: settings.artifacts(reports_dir),
        ..load_analysis_options(config_dir, &mut env)
    };
    report_and_gate(&test_run, &options, &reports_dir.join(SUMMARY_FILE))
}

/// Analyze an existing newman JSON export.
pub fn analyze_export(input: &Path, output: &Path, config_dir: &Path) -> Result<RunOutcome> {
    let test_run = JsonFileSource::new(input).fetch()?;
    let options = load_analysis_options(config_dir, &mut EnvParser::new());
    report_and_gate(&test_run, &options, output)
}

/// Re-check the concentration gate of a written report.
///
/// Prints the verdict only; the exit status reflects whether the report
/// could be read.
pub fn gate(summary: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(summary)
        .with_context(|| format!("Failed to read report {}", summary.display()))?;
    let report: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Malformed report {}", summary.display()))?;

    match concentration_from_report(&report) {
        Some(verdict) => println!("Concentration: {verdict}"),
        None => println!("No failure clusters: concentration gate skipped"),
    }
    Ok(())
}

/// Write the demo report.
pub fn demo(output: &Path) -> Result<PathBuf> {
    let test_run = demo_run().context("Failed to build demo run")?;
    let options = AnalysisOptions {
        reporting: Loaded {
            config_path: None,
            config: demo_reporting(),
        },
        reports: ReportPaths::default(),
        ..AnalysisOptions::default()
    };
    let report = analyze(&test_run, &options);
    let path = write_report(&report, output)?;
    println!("Demo report: {}", path.display());
    Ok(path)
}
