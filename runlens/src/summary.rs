//! Human-readable run summary printed after the report is written.

use runlens_analysis::{AnalysisReport, GateEvaluation};
use std::fmt;

pub struct RunSummary<'a> {
    report: &'a AnalysisReport,
    gates: &'a GateEvaluation,
}

impl<'a> RunSummary<'a> {
    pub fn new(report: &'a AnalysisReport, gates: &'a GateEvaluation) -> Self {
        Self { report, gates }
    }
}

fn ms(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v}ms"))
}

fn count(value: Option<u64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

impl fmt::Display for RunSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        let stats = &report.stats;
        let p = &report.response_time_percentiles;

        writeln!(f, "=== {} ===", report.collection)?;
        writeln!(
            f,
            "Requests: {}  Assertions: {} ({} failed)",
            count(stats.requests_total),
            count(stats.assertions_total),
            count(stats.assertions_failed)
        )?;
        writeln!(
            f,
            "Response time: p50 {}  p90 {}  p95 {}  p99 {}",
            ms(p.p50),
            ms(p.p90),
            ms(p.p95),
            ms(p.p99)
        )?;

        let clusters = &report.failure_clusters;
        if !clusters.is_empty() {
            let top_n = report.reporting.config.failure_clusters.top_n;
            writeln!(
                f,
                "Failure clusters (top {} of {}, {} failures):",
                top_n.min(clusters.len()),
                clusters.len(),
                report.failure_clusters_meta.total_failures
            )?;
            for (rank, cluster) in clusters.iter().take(top_n).enumerate() {
                writeln!(
                    f,
                    "  {}. {}: {} ({}%)",
                    rank + 1,
                    cluster.key(),
                    cluster.count,
                    cluster.share
                )?;
                if let Some(example) = cluster.examples.first() {
                    writeln!(f, "       {example}")?;
                }
            }
        }

        if report.budget_breaches.is_empty() {
            writeln!(f, "Budget breaches: none")?;
        } else {
            writeln!(f, "Budget breaches:")?;
            for breach in &report.budget_breaches {
                writeln!(f, "  {breach}")?;
            }
        }

        if let Some(verdict) = &self.gates.concentration {
            writeln!(f, "Concentration: {verdict}")?;
        }
        writeln!(
            f,
            "Outcome: {} (exit {})",
            self.gates.outcome,
            self.gates.outcome.exit_code()
        )
    }
}
