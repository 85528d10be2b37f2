//! Runner settings taken from `POSTMAN_*` environment variables.

use runlens_analysis::ReportPaths;
use runlens_common::{EnvParser, Sourced};
use std::path::Path;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_HTML_REPORT_FILE: &str = "newman-report.html";

/// JUnit report written next to the summary.
pub const JUNIT_REPORT_FILE: &str = "newman-results.xml";
/// Aggregated report written by `run`.
pub const SUMMARY_FILE: &str = "newman-summary.json";
/// Raw newman JSON export produced by the CLI runner.
pub const CLI_SUMMARY_FILE: &str = "newman-cli-summary.json";

/// How newman is invoked. None of this affects the analysis itself.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerSettings {
    /// Passed to the collection as the `baseUrl` variable.
    pub base_url: Sourced<String>,
    /// Adds the `htmlextra` reporter when set to `1`.
    pub html_report: Sourced<bool>,
    pub html_report_file: Sourced<String>,
}

impl RunnerSettings {
    pub fn from_env(env: &mut EnvParser) -> Self {
        Self {
            base_url: env.get_string("BASE_URL", DEFAULT_BASE_URL),
            html_report: env.get_flag("ENABLE_HTML_REPORT"),
            html_report_file: env.get_string("HTML_REPORT_FILE", DEFAULT_HTML_REPORT_FILE),
        }
    }

    /// Reporters requested from newman, before the runner adds its own.
    pub fn reporters(&self) -> Vec<&'static str> {
        let mut reporters = vec!["cli", "junit"];
        if self.html_report.value {
            reporters.push("htmlextra");
        }
        reporters
    }

    /// Collection variables passed with `--env-var`.
    pub fn env_vars(&self) -> Vec<(String, String)> {
        vec![("baseUrl".to_string(), self.base_url.value.clone())]
    }

    /// Paths of the JUnit and optional HTML artifacts under `reports_dir`.
    pub fn artifacts(&self, reports_dir: &Path) -> ReportPaths {
        ReportPaths {
            junit: Some(reports_dir.join(JUNIT_REPORT_FILE)),
            html: self
                .html_report
                .value
                .then(|| reports_dir.join(&self.html_report_file.value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runlens_common::ConfigSource;
    use std::path::PathBuf;

    fn settings(vars: &[(&str, &str)]) -> RunnerSettings {
        let mut env =
            EnvParser::from_vars(vars.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        RunnerSettings::from_env(&mut env)
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]);
        assert_eq!(s.base_url.value, DEFAULT_BASE_URL);
        assert_eq!(s.base_url.source, ConfigSource::Default);
        assert!(!s.html_report.value);
        assert_eq!(s.reporters(), vec!["cli", "junit"]);
        assert_eq!(
            s.artifacts(Path::new("reports")),
            ReportPaths {
                junit: Some(PathBuf::from("reports/newman-results.xml")),
                html: None,
            }
        );
    }

    #[test]
    fn test_html_report_enabled() {
        let s = settings(&[
            ("POSTMAN_ENABLE_HTML_REPORT", "1"),
            ("POSTMAN_HTML_REPORT_FILE", "api.html"),
            ("POSTMAN_BASE_URL", "https://staging.example.com"),
        ]);
        assert_eq!(s.reporters(), vec!["cli", "junit", "htmlextra"]);
        assert_eq!(
            s.artifacts(Path::new("out")).html,
            Some(PathBuf::from("out/api.html"))
        );
        assert_eq!(
            s.env_vars(),
            vec![("baseUrl".to_string(), "https://staging.example.com".to_string())]
        );
        assert!(s.base_url.is_from_env());
    }

    #[test]
    fn test_html_report_requires_exact_one() {
        let s = settings(&[("POSTMAN_ENABLE_HTML_REPORT", "true")]);
        assert!(!s.html_report.value);
        assert!(s.artifacts(Path::new("r")).html.is_none());
    }
}
