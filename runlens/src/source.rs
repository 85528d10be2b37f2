//! Where a test run comes from.
//!
//! A run is either an existing newman JSON export or the result of invoking
//! the `newman` CLI, which writes that export itself. The source is chosen
//! once at startup.

use crate::settings::{CLI_SUMMARY_FILE, RunnerSettings};
use runlens_common::{InputError, TestRunResult, load_run};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to prepare {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("newman was not found on PATH and no previous export exists at {fallback}")]
    Unavailable { fallback: PathBuf },
}

pub type Result<T> = std::result::Result<T, SourceError>;

/// Produces a parsed test run.
pub trait RunSource {
    /// Short label for logs.
    fn name(&self) -> &'static str;

    fn fetch(&self) -> Result<TestRunResult>;
}

/// An already produced newman JSON export.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RunSource for JsonFileSource {
    fn name(&self) -> &'static str {
        "json-file"
    }

    fn fetch(&self) -> Result<TestRunResult> {
        debug!(path = %self.path.display(), "reading newman export");
        Ok(load_run(&self.path)?)
    }
}

/// Runs a collection through the `newman` executable.
///
/// The `json` reporter is always enabled so the run can be read back from
/// its export, even when newman exits non-zero because assertions failed.
#[derive(Debug, Clone)]
pub struct NewmanCliSource {
    program: PathBuf,
    collection: PathBuf,
    reporters: Vec<String>,
    junit_export: Option<PathBuf>,
    html_export: Option<PathBuf>,
    json_export: PathBuf,
    env_vars: Vec<(String, String)>,
}

impl NewmanCliSource {
    pub fn new(
        program: PathBuf,
        collection: &Path,
        settings: &RunnerSettings,
        reports_dir: &Path,
    ) -> Self {
        let mut reporters: Vec<String> = Vec::new();
        for reporter in settings.reporters().into_iter().chain(["json"]) {
            if !reporters.iter().any(|r| r == reporter) {
                reporters.push(reporter.to_string());
            }
        }
        let artifacts = settings.artifacts(reports_dir);
        Self {
            program,
            collection: collection.to_path_buf(),
            reporters,
            junit_export: artifacts.junit,
            html_export: artifacts.html,
            json_export: reports_dir.join(CLI_SUMMARY_FILE),
            env_vars: settings.env_vars(),
        }
    }

    /// Command-line arguments passed to newman.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["run".into(), self.collection.clone().into()];
        args.push("-r".into());
        args.push(self.reporters.join(",").into());
        if let Some(junit) = &self.junit_export {
            args.push("--reporter-junit-export".into());
            args.push(junit.clone().into());
        }
        if let Some(html) = &self.html_export
            && self.reporters.iter().any(|r| r == "htmlextra")
        {
            args.push("--reporter-htmlextra-export".into());
            args.push(html.clone().into());
        }
        args.push("--reporter-json-export".into());
        args.push(self.json_export.clone().into());
        for (key, value) in &self.env_vars {
            args.push("--env-var".into());
            args.push(format!("{key}={value}").into());
        }
        args
    }
}

impl RunSource for NewmanCliSource {
    fn name(&self) -> &'static str {
        "newman-cli"
    }

    fn fetch(&self) -> Result<TestRunResult> {
        if let Some(parent) = self.json_export.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SourceError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        // A failed run must not be analyzed from an earlier export.
        match std::fs::remove_file(&self.json_export) {
            Ok(()) => debug!(path = %self.json_export.display(), "removed previous export"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(SourceError::Io {
                    path: self.json_export.clone(),
                    source,
                });
            }
        }

        info!(
            program = %self.program.display(),
            collection = %self.collection.display(),
            reporters = %self.reporters.join(","),
            "running newman"
        );
        let status = Command::new(&self.program)
            .args(self.args())
            .status()
            .map_err(|source| SourceError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            // Assertion failures exit non-zero; the export is still written.
            warn!(status = ?status.code(), "newman exited unsuccessfully");
        }
        Ok(load_run(&self.json_export)?)
    }
}

/// Pick the newman CLI when it is on `PATH`, else a previous CLI export.
pub fn select_source(
    collection: &Path,
    reports_dir: &Path,
    settings: &RunnerSettings,
) -> Result<Box<dyn RunSource>> {
    select_source_with(which::which("newman").ok(), collection, reports_dir, settings)
}

pub fn select_source_with(
    newman: Option<PathBuf>,
    collection: &Path,
    reports_dir: &Path,
    settings: &RunnerSettings,
) -> Result<Box<dyn RunSource>> {
    if let Some(program) = newman {
        debug!(program = %program.display(), "found newman");
        return Ok(Box::new(NewmanCliSource::new(
            program,
            collection,
            settings,
            reports_dir,
        )));
    }

    let fallback = reports_dir.join(CLI_SUMMARY_FILE);
    if fallback.is_file() {
        warn!(path = %fallback.display(), "newman not found; using previous export");
        return Ok(Box::new(JsonFileSource::new(fallback)));
    }
    Err(SourceError::Unavailable { fallback })
}

#[cfg(test)]
mod tests {
    use super::*;
    use runlens_common::EnvParser;

    fn settings(vars: &[(&str, &str)]) -> RunnerSettings {
        let mut env =
            EnvParser::from_vars(vars.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        RunnerSettings::from_env(&mut env)
    }

    fn args_of(source: &NewmanCliSource) -> Vec<String> {
        source
            .args()
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_cli_args_force_json_reporter() {
        let source = NewmanCliSource::new(
            PathBuf::from("newman"),
            Path::new("api.postman_collection.json"),
            &settings(&[]),
            Path::new("reports"),
        );
        assert_eq!(
            args_of(&source),
            vec![
                "run",
                "api.postman_collection.json",
                "-r",
                "cli,junit,json",
                "--reporter-junit-export",
                "reports/newman-results.xml",
                "--reporter-json-export",
                "reports/newman-cli-summary.json",
                "--env-var",
                "baseUrl=http://localhost:8080",
            ]
        );
    }

    #[test]
    fn test_cli_args_with_html_report() {
        let source = NewmanCliSource::new(
            PathBuf::from("newman"),
            Path::new("c.json"),
            &settings(&[("POSTMAN_ENABLE_HTML_REPORT", "1")]),
            Path::new("out"),
        );
        let args = args_of(&source);
        assert!(args.contains(&"cli,junit,htmlextra,json".to_string()));
        let pos = args
            .iter()
            .position(|a| a == "--reporter-htmlextra-export")
            .unwrap();
        assert_eq!(args[pos + 1], "out/newman-report.html");
    }

    #[test]
    fn test_select_prefers_newman() {
        let dir = tempfile::tempdir().unwrap();
        let source = select_source_with(
            Some(PathBuf::from("/usr/bin/newman")),
            Path::new("c.json"),
            dir.path(),
            &settings(&[]),
        )
        .unwrap();
        assert_eq!(source.name(), "newman-cli");
    }

    #[test]
    fn test_select_falls_back_to_previous_export() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CLI_SUMMARY_FILE), r#"{"run": {}}"#).unwrap();

        let source =
            select_source_with(None, Path::new("c.json"), dir.path(), &settings(&[])).unwrap();
        assert_eq!(source.name(), "json-file");
        let run = source.fetch().unwrap();
        assert!(run.executions().is_empty());
    }

    #[test]
    fn test_select_without_any_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = select_source_with(None, Path::new("c.json"), dir.path(), &settings(&[]))
            .err()
            .unwrap();
        assert!(matches!(err, SourceError::Unavailable { .. }));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = NewmanCliSource::new(
            dir.path().join("no-such-newman"),
            Path::new("c.json"),
            &settings(&[]),
            dir.path(),
        );
        let err = source.fetch().unwrap_err();
        assert!(matches!(err, SourceError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_previous_export_is_not_reused_when_newman_writes_none() {
        let dir = tempfile::tempdir().unwrap();
        let export = dir.path().join(CLI_SUMMARY_FILE);
        std::fs::write(&export, r#"{"run": {}}"#).unwrap();

        // `sh run ...` exits non-zero without writing an export.
        let source = NewmanCliSource::new(
            PathBuf::from("/bin/sh"),
            Path::new("c.json"),
            &settings(&[]),
            dir.path(),
        );
        let err = source.fetch().unwrap_err();
        assert!(matches!(err, SourceError::Input(InputError::Read { .. })));
        assert!(!export.exists());
    }

    #[test]
    fn test_json_file_source_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = JsonFileSource::new(&path).fetch().unwrap_err();
        assert!(matches!(err, SourceError::Input(InputError::Parse { .. })));
    }
}
