//! Tracing subscriber setup for the runlens binaries.
//!
//! # Environment Variables
//!
//! - `RUNLENS_LOG`: filter directive (default: the level passed to [`LogConfig::from_env`])
//! - `RUNLENS_LOG_FORMAT`: `pretty` (default) or `json`
//! - `RUNLENS_LOG_FILE`: additionally append JSON lines to this file

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Console output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
    /// Write console output to stderr instead of stdout.
    pub stderr: bool,
    pub file: Option<PathBuf>,
}

impl LogConfig {
    /// Build from `RUNLENS_LOG*` variables, falling back to `default_level`.
    pub fn from_env(default_level: &str) -> Self {
        let level = std::env::var("RUNLENS_LOG")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default_level.to_string());
        let format = match std::env::var("RUNLENS_LOG_FORMAT")
            .map(|v| v.to_lowercase())
            .as_deref()
        {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };
        let file = std::env::var("RUNLENS_LOG_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Self {
            level,
            format,
            stderr: false,
            file,
        }
    }

    #[must_use]
    pub fn with_stderr(mut self) -> Self {
        self.stderr = true;
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: &str) -> Self {
        self.level = level.to_string();
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

/// Keeps non-blocking writers flushing until dropped.
#[derive(Default)]
pub struct LoggingGuards {
    _guards: Vec<WorkerGuard>,
}

/// Install the global tracing subscriber.
pub fn init_logging(config: &LogConfig) -> Result<LoggingGuards> {
    let filter = EnvFilter::try_new(&config.level)
        .with_context(|| format!("invalid log filter '{}'", config.level))?;

    let mut guards = Vec::new();
    let mut layers: Vec<BoxedLayer> = Vec::new();

    layers.push(if config.stderr {
        console_layer(config.format, std::io::stderr)
    } else {
        console_layer(config.format, std::io::stdout)
    });

    if let Some(path) = &config.file {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create log directory {}", dir.display()))?;
        let file_name = path
            .file_name()
            .with_context(|| format!("log file path has no file name: {}", path.display()))?;

        let appender = tracing_appender::rolling::never(&dir, file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        guards.push(guard);
        layers.push(
            fmt::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(LoggingGuards { _guards: guards })
}

fn console_layer<W>(format: LogFormat, writer: W) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(writer)
            .with_target(false)
            .compact()
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_current_span(true)
            .boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_methods() {
        let cfg = LogConfig {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            stderr: false,
            file: None,
        }
        .with_stderr()
        .with_level("debug")
        .with_format(LogFormat::Json);

        assert!(cfg.stderr);
        assert_eq!(cfg.level, "debug");
        assert_eq!(cfg.format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        let cfg = LogConfig {
            level: "runlens=loud".to_string(),
            format: LogFormat::Pretty,
            stderr: true,
            file: None,
        };
        assert!(init_logging(&cfg).is_err());
    }
}
