//! Configuration system for runlens.
//!
//! This module provides:
//! - Performance budget configuration (`newman-budgets.json`)
//! - Reporting configuration (`newman-config.json`)
//! - `POSTMAN_*` environment variable parsing with source tracking
//!
//! Both files are optional. Loading returns a [`ConfigError`] for unreadable
//! or malformed files and the caller decides how to fall back.

pub mod budget;
pub mod env;
pub mod reporting;
pub mod source;

pub use budget::{BudgetConfig, PercentilePoint, PercentileThresholds, ScopeBudget};
pub use env::{EnvError, EnvParser};
pub use reporting::{
    FailureClusterConfig, NormalizationConfig, OverridesApplied, ReportingConfig, ReportingMeta,
    apply_failure_cluster_overrides,
};
pub use source::{ConfigSource, Sourced};

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the performance budget configuration.
pub const BUDGET_CONFIG_FILE: &str = "newman-budgets.json";
/// File name of the reporting configuration.
pub const REPORTING_CONFIG_FILE: &str = "newman-config.json";
/// Directory both configuration files are read from by default.
pub const DEFAULT_CONFIG_DIR: &str = "scripts";

/// Errors that can occur while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A configuration value together with the file it came from.
///
/// `config_path` is `None` when built-in defaults are in use.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Loaded<T> {
    pub config_path: Option<PathBuf>,
    pub config: T,
}

impl<T: Default> Loaded<T> {
    pub fn defaults() -> Self {
        Self {
            config_path: None,
            config: T::default(),
        }
    }
}

/// Load `<dir>/newman-budgets.json`. A missing file yields defaults.
pub fn load_budget_config(dir: &Path) -> Result<Loaded<BudgetConfig>, ConfigError> {
    load_json_config(&dir.join(BUDGET_CONFIG_FILE))
}

/// Load `<dir>/newman-config.json`. A missing file yields defaults.
///
/// Environment overrides are not applied here; see
/// [`apply_failure_cluster_overrides`].
pub fn load_reporting_config(dir: &Path) -> Result<Loaded<ReportingConfig>, ConfigError> {
    load_json_config(&dir.join(REPORTING_CONFIG_FILE))
}

fn load_json_config<T: DeserializeOwned + Default>(path: &Path) -> Result<Loaded<T>, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(Loaded::defaults());
    }

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(Loaded {
        config_path: Some(path.to_path_buf()),
        config,
    })
}
