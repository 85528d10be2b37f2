//! Source tracking for configuration values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    /// Built-in default.
    Default,
    /// A configuration file.
    File,
    /// An environment variable.
    Env,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::File => write!(f, "file"),
            Self::Env => write!(f, "env"),
        }
    }
}

/// A value paired with its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub value: T,
    pub source: ConfigSource,
    /// Environment variable name when `source` is [`ConfigSource::Env`].
    pub var: Option<String>,
}

impl<T> Sourced<T> {
    pub fn from_env(value: T, var: impl Into<String>) -> Self {
        Self {
            value,
            source: ConfigSource::Env,
            var: Some(var.into()),
        }
    }

    pub fn default_value(value: T) -> Self {
        Self {
            value,
            source: ConfigSource::Default,
            var: None,
        }
    }

    pub fn is_from_env(&self) -> bool {
        self.source == ConfigSource::Env
    }
}
