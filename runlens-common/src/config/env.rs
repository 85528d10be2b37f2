//! Environment variable parsing with type safety.
//!
//! Provides a parser for `POSTMAN_*` environment variables with validation,
//! error collection, and source tracking. Invalid values never abort a run:
//! they are recorded as [`EnvError`]s and the caller keeps its current value.

use super::source::Sourced;
use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Errors that can occur during environment variable parsing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    /// Invalid value for a variable; the override is ignored.
    #[error("Invalid value for {var}: expected {expected}, got '{value}'; override ignored")]
    InvalidValue {
        var: String,
        expected: String,
        value: String,
    },

    /// Value outside the accepted range; clamped to the nearest bound.
    #[error("Value out of range for {var}: {value} (valid: {min}..={max}); clamped to {clamped}")]
    Clamped {
        var: String,
        value: String,
        min: String,
        max: String,
        clamped: String,
    },
}

enum Lookup {
    Process,
    Map(HashMap<String, String>),
}

/// Type-safe environment variable parser.
///
/// Collects errors during parsing so all issues can be reported at once.
pub struct EnvParser {
    prefix: &'static str,
    lookup: Lookup,
    errors: Vec<EnvError>,
}

impl EnvParser {
    /// Create a new parser over the process environment with the POSTMAN_ prefix.
    pub fn new() -> Self {
        Self {
            prefix: "POSTMAN_",
            lookup: Lookup::Process,
            errors: Vec::new(),
        }
    }

    /// Create a parser over a fixed set of variables (full names, prefix included).
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            prefix: "POSTMAN_",
            lookup: Lookup::Map(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            errors: Vec::new(),
        }
    }

    /// Get all accumulated errors.
    pub fn errors(&self) -> &[EnvError] {
        &self.errors
    }

    /// Check if any errors occurred.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Take ownership of errors.
    pub fn take_errors(&mut self) -> Vec<EnvError> {
        std::mem::take(&mut self.errors)
    }

    /// Get the full variable name with prefix.
    pub fn var_name(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// Raw value of a variable; unset and blank values are treated alike.
    fn raw(&self, name: &str) -> Option<(String, String)> {
        let var_name = self.var_name(name);
        let value = match &self.lookup {
            Lookup::Process => env::var(&var_name).ok(),
            Lookup::Map(vars) => vars.get(&var_name).cloned(),
        }?;
        if value.trim().is_empty() {
            return None;
        }
        Some((var_name, value))
    }

    /// Get a string value with default.
    pub fn get_string(&mut self, name: &str, default: &str) -> Sourced<String> {
        match self.raw(name) {
            Some((var_name, value)) => Sourced::from_env(value, var_name),
            None => Sourced::default_value(default.to_string()),
        }
    }

    /// Get an opt-in flag: only the exact value `1` enables it.
    pub fn get_flag(&mut self, name: &str) -> Sourced<bool> {
        match self.raw(name) {
            Some((var_name, value)) => Sourced::from_env(value.trim() == "1", var_name),
            None => Sourced::default_value(false),
        }
    }

    /// Get a boolean switch override.
    ///
    /// Accepts: 1, true (for true)
    ///          0, false (for false)
    ///
    /// Returns `None` when unset or invalid.
    pub fn get_switch(&mut self, name: &str) -> Option<Sourced<bool>> {
        let (var_name, value) = self.raw(name)?;
        match value.trim().to_lowercase().as_str() {
            "1" | "true" => Some(Sourced::from_env(true, var_name)),
            "0" | "false" => Some(Sourced::from_env(false, var_name)),
            _ => {
                self.errors.push(EnvError::InvalidValue {
                    var: var_name,
                    expected: "boolean (1/true/0/false)".to_string(),
                    value,
                });
                None
            }
        }
    }

    /// Get a strictly positive integer override.
    ///
    /// Returns `None` when unset or invalid.
    pub fn get_positive_usize(&mut self, name: &str) -> Option<Sourced<usize>> {
        let (var_name, value) = self.raw(name)?;
        match value.trim().parse::<usize>() {
            Ok(n) if n > 0 => Some(Sourced::from_env(n, var_name)),
            _ => {
                self.errors.push(EnvError::InvalidValue {
                    var: var_name,
                    expected: "integer > 0".to_string(),
                    value,
                });
                None
            }
        }
    }

    /// Get a numeric override clamped to `min..=max`.
    ///
    /// Out-of-range values are clamped and recorded as [`EnvError::Clamped`];
    /// non-numeric values are ignored. Returns `None` when unset or invalid.
    pub fn get_clamped_f64(&mut self, name: &str, min: f64, max: f64) -> Option<Sourced<f64>> {
        let (var_name, value) = self.raw(name)?;
        let parsed = match value.trim().parse::<f64>() {
            Ok(n) if !n.is_nan() => n,
            _ => {
                self.errors.push(EnvError::InvalidValue {
                    var: var_name,
                    expected: "number".to_string(),
                    value,
                });
                return None;
            }
        };

        let clamped = parsed.clamp(min, max);
        if clamped != parsed {
            self.errors.push(EnvError::Clamped {
                var: var_name.clone(),
                value: value.trim().to_string(),
                min: min.to_string(),
                max: max.to_string(),
                clamped: clamped.to_string(),
            });
        }
        Some(Sourced::from_env(clamped, var_name))
    }
}

impl Default for EnvParser {
    fn default() -> Self {
        Self::new()
    }
}
