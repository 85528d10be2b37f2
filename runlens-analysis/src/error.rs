//! Analysis error types.

use runlens_common::InputError;
use std::path::PathBuf;

/// Errors that can occur while producing or writing an analysis report.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Failed to serialize analysis report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write analysis report {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AnalysisError {
    /// Whether the run itself could not be read or parsed.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Input(_))
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
