//! Error types for proxy-bench-report

use std::path::PathBuf;

use thiserror::Error;

/// Failures persisting or loading a report
#[derive(Debug, Error)]
pub enum ReportError {
    /// Filesystem failure
    #[error("{action} {path}: {source}")]
    Io {
        /// What was being attempted
        action: &'static str,
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Report could not be encoded or decoded
    #[error("invalid report JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}
