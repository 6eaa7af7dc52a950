//! Pipeline errors.

use hobart_data::{DataError, FailureKind, SeriesFailure};
use hobart_output::ExportError;
use hobart_regression::RegressionError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that stop a pipeline run.
///
/// Per-series fit and diagnostic failures are recorded in the report and do
/// not appear here unless the run is configured to abort on them.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input table error
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Regression error affecting the whole panel
    #[error("Regression error: {0}")]
    Regression(#[from] RegressionError),

    /// Aggregation or export error
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Configuration could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A series failed and the run was configured to abort
    #[error("Aborted: {0}")]
    SeriesFailed(SeriesFailure),
}

impl PipelineError {
    /// Map this error onto the failure taxonomy used in aggregated reports.
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Data(err) => err.kind(),
            Self::Regression(err) => err.kind(),
            Self::SeriesFailed(failure) => failure.kind,
            Self::Export(_) | Self::Io(_) | Self::Json(_) | Self::InvalidConfig(_) => {
                FailureKind::Other
            }
        }
    }
}
