//! Diagnostic errors.

use hobart_data::{DataError, FailureKind};
use hobart_regression::RegressionError;
use thiserror::Error;

/// Result type for diagnostic tests.
pub type Result<T> = std::result::Result<T, DiagnosticError>;

/// Errors that can occur while computing a diagnostic test.
#[derive(Debug, Error)]
pub enum DiagnosticError {
    /// Residual, fitted and regressor indices cannot be reconciled
    #[error("Index alignment error: {0}")]
    IndexAlignment(String),

    /// Too few observations for the test
    #[error("Insufficient data for {test}: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Test name
        test: &'static str,
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// Sample has no spread
    #[error("Zero variance sample in {0}")]
    ZeroVariance(&'static str),

    /// Auxiliary regression failed
    #[error("Auxiliary regression failed: {0}")]
    Regression(#[from] RegressionError),

    /// Table error
    #[error("Data error: {0}")]
    Data(#[from] DataError),
}

impl DiagnosticError {
    /// Map this error onto the failure taxonomy used in aggregated reports.
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::IndexAlignment(_) => FailureKind::IndexAlignment,
            Self::InsufficientData { .. } => FailureKind::InsufficientData,
            Self::ZeroVariance(_) => FailureKind::Other,
            Self::Regression(err) => err.kind(),
            Self::Data(err) => err.kind(),
        }
    }
}
