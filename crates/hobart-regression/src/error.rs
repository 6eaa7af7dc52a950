//! Regression errors.

use hobart_data::{DataError, FailureKind};
use thiserror::Error;

/// Errors that can occur while fitting a regression.
#[derive(Debug, Error)]
pub enum RegressionError {
    /// Not enough complete observations for the number of parameters
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// Design matrix is rank deficient
    #[error("Singular design matrix: column {column} of {columns} is linearly dependent on earlier columns")]
    SingularDesign {
        /// First linearly dependent column
        column: usize,
        /// Number of columns
        columns: usize,
    },

    /// Dimension mismatch between response and design
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Regressor panel has the wrong number of factors for the model
    #[error("Factor count mismatch: model expects {expected}, panel has {actual}")]
    FactorCount {
        /// Factors required by the model
        expected: usize,
        /// Columns supplied
        actual: usize,
    },

    /// Design has no columns
    #[error("Design matrix has no columns")]
    EmptyDesign,

    /// Response has zero total variation
    #[error("Response has zero variance")]
    ZeroVariance,

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Distribution construction failed
    #[error("Distribution error: {0}")]
    Distribution(String),

    /// Table error
    #[error("Data error: {0}")]
    Data(#[from] DataError),
}

impl From<statrs::StatsError> for RegressionError {
    fn from(err: statrs::StatsError) -> Self {
        Self::Distribution(err.to_string())
    }
}

impl RegressionError {
    /// Map this error onto the failure taxonomy used in aggregated reports.
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::InsufficientData { .. } => FailureKind::InsufficientData,
            Self::SingularDesign { .. } => FailureKind::SingularDesign,
            Self::DimensionMismatch { .. } => FailureKind::IndexAlignment,
            Self::Data(err) => err.kind(),
            Self::FactorCount { .. }
            | Self::EmptyDesign
            | Self::ZeroVariance
            | Self::InvalidParameter(_)
            | Self::Distribution(_) => FailureKind::Other,
        }
    }
}
