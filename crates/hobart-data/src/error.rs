//! Error types for table and return operations.

use crate::failure::FailureKind;
use chrono::NaiveDate;
use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while building or transforming time series tables.
#[derive(Debug, Error)]
pub enum DataError {
    /// Not enough non-missing observations in a column
    #[error("Insufficient data in {column}: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Column that was inspected
        column: String,
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// Column holds values that are not numeric
    #[error("Invalid column type for {column}: expected numeric, found {found}")]
    InvalidColumnType {
        /// Offending column
        column: String,
        /// Description of the type that was found
        found: String,
    },

    /// Column length differs from the index length
    #[error("Length mismatch for {column}: index has {expected} rows, column has {actual}")]
    LengthMismatch {
        /// Offending column
        column: String,
        /// Index length
        expected: usize,
        /// Column length
        actual: usize,
    },

    /// Column name already present in the table
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    /// Requested column is absent
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Timestamp appears more than once in an index
    #[error("Duplicate timestamp in index: {0}")]
    DuplicateTimestamp(NaiveDate),

    /// Two indices cannot be reconciled
    #[error("Index alignment error: {0}")]
    IndexAlignment(String),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

impl DataError {
    /// Map this error onto the failure taxonomy used in aggregated reports.
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::InsufficientData { .. } => FailureKind::InsufficientData,
            Self::InvalidColumnType { .. } => FailureKind::InvalidColumnType,
            Self::DuplicateTimestamp(_) | Self::IndexAlignment(_) | Self::LengthMismatch { .. } => {
                FailureKind::IndexAlignment
            }
            Self::DuplicateColumn(_) | Self::MissingColumn(_) | Self::Polars(_) => {
                FailureKind::Other
            }
        }
    }
}
