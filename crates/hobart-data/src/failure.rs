//! Per-series failure records.
//!
//! A series that cannot be regressed or tested is reported with its identity
//! preserved instead of contributing NaN rows to aggregated tables.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a per-series failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Not enough non-missing observations
    InsufficientData,
    /// Regressor matrix is not full rank
    SingularDesign,
    /// Residual, fitted and regressor indices cannot be reconciled
    IndexAlignment,
    /// Non-numeric data where numeric data was expected
    InvalidColumnType,
    /// Anything else (degenerate samples, distribution errors)
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InsufficientData => "insufficient_data",
            Self::SingularDesign => "singular_design",
            Self::IndexAlignment => "index_alignment",
            Self::InvalidColumnType => "invalid_column_type",
            Self::Other => "other",
        };
        f.write_str(label)
    }
}

/// A failed computation for one series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesFailure {
    /// Series (instrument) name.
    pub series: String,

    /// Processing stage that failed, e.g. `regression` or `shapiro_wilk`.
    pub stage: String,

    /// Failure category.
    pub kind: FailureKind,

    /// Human-readable reason.
    pub reason: String,
}

impl SeriesFailure {
    /// Create a new failure record.
    pub fn new(
        series: impl Into<String>,
        stage: impl Into<String>,
        kind: FailureKind,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            series: series.into(),
            stage: stage.into(),
            kind,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SeriesFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed at {} ({}): {}",
            self.series, self.stage, self.kind, self.reason
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display() {
        let failure = SeriesFailure::new(
            "FUND_A",
            "regression",
            FailureKind::SingularDesign,
            "rank 1 < 2",
        );
        assert_eq!(
            failure.to_string(),
            "FUND_A failed at regression (singular_design): rank 1 < 2"
        );
    }
}
