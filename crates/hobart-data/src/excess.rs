//! Excess Return Aligner
//!
//! Aligns return series with a risk-free benchmark by timestamp and subtracts
//! it value-for-value.
//!
//! Source data uses exact zero as a "no observation" placeholder. Under
//! [`ZeroPolicy::Missing`] such zeros are turned into explicit missing values
//! in both the raw and excess tables, so a missing observation is never
//! mistaken for a 0% return downstream.

use crate::error::{DataError, Result};
use crate::table::TimeSeriesTable;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Interpretation of exact-zero returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroPolicy {
    /// Exact zero is a placeholder for a missing observation
    #[default]
    Missing,
    /// Exact zero is a genuine observation
    Observed,
}

impl ZeroPolicy {
    /// Apply the policy to a single cell.
    pub fn apply(self, value: Option<f64>) -> Option<f64> {
        match self {
            Self::Missing => value.filter(|v| *v != 0.0),
            Self::Observed => value,
        }
    }
}

/// Raw and excess returns on a shared index.
#[derive(Debug, Clone, PartialEq)]
pub struct ExcessReturns {
    /// Returns after the zero policy has been applied.
    pub raw: TimeSeriesTable,

    /// Returns minus the aligned risk-free rate.
    pub excess: TimeSeriesTable,
}

/// Subtract a time-aligned risk-free rate from every return column.
///
/// The risk-free column is reindexed onto the returns' index; timestamps
/// absent from the benchmark become missing, and so does the excess return.
/// The output keeps the row order of `returns`.
///
/// # Errors
/// `MissingColumn` if `risk_free_column` is not in `risk_free`, or
/// `DuplicateTimestamp` if the benchmark index repeats a date.
pub fn align_and_subtract(
    returns: &TimeSeriesTable,
    risk_free: &TimeSeriesTable,
    risk_free_column: &str,
    policy: ZeroPolicy,
) -> Result<ExcessReturns> {
    if !risk_free.contains(risk_free_column) {
        return Err(DataError::MissingColumn(risk_free_column.to_string()));
    }
    returns.ensure_unique_index()?;

    let aligned = risk_free
        .select(&[risk_free_column])?
        .reindex(returns.index())?;
    let rf = aligned.column(risk_free_column)?;
    let unmatched = rf.iter().filter(|v| v.is_none()).count();
    if unmatched > 0 {
        debug!(unmatched, "risk-free rate missing for some return timestamps");
    }

    let mut raw = TimeSeriesTable::new(returns.index().to_vec());
    let mut excess = TimeSeriesTable::new(returns.index().to_vec());

    for column in returns.columns() {
        let cleaned: Vec<Option<f64>> = column.values.iter().map(|v| policy.apply(*v)).collect();
        let subtracted = cleaned
            .iter()
            .zip(rf)
            .map(|(r, f)| match (r, f) {
                (Some(r), Some(f)) => policy.apply(Some(r - f)),
                _ => None,
            })
            .collect();

        raw.push_column(column.name.clone(), cleaned)?;
        excess.push_column(column.name.clone(), subtracted)?;
    }

    Ok(ExcessReturns { raw, excess })
}
