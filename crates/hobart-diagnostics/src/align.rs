//! Sample alignment for residual diagnostics
//!
//! Residuals, fitted values and regressors can reach the diagnostics on
//! different indices. They are joined on timestamps first: a row is kept only
//! when every input has a valid observation at that date, and the kept rows
//! are ordered by ascending date. Missing values are dropped after the join,
//! never per table.

use crate::error::{DiagnosticError, Result};
use chrono::NaiveDate;
use hobart_data::TimeSeriesTable;
use ndarray::Array2;
use std::collections::HashMap;

/// Residuals, fitted values and regressors on a shared ascending index.
#[derive(Debug, Clone)]
pub struct AlignedSample {
    /// Common timestamps, ascending
    pub index: Vec<NaiveDate>,
    /// Residuals on `index`
    pub residuals: Vec<f64>,
    /// Fitted values on `index`
    pub fitted: Vec<f64>,
    /// Regressors on `index` (T x K, no intercept column)
    pub regressors: Array2<f64>,
    /// Regressor column names
    pub regressor_names: Vec<String>,
}

fn positions(table: &TimeSeriesTable) -> Result<HashMap<NaiveDate, usize>> {
    ensure_unique(table)?;
    Ok(table
        .index()
        .iter()
        .enumerate()
        .map(|(i, d)| (*d, i))
        .collect())
}

impl AlignedSample {
    /// Align `series`' residuals and fitted values with every regressor
    /// column.
    ///
    /// # Errors
    /// `IndexAlignment` if an index has duplicate timestamps or the inputs
    /// share no valid timestamp; `Data` if `series` is absent.
    pub fn from_tables(
        series: &str,
        residuals: &TimeSeriesTable,
        fitted: &TimeSeriesTable,
        regressors: &TimeSeriesTable,
    ) -> Result<Self> {
        let residual_values = residuals.column(series)?;
        let fitted_values = fitted.column(series)?;

        ensure_unique(residuals)?;
        let fitted_rows = positions(fitted)?;
        let regressor_rows = positions(regressors)?;

        let regressor_columns: Vec<&[Option<f64>]> =
            regressors.columns().iter().map(|c| c.values.as_slice()).collect();

        let mut rows: Vec<(NaiveDate, f64, f64, Vec<f64>)> = Vec::new();
        for (i, date) in residuals.index().iter().enumerate() {
            let Some(e) = residual_values[i] else {
                continue;
            };
            let Some(y_hat) = fitted_rows.get(date).and_then(|&j| fitted_values[j]) else {
                continue;
            };
            let Some(&r) = regressor_rows.get(date) else {
                continue;
            };
            let x: Option<Vec<f64>> = regressor_columns.iter().map(|c| c[r]).collect();
            if let Some(x) = x {
                rows.push((*date, e, y_hat, x));
            }
        }

        if rows.is_empty() && residual_values.iter().any(Option::is_some) {
            return Err(DiagnosticError::IndexAlignment(format!(
                "residuals of {series} share no valid timestamp with fitted values and regressors"
            )));
        }

        rows.sort_by_key(|row| row.0);

        let k = regressor_columns.len();
        let mut regressor_matrix = Array2::<f64>::zeros((rows.len(), k));
        for (t, row) in rows.iter().enumerate() {
            for (c, v) in row.3.iter().enumerate() {
                regressor_matrix[[t, c]] = *v;
            }
        }

        Ok(Self {
            index: rows.iter().map(|r| r.0).collect(),
            residuals: rows.iter().map(|r| r.1).collect(),
            fitted: rows.iter().map(|r| r.2).collect(),
            regressors: regressor_matrix,
            regressor_names: regressors.column_names().into_iter().map(str::to_string).collect(),
        })
    }

    /// Number of aligned observations.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether no observation survived alignment.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

fn ensure_unique(table: &TimeSeriesTable) -> Result<()> {
    table
        .ensure_unique_index()
        .map_err(|err| DiagnosticError::IndexAlignment(err.to_string()))
}

/// Non-missing residuals of one series in ascending date order.
///
/// # Errors
/// `IndexAlignment` if the residual index has duplicate timestamps.
pub fn sorted_residuals(residuals: &TimeSeriesTable, series: &str) -> Result<Vec<f64>> {
    let values = residuals.column(series)?;
    ensure_unique(residuals)?;

    let mut dated: Vec<(NaiveDate, f64)> = residuals
        .index()
        .iter()
        .zip(values)
        .filter_map(|(d, v)| v.map(|v| (*d, v)))
        .collect();
    dated.sort_by_key(|(d, _)| *d);
    Ok(dated.into_iter().map(|(_, v)| v).collect())
}
