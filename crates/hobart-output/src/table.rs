//! Per-series scalar result tables.

use crate::export::ExportError;
use hobart_data::SeriesFailure;
use serde::{Deserialize, Serialize};

/// One row of a [`ScalarTable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarRow {
    /// Row label: the series name, or the regressor name in the VIF table
    pub series: String,

    /// One value per table column; `None` where a value is undefined
    pub values: Vec<Option<f64>>,
}

/// A named table with one row per series and a fixed column set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarTable {
    /// Table name, e.g. `regression` or `shapiro_wilk`
    pub name: String,

    /// Column names
    pub columns: Vec<String>,

    /// Rows in processing order
    pub rows: Vec<ScalarRow>,

    /// Series left out of this table and why
    pub failures: Vec<SeriesFailure>,
}

impl ScalarTable {
    /// Create an empty table.
    pub fn new<S: Into<String>>(name: impl Into<String>, columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Append a row.
    ///
    /// # Errors
    /// `Shape` if the number of values differs from the number of columns.
    pub fn push_row(&mut self, series: impl Into<String>, values: Vec<Option<f64>>) -> Result<(), ExportError> {
        if values.len() != self.columns.len() {
            return Err(ExportError::Shape {
                table: self.name.clone(),
                expected: self.columns.len(),
                actual: values.len(),
            });
        }
        self.rows.push(ScalarRow {
            series: series.into(),
            values,
        });
        Ok(())
    }

    /// Record a series left out of the table.
    pub fn push_failure(&mut self, failure: SeriesFailure) {
        self.failures.push(failure);
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row labels in order.
    pub fn series(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.series.as_str()).collect()
    }

    /// Row for a series.
    pub fn row(&self, series: &str) -> Option<&ScalarRow> {
        self.rows.iter().find(|r| r.series == series)
    }

    /// Value at (`series`, `column`).
    pub fn value(&self, series: &str, column: &str) -> Option<f64> {
        let c = self.columns.iter().position(|name| name == column)?;
        self.row(series).and_then(|r| r.values[c])
    }

    /// Render as a fixed-width text table.
    pub fn to_ascii_table(&self) -> String {
        let label_width = self
            .rows
            .iter()
            .map(|r| r.series.len())
            .chain(std::iter::once(6))
            .max()
            .unwrap_or(6)
            + 2;
        let col_width = self
            .columns
            .iter()
            .map(|c| c.len())
            .chain(std::iter::once(12))
            .max()
            .unwrap_or(12)
            + 1;
        let total = label_width + col_width * self.columns.len();

        let mut output = String::new();
        output.push_str(&format!("\n{}\n", self.name));
        output.push_str(&"=".repeat(total));
        output.push('\n');

        output.push_str(&format!("{:<label_width$}", "Series"));
        for column in &self.columns {
            output.push_str(&format!("{column:>col_width$}"));
        }
        output.push('\n');
        output.push_str(&"-".repeat(total));
        output.push('\n');

        for row in &self.rows {
            output.push_str(&format!("{:<label_width$}", row.series));
            for value in &row.values {
                match value {
                    Some(v) => output.push_str(&format!("{v:>col_width$.4}")),
                    None => output.push_str(&format!("{:>col_width$}", "-")),
                }
            }
            output.push('\n');
        }

        if !self.failures.is_empty() {
            output.push_str(&"-".repeat(total));
            output.push('\n');
            for failure in &self.failures {
                output.push_str(&format!("{failure}\n"));
            }
        }
        output
    }
}
