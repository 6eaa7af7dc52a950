//! Polars interop for time series tables.
//!
//! Readers of spreadsheets or CSV files usually hand over a `DataFrame`; this
//! module converts between that and [`TimeSeriesTable`]. The timestamp column
//! must have the `Date` dtype and every other column must be numeric.

use crate::error::{DataError, Result};
use crate::table::TimeSeriesTable;
use chrono::{NaiveDate, TimeDelta};
use polars::prelude::*;

/// 1970-01-01, the origin of the polars `Date` physical representation.
fn epoch() -> NaiveDate {
    NaiveDate::default()
}

fn date_from_epoch_days(days: i32) -> Result<NaiveDate> {
    epoch()
        .checked_add_signed(TimeDelta::days(i64::from(days)))
        .ok_or_else(|| DataError::IndexAlignment(format!("date out of range: {days} days")))
}

const fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float64
            | DataType::Float32
            | DataType::Int64
            | DataType::Int32
            | DataType::Int16
            | DataType::Int8
            | DataType::UInt64
            | DataType::UInt32
            | DataType::UInt16
            | DataType::UInt8
    )
}

impl TimeSeriesTable {
    /// Build a table from a data frame with a `Date` timestamp column.
    ///
    /// Integer columns are coerced to `f64`; nulls become missing values.
    ///
    /// # Errors
    /// `InvalidColumnType` for a non-date timestamp column or any non-numeric
    /// data column, `IndexAlignment` for null timestamps.
    pub fn from_dataframe(df: &DataFrame, date_column: &str) -> Result<Self> {
        let dates = df.column(date_column)?;
        if dates.dtype() != &DataType::Date {
            return Err(DataError::InvalidColumnType {
                column: date_column.to_string(),
                found: dates.dtype().to_string(),
            });
        }

        let days = dates.cast(&DataType::Int32)?;
        let mut index = Vec::with_capacity(df.height());
        for (row, day) in days.as_materialized_series().i32()?.into_iter().enumerate() {
            let day = day
                .ok_or_else(|| DataError::IndexAlignment(format!("null timestamp at row {row}")))?;
            index.push(date_from_epoch_days(day)?);
        }

        let mut table = Self::new(index);
        for column in df.get_columns() {
            let name = column.name().as_str();
            if name == date_column {
                continue;
            }
            if !is_numeric(column.dtype()) {
                return Err(DataError::InvalidColumnType {
                    column: name.to_string(),
                    found: column.dtype().to_string(),
                });
            }
            let floats = column.cast(&DataType::Float64)?;
            let values: Vec<Option<f64>> =
                floats.as_materialized_series().f64()?.into_iter().collect();
            table.push_column(name, values)?;
        }

        Ok(table)
    }

    /// Convert to a data frame with the index as a leading `Date` column.
    pub fn to_dataframe(&self, date_column: &str) -> Result<DataFrame> {
        let epoch = epoch();
        let days: Vec<i32> = self
            .index()
            .iter()
            .map(|d| (*d - epoch).num_days() as i32)
            .collect();

        let mut columns = Vec::with_capacity(self.width() + 1);
        columns.push(Column::new(date_column.into(), days).cast(&DataType::Date)?);
        for column in self.columns() {
            columns.push(Column::new(
                column.name.as_str().into(),
                column.values.clone(),
            ));
        }

        Ok(DataFrame::new(columns)?)
    }
}
