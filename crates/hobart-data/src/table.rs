//! Time Series Table
//!
//! An ordered index of dates shared by one or more named numeric columns.
//! Missing observations are explicit `None` values; `NaN` and infinities are
//! normalised to `None` when a column enters a table, so downstream code never
//! has to distinguish "not a number" from "no observation".

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Direction of a table's index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOrder {
    /// Strictly increasing dates
    Ascending,
    /// Strictly decreasing dates
    Descending,
    /// Neither (includes duplicate timestamps)
    Unordered,
}

/// A named numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name (instrument or factor).
    pub name: String,

    /// One value per index row; `None` marks a missing observation.
    pub values: Vec<Option<f64>>,
}

impl Column {
    /// Number of non-missing observations.
    pub fn count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Non-missing values in row order.
    pub fn present(&self) -> Vec<f64> {
        self.values.iter().flatten().copied().collect()
    }
}

/// Time-indexed table of numeric columns sharing one index.
///
/// Deserialization goes through [`TimeSeriesTable::from_columns`], so a
/// deserialized table satisfies the same invariants as a constructed one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "SerializedTable")]
pub struct TimeSeriesTable {
    index: Vec<NaiveDate>,
    columns: Vec<Column>,
}

#[derive(Debug, Deserialize)]
struct SerializedTable {
    index: Vec<NaiveDate>,
    columns: Vec<Column>,
}

impl TryFrom<SerializedTable> for TimeSeriesTable {
    type Error = DataError;

    fn try_from(table: SerializedTable) -> Result<Self> {
        Self::from_columns(
            table.index,
            table.columns.into_iter().map(|c| (c.name, c.values)),
        )
    }
}

impl TimeSeriesTable {
    /// Create an empty table over the given index.
    pub const fn new(index: Vec<NaiveDate>) -> Self {
        Self {
            index,
            columns: Vec::new(),
        }
    }

    /// Build a table from `(name, values)` pairs.
    pub fn from_columns<S: Into<String>>(
        index: Vec<NaiveDate>,
        columns: impl IntoIterator<Item = (S, Vec<Option<f64>>)>,
    ) -> Result<Self> {
        let mut table = Self::new(index);
        for (name, values) in columns {
            table.push_column(name, values)?;
        }
        Ok(table)
    }

    /// Append a column.
    ///
    /// Fails if the name is already taken or the length differs from the index.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Result<()> {
        let name = name.into();
        if values.len() != self.index.len() {
            return Err(DataError::LengthMismatch {
                column: name,
                expected: self.index.len(),
                actual: values.len(),
            });
        }
        if self.columns.iter().any(|c| c.name == name) {
            return Err(DataError::DuplicateColumn(name));
        }

        let values = values
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        self.columns.push(Column { name, values });
        Ok(())
    }

    /// The shared time index.
    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    /// Number of rows.
    pub const fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the table has no rows.
    pub const fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of columns.
    pub const fn width(&self) -> usize {
        self.columns.len()
    }

    /// All columns in insertion order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Whether a column with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Values of a named column.
    pub fn column(&self, name: &str) -> Result<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    }

    /// Value at a row of a named column.
    pub fn get(&self, name: &str, row: usize) -> Result<Option<f64>> {
        Ok(self.column(name)?.get(row).copied().flatten())
    }

    /// Direction of the index.
    pub fn index_order(&self) -> IndexOrder {
        if self.index.windows(2).all(|w| w[0] < w[1]) {
            IndexOrder::Ascending
        } else if self.index.windows(2).all(|w| w[0] > w[1]) {
            IndexOrder::Descending
        } else {
            IndexOrder::Unordered
        }
    }

    /// Fail with `DuplicateTimestamp` if any date appears twice.
    pub fn ensure_unique_index(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.index.len());
        for date in &self.index {
            if !seen.insert(*date) {
                return Err(DataError::DuplicateTimestamp(*date));
            }
        }
        Ok(())
    }

    /// Copy of the table with rows sorted by ascending date.
    pub fn sorted_ascending(&self) -> Result<Self> {
        self.ensure_unique_index()?;

        let mut order: Vec<usize> = (0..self.index.len()).collect();
        order.sort_by_key(|&i| self.index[i]);
        Ok(self.take_rows(&order))
    }

    /// Copy of the table restricted to the given row positions, in that order.
    pub fn take_rows(&self, rows: &[usize]) -> Self {
        Self {
            index: rows.iter().map(|&i| self.index[i]).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: rows.iter().map(|&i| c.values[i]).collect(),
                })
                .collect(),
        }
    }

    /// Conform the table to a new index.
    ///
    /// Timestamps absent from this table become missing values. The source
    /// index must not contain duplicates.
    pub fn reindex(&self, index: &[NaiveDate]) -> Result<Self> {
        self.ensure_unique_index()?;

        let positions: HashMap<NaiveDate, usize> = self
            .index
            .iter()
            .enumerate()
            .map(|(i, d)| (*d, i))
            .collect();
        let lookup: Vec<Option<usize>> = index.iter().map(|d| positions.get(d).copied()).collect();

        Ok(Self {
            index: index.to_vec(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: lookup.iter().map(|p| p.and_then(|i| c.values[i])).collect(),
                })
                .collect(),
        })
    }

    /// Table containing only the named columns, in the requested order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let mut table = Self::new(self.index.clone());
        for name in names {
            let name = name.as_ref();
            table.push_column(name, self.column(name)?.to_vec())?;
        }
        Ok(table)
    }

    /// Apply a value transform to every non-missing cell.
    pub fn map_values(&self, f: impl Fn(f64) -> Option<f64>) -> Self {
        Self {
            index: self.index.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: c
                        .values
                        .iter()
                        .map(|v| v.and_then(&f).filter(|x| x.is_finite()))
                        .collect(),
                })
                .collect(),
        }
    }

    /// Row positions where every column is present.
    pub fn complete_rows(&self) -> Vec<usize> {
        (0..self.index.len())
            .filter(|&i| self.columns.iter().all(|c| c.values[i].is_some()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dates(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect()
    }

    #[test]
    fn test_push_column_normalises_nan() {
        let mut table = TimeSeriesTable::new(dates(3));
        table
            .push_column("a", vec![Some(1.0), Some(f64::NAN), Some(f64::INFINITY)])
            .unwrap();
        assert_eq!(table.column("a").unwrap(), &[Some(1.0), None, None]);
    }

    #[test]
    fn test_push_column_length_mismatch() {
        let mut table = TimeSeriesTable::new(dates(3));
        let err = table.push_column("a", vec![Some(1.0)]).unwrap_err();
        assert!(matches!(err, DataError::LengthMismatch { expected: 3, actual: 1, .. }));
    }

    #[test]
    fn test_duplicate_column() {
        let mut table = TimeSeriesTable::new(dates(1));
        table.push_column("a", vec![Some(1.0)]).unwrap();
        assert!(matches!(
            table.push_column("a", vec![Some(2.0)]),
            Err(DataError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn test_index_order() {
        let mut idx = dates(3);
        assert_eq!(TimeSeriesTable::new(idx.clone()).index_order(), IndexOrder::Ascending);
        idx.reverse();
        assert_eq!(TimeSeriesTable::new(idx.clone()).index_order(), IndexOrder::Descending);
        idx.swap(0, 1);
        assert_eq!(TimeSeriesTable::new(idx).index_order(), IndexOrder::Unordered);
    }

    #[test]
    fn test_sorted_ascending() {
        let mut idx = dates(3);
        idx.reverse();
        let table =
            TimeSeriesTable::from_columns(idx, [("a", vec![Some(3.0), Some(2.0), Some(1.0)])])
                .unwrap();
        let sorted = table.sorted_ascending().unwrap();
        assert_eq!(sorted.index(), dates(3).as_slice());
        assert_eq!(sorted.column("a").unwrap(), &[Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_sorted_ascending_rejects_duplicates() {
        let d = dates(1)[0];
        let table = TimeSeriesTable::new(vec![d, d]);
        assert!(matches!(table.sorted_ascending(), Err(DataError::DuplicateTimestamp(_))));
    }

    #[test]
    fn test_reindex_inserts_missing() {
        let idx = dates(3);
        let table = TimeSeriesTable::from_columns(
            vec![idx[0], idx[2]],
            [("a", vec![Some(1.0), Some(3.0)])],
        )
        .unwrap();
        let wide = table.reindex(&idx).unwrap();
        assert_eq!(wide.column("a").unwrap(), &[Some(1.0), None, Some(3.0)]);
    }

    #[test]
    fn test_select_and_complete_rows() {
        let table = TimeSeriesTable::from_columns(
            dates(3),
            [
                ("a", vec![Some(1.0), None, Some(3.0)]),
                ("b", vec![Some(1.0), Some(2.0), None]),
                ("c", vec![Some(1.0), Some(2.0), Some(3.0)]),
            ],
        )
        .unwrap();
        assert_eq!(table.complete_rows(), vec![0]);

        let bc = table.select(&["c", "b"]).unwrap();
        assert_eq!(bc.column_names(), vec!["c", "b"]);
        assert_eq!(bc.complete_rows(), vec![0, 1]);
        assert!(matches!(table.select(&["z"]), Err(DataError::MissingColumn(_))));
    }

    #[test]
    fn test_deserialize_validates_columns() {
        let valid = json!({
            "index": ["2024-01-01", "2024-01-02"],
            "columns": [{"name": "a", "values": [1.5, null]}]
        });
        let table: TimeSeriesTable = serde_json::from_value(valid).unwrap();
        assert_eq!(table.column("a").unwrap(), &[Some(1.5), None]);

        let short = json!({
            "index": ["2024-01-01", "2024-01-02"],
            "columns": [{"name": "a", "values": [1.5]}]
        });
        let err = serde_json::from_value::<TimeSeriesTable>(short).unwrap_err();
        assert!(err.to_string().contains("Length mismatch"));

        let duplicate = json!({
            "index": ["2024-01-01"],
            "columns": [{"name": "a", "values": [1.0]}, {"name": "a", "values": [2.0]}]
        });
        assert!(serde_json::from_value::<TimeSeriesTable>(duplicate).is_err());
    }

    #[test]
    fn test_serialize_round_trip() {
        let table =
            TimeSeriesTable::from_columns(dates(2), [("a", vec![Some(1.0), None])]).unwrap();
        let text = serde_json::to_string(&table).unwrap();
        let back: TimeSeriesTable = serde_json::from_str(&text).unwrap();
        assert_eq!(back, table);
    }
}
