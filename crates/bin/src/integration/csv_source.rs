//! CSV input tables.
//!
//! The first column holds dates and every other column one numeric series.
//! Empty cells and the usual spreadsheet markers (`NA`, `N/A`, `#N/A`) are
//! missing observations.

use chrono::NaiveDate;
use hobart::data::{DataError, TimeSeriesTable};
use std::io::Read;
use std::path::Path;
use tracing::debug;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y%m%d", "%m/%d/%Y"];

const MISSING_MARKERS: [&str; 3] = ["NA", "N/A", "#N/A"];

/// Error type for CSV input.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CsvSourceError {
    /// Malformed CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Table construction error, including non-numeric cells.
    #[error("{0}")]
    Data(#[from] DataError),

    /// Date cell in none of the accepted formats.
    #[error("Unparseable date {value:?} on line {line}")]
    InvalidDate {
        /// 1-based line number, header included
        line: usize,
        /// Cell content
        value: String,
    },

    /// Header row without any series column.
    #[error("No data columns after the date column")]
    NoColumns,
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

fn parse_cell(column: &str, line: usize, cell: &str) -> Result<Option<f64>, DataError> {
    let cell = cell.trim();
    if cell.is_empty() || MISSING_MARKERS.contains(&cell) {
        return Ok(None);
    }
    cell.parse::<f64>()
        .map(Some)
        .map_err(|_| DataError::InvalidColumnType {
            column: column.to_string(),
            found: format!("{cell:?} on line {line}"),
        })
}

/// Parse a table from any reader.
pub(crate) fn parse_table<R: Read>(reader: R) -> Result<TimeSeriesTable, CsvSourceError> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?.clone();
    let names: Vec<String> = headers.iter().skip(1).map(|h| h.trim().to_string()).collect();
    if names.is_empty() {
        return Err(CsvSourceError::NoColumns);
    }

    let mut index = Vec::new();
    let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); names.len()];

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let line = row + 2;
        let raw_date = record.get(0).unwrap_or_default().trim();
        let date = parse_date(raw_date).ok_or_else(|| CsvSourceError::InvalidDate {
            line,
            value: raw_date.to_string(),
        })?;
        index.push(date);

        for (c, name) in names.iter().enumerate() {
            let cell = record.get(c + 1).unwrap_or_default();
            columns[c].push(parse_cell(name, line, cell)?);
        }
    }

    debug!(rows = index.len(), columns = names.len(), "Parsed CSV table");
    Ok(TimeSeriesTable::from_columns(index, names.into_iter().zip(columns))?)
}

/// Read a table from a CSV file.
pub(crate) fn read_table(path: &Path) -> Result<TimeSeriesTable, CsvSourceError> {
    let file = std::fs::File::open(path).map_err(csv::Error::from)?;
    parse_table(std::io::BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_table() {
        let data = "Date,FUND_A,FUND_B\n2024-03-29,101.5,\n2024-02-29,100.0,NA\n2024-01-31,99.0,45.2\n";
        let table = parse_table(data.as_bytes()).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.column_names(), vec!["FUND_A", "FUND_B"]);
        assert_eq!(table.index()[0], NaiveDate::from_ymd_opt(2024, 3, 29).unwrap());
        assert_eq!(table.column("FUND_B").unwrap(), &[None, None, Some(45.2)]);
    }

    #[test]
    fn test_date_formats() {
        let data = "date,x\n20240131,1\n02/29/2024,2\n";
        let table = parse_table(data.as_bytes()).unwrap();
        assert_eq!(
            table.index(),
            &[
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            ]
        );
    }

    #[test]
    fn test_non_numeric_cell() {
        let data = "date,FUND_A\n2024-01-31,1.5\n2024-02-29,n/a price\n";
        match parse_table(data.as_bytes()) {
            Err(CsvSourceError::Data(DataError::InvalidColumnType { column, found })) => {
                assert_eq!(column, "FUND_A");
                assert!(found.contains("line 3"));
            }
            other => panic!("expected an invalid column type, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_date() {
        let data = "date,x\nyesterday,1\n";
        assert!(matches!(
            parse_table(data.as_bytes()),
            Err(CsvSourceError::InvalidDate { line: 2, .. })
        ));
    }

    #[test]
    fn test_no_columns() {
        assert!(matches!(
            parse_table("date\n2024-01-31\n".as_bytes()),
            Err(CsvSourceError::NoColumns)
        ));
    }

    #[test]
    fn test_read_table_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "date,RF,Mkt-RF\n2024-01-31,0.0004,0.012\n").unwrap();
        let table = read_table(file.path()).unwrap();
        assert_eq!(table.column("Mkt-RF").unwrap(), &[Some(0.012)]);
    }
}
