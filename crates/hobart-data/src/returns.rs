//! Return Transform
//!
//! Converts closing prices to log returns and repairs interior gaps.
//!
//! Returns are computed pairwise over consecutive rows of the price table in
//! its stored row order. The first row has no predecessor and is dropped, so
//! a table of `T` prices yields `T - 1` returns indexed by rows `1..T`.

use crate::error::{DataError, Result};
use crate::failure::SeriesFailure;
use crate::table::{Column, TimeSeriesTable};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Direction of the log-price ratio.
///
/// `PreviousOverCurrent` computes `ln(price[t-1] / price[t])`, which is the
/// convention of the source analysis when prices are stored newest-first.
/// `CurrentOverPrevious` computes the textbook `ln(price[t] / price[t-1])`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnConvention {
    /// `ln(p[t-1] / p[t])`
    #[default]
    PreviousOverCurrent,
    /// `ln(p[t] / p[t-1])`
    CurrentOverPrevious,
}

impl ReturnConvention {
    /// Log return from a (previous, current) price pair.
    ///
    /// Non-positive prices have no log return and yield `None`.
    pub fn log_return(self, previous: f64, current: f64) -> Option<f64> {
        if previous <= 0.0 || current <= 0.0 {
            return None;
        }
        let value = match self {
            Self::PreviousOverCurrent => (previous / current).ln(),
            Self::CurrentOverPrevious => (current / previous).ln(),
        };
        value.is_finite().then_some(value)
    }
}

/// Stage label recorded when a price column is too short for returns.
pub const RETURNS_STAGE: &str = "returns";

fn column_returns(column: &Column, convention: ReturnConvention) -> Vec<Option<f64>> {
    column
        .values
        .windows(2)
        .map(|pair| match (pair[0], pair[1]) {
            (Some(previous), Some(current)) => convention.log_return(previous, current),
            _ => None,
        })
        .collect()
}

fn insufficient_prices(column: &Column) -> Option<DataError> {
    let count = column.count();
    (count < 2).then(|| DataError::InsufficientData {
        column: column.name.clone(),
        required: 2,
        actual: count,
    })
}

/// Compute log returns for every column of a price table.
///
/// The returned table is indexed by the price index without its first row.
/// A return is missing when either price of the pair is missing.
///
/// # Errors
/// `InsufficientData` if any column has fewer than two non-missing prices.
pub fn compute_log_returns(
    prices: &TimeSeriesTable,
    convention: ReturnConvention,
) -> Result<TimeSeriesTable> {
    if let Some(err) = prices.columns().iter().find_map(insufficient_prices) {
        return Err(err);
    }
    let (returns, _) = log_returns_by_column(prices, convention)?;
    Ok(returns)
}

/// Log returns for the columns that have at least two prices.
///
/// Columns with fewer prices are left out of the returned table and
/// reported as `InsufficientData` failures, in column order, so one short
/// instrument does not prevent the others from being processed.
pub fn log_returns_by_column(
    prices: &TimeSeriesTable,
    convention: ReturnConvention,
) -> Result<(TimeSeriesTable, Vec<SeriesFailure>)> {
    let index = prices.index().iter().skip(1).copied().collect();
    let mut returns = TimeSeriesTable::new(index);
    let mut failures = Vec::new();

    for column in prices.columns() {
        if let Some(err) = insufficient_prices(column) {
            warn!(series = %column.name, error = %err, "Skipping price column");
            failures.push(SeriesFailure::new(
                &column.name,
                RETURNS_STAGE,
                err.kind(),
                err.to_string(),
            ));
            continue;
        }
        returns.push_column(column.name.clone(), column_returns(column, convention))?;
    }

    debug!(
        columns = returns.width(),
        skipped = failures.len(),
        rows = returns.len(),
        "computed log returns"
    );
    Ok((returns, failures))
}

/// A value that counts as an observation for gap repair.
fn is_valid(value: Option<f64>) -> bool {
    matches!(value, Some(v) if !v.is_nan() && v != 0.0)
}

/// Replace interior gaps with the mean of the valid observations.
///
/// A value is valid when it is present, not `NaN` and not exactly zero.
/// Missing, `NaN` or zero values lying between the first and last valid
/// observation (inclusive) are replaced with the mean of all valid values.
/// Leading and trailing gaps are left untouched. A series without any valid
/// value is returned unchanged.
pub fn repair_gaps(series: &[Option<f64>]) -> Vec<Option<f64>> {
    let valid: Vec<f64> = series.iter().copied().filter(|v| is_valid(*v)).flatten().collect();
    if valid.is_empty() {
        return series.to_vec();
    }
    let mean = valid.iter().sum::<f64>() / valid.len() as f64;

    let first = series.iter().position(|v| is_valid(*v));
    let last = series.iter().rposition(|v| is_valid(*v));
    let (Some(first), Some(last)) = (first, last) else {
        return series.to_vec();
    };

    series
        .iter()
        .enumerate()
        .map(|(i, v)| {
            if (first..=last).contains(&i) && !is_valid(*v) {
                Some(mean)
            } else {
                *v
            }
        })
        .collect()
}

/// Apply [`repair_gaps`] to every column of a table.
pub fn repair_table_gaps(table: &TimeSeriesTable) -> Result<TimeSeriesTable> {
    let mut repaired = TimeSeriesTable::new(table.index().to_vec());
    for column in table.columns() {
        let values = repair_gaps(&column.values);
        let filled = values
            .iter()
            .zip(&column.values)
            .filter(|(new, old)| new != old)
            .count();
        if filled > 0 {
            debug!(column = %column.name, filled, "repaired interior gaps");
        }
        repaired.push_column(column.name.clone(), values)?;
    }
    Ok(repaired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn dates(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect()
    }

    #[test]
    fn test_log_returns_scenario() {
        let prices = TimeSeriesTable::from_columns(
            dates(4),
            [("FUND", vec![Some(100.0), Some(105.0), Some(103.0), Some(108.0)])],
        )
        .unwrap();

        let returns = compute_log_returns(&prices, ReturnConvention::default()).unwrap();
        assert_eq!(returns.len(), 3);
        assert_eq!(returns.index(), &dates(4)[1..]);

        let values = returns.column("FUND").unwrap();
        assert_relative_eq!(values[0].unwrap(), (100.0_f64 / 105.0).ln(), epsilon = 1e-12);
        assert_relative_eq!(values[1].unwrap(), (105.0_f64 / 103.0).ln(), epsilon = 1e-12);
        assert_relative_eq!(values[2].unwrap(), (103.0_f64 / 108.0).ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_log_returns_conventional_direction() {
        let prices =
            TimeSeriesTable::from_columns(dates(2), [("FUND", vec![Some(100.0), Some(110.0)])])
                .unwrap();
        let returns = compute_log_returns(&prices, ReturnConvention::CurrentOverPrevious).unwrap();
        assert_relative_eq!(returns.get("FUND", 0).unwrap().unwrap(), 1.1_f64.ln());
    }

    #[test]
    fn test_log_returns_missing_price() {
        let prices = TimeSeriesTable::from_columns(
            dates(4),
            [("FUND", vec![Some(100.0), None, Some(103.0), Some(0.0)])],
        )
        .unwrap();
        let returns = compute_log_returns(&prices, ReturnConvention::default()).unwrap();
        assert_eq!(returns.column("FUND").unwrap(), &[None, None, None]);
    }

    #[test]
    fn test_log_returns_insufficient_data() {
        let prices =
            TimeSeriesTable::from_columns(dates(3), [("FUND", vec![None, Some(1.0), None])])
                .unwrap();
        let err = compute_log_returns(&prices, ReturnConvention::default()).unwrap_err();
        assert!(matches!(err, DataError::InsufficientData { actual: 1, .. }));
    }

    #[test]
    fn test_repair_interior_only() {
        let series = vec![
            None,
            Some(0.0),
            Some(1.0),
            None,
            Some(0.0),
            Some(3.0),
            Some(f64::NAN),
            None,
        ];
        let repaired = repair_gaps(&series);

        assert_eq!(repaired[0], None);
        assert_eq!(repaired[1], Some(0.0));
        assert_eq!(repaired[2], Some(1.0));
        assert_eq!(repaired[3], Some(2.0));
        assert_eq!(repaired[4], Some(2.0));
        assert_eq!(repaired[5], Some(3.0));
        assert!(repaired[6].unwrap().is_nan());
        assert_eq!(repaired[7], None);
    }

    #[rstest]
    #[case(vec![])]
    #[case(vec![None, None])]
    #[case(vec![Some(0.0), None, Some(0.0)])]
    fn test_repair_degenerate_unchanged(#[case] series: Vec<Option<f64>>) {
        assert_eq!(repair_gaps(&series), series);
    }

    #[test]
    fn test_repair_never_touches_outer_span() {
        let series = vec![
            Some(0.0),
            None,
            Some(0.5),
            Some(0.0),
            None,
            Some(-0.5),
            None,
            Some(0.0),
        ];
        let repaired = repair_gaps(&series);
        let first = 2;
        let last = 5;
        for (i, (old, new)) in series.iter().zip(&repaired).enumerate() {
            if i < first || i > last {
                assert_eq!(old, new, "row {i} outside the valid span was modified");
            }
        }
        assert_eq!(repaired[3], Some(0.0));
        assert_eq!(repaired[4], Some(0.0));
    }

    #[test]
    fn test_short_columns_set_aside() {
        let prices = TimeSeriesTable::from_columns(
            dates(3),
            [
                ("FUND", vec![Some(100.0), Some(101.0), Some(99.0)]),
                ("LONE", vec![None, Some(50.0), None]),
                ("EMPTY", vec![None, None, None]),
            ],
        )
        .unwrap();

        assert!(matches!(
            compute_log_returns(&prices, ReturnConvention::default()),
            Err(DataError::InsufficientData { actual: 1, .. })
        ));

        let (returns, failures) =
            log_returns_by_column(&prices, ReturnConvention::default()).unwrap();
        assert_eq!(returns.column_names(), vec!["FUND"]);
        assert_eq!(returns.len(), 2);

        let skipped: Vec<&str> = failures.iter().map(|f| f.series.as_str()).collect();
        assert_eq!(skipped, vec!["LONE", "EMPTY"]);
        assert!(failures.iter().all(|f| f.kind == crate::FailureKind::InsufficientData));
        assert_eq!(failures[0].stage, RETURNS_STAGE);
    }
}
