//! Per-dataset pipeline
//!
//! Runs the stages in dependency order:
//!
//! 1. log returns from closing prices, in the price table's stored row order
//! 2. ascending sort and interior gap repair
//! 3. risk-free alignment and subtraction
//! 4. descriptive statistics of the excess returns
//! 5. one OLS fit per series
//! 6. the residual diagnostic battery
//! 7. aggregation onto the excess-return index

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use hobart_data::{
    SeriesFailure, TimeSeriesTable, align_and_subtract, describe, log_returns_by_column,
    repair_table_gaps,
};
use hobart_diagnostics::DiagnosticSuite;
use hobart_output::{DatasetReport, ResultAggregator};
use hobart_regression::FactorRegression;
use polars::prelude::DataFrame;
use rayon::prelude::*;
use tracing::info;

/// Named input tables for one dataset.
#[derive(Debug, Clone)]
pub struct DatasetInput {
    /// Dataset name, used in report file names
    pub name: String,
    /// Closing prices, one column per instrument
    pub prices: TimeSeriesTable,
    /// Risk-free rate and factor columns
    pub factors: TimeSeriesTable,
}

impl DatasetInput {
    /// Input from polars frames whose timestamps sit in a `Date` column
    /// named `date_column`.
    ///
    /// # Errors
    /// Fails when either frame lacks the date column or holds a non-numeric
    /// series column.
    pub fn from_dataframes(
        name: impl Into<String>,
        prices: &DataFrame,
        factors: &DataFrame,
        date_column: &str,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            prices: TimeSeriesTable::from_dataframe(prices, date_column)?,
            factors: TimeSeriesTable::from_dataframe(factors, date_column)?,
        })
    }
}

/// Factor-model pipeline over one or more datasets.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline.
    pub const fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Excess log returns of `prices` over the risk-free column of
    /// `factors`, sorted ascending by date.
    ///
    /// Price columns with fewer than two prices are left out and returned as
    /// failures.
    ///
    /// # Errors
    /// Propagates table errors: a missing risk-free column or duplicate
    /// timestamps.
    pub fn excess_returns(
        &self,
        prices: &TimeSeriesTable,
        factors: &TimeSeriesTable,
    ) -> Result<(TimeSeriesTable, Vec<SeriesFailure>)> {
        prices.ensure_unique_index()?;
        let (returns, skipped) = log_returns_by_column(prices, self.config.return_convention)?;
        let mut returns = returns.sorted_ascending()?;
        if self.config.repair_gaps {
            returns = repair_table_gaps(&returns)?;
        }

        let aligned = align_and_subtract(
            &returns,
            factors,
            &self.config.risk_free_column,
            self.config.zero_policy,
        )?;
        Ok((aligned.excess, skipped))
    }

    /// Run every stage for one dataset.
    ///
    /// # Errors
    /// Fails on invalid configuration, malformed input tables or a factor
    /// column absent from `factors`. A series without enough prices or one
    /// that cannot be fitted is recorded among the regression failures
    /// unless `abort_on_series_failure` is set, in which case the first such
    /// failure is returned.
    pub fn run(
        &self,
        dataset: &str,
        prices: &TimeSeriesTable,
        factors: &TimeSeriesTable,
    ) -> Result<DatasetReport> {
        self.config.validate()?;
        let model = &self.config.model;
        info!(
            dataset,
            model = model.name(),
            instruments = prices.width(),
            observations = prices.len(),
            "Starting pipeline"
        );

        let (excess, skipped) = self.excess_returns(prices, factors)?;
        info!(
            dataset,
            rows = excess.len(),
            skipped = skipped.len(),
            "Computed excess returns"
        );

        let descriptive = describe(&excess);

        let regression = FactorRegression::new(model.clone(), self.config.ols_options())
            .parallel(self.config.parallel);
        let mut fit = regression.fit_all(&excess, factors)?;
        fit.failures = in_column_order(prices, skipped, std::mem::take(&mut fit.failures));
        info!(
            dataset,
            fitted = fit.fits.len(),
            failed = fit.failures.len(),
            "Fitted regressions"
        );

        let abort = self.config.abort_on_series_failure;
        if let Some(failure) = fit.failures.first().filter(|_| abort) {
            return Err(PipelineError::SeriesFailed(failure.clone()));
        }

        let diagnostics = DiagnosticSuite::new()
            .parallel(self.config.parallel)
            .run(&fit);
        info!(
            dataset,
            failed = diagnostics.failures().len(),
            "Ran diagnostics"
        );

        let report = ResultAggregator::new(dataset.to_string(), excess.index().to_vec())
            .descriptive(descriptive)
            .build(&fit, &diagnostics)?;
        Ok(report)
    }

    /// Run several datasets, in parallel when configured. Reports keep the
    /// input order.
    pub fn run_all(&self, inputs: &[DatasetInput]) -> Vec<Result<DatasetReport>> {
        let run = |input: &DatasetInput| self.run(&input.name, &input.prices, &input.factors);
        if self.config.parallel {
            inputs.par_iter().map(run).collect()
        } else {
            inputs.iter().map(run).collect()
        }
    }
}

/// Merge two failure lists into the column order of `prices`.
fn in_column_order(
    prices: &TimeSeriesTable,
    skipped: Vec<SeriesFailure>,
    fitted: Vec<SeriesFailure>,
) -> Vec<SeriesFailure> {
    let names = prices.column_names();
    let mut failures: Vec<SeriesFailure> = skipped.into_iter().chain(fitted).collect();
    failures.sort_by_key(|f| names.iter().position(|n| *n == f.series));
    failures
}
