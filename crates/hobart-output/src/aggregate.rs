//! Result aggregation
//!
//! Collects everything computed for one dataset into named tables. Scalar
//! tables keep the processing order of the input series; residual and
//! fitted tables share the canonical index of the excess-return table.
//! A series whose regression failed is absent from every table and listed
//! among the regression failures.

use crate::export::{ExportError, ExportFormat, Exporter};
use crate::table::ScalarTable;
use chrono::NaiveDate;
use hobart_data::{DescriptiveStats, SeriesFailure, TimeSeriesTable};
use hobart_diagnostics::{DiagnosticError, ModelDiagnostics, names};
use hobart_regression::{ModelFit, RegressionResult};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Table names in export order.
pub const TABLE_NAMES: [&str; 10] = [
    "regression",
    "residuals",
    "fitted",
    "descriptive",
    names::BREUSCH_PAGAN,
    names::WHITE,
    names::SHAPIRO_WILK,
    names::JARQUE_BERA,
    names::DURBIN_WATSON,
    names::VIF,
];

const HETEROSKEDASTICITY_COLUMNS: [&str; 4] = ["lm_statistic", "lm_pvalue", "f_statistic", "f_pvalue"];

/// Every output table for one dataset and model.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetReport {
    /// Dataset name
    pub dataset: String,
    /// Model name
    pub model: String,
    /// Regression coefficients and fit quality
    pub regression: ScalarTable,
    /// Residuals, one column per fitted series
    pub residuals: TimeSeriesTable,
    /// Fitted values, one column per fitted series
    pub fitted: TimeSeriesTable,
    /// Descriptive statistics of the excess returns
    pub descriptive: ScalarTable,
    /// Breusch-Pagan test
    pub breusch_pagan: ScalarTable,
    /// White test
    pub white: ScalarTable,
    /// Shapiro-Wilk test
    pub shapiro_wilk: ScalarTable,
    /// Jarque-Bera test
    pub jarque_bera: ScalarTable,
    /// Durbin-Watson statistic
    pub durbin_watson: ScalarTable,
    /// Variance inflation factors, one row per regressor
    pub vif: ScalarTable,
}

impl DatasetReport {
    /// Scalar tables in export order.
    pub fn scalar_tables(&self) -> [&ScalarTable; 8] {
        [
            &self.regression,
            &self.descriptive,
            &self.breusch_pagan,
            &self.white,
            &self.shapiro_wilk,
            &self.jarque_bera,
            &self.durbin_watson,
            &self.vif,
        ]
    }

    /// Scalar table by name.
    pub fn table(&self, name: &str) -> Option<&ScalarTable> {
        self.scalar_tables().into_iter().find(|t| t.name == name)
    }

    /// All recorded failures, table by table.
    pub fn failures(&self) -> Vec<SeriesFailure> {
        self.scalar_tables()
            .iter()
            .flat_map(|t| t.failures.iter().cloned())
            .collect()
    }

    /// File stem `<dataset>_<model>_<table>`.
    pub fn file_stem(&self, table: &str) -> String {
        format!("{}_{}_{}", self.dataset, self.model, table)
    }

    /// Write every table to `dir`, plus a failures sidecar when any series
    /// failed. Returns the written paths.
    pub fn export(&self, dir: &Path, format: ExportFormat) -> Result<Vec<PathBuf>, ExportError> {
        std::fs::create_dir_all(dir)?;
        let ext = format.extension();
        let path = |table: &str| dir.join(format!("{}.{ext}", self.file_stem(table)));

        let mut written = Vec::with_capacity(TABLE_NAMES.len() + 1);
        for name in TABLE_NAMES {
            let target = path(name);
            match name {
                "residuals" => self.residuals.export_to_file(&target, format)?,
                "fitted" => self.fitted.export_to_file(&target, format)?,
                _ => match self.table(name) {
                    Some(table) => table.export_to_file(&target, format)?,
                    None => continue,
                },
            }
            debug!(path = %target.display(), "Wrote table");
            written.push(target);
        }

        let failures = self.failures();
        if !failures.is_empty() {
            let target = path("failures");
            failures.export_to_file(&target, format)?;
            written.push(target);
        }

        info!(
            dataset = %self.dataset,
            model = %self.model,
            files = written.len(),
            "Exported report"
        );
        Ok(written)
    }
}

/// Builder that assembles a [`DatasetReport`].
#[derive(Debug)]
pub struct ResultAggregator {
    dataset: String,
    index: Vec<NaiveDate>,
    descriptive: Vec<DescriptiveStats>,
}

impl ResultAggregator {
    /// Aggregate onto the canonical time index of `dataset`.
    pub const fn new(dataset: String, index: Vec<NaiveDate>) -> Self {
        Self {
            dataset,
            index,
            descriptive: Vec::new(),
        }
    }

    /// Set the descriptive statistics, one entry per series.
    pub fn descriptive(mut self, stats: Vec<DescriptiveStats>) -> Self {
        self.descriptive = stats;
        self
    }

    /// Build the report for a model fit and its diagnostics.
    ///
    /// # Errors
    /// `Data` if the residual or fitted index cannot be conformed to the
    /// canonical index.
    pub fn build(self, fit: &ModelFit, diagnostics: &ModelDiagnostics) -> Result<DatasetReport, ExportError> {
        let model = fit.model.name().to_string();

        let mut regression = regression_table(fit.results())?;
        for failure in &fit.failures {
            regression.push_failure(failure.clone());
        }

        let mut descriptive = ScalarTable::new("descriptive", DescriptiveStats::FIELDS);
        for stats in &self.descriptive {
            descriptive.push_row(&stats.series, stats.values())?;
        }

        let mut breusch_pagan = ScalarTable::new(names::BREUSCH_PAGAN, HETEROSKEDASTICITY_COLUMNS);
        let mut white = ScalarTable::new(names::WHITE, HETEROSKEDASTICITY_COLUMNS);
        let mut shapiro_wilk = ScalarTable::new(names::SHAPIRO_WILK, ["statistic", "p_value"]);
        let mut jarque_bera =
            ScalarTable::new(names::JARQUE_BERA, ["statistic", "p_value", "skewness", "kurtosis"]);
        let mut durbin_watson = ScalarTable::new(names::DURBIN_WATSON, ["statistic"]);

        for series in &diagnostics.series {
            let name = series.series.as_str();
            record(&mut breusch_pagan, name, &series.breusch_pagan, |t| {
                vec![Some(t.lm_statistic), Some(t.lm_pvalue), Some(t.f_statistic), Some(t.f_pvalue)]
            })?;
            record(&mut white, name, &series.white, |t| {
                vec![Some(t.lm_statistic), Some(t.lm_pvalue), Some(t.f_statistic), Some(t.f_pvalue)]
            })?;
            record(&mut shapiro_wilk, name, &series.shapiro_wilk, |t| {
                vec![Some(t.statistic), Some(t.p_value)]
            })?;
            record(&mut jarque_bera, name, &series.jarque_bera, |t| {
                vec![Some(t.statistic), Some(t.p_value), Some(t.skewness), Some(t.kurtosis)]
            })?;
            record(&mut durbin_watson, name, &series.durbin_watson, |dw| vec![Some(*dw)])?;
        }

        let mut vif = ScalarTable::new(names::VIF, ["vif"]);
        match &diagnostics.vif {
            Ok(values) => {
                for v in values {
                    vif.push_row(&v.regressor, vec![Some(v.vif)])?;
                }
            }
            Err(err) => vif.push_failure(SeriesFailure::new(
                "panel",
                names::VIF,
                err.kind(),
                err.to_string(),
            )),
        }

        Ok(DatasetReport {
            dataset: self.dataset,
            model,
            regression,
            residuals: fit.residuals.reindex(&self.index)?,
            fitted: fit.fitted.reindex(&self.index)?,
            descriptive,
            breusch_pagan,
            white,
            shapiro_wilk,
            jarque_bera,
            durbin_watson,
            vif,
        })
    }
}

fn record<T>(
    table: &mut ScalarTable,
    series: &str,
    outcome: &Result<T, DiagnosticError>,
    values: impl Fn(&T) -> Vec<Option<f64>>,
) -> Result<(), ExportError> {
    match outcome {
        Ok(result) => table.push_row(series, values(result)),
        Err(err) => {
            let stage = table.name.clone();
            table.push_failure(SeriesFailure::new(series, stage, err.kind(), err.to_string()));
            Ok(())
        }
    }
}

/// Columns of the regression table for a model's coefficient names.
pub fn regression_columns(coefficients: &[&str], multi_factor: bool) -> Vec<String> {
    let mut columns: Vec<String> = coefficients
        .iter()
        .flat_map(|name| {
            ["", "_std_error", "_t_value", "_p_value", "_ci_lower", "_ci_upper"]
                .map(|suffix| format!("{name}{suffix}"))
        })
        .collect();
    columns.extend(["r_squared", "adj_r_squared"].map(String::from));
    if multi_factor {
        columns.push("f_pvalue".to_string());
    }
    columns.push("nobs".to_string());
    columns
}

fn regression_table<'a>(
    results: impl Iterator<Item = &'a RegressionResult>,
) -> Result<ScalarTable, ExportError> {
    let results: Vec<&RegressionResult> = results.collect();
    let Some(first) = results.first() else {
        return Ok(ScalarTable::new("regression", Vec::<String>::new()));
    };

    let names: Vec<&str> = first.coefficients().map(|c| c.name.as_str()).collect();
    let multi_factor = first.factors.len() > 1;
    let mut table = ScalarTable::new("regression", regression_columns(&names, multi_factor));

    for result in results {
        let mut values: Vec<Option<f64>> = result
            .coefficients()
            .flat_map(|c| {
                [c.estimate, c.std_error, c.t_value, c.p_value, c.ci_lower, c.ci_upper].map(Some)
            })
            .collect();
        values.push(Some(result.r_squared));
        values.push(Some(result.adj_r_squared));
        if multi_factor {
            values.push(result.f_pvalue);
        }
        values.push(Some(result.nobs as f64));
        table.push_row(&result.series, values)?;
    }
    Ok(table)
}
