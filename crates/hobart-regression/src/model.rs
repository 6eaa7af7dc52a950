//! Factor model regressions
//!
//! Fits one OLS model per series against a shared regressor panel. Rows
//! where the series or any factor is missing are dropped for that series
//! only; residuals and fitted values are expanded back onto the series index
//! so every output column has the same shape.

use crate::error::RegressionError;
use crate::ols::{OlsFit, OlsOptions, add_intercept, ols};
use hobart_data::{SeriesFailure, TimeSeriesTable};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Name of the intercept coefficient.
pub const INTERCEPT: &str = "intercept";

/// Stage label recorded on regression failures.
pub const REGRESSION_STAGE: &str = "regression";

/// A linear factor model, identified by its regressor column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FactorModel {
    /// Single-factor CAPM on the market excess return
    Capm {
        /// Market excess return column
        market: String,
    },
    /// Fama-French three-factor model
    FamaFrench {
        /// Market excess return column
        market: String,
        /// Size factor column
        size: String,
        /// Value factor column
        value: String,
    },
}

impl FactorModel {
    /// CAPM on the conventional `Mkt-RF` column.
    pub fn capm() -> Self {
        Self::Capm {
            market: "Mkt-RF".to_string(),
        }
    }

    /// Fama-French on the conventional `Mkt-RF`, `SMB` and `HML` columns.
    pub fn fama_french() -> Self {
        Self::FamaFrench {
            market: "Mkt-RF".to_string(),
            size: "SMB".to_string(),
            value: "HML".to_string(),
        }
    }

    /// Short model name used in reports and file names.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Capm { .. } => "capm",
            Self::FamaFrench { .. } => "fama_french",
        }
    }

    /// Regressor column names in design order.
    pub fn factors(&self) -> Vec<&str> {
        match self {
            Self::Capm { market } => vec![market.as_str()],
            Self::FamaFrench {
                market,
                size,
                value,
            } => vec![market.as_str(), size.as_str(), value.as_str()],
        }
    }
}

impl Default for FactorModel {
    fn default() -> Self {
        Self::capm()
    }
}

/// Estimate and inference for one named coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    /// `intercept` or the regressor column name
    pub name: String,
    /// Point estimate
    pub estimate: f64,
    /// Standard error
    pub std_error: f64,
    /// t statistic
    pub t_value: f64,
    /// Two-sided p-value
    pub p_value: f64,
    /// Lower confidence bound
    pub ci_lower: f64,
    /// Upper confidence bound
    pub ci_upper: f64,
}

/// Regression record for one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    /// Series name
    pub series: String,
    /// Model name
    pub model: String,
    /// Intercept (alpha)
    pub intercept: Coefficient,
    /// Factor loadings in model order
    pub factors: Vec<Coefficient>,
    /// Coefficient of determination
    pub r_squared: f64,
    /// Adjusted R²
    pub adj_r_squared: f64,
    /// Overall F-test p-value, reported for multi-factor models only
    pub f_pvalue: Option<f64>,
    /// Observations used in the fit
    pub nobs: usize,
}

impl RegressionResult {
    /// Look up a coefficient by name.
    pub fn coefficient(&self, name: &str) -> Option<&Coefficient> {
        if name == INTERCEPT {
            return Some(&self.intercept);
        }
        self.factors.iter().find(|c| c.name == name)
    }

    /// All coefficients, intercept first.
    pub fn coefficients(&self) -> impl Iterator<Item = &Coefficient> {
        std::iter::once(&self.intercept).chain(self.factors.iter())
    }
}

/// A successful fit with its per-observation outputs on the series index.
#[derive(Debug, Clone)]
pub struct SeriesFit {
    /// Scalar regression record
    pub result: RegressionResult,
    /// Residuals; `None` on rows excluded from the fit
    pub residuals: Vec<Option<f64>>,
    /// Fitted values; `None` on rows excluded from the fit
    pub fitted: Vec<Option<f64>>,
}

impl SeriesFit {
    /// Row positions used in estimation.
    pub fn estimation_rows(&self) -> Vec<usize> {
        self.residuals
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.map(|_| i))
            .collect()
    }
}

/// Fits for every series of a table, in input column order.
#[derive(Debug, Clone)]
pub struct ModelFit {
    /// Model that was fitted
    pub model: FactorModel,
    /// Successful fits
    pub fits: Vec<SeriesFit>,
    /// Series that could not be fitted
    pub failures: Vec<SeriesFailure>,
    /// Residuals, one column per fitted series
    pub residuals: TimeSeriesTable,
    /// Fitted values, one column per fitted series
    pub fitted: TimeSeriesTable,
    /// Regressor panel conformed to the series index
    pub regressors: TimeSeriesTable,
}

impl ModelFit {
    /// Regression records in input order.
    pub fn results(&self) -> impl Iterator<Item = &RegressionResult> {
        self.fits.iter().map(|f| &f.result)
    }

    /// Fit for a named series.
    pub fn fit(&self, series: &str) -> Option<&SeriesFit> {
        self.fits.iter().find(|f| f.result.series == series)
    }
}

/// Per-series factor regression driver.
#[derive(Debug, Clone, Default)]
pub struct FactorRegression {
    model: FactorModel,
    options: OlsOptions,
    parallel: bool,
}

impl FactorRegression {
    /// Create a driver for `model` with the given OLS options.
    pub const fn new(model: FactorModel, options: OlsOptions) -> Self {
        Self {
            model,
            options,
            parallel: false,
        }
    }

    /// Fit series on the rayon pool.
    pub const fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The model being fitted.
    pub const fn model(&self) -> &FactorModel {
        &self.model
    }

    /// Fit one series against a panel that already shares its index.
    ///
    /// # Errors
    /// `InsufficientData` when no more complete rows remain than parameters,
    /// plus any error from [`ols`].
    pub fn fit_series(
        &self,
        name: &str,
        values: &[Option<f64>],
        panel: &TimeSeriesTable,
    ) -> Result<SeriesFit, RegressionError> {
        if values.len() != panel.len() {
            return Err(RegressionError::DimensionMismatch {
                expected: panel.len(),
                actual: values.len(),
            });
        }

        let factors = self.model.factors();
        let columns = factors
            .iter()
            .map(|f| panel.column(f))
            .collect::<Result<Vec<_>, _>>()?;

        let rows: Vec<usize> = (0..values.len())
            .filter(|&i| values[i].is_some() && columns.iter().all(|c| c[i].is_some()))
            .collect();

        let n_params = factors.len() + 1;
        if rows.len() <= n_params {
            return Err(RegressionError::InsufficientData {
                required: n_params + 1,
                actual: rows.len(),
            });
        }

        let y: Array1<f64> = rows.iter().filter_map(|&i| values[i]).collect();
        let regressors = Array2::from_shape_fn((rows.len(), factors.len()), |(r, c)| {
            columns[c][rows[r]].unwrap_or_default()
        });
        let fit = ols(&y, &add_intercept(&regressors), &self.options)?;

        debug!(
            series = name,
            nobs = fit.nobs,
            r_squared = fit.r_squared,
            "Fitted {}",
            self.model.name()
        );

        let mut residuals = vec![None; values.len()];
        let mut fitted = vec![None; values.len()];
        for (pos, &row) in rows.iter().enumerate() {
            residuals[row] = Some(fit.residuals[pos]);
            fitted[row] = Some(fit.fitted[pos]);
        }

        Ok(SeriesFit {
            result: self.to_result(name, &factors, &fit),
            residuals,
            fitted,
        })
    }

    fn to_result(&self, name: &str, factors: &[&str], fit: &OlsFit) -> RegressionResult {
        let coefficient = |i: usize, label: &str| Coefficient {
            name: label.to_string(),
            estimate: fit.coefficients[i],
            std_error: fit.std_errors[i],
            t_value: fit.t_values[i],
            p_value: fit.p_values[i],
            ci_lower: fit.conf_int[i].0,
            ci_upper: fit.conf_int[i].1,
        };

        RegressionResult {
            series: name.to_string(),
            model: self.model.name().to_string(),
            intercept: coefficient(0, INTERCEPT),
            factors: factors
                .iter()
                .enumerate()
                .map(|(i, f)| coefficient(i + 1, *f))
                .collect(),
            r_squared: fit.r_squared,
            adj_r_squared: fit.adj_r_squared,
            f_pvalue: if factors.len() > 1 { fit.f_pvalue } else { None },
            nobs: fit.nobs,
        }
    }

    /// Fit every column of `series` against the model's factors.
    ///
    /// The regressor panel is conformed to the series index first. A series
    /// that fails is recorded in [`ModelFit::failures`] and left out of the
    /// residual and fitted tables; the remaining series are unaffected.
    ///
    /// # Errors
    /// Fails as a whole only when a factor column is missing from
    /// `regressors` or its index has duplicate timestamps.
    pub fn fit_all(
        &self,
        series: &TimeSeriesTable,
        regressors: &TimeSeriesTable,
    ) -> Result<ModelFit, RegressionError> {
        let panel = regressors
            .select(&self.model.factors())?
            .reindex(series.index())?;

        let fit_column = |column: &hobart_data::Column| {
            self.fit_series(&column.name, &column.values, &panel)
                .map_err(|err| {
                    warn!(series = %column.name, error = %err, "Regression failed");
                    SeriesFailure::new(&column.name, REGRESSION_STAGE, err.kind(), err.to_string())
                })
        };

        let outcomes: Vec<Result<SeriesFit, SeriesFailure>> = if self.parallel {
            series.columns().par_iter().map(fit_column).collect()
        } else {
            series.columns().iter().map(fit_column).collect()
        };

        let mut fits = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        let mut residuals = TimeSeriesTable::new(series.index().to_vec());
        let mut fitted = TimeSeriesTable::new(series.index().to_vec());

        for outcome in outcomes {
            match outcome {
                Ok(fit) => {
                    residuals.push_column(&fit.result.series, fit.residuals.clone())?;
                    fitted.push_column(&fit.result.series, fit.fitted.clone())?;
                    fits.push(fit);
                }
                Err(failure) => failures.push(failure),
            }
        }

        Ok(ModelFit {
            model: self.model.clone(),
            fits,
            failures,
            residuals,
            fitted,
            regressors: panel,
        })
    }
}

fn check_factor_count(regressors: &TimeSeriesTable, expected: usize) -> Result<Vec<String>, RegressionError> {
    if regressors.width() != expected {
        return Err(RegressionError::FactorCount {
            expected,
            actual: regressors.width(),
        });
    }
    Ok(regressors.column_names().into_iter().map(str::to_string).collect())
}

/// CAPM for every series against a single-column regressor table.
///
/// The regressor column's name becomes the market factor name.
pub fn fit_capm(
    series: &TimeSeriesTable,
    regressor: &TimeSeriesTable,
) -> Result<ModelFit, RegressionError> {
    let mut names = check_factor_count(regressor, 1)?;
    let model = FactorModel::Capm {
        market: names.remove(0),
    };
    FactorRegression::new(model, OlsOptions::default()).fit_all(series, regressor)
}

/// Fama-French three-factor fit against a panel of market, size and value
/// columns, in that order.
pub fn fit_fama_french(
    series: &TimeSeriesTable,
    panel: &TimeSeriesTable,
) -> Result<ModelFit, RegressionError> {
    let names = check_factor_count(panel, 3)?;
    let model = FactorModel::FamaFrench {
        market: names[0].clone(),
        size: names[1].clone(),
        value: names[2].clone(),
    };
    FactorRegression::new(model, OlsOptions::default()).fit_all(series, panel)
}
