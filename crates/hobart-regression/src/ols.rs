//! Ordinary least squares
//!
//! Fits `y = X b + e` through a Householder QR decomposition of the design
//! and reports the usual inference: standard errors, t-tests, confidence
//! intervals, R² and the overall F-test.
//!
//! A design is treated as containing a constant when some column holds the
//! same non-zero value in every row. With a constant, R² is centered and the
//! model has `k - 1` degrees of freedom; without one, R² is uncentered and
//! the model has `k`.

use crate::distributions::{f_sf, t_critical, t_two_sided_pvalue};
use crate::error::RegressionError;
use crate::hac::newey_west_covariance;
use crate::linalg::{DEFAULT_RANK_TOLERANCE, QrDecomposition};
use ndarray::{Array1, Array2, s};
use serde::{Deserialize, Serialize};

/// Estimator for the coefficient covariance matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CovarianceType {
    /// `σ² (X'X)^{-1}` under homoskedastic, uncorrelated errors
    #[default]
    Classical,
    /// Newey-West HAC sandwich; `lags: None` selects the rule-of-thumb lag
    NeweyWest {
        /// Maximum lag of the Bartlett kernel
        lags: Option<usize>,
    },
}

/// Options for an OLS fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OlsOptions {
    /// Significance level for confidence intervals (default: 0.05)
    pub alpha: f64,

    /// Coefficient covariance estimator (default: classical)
    pub covariance: CovarianceType,

    /// Relative tolerance for rank detection (default: 1e-10)
    pub rank_tolerance: f64,
}

impl Default for OlsOptions {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            covariance: CovarianceType::Classical,
            rank_tolerance: DEFAULT_RANK_TOLERANCE,
        }
    }
}

/// Result of an OLS fit.
#[derive(Debug, Clone)]
pub struct OlsFit {
    /// Coefficient estimates (K)
    pub coefficients: Array1<f64>,
    /// Standard errors (K)
    pub std_errors: Array1<f64>,
    /// t statistics (K)
    pub t_values: Array1<f64>,
    /// Two-sided p-values (K)
    pub p_values: Array1<f64>,
    /// Confidence interval bounds per coefficient
    pub conf_int: Vec<(f64, f64)>,
    /// Fitted values (T)
    pub fitted: Array1<f64>,
    /// Residuals (T)
    pub residuals: Array1<f64>,
    /// Sum of squared residuals
    pub ssr: f64,
    /// Total sum of squares (centered when the design has a constant)
    pub tss: f64,
    /// Coefficient of determination
    pub r_squared: f64,
    /// R² adjusted for degrees of freedom
    pub adj_r_squared: f64,
    /// Overall F statistic (absent when the model has no slope terms)
    pub f_statistic: Option<f64>,
    /// p-value of the overall F statistic
    pub f_pvalue: Option<f64>,
    /// Number of observations
    pub nobs: usize,
    /// Model degrees of freedom
    pub df_model: usize,
    /// Residual degrees of freedom
    pub df_resid: usize,
    /// Whether a constant column was detected
    pub has_constant: bool,
}

/// Whether the design has a column holding one non-zero value in every row.
pub fn has_constant_column(x: &Array2<f64>) -> bool {
    x.columns().into_iter().any(|col| match col.first() {
        Some(&first) => first != 0.0 && col.iter().all(|v| *v == first),
        None => false,
    })
}

/// Fit `y` on the full design `x` (no column is added).
///
/// # Errors
/// * `DimensionMismatch` if `y` and `x` disagree on the number of rows
/// * `InsufficientData` unless there are more observations than columns
/// * `SingularDesign` if `x` is rank deficient
/// * `ZeroVariance` if `y` has no variation to explain
pub fn ols(y: &Array1<f64>, x: &Array2<f64>, options: &OlsOptions) -> Result<OlsFit, RegressionError> {
    let (n, k) = x.dim();
    if y.len() != n {
        return Err(RegressionError::DimensionMismatch {
            expected: n,
            actual: y.len(),
        });
    }
    if k == 0 {
        return Err(RegressionError::EmptyDesign);
    }
    if n <= k {
        return Err(RegressionError::InsufficientData {
            required: k + 1,
            actual: n,
        });
    }

    let qr = QrDecomposition::new(x, options.rank_tolerance)?;
    let coefficients = qr.solve(y)?;
    let fitted = x.dot(&coefficients);
    let residuals = y - &fitted;

    let has_constant = has_constant_column(x);
    let df_model = if has_constant { k - 1 } else { k };
    let df_resid = n - k;

    let ssr = residuals.dot(&residuals);
    let tss = if has_constant {
        let mean = y.sum() / n as f64;
        y.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
    } else {
        y.dot(y)
    };
    if tss <= 0.0 {
        return Err(RegressionError::ZeroVariance);
    }

    let r_squared = 1.0 - ssr / tss;
    let n_const = usize::from(has_constant) as f64;
    let adj_r_squared = 1.0 - (n as f64 - n_const) / df_resid as f64 * (1.0 - r_squared);

    let scale = ssr / df_resid as f64;
    let xtx_inv = qr.xtx_inverse();
    let cov = match options.covariance {
        CovarianceType::Classical => &xtx_inv * scale,
        CovarianceType::NeweyWest { lags } => newey_west_covariance(x, &residuals, &xtx_inv, lags),
    };

    let std_errors: Array1<f64> = cov.diag().mapv(|v| v.max(0.0).sqrt());
    let t_values = &coefficients / &std_errors;

    let df = df_resid as f64;
    let p_values = t_values
        .iter()
        .map(|t| t_two_sided_pvalue(*t, df))
        .collect::<Result<Vec<_>, _>>()?;
    let critical = t_critical(options.alpha, df)?;
    let conf_int = coefficients
        .iter()
        .zip(std_errors.iter())
        .map(|(b, se)| (b - critical * se, b + critical * se))
        .collect();

    let (f_statistic, f_pvalue) = if df_model == 0 {
        (None, None)
    } else {
        let ess = tss - ssr;
        let f = if ssr > 0.0 {
            (ess / df_model as f64) / scale
        } else {
            f64::INFINITY
        };
        (Some(f), Some(f_sf(f, df_model as f64, df)?))
    };

    Ok(OlsFit {
        coefficients,
        std_errors,
        t_values,
        p_values: Array1::from_vec(p_values),
        conf_int,
        fitted,
        residuals,
        ssr,
        tss,
        r_squared,
        adj_r_squared,
        f_statistic,
        f_pvalue,
        nobs: n,
        df_model,
        df_resid,
        has_constant,
    })
}

/// Prepend an intercept column of ones to a regressor matrix.
pub fn add_intercept(regressors: &Array2<f64>) -> Array2<f64> {
    let (n, k) = regressors.dim();
    let mut design = Array2::<f64>::ones((n, k + 1));
    design.slice_mut(s![.., 1..]).assign(regressors);
    design
}
