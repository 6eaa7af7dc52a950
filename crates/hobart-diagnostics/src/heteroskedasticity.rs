//! Heteroskedasticity tests
//!
//! Both tests regress the squared residuals on an auxiliary design and
//! report the LM statistic `n R²` against `χ²(df)` together with the
//! auxiliary regression's overall F-test.
//!
//! - Breusch-Pagan (Koenker's studentized form): design is the intercept and
//!   the original regressors.
//! - White: design is the intercept, the regressors, their squares and all
//!   pairwise cross-products.

use crate::error::{DiagnosticError, Result};
use hobart_regression::distributions::chi2_sf;
use hobart_regression::{OlsOptions, add_intercept, ols};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// LM and F forms of a heteroskedasticity test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeteroskedasticityTest {
    /// Lagrange multiplier statistic `n R²`
    pub lm_statistic: f64,
    /// p-value of the LM statistic
    pub lm_pvalue: f64,
    /// F statistic of the auxiliary regression
    pub f_statistic: f64,
    /// p-value of the F statistic
    pub f_pvalue: f64,
}

fn auxiliary_test(
    test: &'static str,
    residuals: &[f64],
    design: &Array2<f64>,
) -> Result<HeteroskedasticityTest> {
    if residuals.len() != design.nrows() {
        return Err(DiagnosticError::IndexAlignment(format!(
            "{test}: {} residuals for {} regressor rows",
            residuals.len(),
            design.nrows()
        )));
    }
    if residuals.len() <= design.ncols() {
        return Err(DiagnosticError::InsufficientData {
            test,
            required: design.ncols() + 1,
            actual: residuals.len(),
        });
    }

    let squared: Array1<f64> = residuals.iter().map(|e| e * e).collect();
    let aux = ols(&squared, design, &OlsOptions::default())?;

    let lm_statistic = aux.nobs as f64 * aux.r_squared;
    let lm_pvalue = chi2_sf(lm_statistic, aux.df_model as f64)?;
    let (Some(f_statistic), Some(f_pvalue)) = (aux.f_statistic, aux.f_pvalue) else {
        return Err(DiagnosticError::InsufficientData {
            test,
            required: 1,
            actual: 0,
        });
    };

    Ok(HeteroskedasticityTest {
        lm_statistic,
        lm_pvalue,
        f_statistic,
        f_pvalue,
    })
}

/// Breusch-Pagan test of `residuals` against `regressors` (T x K, without an
/// intercept column).
pub fn breusch_pagan(residuals: &[f64], regressors: &Array2<f64>) -> Result<HeteroskedasticityTest> {
    auxiliary_test("breusch_pagan", residuals, &add_intercept(regressors))
}

/// White's auxiliary design: `[1, x_1..x_k, x_i x_j for i <= j]`.
pub fn white_design(regressors: &Array2<f64>) -> Array2<f64> {
    let (n, k) = regressors.dim();
    let n_cols = 1 + k + k * (k + 1) / 2;
    let mut design = Array2::<f64>::ones((n, n_cols));

    let mut col = 1;
    for i in 0..k {
        design.column_mut(col).assign(&regressors.column(i));
        col += 1;
    }
    for i in 0..k {
        for j in i..k {
            let product = &regressors.column(i) * &regressors.column(j);
            design.column_mut(col).assign(&product);
            col += 1;
        }
    }
    design
}

/// White test of `residuals` against `regressors` (T x K, without an
/// intercept column).
pub fn white(residuals: &[f64], regressors: &Array2<f64>) -> Result<HeteroskedasticityTest> {
    auxiliary_test("white", residuals, &white_design(regressors))
}
