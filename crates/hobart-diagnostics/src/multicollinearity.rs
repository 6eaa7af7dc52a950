//! Variance inflation factors
//!
//! For each column `j` of the design `[1, x_1, ..., x_k]`, regress column
//! `j` on the remaining columns and report `VIF_j = 1 / (1 - R²_j)`.
//!
//! The intercept's auxiliary regression has no constant, so its R² is
//! uncentered; every factor's auxiliary regression includes the intercept
//! and uses the centered R².
//!
//! Exact collinearity gives an infinite VIF instead of an error. Auxiliary
//! regressors that depend on earlier ones are dropped, which leaves their
//! span unchanged, and a fit with no residual variation counts as `R² = 1`.

use crate::error::{DiagnosticError, Result};
use hobart_data::TimeSeriesTable;
use hobart_regression::{
    DEFAULT_RANK_TOLERANCE, INTERCEPT, OlsOptions, RegressionError, add_intercept, ols,
};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Variance inflation factor of one design column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vif {
    /// `intercept` or a regressor name
    pub regressor: String,
    /// Variance inflation factor; `f64::INFINITY` when the column lies in the
    /// span of the others
    pub vif: f64,
}

/// R² of `target` on the span of `rest`.
fn auxiliary_r_squared(
    target: &Array1<f64>,
    mut rest: Array2<f64>,
    options: &OlsOptions,
) -> Result<f64> {
    loop {
        if rest.ncols() == 0 {
            return Ok(0.0);
        }
        match ols(target, &rest, options) {
            Ok(aux) if aux.ssr <= DEFAULT_RANK_TOLERANCE.powi(2) * aux.tss => return Ok(1.0),
            Ok(aux) => return Ok(aux.r_squared),
            Err(RegressionError::SingularDesign { column, .. }) => {
                let keep: Vec<usize> = (0..rest.ncols()).filter(|&c| c != column).collect();
                rest = rest.select(Axis(1), &keep);
            }
            // Constant target alongside the intercept
            Err(RegressionError::ZeroVariance) => return Ok(1.0),
            Err(err) => return Err(err.into()),
        }
    }
}

/// VIF for the intercept and every column of `regressors` (T x K).
pub fn variance_inflation_factors(regressors: &Array2<f64>, names: &[String]) -> Result<Vec<Vif>> {
    let (n, k) = regressors.dim();
    if names.len() != k {
        return Err(DiagnosticError::IndexAlignment(format!(
            "{} regressor names for {k} columns",
            names.len()
        )));
    }
    if k == 0 {
        return Ok(Vec::new());
    }
    // Each auxiliary regression has k columns
    if n <= k {
        return Err(DiagnosticError::InsufficientData {
            test: "vif",
            required: k + 1,
            actual: n,
        });
    }

    let design = add_intercept(regressors);
    let options = OlsOptions::default();
    let labels = std::iter::once(INTERCEPT.to_string()).chain(names.iter().cloned());

    labels
        .enumerate()
        .map(|(j, regressor)| {
            let target: Array1<f64> = design.column(j).to_owned();
            let others: Vec<usize> = (0..=k).filter(|&c| c != j).collect();
            let rest = design.select(Axis(1), &others);
            let r_squared = auxiliary_r_squared(&target, rest, &options)?;
            let vif = if r_squared >= 1.0 {
                f64::INFINITY
            } else {
                1.0 / (1.0 - r_squared)
            };
            Ok(Vif { regressor, vif })
        })
        .collect()
}

/// VIF over the rows of `panel` where every regressor is present.
pub fn panel_vif(panel: &TimeSeriesTable) -> Result<Vec<Vif>> {
    let rows = panel.complete_rows();
    let k = panel.width();
    let mut matrix = Array2::<f64>::zeros((rows.len(), k));
    for (c, column) in panel.columns().iter().enumerate() {
        for (t, &row) in rows.iter().enumerate() {
            matrix[[t, c]] = column.values[row].unwrap_or_default();
        }
    }
    let names: Vec<String> = panel.column_names().into_iter().map(str::to_string).collect();
    variance_inflation_factors(&matrix, &names)
}
