//! Newey-West HAC (Heteroskedasticity and Autocorrelation Consistent) coefficient covariance
//!
//! Replaces the classical `σ² (X'X)^{-1}` with a sandwich estimator that
//! stays consistent when regression errors are heteroskedastic and serially
//! correlated, as monthly fund returns often are:
//! ```text
//! V_NW = (X'X)^{-1} S (X'X)^{-1}
//! where:
//! - S = Γ_0 + Σ_{l=1}^{L} w_l * (Γ_l + Γ_l^T)
//! - Γ_l = Σ_{t=l+1}^T (x_t e_t)(x_{t-l} e_{t-l})^T
//! - w_l = 1 - l/(L+1) (Bartlett kernel weights)
//! - L = ceil(4*(T/100)^(2/9)) unless given explicitly
//! ```
//!
//! # References
//! - Newey, W. K., & West, K. D. (1987). "A Simple, Positive Semi-Definite,
//!   Heteroskedasticity and Autocorrelation Consistent Covariance Matrix."
//!   Econometrica, 55(3), 703-708.

use ndarray::{Array1, Array2};

/// Lag length from the Newey-West rule of thumb, `ceil(4 (T/100)^(2/9))`.
pub fn optimal_lags(n_periods: usize) -> usize {
    let t = n_periods as f64;
    (4.0 * (t / 100.0).powf(2.0 / 9.0)).ceil() as usize
}

/// Bartlett kernel weight `1 - l/(L+1)`, zero beyond `max_lag`.
pub fn bartlett_weight(lag: usize, max_lag: usize) -> f64 {
    if lag == 0 {
        1.0
    } else if lag <= max_lag {
        1.0 - (lag as f64) / (max_lag as f64 + 1.0)
    } else {
        0.0
    }
}

/// Newey-West covariance of OLS coefficients.
///
/// # Arguments
/// * `x` - Design matrix (T x K)
/// * `residuals` - OLS residuals (T)
/// * `xtx_inv` - `(X'X)^{-1}` (K x K)
/// * `lags` - Maximum lag; `None` selects [`optimal_lags`]
pub fn newey_west_covariance(
    x: &Array2<f64>,
    residuals: &Array1<f64>,
    xtx_inv: &Array2<f64>,
    lags: Option<usize>,
) -> Array2<f64> {
    let (n_periods, n_params) = x.dim();
    let max_lag = lags
        .unwrap_or_else(|| optimal_lags(n_periods))
        .min(n_periods.saturating_sub(1));

    // Score contributions u_t = x_t * e_t
    let mut scores = x.to_owned();
    for (mut row, e) in scores.rows_mut().into_iter().zip(residuals.iter()) {
        row *= *e;
    }

    let mut meat = scores.t().dot(&scores);

    for lag in 1..=max_lag {
        let weight = bartlett_weight(lag, max_lag);
        let mut gamma = Array2::<f64>::zeros((n_params, n_params));

        for t in lag..n_periods {
            for i in 0..n_params {
                for j in 0..n_params {
                    gamma[[i, j]] += scores[[t, i]] * scores[[t - lag, j]];
                }
            }
        }

        // Add w_l * (Γ_l + Γ_l^T)
        for i in 0..n_params {
            for j in 0..n_params {
                meat[[i, j]] += weight * (gamma[[i, j]] + gamma[[j, i]]);
            }
        }
    }

    xtx_inv.dot(&meat).dot(xtx_inv)
}
