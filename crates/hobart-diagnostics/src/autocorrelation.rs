//! Durbin-Watson statistic
//!
//! `DW = Σ_{t=2}^T (e_t - e_{t-1})² / Σ_{t=1}^T e_t²`
//!
//! Ranges over `[0, 4]`: close to 2 for serially uncorrelated residuals,
//! towards 0 under positive and towards 4 under negative autocorrelation.
//! No p-value is reported.

use crate::error::{DiagnosticError, Result};

/// Durbin-Watson statistic of residuals in time order.
pub fn durbin_watson(residuals: &[f64]) -> Result<f64> {
    if residuals.len() < 2 {
        return Err(DiagnosticError::InsufficientData {
            test: "durbin_watson",
            required: 2,
            actual: residuals.len(),
        });
    }

    let ssr: f64 = residuals.iter().map(|e| e * e).sum();
    if ssr == 0.0 {
        return Err(DiagnosticError::ZeroVariance("durbin_watson"));
    }

    let diff: f64 = residuals.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
    Ok(diff / ssr)
}
