//! Sampling-distribution helpers shared by the regression and diagnostic tests.

use crate::error::RegressionError;
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, StudentsT};

/// Two-sided p-value of a t statistic with `df` degrees of freedom.
pub fn t_two_sided_pvalue(t: f64, df: f64) -> Result<f64, RegressionError> {
    if t.is_nan() {
        return Ok(1.0);
    }
    if t.is_infinite() {
        return Ok(0.0);
    }
    let dist = StudentsT::new(0.0, 1.0, df)?;
    Ok((2.0 * dist.sf(t.abs())).clamp(0.0, 1.0))
}

/// Critical value `t_{1 - alpha/2}` for a two-sided interval.
pub fn t_critical(alpha: f64, df: f64) -> Result<f64, RegressionError> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(RegressionError::InvalidParameter(format!(
            "alpha must be in (0, 1), got {alpha}"
        )));
    }
    let dist = StudentsT::new(0.0, 1.0, df)?;
    Ok(dist.inverse_cdf(1.0 - alpha / 2.0))
}

/// Upper-tail probability of an F statistic.
pub fn f_sf(f: f64, df_num: f64, df_den: f64) -> Result<f64, RegressionError> {
    if f.is_infinite() && f > 0.0 {
        return Ok(0.0);
    }
    if f.is_nan() || f <= 0.0 {
        return Ok(1.0);
    }
    let dist = FisherSnedecor::new(df_num, df_den)?;
    Ok(dist.sf(f).clamp(0.0, 1.0))
}

/// Upper-tail probability of a chi-squared statistic.
pub fn chi2_sf(x: f64, df: f64) -> Result<f64, RegressionError> {
    if x.is_infinite() && x > 0.0 {
        return Ok(0.0);
    }
    if x.is_nan() || x <= 0.0 {
        return Ok(1.0);
    }
    let dist = ChiSquared::new(df)?;
    Ok(dist.sf(x).clamp(0.0, 1.0))
}
