//! Residual normality tests
//!
//! - Shapiro-Wilk with Royston's (1995) coefficient and p-value
//!   approximations, valid for `3 <= n <= 5000`.
//! - Jarque-Bera from the biased sample skewness and Pearson kurtosis
//!   (normal kurtosis is 3), compared with `χ²(2)`.
//!
//! # References
//! - Royston, P. (1995). "Remark AS R94: A Remark on Algorithm AS 181: The
//!   W-test for Normality." Applied Statistics, 44(4), 547-551.
//! - Jarque, C. M., & Bera, A. K. (1987). "A Test for Normality of
//!   Observations and Regression Residuals." International Statistical
//!   Review, 55(2), 163-172.

use crate::error::{DiagnosticError, Result};
use hobart_regression::RegressionError;
use hobart_regression::distributions::chi2_sf;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::f64::consts::PI;
use tracing::warn;

/// Largest sample for which the Shapiro-Wilk p-value approximation holds.
pub const SHAPIRO_WILK_MAX_N: usize = 5000;

const SMALL_RANGE: f64 = 1e-19;

const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.071190, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.5440, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const G: [f64; 2] = [-2.273, 0.459];

/// Shapiro-Wilk W statistic and p-value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapiroWilk {
    /// W statistic in `(0, 1]`
    pub statistic: f64,
    /// p-value under the normal null
    pub p_value: f64,
}

/// Jarque-Bera statistic with the moments it is built from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JarqueBera {
    /// JB statistic
    pub statistic: f64,
    /// p-value from `χ²(2)`
    pub p_value: f64,
    /// Biased sample skewness
    pub skewness: f64,
    /// Pearson kurtosis (normal = 3)
    pub kurtosis: f64,
}

/// Evaluate `c[0] + c[1] x + c[2] x² + ...`.
fn poly(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

fn standard_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0).map_err(|err| RegressionError::from(err).into())
}

/// Half of the antisymmetric Shapiro-Wilk coefficients, largest first.
fn coefficients(n: usize, normal: &Normal) -> Vec<f64> {
    let half = n / 2;
    if n == 3 {
        return vec![std::f64::consts::FRAC_1_SQRT_2];
    }

    let nf = n as f64;
    let m: Vec<f64> = (1..=half)
        .map(|i| normal.inverse_cdf((i as f64 - 0.375) / (nf + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / nf.sqrt();

    let a1 = poly(&C1, rsn) - m[0] / ssumm2;
    let mut a = vec![0.0; half];
    a[0] = a1;

    let (first_scaled, fac) = if n > 5 {
        let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
        a[1] = a2;
        let fac = ((summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1])
            / (1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2))
            .sqrt();
        (2, fac)
    } else {
        let fac = ((summ2 - 2.0 * m[0] * m[0]) / (1.0 - 2.0 * a1 * a1)).sqrt();
        (1, fac)
    };
    for i in first_scaled..half {
        a[i] = -m[i] / fac;
    }
    a
}

/// Shapiro-Wilk test for normality.
///
/// # Errors
/// `InsufficientData` below three observations, `ZeroVariance` when every
/// value is identical.
pub fn shapiro_wilk(values: &[f64]) -> Result<ShapiroWilk> {
    let n = values.len();
    if n < 3 {
        return Err(DiagnosticError::InsufficientData {
            test: "shapiro_wilk",
            required: 3,
            actual: n,
        });
    }
    if n > SHAPIRO_WILK_MAX_N {
        warn!(n, "Shapiro-Wilk p-value may be inaccurate for n > {SHAPIRO_WILK_MAX_N}");
    }

    let mut x = values.to_vec();
    x.sort_by(f64::total_cmp);
    if x[n - 1] - x[0] < SMALL_RANGE {
        return Err(DiagnosticError::ZeroVariance("shapiro_wilk"));
    }

    let normal = standard_normal()?;
    let half = coefficients(n, &normal);

    // Expand to the full antisymmetric vector aligned with the sorted sample
    let mut a = vec![0.0; n];
    for (i, c) in half.iter().enumerate() {
        a[i] = -c;
        a[n - 1 - i] = *c;
    }

    let nf = n as f64;
    let x_mean = x.iter().sum::<f64>() / nf;
    let a_mean = a.iter().sum::<f64>() / nf;
    let (mut sxa, mut sxx, mut saa) = (0.0, 0.0, 0.0);
    for (xi, ai) in x.iter().zip(a.iter()) {
        let dx = xi - x_mean;
        let da = ai - a_mean;
        sxa += dx * da;
        sxx += dx * dx;
        saa += da * da;
    }
    let w = (sxa * sxa / (sxx * saa)).min(1.0);

    let p_value = if n == 3 {
        (6.0 / PI * (w.sqrt().asin() - (0.75_f64).sqrt().asin())).max(0.0)
    } else if w >= 1.0 {
        1.0
    } else {
        let w1 = (1.0 - w).ln();
        let (z, m, s) = if n <= 11 {
            let gamma = poly(&G, nf);
            if w1 >= gamma {
                return Ok(ShapiroWilk {
                    statistic: w,
                    p_value: 1e-99,
                });
            }
            (-(gamma - w1).ln(), poly(&C3, nf), poly(&C4, nf).exp())
        } else {
            let ln_n = nf.ln();
            (w1, poly(&C5, ln_n), poly(&C6, ln_n).exp())
        };
        normal.sf((z - m) / s)
    };

    Ok(ShapiroWilk {
        statistic: w,
        p_value: p_value.clamp(0.0, 1.0),
    })
}

/// Jarque-Bera test for normality.
///
/// # Errors
/// `InsufficientData` below two observations, `ZeroVariance` for a
/// constant sample.
pub fn jarque_bera(values: &[f64]) -> Result<JarqueBera> {
    let n = values.len();
    if n < 2 {
        return Err(DiagnosticError::InsufficientData {
            test: "jarque_bera",
            required: 2,
            actual: n,
        });
    }

    let nf = n as f64;
    let mean = values.iter().sum::<f64>() / nf;
    let moment = |k: i32| values.iter().map(|v| (v - mean).powi(k)).sum::<f64>() / nf;
    let m2 = moment(2);
    if m2 <= 0.0 {
        return Err(DiagnosticError::ZeroVariance("jarque_bera"));
    }

    let skewness = moment(3) / m2.powf(1.5);
    let kurtosis = moment(4) / (m2 * m2);
    let statistic = nf / 6.0 * (skewness * skewness + (kurtosis - 3.0).powi(2) / 4.0);
    let p_value = chi2_sf(statistic, 2.0)?;

    Ok(JarqueBera {
        statistic,
        p_value,
        skewness,
        kurtosis,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn normal_scores(n: usize) -> Vec<f64> {
        let normal = Normal::new(0.0, 1.0).unwrap();
        (1..=n)
            .map(|i| normal.inverse_cdf((i as f64 - 0.5) / n as f64))
            .collect()
    }

    #[test]
    fn test_poly_ascending_powers() {
        assert_relative_eq!(poly(&[1.0, 2.0, 3.0], 2.0), 17.0);
    }

    #[test]
    fn test_coefficients_are_normalised() {
        let normal = Normal::new(0.0, 1.0).unwrap();
        for n in [4, 5, 6, 20, 101] {
            let half = coefficients(n, &normal);
            let sum_sq: f64 = 2.0 * half.iter().map(|a| a * a).sum::<f64>();
            assert_relative_eq!(sum_sq, 1.0, epsilon = 1e-6);
            assert!(half.windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn test_three_points() {
        // W = 27/28 exactly for [1, 2, 4]
        let sw = shapiro_wilk(&[1.0, 2.0, 4.0]).unwrap();
        assert_relative_eq!(sw.statistic, 27.0 / 28.0, epsilon = 1e-12);
        assert_relative_eq!(sw.p_value, 0.6369, epsilon = 1e-3);

        let sw = shapiro_wilk(&[3.0, 1.0, 2.0]).unwrap();
        assert_relative_eq!(sw.statistic, 1.0, epsilon = 1e-12);
        assert_relative_eq!(sw.p_value, 1.0, epsilon = 1e-9);
    }

    #[rstest]
    #[case(8)]
    #[case(30)]
    #[case(200)]
    fn test_normal_scores_are_not_rejected(#[case] n: usize) {
        let sw = shapiro_wilk(&normal_scores(n)).unwrap();
        assert!(sw.statistic > 0.95);
        assert!(sw.p_value > 0.5);
    }

    #[test]
    fn test_exponential_sample_is_rejected() {
        let n = 50;
        let sample: Vec<f64> = (1..=n)
            .map(|i| -(1.0 - (i as f64 - 0.5) / n as f64).ln())
            .collect();
        let sw = shapiro_wilk(&sample).unwrap();
        assert!(sw.statistic < 0.95);
        assert!(sw.p_value < 0.01);
    }

    #[test]
    fn test_order_does_not_matter() {
        let a = shapiro_wilk(&[0.3, -1.2, 0.8, 2.1, -0.4, 0.0, 1.1]).unwrap();
        let b = shapiro_wilk(&[2.1, 1.1, 0.8, 0.3, 0.0, -0.4, -1.2]).unwrap();
        assert_relative_eq!(a.statistic, b.statistic, epsilon = 1e-14);
        assert_relative_eq!(a.p_value, b.p_value, epsilon = 1e-14);
    }

    #[test]
    fn test_shapiro_wilk_degenerate() {
        assert!(matches!(
            shapiro_wilk(&[1.0, 2.0]),
            Err(DiagnosticError::InsufficientData { required: 3, .. })
        ));
        assert!(matches!(
            shapiro_wilk(&[0.5; 6]),
            Err(DiagnosticError::ZeroVariance(_))
        ));
    }

    #[test]
    fn test_jarque_bera_by_hand() {
        // m2 = 2, m4 = 6.8, K = 1.7, S = 0, JB = 5/6 * 1.69/4
        let jb = jarque_bera(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_relative_eq!(jb.skewness, 0.0, epsilon = 1e-12);
        assert_relative_eq!(jb.kurtosis, 1.7, epsilon = 1e-12);
        assert_relative_eq!(jb.statistic, 0.352083333, epsilon = 1e-8);
        assert_relative_eq!(jb.p_value, (-jb.statistic / 2.0).exp(), epsilon = 1e-9);
    }

    #[test]
    fn test_jarque_bera_skewed_sample() {
        let jb = jarque_bera(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 10.0]).unwrap();
        assert!(jb.skewness > 2.0);
        assert!(jb.kurtosis > 3.0);
        assert!(jb.p_value < 0.05);
    }

    #[test]
    fn test_jarque_bera_constant_sample() {
        assert!(matches!(
            jarque_bera(&[1.0, 1.0, 1.0]),
            Err(DiagnosticError::ZeroVariance(_))
        ));
    }
}
