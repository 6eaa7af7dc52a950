//! Integration tests for per-series factor regressions.

use approx::assert_relative_eq;
use chrono::{NaiveDate, TimeDelta};
use hobart_data::{FailureKind, TimeSeriesTable};
use hobart_regression::{
    FactorModel, FactorRegression, INTERCEPT, OlsOptions, add_intercept, fit_capm,
    fit_fama_french, ols,
};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn dates(n: usize) -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2015, 1, 30).unwrap();
    (0..n).map(|i| start + TimeDelta::days(7 * i as i64)).collect()
}

fn normals(rng: &mut StdRng, n: usize) -> Vec<f64> {
    (0..n)
        .map(|_| {
            let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
            let u2: f64 = rng.r#gen();
            (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
        })
        .collect()
}

fn some(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().copied().map(Some).collect()
}

#[test]
fn test_recovers_intercept_and_slope() {
    let mut rng = StdRng::seed_from_u64(7);
    let n = 120;
    let x = normals(&mut rng, n);
    let raw_noise = Array1::from_vec(normals(&mut rng, n)) * 0.5;

    // Remove the part of the noise explained by [1, x] so OLS returns the
    // true coefficients exactly.
    let design = add_intercept(&Array2::from_shape_vec((n, 1), x.clone()).unwrap());
    let noise = ols(&raw_noise, &design, &OlsOptions::default()).unwrap().residuals;

    let y: Vec<f64> = x
        .iter()
        .zip(noise.iter())
        .map(|(xi, e)| 2.0 + 3.0 * xi + e)
        .collect();

    let regressors = TimeSeriesTable::from_columns(dates(n), [("Mkt-RF", some(&x))]).unwrap();
    let series = TimeSeriesTable::from_columns(dates(n), [("fund", some(&y))]).unwrap();

    let fit = fit_capm(&series, &regressors).unwrap();
    let result = &fit.fits[0].result;

    let alpha = result.coefficient(INTERCEPT).unwrap();
    let beta = result.coefficient("Mkt-RF").unwrap();
    assert_relative_eq!(alpha.estimate, 2.0, epsilon = 1e-9);
    assert_relative_eq!(beta.estimate, 3.0, epsilon = 1e-9);
    assert!(alpha.ci_lower < 2.0 && 2.0 < alpha.ci_upper);
    assert!(beta.ci_lower < 3.0 && 3.0 < beta.ci_upper);
    assert!(beta.p_value < 1e-6);
    assert_eq!(result.nobs, n);
}

#[test]
fn test_perfect_correlation_gives_unit_r_squared() {
    let mut rng = StdRng::seed_from_u64(11);
    let n = 60;
    let mkt = normals(&mut rng, n);
    let smb = normals(&mut rng, n);
    let hml = normals(&mut rng, n);
    let y: Vec<f64> = (0..n)
        .map(|i| 0.001 + 1.1 * mkt[i] - 0.4 * smb[i] + 0.25 * hml[i])
        .collect();

    let panel = TimeSeriesTable::from_columns(
        dates(n),
        [("Mkt-RF", some(&mkt)), ("SMB", some(&smb)), ("HML", some(&hml))],
    )
    .unwrap();
    let series = TimeSeriesTable::from_columns(dates(n), [("fund", some(&y))]).unwrap();

    let ff = fit_fama_french(&series, &panel).unwrap();
    let result = &ff.fits[0].result;
    assert_relative_eq!(result.r_squared, 1.0, epsilon = 1e-9);
    assert!(result.f_pvalue.is_some());
    assert_eq!(result.factors.len(), 3);
    assert_eq!(result.factors[1].name, "SMB");
    for residual in ff.residuals.column("fund").unwrap().iter().flatten() {
        assert!(residual.abs() < 1e-9);
    }

    let market = panel.select(&["Mkt-RF"]).unwrap();
    let capm_target: Vec<f64> = mkt.iter().map(|m| 0.5 + 2.0 * m).collect();
    let series = TimeSeriesTable::from_columns(dates(n), [("tracker", some(&capm_target))]).unwrap();
    let capm = fit_capm(&series, &market).unwrap();
    assert_relative_eq!(capm.fits[0].result.r_squared, 1.0, epsilon = 1e-9);
}

#[test]
fn test_reindexed_residuals_reproduce_estimation_rows() {
    let mut rng = StdRng::seed_from_u64(3);
    let n = 40;
    let mkt = normals(&mut rng, n);
    let y = normals(&mut rng, n);

    let mut market = some(&mkt);
    let mut fund = some(&y);
    for i in [0, 5, 17] {
        market[i] = None;
    }
    for i in [5, 22, 39] {
        fund[i] = None;
    }

    let regressors = TimeSeriesTable::from_columns(dates(n), [("Mkt-RF", market.clone())]).unwrap();
    let series = TimeSeriesTable::from_columns(dates(n), [("fund", fund.clone())]).unwrap();
    let fit = fit_capm(&series, &regressors).unwrap();

    let expected: Vec<usize> = (0..n)
        .filter(|&i| market[i].is_some() && fund[i].is_some())
        .collect();
    assert_eq!(fit.fits[0].estimation_rows(), expected);
    assert_eq!(fit.residuals.index(), series.index());

    let kept = fit.residuals.complete_rows();
    assert_eq!(kept, expected);
    assert_eq!(fit.fitted.complete_rows(), expected);
}

#[test]
fn test_collinear_factors_are_reported_as_singular() {
    let mut rng = StdRng::seed_from_u64(5);
    let n = 30;
    let mkt = normals(&mut rng, n);
    let smb = normals(&mut rng, n);
    let hml: Vec<f64> = smb.iter().map(|s| 2.0 * s).collect();
    let y = normals(&mut rng, n);

    let panel = TimeSeriesTable::from_columns(
        dates(n),
        [("Mkt-RF", some(&mkt)), ("SMB", some(&smb)), ("HML", some(&hml))],
    )
    .unwrap();
    let series = TimeSeriesTable::from_columns(dates(n), [("fund", some(&y))]).unwrap();

    let fit = fit_fama_french(&series, &panel).unwrap();
    assert!(fit.fits.is_empty());
    assert_eq!(fit.failures.len(), 1);
    assert_eq!(fit.failures[0].kind, FailureKind::SingularDesign);
    assert_eq!(fit.failures[0].stage, "regression");
    assert_eq!(fit.residuals.width(), 0);
}

#[test]
fn test_parallel_fit_preserves_column_order() {
    let mut rng = StdRng::seed_from_u64(19);
    let n = 50;
    let mkt = normals(&mut rng, n);
    let regressors = TimeSeriesTable::from_columns(dates(n), [("Mkt-RF", some(&mkt))]).unwrap();

    let names: Vec<String> = (0..12).map(|i| format!("fund_{i:02}")).collect();
    let columns: Vec<(String, Vec<Option<f64>>)> = names
        .iter()
        .map(|name| (name.clone(), some(&normals(&mut rng, n))))
        .collect();
    let series = TimeSeriesTable::from_columns(dates(n), columns).unwrap();

    let serial = FactorRegression::new(FactorModel::capm(), OlsOptions::default())
        .fit_all(&series, &regressors)
        .unwrap();
    let parallel = FactorRegression::new(FactorModel::capm(), OlsOptions::default())
        .parallel(true)
        .fit_all(&series, &regressors)
        .unwrap();

    let serial_names: Vec<&str> = serial.results().map(|r| r.series.as_str()).collect();
    let parallel_names: Vec<&str> = parallel.results().map(|r| r.series.as_str()).collect();
    assert_eq!(serial_names, names.iter().map(String::as_str).collect::<Vec<_>>());
    assert_eq!(serial_names, parallel_names);
    assert_eq!(serial.residuals, parallel.residuals);
}

#[test]
fn test_regressors_conformed_to_series_index() {
    // Regressor panel covers a longer, descending span
    let n = 10;
    let mut long_index = dates(n + 4);
    long_index.reverse();
    let mkt: Vec<Option<f64>> = (0..n + 4).map(|i| Some((i as f64 * 0.7).sin())).collect();
    let regressors = TimeSeriesTable::from_columns(long_index, [("Mkt-RF", mkt)]).unwrap();

    let y: Vec<Option<f64>> = (0..n).map(|i| Some((i as f64 * 0.3).cos())).collect();
    let series = TimeSeriesTable::from_columns(dates(n), [("fund", y)]).unwrap();

    let fit = fit_capm(&series, &regressors).unwrap();
    assert_eq!(fit.regressors.index(), series.index());
    assert_eq!(fit.fits[0].result.nobs, n);
}
