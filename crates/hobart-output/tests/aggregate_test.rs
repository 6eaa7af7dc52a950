//! Integration tests for aggregation and export.

use chrono::{NaiveDate, TimeDelta};
use hobart_data::{FailureKind, TimeSeriesTable, describe};
use hobart_diagnostics::{DiagnosticError, DiagnosticSuite, names};
use hobart_output::{ExportFormat, ResultAggregator, TABLE_NAMES};
use hobart_regression::fit_capm;

fn dates(n: usize) -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2019, 1, 31).unwrap();
    (0..n).map(|i| start + TimeDelta::days(30 * i as i64)).collect()
}

fn wave(n: usize, freq: f64, phase: f64) -> Vec<Option<f64>> {
    (0..n)
        .map(|i| Some(0.02 * (i as f64 * freq + phase).sin()))
        .collect()
}

fn inputs() -> (TimeSeriesTable, TimeSeriesTable) {
    let n = 36;
    let market = wave(n, 0.9, 0.0);
    let fund_a: Vec<Option<f64>> = market
        .iter()
        .zip(wave(n, 2.3, 0.4))
        .map(|(m, e)| Some(0.001 + 1.2 * m.unwrap() + 0.3 * e.unwrap()))
        .collect();
    let mut fund_b = wave(n, 1.7, 1.1);
    fund_b[4] = None;
    let sparse: Vec<Option<f64>> = (0..n).map(|i| (i < 2).then_some(0.01)).collect();

    let regressors = TimeSeriesTable::from_columns(dates(n), [("Mkt-RF", market)]).unwrap();
    let series = TimeSeriesTable::from_columns(
        dates(n),
        [("FUND_A", fund_a), ("SPARSE", sparse), ("FUND_B", fund_b)],
    )
    .unwrap();
    (series, regressors)
}

#[test]
fn test_report_tables_share_order_and_index() {
    let (series, regressors) = inputs();
    let fit = fit_capm(&series, &regressors).unwrap();
    let diagnostics = DiagnosticSuite::new().run(&fit);

    let report = ResultAggregator::new("funds".to_string(), series.index().to_vec())
        .descriptive(describe(&series))
        .build(&fit, &diagnostics)
        .unwrap();

    assert_eq!(report.model, "capm");
    assert_eq!(report.regression.series(), vec!["FUND_A", "FUND_B"]);
    assert_eq!(report.durbin_watson.series(), vec!["FUND_A", "FUND_B"]);
    assert_eq!(report.shapiro_wilk.series(), vec!["FUND_A", "FUND_B"]);
    assert_eq!(report.descriptive.series(), vec!["FUND_A", "SPARSE", "FUND_B"]);
    assert_eq!(report.vif.series(), vec!["intercept", "Mkt-RF"]);

    assert_eq!(report.residuals.index(), series.index());
    assert_eq!(report.fitted.index(), series.index());
    assert_eq!(report.residuals.get("FUND_B", 4).unwrap(), None);

    assert_eq!(report.regression.failures.len(), 1);
    assert_eq!(report.regression.failures[0].series, "SPARSE");
    assert!(report.regression.value("FUND_A", "Mkt-RF").is_some());
    assert!(report.regression.value("FUND_A", "intercept_p_value").is_some());
    assert_eq!(report.regression.value("FUND_B", "nobs"), Some(35.0));
}

#[test]
fn test_export_writes_one_file_per_table() {
    let (series, regressors) = inputs();
    let fit = fit_capm(&series, &regressors).unwrap();
    let diagnostics = DiagnosticSuite::new().run(&fit);
    let report = ResultAggregator::new("funds".to_string(), series.index().to_vec())
        .descriptive(describe(&series))
        .build(&fit, &diagnostics)
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let written = report.export(dir.path(), ExportFormat::Csv).unwrap();

    for table in TABLE_NAMES {
        let path = dir.path().join(format!("funds_capm_{table}.csv"));
        assert!(path.exists(), "missing {}", path.display());
    }
    let failures = dir.path().join("funds_capm_failures.csv");
    assert!(failures.exists());
    assert_eq!(written.len(), TABLE_NAMES.len() + 1);

    let residuals = std::fs::read_to_string(dir.path().join("funds_capm_residuals.csv")).unwrap();
    let lines: Vec<&str> = residuals.lines().collect();
    assert_eq!(lines[0], "date,FUND_A,FUND_B");
    assert_eq!(lines.len(), series.len() + 1);
    assert!(lines[5].ends_with(','));

    let sidecar = std::fs::read_to_string(failures).unwrap();
    assert!(sidecar.contains("SPARSE,regression,insufficient_data"));
}

#[test]
fn test_json_export() {
    let (series, regressors) = inputs();
    let fit = fit_capm(&series, &regressors).unwrap();
    let diagnostics = DiagnosticSuite::new().run(&fit);
    let report = ResultAggregator::new("funds".to_string(), series.index().to_vec())
        .build(&fit, &diagnostics)
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    report.export(dir.path(), ExportFormat::PrettyJson).unwrap();

    let json = std::fs::read_to_string(dir.path().join("funds_capm_regression.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["name"], "regression");
    assert_eq!(value["rows"][0]["series"], "FUND_A");
    assert_eq!(value["failures"][0]["kind"], "insufficient_data");
}

#[test]
fn test_vif_error_recorded_as_panel_failure() {
    let (series, regressors) = inputs();
    let fit = fit_capm(&series, &regressors).unwrap();
    let mut diagnostics = DiagnosticSuite::new().run(&fit);
    diagnostics.vif = Err(DiagnosticError::InsufficientData {
        test: names::VIF,
        required: 3,
        actual: 2,
    });

    let report = ResultAggregator::new("funds".to_string(), series.index().to_vec())
        .build(&fit, &diagnostics)
        .unwrap();

    assert!(report.vif.series().is_empty());
    assert_eq!(report.vif.failures.len(), 1);
    let failure = &report.vif.failures[0];
    assert_eq!(failure.series, "panel");
    assert_eq!(failure.stage, names::VIF);
    assert_eq!(failure.kind, FailureKind::InsufficientData);
    assert!(report.failures().iter().any(|f| f.series == "panel"));

    // Regression output is unaffected
    assert_eq!(report.regression.series(), vec!["FUND_A", "FUND_B"]);
}
