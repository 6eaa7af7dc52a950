//! Diagnostic battery over a fitted model
//!
//! Every test is computed independently for every fitted series. A failing
//! test is recorded for that series and test only; the series still appears
//! in every other test's results.

use crate::align::{AlignedSample, sorted_residuals};
use crate::autocorrelation::durbin_watson;
use crate::error::{DiagnosticError, Result};
use crate::heteroskedasticity::{HeteroskedasticityTest, breusch_pagan, white};
use crate::multicollinearity::{Vif, panel_vif};
use crate::normality::{JarqueBera, ShapiroWilk, jarque_bera, shapiro_wilk};
use hobart_data::SeriesFailure;
use hobart_regression::ModelFit;
use ndarray::Array2;
use rayon::prelude::*;
use tracing::{debug, warn};

/// Test names, used as table names and failure stages.
pub mod names {
    /// Breusch-Pagan
    pub const BREUSCH_PAGAN: &str = "breusch_pagan";
    /// White
    pub const WHITE: &str = "white";
    /// Shapiro-Wilk
    pub const SHAPIRO_WILK: &str = "shapiro_wilk";
    /// Jarque-Bera
    pub const JARQUE_BERA: &str = "jarque_bera";
    /// Durbin-Watson
    pub const DURBIN_WATSON: &str = "durbin_watson";
    /// Variance inflation factors
    pub const VIF: &str = "vif";
}

/// Outcome of every residual test for one series.
#[derive(Debug)]
pub struct SeriesDiagnostics {
    /// Series name
    pub series: String,
    /// Breusch-Pagan test
    pub breusch_pagan: Result<HeteroskedasticityTest>,
    /// White test
    pub white: Result<HeteroskedasticityTest>,
    /// Shapiro-Wilk test
    pub shapiro_wilk: Result<ShapiroWilk>,
    /// Jarque-Bera test
    pub jarque_bera: Result<JarqueBera>,
    /// Durbin-Watson statistic
    pub durbin_watson: Result<f64>,
}

impl SeriesDiagnostics {
    /// Failure records for the tests that did not complete.
    pub fn failures(&self) -> Vec<SeriesFailure> {
        let failure = |stage: &str, err: &DiagnosticError| {
            SeriesFailure::new(&self.series, stage, err.kind(), err.to_string())
        };
        [
            (names::BREUSCH_PAGAN, self.breusch_pagan.as_ref().err()),
            (names::WHITE, self.white.as_ref().err()),
            (names::SHAPIRO_WILK, self.shapiro_wilk.as_ref().err()),
            (names::JARQUE_BERA, self.jarque_bera.as_ref().err()),
            (names::DURBIN_WATSON, self.durbin_watson.as_ref().err()),
        ]
        .into_iter()
        .filter_map(|(stage, err)| err.map(|e| failure(stage, e)))
        .collect()
    }
}

/// Diagnostics for every fitted series plus the panel VIF.
#[derive(Debug)]
pub struct ModelDiagnostics {
    /// Per-series results in fit order
    pub series: Vec<SeriesDiagnostics>,
    /// VIF of the regressor panel
    pub vif: Result<Vec<Vif>>,
}

impl ModelDiagnostics {
    /// All failure records, series first then the panel VIF.
    pub fn failures(&self) -> Vec<SeriesFailure> {
        let mut failures: Vec<SeriesFailure> =
            self.series.iter().flat_map(SeriesDiagnostics::failures).collect();
        if let Err(err) = &self.vif {
            failures.push(SeriesFailure::new(
                "panel",
                names::VIF,
                err.kind(),
                err.to_string(),
            ));
        }
        failures
    }
}

type HeteroskedasticityFn = fn(&[f64], &Array2<f64>) -> Result<HeteroskedasticityTest>;

/// Re-issue a shared input error for each test that depends on it.
fn replay(err: &DiagnosticError) -> DiagnosticError {
    match err {
        DiagnosticError::IndexAlignment(msg) => DiagnosticError::IndexAlignment(msg.clone()),
        other => DiagnosticError::IndexAlignment(other.to_string()),
    }
}

fn residual_slice(values: &Result<Vec<f64>>) -> Result<&[f64]> {
    match values {
        Ok(v) => Ok(v.as_slice()),
        Err(err) => Err(replay(err)),
    }
}

/// Runs the diagnostic battery.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticSuite {
    parallel: bool,
}

impl DiagnosticSuite {
    /// Create a sequential suite.
    pub const fn new() -> Self {
        Self { parallel: false }
    }

    /// Run series on the rayon pool.
    pub const fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Diagnose one series of a model fit.
    pub fn diagnose_series(&self, fit: &ModelFit, series: &str) -> SeriesDiagnostics {
        let aligned = AlignedSample::from_tables(series, &fit.residuals, &fit.fitted, &fit.regressors);
        let residuals = sorted_residuals(&fit.residuals, series);

        let heteroskedasticity = |test: HeteroskedasticityFn| match &aligned {
            Ok(sample) => test(&sample.residuals, &sample.regressors),
            Err(err) => Err(replay(err)),
        };

        let diagnostics = SeriesDiagnostics {
            series: series.to_string(),
            breusch_pagan: heteroskedasticity(breusch_pagan),
            white: heteroskedasticity(white),
            shapiro_wilk: residual_slice(&residuals).and_then(shapiro_wilk),
            jarque_bera: residual_slice(&residuals).and_then(jarque_bera),
            durbin_watson: residual_slice(&residuals).and_then(durbin_watson),
        };

        for failure in diagnostics.failures() {
            warn!(series = %failure.series, test = %failure.stage, reason = %failure.reason, "Diagnostic failed");
        }
        diagnostics
    }

    /// Diagnose every fitted series and the regressor panel.
    pub fn run(&self, fit: &ModelFit) -> ModelDiagnostics {
        let fitted_series: Vec<&str> = fit.results().map(|r| r.series.as_str()).collect();
        debug!(series = fitted_series.len(), "Running diagnostics");

        let series: Vec<SeriesDiagnostics> = if self.parallel {
            fitted_series
                .par_iter()
                .map(|name| self.diagnose_series(fit, name))
                .collect()
        } else {
            fitted_series
                .iter()
                .map(|name| self.diagnose_series(fit, name))
                .collect()
        };

        let vif = panel_vif(&fit.regressors);
        if let Err(err) = &vif {
            warn!(error = %err, "VIF failed");
        }

        ModelDiagnostics { series, vif }
    }
}
