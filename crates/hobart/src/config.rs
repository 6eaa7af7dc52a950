//! Pipeline configuration.

use crate::error::{PipelineError, Result};
use hobart_data::{ReturnConvention, ZeroPolicy};
use hobart_regression::{CovarianceType, FactorModel, OlsOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for one pipeline run.
///
/// Every field has a default, so a JSON file only lists overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Factor model to fit (default: CAPM on `Mkt-RF`)
    pub model: FactorModel,

    /// Risk-free column of the factor table (default: `RF`)
    pub risk_free_column: String,

    /// Direction of the log-price ratio
    pub return_convention: ReturnConvention,

    /// Interpretation of exact-zero returns
    pub zero_policy: ZeroPolicy,

    /// Fill interior gaps of each return series with its mean (default: true)
    pub repair_gaps: bool,

    /// Significance level for confidence intervals (default: 0.05)
    pub alpha: f64,

    /// Coefficient covariance estimator
    pub covariance: CovarianceType,

    /// Fit and diagnose series on the rayon pool (default: false)
    pub parallel: bool,

    /// Stop the run when any series fails to fit (default: false)
    pub abort_on_series_failure: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: FactorModel::default(),
            risk_free_column: "RF".to_string(),
            return_convention: ReturnConvention::default(),
            zero_policy: ZeroPolicy::default(),
            repair_gaps: true,
            alpha: 0.05,
            covariance: CovarianceType::default(),
            parallel: false,
            abort_on_series_failure: false,
        }
    }
}

impl PipelineConfig {
    /// Parse a JSON configuration.
    ///
    /// # Errors
    /// `Json` on malformed input, `InvalidConfig` if a value is out of range.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    ///
    /// # Errors
    /// `Io` if the file cannot be read, otherwise as [`Self::from_json_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Check value ranges.
    ///
    /// # Errors
    /// `InvalidConfig` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "alpha must lie in (0, 1), got {}",
                self.alpha
            )));
        }
        if self.risk_free_column.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "risk_free_column must not be empty".to_string(),
            ));
        }
        if self.model.factors().contains(&self.risk_free_column.as_str()) {
            return Err(PipelineError::InvalidConfig(format!(
                "risk-free column {} is also a model factor",
                self.risk_free_column
            )));
        }
        Ok(())
    }

    /// OLS options derived from this configuration.
    pub fn ols_options(&self) -> OlsOptions {
        OlsOptions {
            alpha: self.alpha,
            covariance: self.covariance,
            ..OlsOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.model, FactorModel::capm());
        assert_eq!(config.risk_free_column, "RF");
        assert!(config.repair_gaps);
        assert!(!config.parallel);
        assert!(!config.abort_on_series_failure);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = PipelineConfig::from_json_str(
            r#"{"model": {"kind": "fama_french", "market": "Mkt-RF", "size": "SMB", "value": "HML"}, "alpha": 0.1}"#,
        )
        .unwrap();
        assert_eq!(config.model, FactorModel::fama_french());
        assert_eq!(config.alpha, 0.1);
        assert_eq!(config.risk_free_column, "RF");
        assert_eq!(config.ols_options().alpha, 0.1);
    }

    #[test]
    fn test_newey_west_from_json() {
        let config =
            PipelineConfig::from_json_str(r#"{"covariance": {"type": "newey_west", "lags": 4}}"#)
                .unwrap();
        assert_eq!(config.covariance, CovarianceType::NeweyWest { lags: Some(4) });
    }

    #[test]
    fn test_invalid_alpha() {
        assert!(matches!(
            PipelineConfig::from_json_str(r#"{"alpha": 1.5}"#),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_risk_free_factor_clash() {
        assert!(matches!(
            PipelineConfig::from_json_str(r#"{"risk_free_column": "Mkt-RF"}"#),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hobart.json");
        std::fs::write(&path, r#"{"parallel": true, "zero_policy": "observed"}"#).unwrap();
        let config = PipelineConfig::from_file(&path).unwrap();
        assert!(config.parallel);
        assert_eq!(config.zero_policy, ZeroPolicy::Observed);
    }
}
