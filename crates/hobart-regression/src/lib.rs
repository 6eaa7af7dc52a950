#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]

pub mod distributions;
pub mod error;
pub mod hac;
pub mod linalg;
pub mod model;
pub mod ols;

pub use error::RegressionError;
pub use linalg::{DEFAULT_RANK_TOLERANCE, QrDecomposition};
pub use model::{
    Coefficient, FactorModel, FactorRegression, INTERCEPT, ModelFit, REGRESSION_STAGE,
    RegressionResult, SeriesFit, fit_capm, fit_fama_french,
};
pub use ols::{CovarianceType, OlsFit, OlsOptions, add_intercept, has_constant_column, ols};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
