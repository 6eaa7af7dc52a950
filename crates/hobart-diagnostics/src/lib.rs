#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod align;
pub mod autocorrelation;
pub mod error;
pub mod heteroskedasticity;
pub mod multicollinearity;
pub mod normality;
pub mod suite;

// Re-export main types
pub use align::{AlignedSample, sorted_residuals};
pub use autocorrelation::durbin_watson;
pub use error::{DiagnosticError, Result};
pub use heteroskedasticity::{HeteroskedasticityTest, breusch_pagan, white, white_design};
pub use multicollinearity::{Vif, panel_vif, variance_inflation_factors};
pub use normality::{JarqueBera, ShapiroWilk, jarque_bera, shapiro_wilk};
pub use suite::{DiagnosticSuite, ModelDiagnostics, SeriesDiagnostics, names};
