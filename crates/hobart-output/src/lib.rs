#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod aggregate;
pub mod export;
pub mod table;

pub use aggregate::{DatasetReport, ResultAggregator, TABLE_NAMES, regression_columns};
pub use export::{ExportError, ExportFormat, Exporter};
pub use table::{ScalarRow, ScalarTable};
