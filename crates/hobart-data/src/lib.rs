#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod excess;
pub mod failure;
pub mod frame;
pub mod returns;
pub mod stats;
pub mod table;

pub use error::{DataError, Result};
pub use excess::{ExcessReturns, ZeroPolicy, align_and_subtract};
pub use failure::{FailureKind, SeriesFailure};
pub use returns::{
    RETURNS_STAGE, ReturnConvention, compute_log_returns, log_returns_by_column, repair_gaps,
    repair_table_gaps,
};
pub use stats::{DescriptiveStats, describe};
pub use table::{Column, IndexOrder, TimeSeriesTable};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
