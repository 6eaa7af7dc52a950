//! Adapters between files on disk and the in-memory tables of the core.

pub(crate) mod csv_source;
