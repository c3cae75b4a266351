//! articulate-report: CSV and text report generation.
//!
//! Renders sequence statistics and transfer availability into the files
//! consumed by external plotting.

pub mod tables;
pub mod text;
