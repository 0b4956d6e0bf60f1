//! Display models for CLI output
//!
//! Converts scan outcomes and opaque reports into table rows, pretty text,
//! and JSON documents.

pub mod display;

pub use display::{ReportSummary, ReportView, ScanRun, ScanRunReport};
