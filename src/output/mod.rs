//! Report and image writers.

mod report;

pub use report::{AnalysisReport, REPORT_VERSION, ReportSettings, save_annotated, write_report};
