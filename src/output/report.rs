//! JSON report of an analysis.

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::pipeline::{AnalysisOutcome, PrimaryPick};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Report format version.
pub const REPORT_VERSION: &str = "1.0";

/// Filter settings that produced the report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSettings {
    /// Minimum detection confidence.
    pub score_threshold: f32,
    /// NMS overlap cutoff.
    pub iou_threshold: f32,
    /// Minimum box side.
    pub min_box_px: f32,
    /// Accepted labels (empty accepts all).
    pub label_filter: Vec<String>,
}

impl From<&PipelineConfig> for ReportSettings {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            score_threshold: config.score_threshold(),
            iou_threshold: config.iou_threshold(),
            min_box_px: config.min_box_px(),
            label_filter: config.label_filter().iter().cloned().collect(),
        }
    }
}

/// Top-level JSON document.
#[derive(Debug, Serialize)]
pub struct AnalysisReport<'a> {
    /// Report format version.
    pub version: &'static str,
    /// When the report was produced.
    pub timestamp: DateTime<Utc>,
    /// Filter settings.
    pub settings: ReportSettings,
    /// Best breed across both species.
    pub primary: Option<PrimaryPick>,
    /// Where the annotated image was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotated_path: Option<PathBuf>,
    /// Full outcome.
    pub outcome: &'a AnalysisOutcome,
}

impl<'a> AnalysisReport<'a> {
    /// Build a report stamped with the current time.
    pub fn new(outcome: &'a AnalysisOutcome, config: &PipelineConfig) -> Self {
        Self {
            version: REPORT_VERSION,
            timestamp: Utc::now(),
            settings: ReportSettings::from(config),
            primary: outcome.primary(),
            annotated_path: None,
            outcome,
        }
    }

    /// Record where the annotated image was saved.
    #[must_use]
    pub fn with_annotated_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.annotated_path = Some(path.into());
        self
    }
}

/// Write `report` as pretty JSON followed by a newline.
pub fn write_report<W: Write>(mut writer: W, report: &AnalysisReport<'_>) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, report)
        .map_err(|source| Error::ReportWrite { source })?;
    writeln!(writer)?;
    Ok(())
}

/// Save the annotated image. Format follows the file extension.
pub fn save_annotated(image: &image::RgbImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    image.save(path).map_err(|source| Error::ImageWrite {
        path: path.to_path_buf(),
        source,
    })
}
