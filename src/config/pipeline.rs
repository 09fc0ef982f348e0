//! Per-invocation pipeline tunables.

use super::PipelineSection;
use crate::constants::{
    DEFAULT_IOU_THRESHOLD, DEFAULT_LABEL_FILTER, DEFAULT_MIN_BOX_PX, DEFAULT_SCORE_THRESHOLD,
};
use std::collections::BTreeSet;
use tracing::warn;

/// Thresholds and label whitelist applied to one `analyze` call.
///
/// Fields are only reachable through setters, which clamp their input:
/// thresholds to `[0, 1]`, the minimum box size to `>= 0`. Labels are stored
/// lowercase.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    score_threshold: f32,
    iou_threshold: f32,
    min_box_px: f32,
    label_filter: BTreeSet<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            min_box_px: DEFAULT_MIN_BOX_PX,
            label_filter: DEFAULT_LABEL_FILTER.iter().map(ToString::to_string).collect(),
        }
    }
}

impl PipelineConfig {
    /// Build from the `[pipeline]` file section, clamping each value.
    pub fn from_section(section: &PipelineSection) -> Self {
        let mut config = Self::default();
        config.set_score_threshold(section.score_threshold);
        config.set_iou_threshold(section.iou_threshold);
        config.set_min_box_px(section.min_box_px);
        config.set_label_filter(&section.label_filter);
        config
    }

    /// Minimum detection confidence.
    pub fn score_threshold(&self) -> f32 {
        self.score_threshold
    }

    /// NMS overlap cutoff.
    pub fn iou_threshold(&self) -> f32 {
        self.iou_threshold
    }

    /// Minimum box width and height.
    pub fn min_box_px(&self) -> f32 {
        self.min_box_px
    }

    /// Accepted labels, lowercase. Empty accepts all.
    pub fn label_filter(&self) -> &BTreeSet<String> {
        &self.label_filter
    }

    /// Set the score threshold, clamped to `[0, 1]`. NaN is ignored.
    pub fn set_score_threshold(&mut self, value: f32) {
        if let Some(value) = clamp_unit("score_threshold", value) {
            self.score_threshold = value;
        }
    }

    /// Set the IoU threshold, clamped to `[0, 1]`. NaN is ignored.
    pub fn set_iou_threshold(&mut self, value: f32) {
        if let Some(value) = clamp_unit("iou_threshold", value) {
            self.iou_threshold = value;
        }
    }

    /// Set the minimum box size, clamped to `>= 0`. NaN is ignored.
    pub fn set_min_box_px(&mut self, value: f32) {
        if value.is_nan() {
            warn!("Ignoring NaN for min_box_px");
            return;
        }
        self.min_box_px = value.max(0.0);
    }

    /// Replace the label whitelist. Labels are trimmed and lowercased; blanks are dropped.
    pub fn set_label_filter<I, S>(&mut self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.label_filter = labels
            .into_iter()
            .map(|label| label.as_ref().trim().to_lowercase())
            .filter(|label| !label.is_empty())
            .collect();
    }

    /// Add `label` to the whitelist, or remove it if present.
    pub fn toggle_label(&mut self, label: &str) {
        let label = label.trim().to_lowercase();
        if label.is_empty() {
            return;
        }
        if !self.label_filter.remove(&label) {
            self.label_filter.insert(label);
        }
    }

    /// Whether a detection label passes the whitelist.
    pub fn accepts_label(&self, label: &str) -> bool {
        self.label_filter.is_empty() || self.label_filter.contains(&label.to_lowercase())
    }
}

fn clamp_unit(name: &str, value: f32) -> Option<f32> {
    if value.is_nan() {
        warn!("Ignoring NaN for {name}");
        return None;
    }
    let clamped = value.clamp(0.0, 1.0);
    if (clamped - value).abs() > f32::EPSILON {
        warn!("{name} {value} out of range, clamped to {clamped}");
    }
    Some(clamped)
}
