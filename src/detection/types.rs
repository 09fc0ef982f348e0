//! Detection type produced by the external detector.

use super::geometry::BoundingBox;
use serde::{Deserialize, Serialize};

/// A single detector hit: box, confidence and class label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Box in source-image pixel coordinates.
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    /// Detector confidence (0.0 - 1.0).
    pub score: f32,
    /// Class label as reported by the detector (e.g. "dog").
    pub label: String,
}

impl Detection {
    /// Create a detection from box edges, score and label.
    pub fn new(
        left: f32,
        top: f32,
        right: f32,
        bottom: f32,
        score: f32,
        label: impl Into<String>,
    ) -> Self {
        Self {
            bbox: BoundingBox::new(left, top, right, bottom),
            score,
            label: label.into(),
        }
    }

    /// Case-insensitive label comparison.
    pub fn has_label(&self, label: &str) -> bool {
        self.label.eq_ignore_ascii_case(label)
    }
}
