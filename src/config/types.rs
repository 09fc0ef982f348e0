//! Configuration type definitions.

use crate::constants::{
    DEFAULT_COOLDOWN_MS, DEFAULT_IOU_THRESHOLD, DEFAULT_LABEL_FILTER, DEFAULT_MARGIN_RATIO,
    DEFAULT_MIN_BOX_PX, DEFAULT_SCORE_THRESHOLD, classifier, decode, detector,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Filtering and orchestration settings.
    pub pipeline: PipelineSection,

    /// Object detector model.
    pub detector: DetectorSection,

    /// Breed classifier models.
    pub classifiers: ClassifiersSection,

    /// Overlay rendering.
    pub render: RenderSection,

    /// Image decoding.
    pub decode: DecodeSection,
}

/// `[pipeline]` settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    /// Minimum detection confidence.
    pub score_threshold: f32,

    /// NMS overlap cutoff.
    pub iou_threshold: f32,

    /// Minimum box width and height in pixels.
    pub min_box_px: f32,

    /// Accepted labels. Empty accepts every label.
    pub label_filter: Vec<String>,

    /// Minimum time between accepted invocations.
    pub cooldown_ms: u64,

    /// Crop margin around a box, as a fraction of its size.
    pub margin_ratio: f32,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            min_box_px: DEFAULT_MIN_BOX_PX,
            label_filter: DEFAULT_LABEL_FILTER.iter().map(ToString::to_string).collect(),
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            margin_ratio: DEFAULT_MARGIN_RATIO,
        }
    }
}

/// `[detector]` settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSection {
    /// Path to the YOLO ONNX model.
    pub path: Option<PathBuf>,

    /// Square model input side.
    pub input_size: u32,

    /// Raw score pre-filter applied inside the detector.
    pub score_threshold: f32,

    /// Detector-local NMS cutoff.
    pub iou_threshold: f32,

    /// Maximum boxes returned per image.
    pub max_detections: usize,

    /// Class names for heads with fewer than 80 classes.
    pub labels: Vec<String>,
}

impl Default for DetectorSection {
    fn default() -> Self {
        Self {
            path: None,
            input_size: detector::DEFAULT_INPUT_SIZE,
            score_threshold: detector::DEFAULT_SCORE_THRESHOLD,
            iou_threshold: detector::DEFAULT_IOU_THRESHOLD,
            max_detections: detector::DEFAULT_MAX_DETECTIONS,
            labels: vec!["cat".to_string(), "dog".to_string()],
        }
    }
}

/// `[classifiers.*]` tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifiersSection {
    /// Dog breed classifier.
    pub dog: ClassifierSection,

    /// Cat breed classifier.
    pub cat: ClassifierSection,
}

/// One breed classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSection {
    /// Path to the ONNX model.
    pub path: Option<PathBuf>,

    /// Path to the label file (one label per line, index order).
    pub labels: Option<PathBuf>,

    /// Model input side. Defaults per species when unset.
    pub input_size: Option<u32>,

    /// Minimum top-1 probability for a breed to be reported.
    pub min_probability: f32,
}

impl Default for ClassifierSection {
    fn default() -> Self {
        Self {
            path: None,
            labels: None,
            input_size: None,
            min_probability: classifier::DEFAULT_MIN_PROBABILITY,
        }
    }
}

/// `[render]` settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSection {
    /// TrueType font used for labels instead of the embedded one.
    pub font: Option<PathBuf>,
}

/// `[decode]` settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeSection {
    /// Long-side limit applied after decoding.
    pub max_side: u32,
}

impl Default for DecodeSection {
    fn default() -> Self {
        Self {
            max_side: decode::DEFAULT_MAX_SIDE,
        }
    }
}
