//! YOLO object detector on ONNX Runtime.
//!
//! Handles both `[1, C, N]` and `[1, N, C]` output layouts where each anchor
//! holds `cx, cy, w, h` followed by one score per class. COCO heads (80+
//! classes) are narrowed to cats and dogs.

use super::{Detection, Detector, greedy_nms};
use crate::config::{DetectorSection, resolve_path};
use crate::constants::detector::{
    COCO_CAT, COCO_DOG, COCO_MIN_CLASSES, DEFAULT_INPUT_SIZE, DEFAULT_IOU_THRESHOLD,
    DEFAULT_MAX_DETECTIONS, DEFAULT_SCORE_THRESHOLD, MIN_BOX_SIDE_PX,
};
use crate::error::{Error, Result};
use crate::inference::session::{build_session, run_nchw};
use image::imageops::{self, FilterType};
use image::RgbImage;
use ort::session::Session;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, trace};

/// Values per anchor besides class scores.
const BOX_FIELDS: usize = 4;

/// Smallest channel count accepted for either output dimension.
const MIN_FIELDS: usize = 6;

/// Detector parameters.
#[derive(Debug, Clone)]
pub struct DetectorSettings {
    /// Square model input side.
    pub input_size: u32,
    /// Raw class score below which anchors are dropped.
    pub score_threshold: f32,
    /// Local NMS cutoff (boxes overlapping more than this are dropped).
    pub iou_threshold: f32,
    /// Maximum boxes returned.
    pub max_detections: usize,
    /// Class names for non-COCO heads, by class index.
    pub labels: Vec<String>,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            input_size: DEFAULT_INPUT_SIZE,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            max_detections: DEFAULT_MAX_DETECTIONS,
            labels: vec!["cat".to_string(), "dog".to_string()],
        }
    }
}

impl DetectorSettings {
    /// Settings from the `[detector]` table.
    pub fn from_section(section: &DetectorSection) -> Self {
        Self {
            input_size: section.input_size,
            score_threshold: section.score_threshold,
            iou_threshold: section.iou_threshold,
            max_detections: section.max_detections,
            labels: section.labels.clone(),
        }
    }
}

/// Mapping from letterboxed model coordinates back to the source image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Source-to-model scale factor.
    pub scale: f32,
    /// Horizontal padding in model pixels.
    pub pad_x: f32,
    /// Vertical padding in model pixels.
    pub pad_y: f32,
    /// Source image width.
    pub width: u32,
    /// Source image height.
    pub height: u32,
}

impl Letterbox {
    /// Map a model-space point back to source pixels, clamped to the image.
    #[allow(clippy::cast_precision_loss)]
    fn restore(&self, x: f32, y: f32) -> (f32, f32) {
        let max_x = self.width.saturating_sub(1) as f32;
        let max_y = self.height.saturating_sub(1) as f32;
        (
            ((x - self.pad_x) / self.scale).clamp(0.0, max_x),
            ((y - self.pad_y) / self.scale).clamp(0.0, max_y),
        )
    }
}

/// Scale `image` into a black `size x size` canvas, centred, and return the
/// NCHW `[0, 1]` buffer with its coordinate mapping.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn letterbox(image: &RgbImage, size: u32) -> (Vec<f32>, Letterbox) {
    let (width, height) = image.dimensions();
    let scale = (size as f32 / width.max(1) as f32).min(size as f32 / height.max(1) as f32);
    let new_w = ((width as f32 * scale) as u32).clamp(1, size);
    let new_h = ((height as f32 * scale) as u32).clamp(1, size);
    let pad_x = (size - new_w) / 2;
    let pad_y = (size - new_h) / 2;

    let mut canvas = RgbImage::new(size, size);
    let resized = imageops::resize(image, new_w, new_h, FilterType::Triangle);
    imageops::overlay(&mut canvas, &resized, i64::from(pad_x), i64::from(pad_y));

    let side = size as usize;
    let mut data = Vec::with_capacity(3 * side * side);
    for channel in 0..3 {
        for pixel in canvas.pixels() {
            data.push(f32::from(pixel[channel]) / 255.0);
        }
    }

    (
        data,
        Letterbox {
            scale,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
            width,
            height,
        },
    )
}

/// Treat values outside `[0, 1]` as logits.
fn to_probability(value: f32) -> f32 {
    if (0.0..=1.0).contains(&value) {
        value
    } else {
        1.0 / (1.0 + (-value).exp())
    }
}

/// Decode raw detector output into source-image detections.
pub fn decode_output(
    raw: &[f32],
    shape: &[i64],
    letterbox: &Letterbox,
    settings: &DetectorSettings,
) -> Result<Vec<Detection>> {
    let shape_error = || Error::UnexpectedOutputShape {
        shape: shape.to_vec(),
    };

    let [_, d1, d2] = shape else {
        return Err(shape_error());
    };
    let d1 = usize::try_from(*d1).map_err(|_| shape_error())?;
    let d2 = usize::try_from(*d2).map_err(|_| shape_error())?;
    if d1 < MIN_FIELDS || d2 < MIN_FIELDS || raw.len() < d1 * d2 {
        return Err(shape_error());
    }

    // Rows are anchors when the first dimension is the larger one.
    let anchors_first = d1 > d2;
    let (anchors, fields) = if anchors_first { (d1, d2) } else { (d2, d1) };
    let value = |anchor: usize, field: usize| {
        if anchors_first {
            raw[anchor * fields + field]
        } else {
            raw[field * anchors + anchor]
        }
    };

    let num_classes = fields - BOX_FIELDS;
    let is_coco = num_classes >= COCO_MIN_CLASSES;

    let mut candidates = Vec::new();
    for anchor in 0..anchors {
        let mut best_class = 0;
        let mut confidence = 0.0_f32;
        for class in 0..num_classes {
            let score = to_probability(value(anchor, BOX_FIELDS + class));
            if score > confidence {
                confidence = score;
                best_class = class;
            }
        }
        if confidence < settings.score_threshold {
            continue;
        }

        let label = if is_coco {
            match best_class {
                COCO_CAT => "cat".to_string(),
                COCO_DOG => "dog".to_string(),
                _ => continue,
            }
        } else {
            settings
                .labels
                .get(best_class)
                .cloned()
                .unwrap_or_else(|| best_class.to_string())
        };

        let (cx, cy) = (value(anchor, 0), value(anchor, 1));
        let (half_w, half_h) = (value(anchor, 2) / 2.0, value(anchor, 3) / 2.0);
        let (left, top) = letterbox.restore(cx - half_w, cy - half_h);
        let (right, bottom) = letterbox.restore(cx + half_w, cy + half_h);

        if right - left < MIN_BOX_SIDE_PX || bottom - top < MIN_BOX_SIDE_PX {
            continue;
        }

        candidates.push(Detection::new(left, top, right, bottom, confidence, label));
    }

    trace!("Detector: {} candidates above raw threshold", candidates.len());

    let mut kept = greedy_nms(candidates, |overlap| overlap > settings.iou_threshold);
    kept.truncate(settings.max_detections);
    Ok(kept)
}

/// YOLO detector backed by an ONNX Runtime session.
pub struct YoloDetector {
    session: Session,
    settings: DetectorSettings,
    path: PathBuf,
}

impl YoloDetector {
    /// Load the model at `path`.
    pub fn from_settings(path: &Path, settings: DetectorSettings) -> Result<Self> {
        Ok(Self {
            session: build_session(path)?,
            settings,
            path: path.to_path_buf(),
        })
    }

    /// Load the model named in the `[detector]` table.
    pub fn from_config(section: &DetectorSection, base: Option<&Path>) -> Result<Self> {
        let path = section.path.as_deref().ok_or(Error::ModelNotConfigured {
            role: "detector",
            section: "detector",
        })?;
        Self::from_settings(
            &resolve_path(path, base),
            DetectorSettings::from_section(section),
        )
    }

    /// Detector parameters.
    pub fn settings(&self) -> &DetectorSettings {
        &self.settings
    }
}

impl Detector for YoloDetector {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>> {
        let start = Instant::now();
        let size = self.settings.input_size;
        let (input, letterbox) = letterbox(image, size);
        let side = size as usize;

        let (shape, raw) = run_nchw(&mut self.session, [1, 3, side, side], input)?;
        let detections = decode_output(&raw, &shape, &letterbox, &self.settings)?;

        debug!(
            "{}: {} detections in {:?} (output {:?})",
            self.path.display(),
            detections.len(),
            start.elapsed(),
            shape
        );
        Ok(detections)
    }
}

impl std::fmt::Debug for YoloDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloDetector")
            .field("path", &self.path)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
