//! Object detection: box geometry, the detector collaborator and suppression.

pub mod geometry;
mod suppress;
mod types;
pub mod yolo;

pub use geometry::{BoundingBox, clamp_coordinate, iou};
pub use suppress::{greedy_nms, passes_filter, suppress};
pub use types::Detection;
pub use yolo::{DetectorSettings, YoloDetector};

use crate::error::Result;
use image::RgbImage;

/// Source of raw, unfiltered detections for a decoded image.
///
/// Implementations hold a stateful model session and are not reentrant,
/// hence `&mut self`.
pub trait Detector {
    /// Detect objects in `image`. Boxes are in `image` pixel coordinates.
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>>;
}

impl<D: Detector + ?Sized> Detector for Box<D> {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>> {
        (**self).detect(image)
    }
}
