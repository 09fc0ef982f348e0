//! Box geometry shared by suppression, cropping, fusion and drawing.

use serde::{Deserialize, Serialize};

/// Axis-aligned box in image-space pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub left: f32,
    /// Top edge.
    pub top: f32,
    /// Right edge.
    pub right: f32,
    /// Bottom edge.
    pub bottom: f32,
}

impl BoundingBox {
    /// Create a box from its edges.
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Horizontal extent (may be negative for malformed boxes).
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Vertical extent (may be negative for malformed boxes).
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Area, treating negative extents as empty.
    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Intersection-over-union with another box.
    pub fn iou(&self, other: &Self) -> f32 {
        iou(self, other)
    }
}

/// Intersection area divided by union area of two boxes.
///
/// Returns 0 when the union is empty, so degenerate boxes never match anything.
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let inter_w = (a.right.min(b.right) - a.left.max(b.left)).max(0.0);
    let inter_h = (a.bottom.min(b.bottom) - a.top.max(b.top)).max(0.0);
    let intersection = inter_w * inter_h;
    let union = a.area() + b.area() - intersection;
    if union <= 0.0 {
        return 0.0;
    }
    (intersection / union).clamp(0.0, 1.0)
}

/// Round a coordinate and clamp it into `[0, extent - 1]`.
///
/// A zero extent yields 0.
pub fn clamp_coordinate(value: f32, extent: u32) -> u32 {
    let max = extent.saturating_sub(1);
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    #[allow(clippy::cast_precision_loss)]
    let upper = max as f32;
    let rounded = value.round();
    if rounded >= upper {
        return max;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let coord = rounded as u32;
    coord.min(max)
}
