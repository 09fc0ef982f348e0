//! Alpha-blended rounded rectangles on RGB images.

use crate::detection::clamp_coordinate;
use image::{Pixel, Rgb, RgbImage, Rgba};

/// Axis-aligned rectangle with circular corners, in pixel coordinates.
///
/// Coordinates may lie outside the image; drawing clips to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundedRect {
    /// Left edge.
    pub left: f32,
    /// Top edge.
    pub top: f32,
    /// Right edge.
    pub right: f32,
    /// Bottom edge.
    pub bottom: f32,
    /// Corner radius, limited to half the shorter side.
    pub radius: f32,
}

impl RoundedRect {
    /// Create a rectangle from its edges and corner radius.
    pub fn new(left: f32, top: f32, right: f32, bottom: f32, radius: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
            radius,
        }
    }

    /// Grow (or shrink, for negative `by`) every edge and the radius.
    pub fn expand(&self, by: f32) -> Self {
        Self {
            left: self.left - by,
            top: self.top - by,
            right: self.right + by,
            bottom: self.bottom + by,
            radius: (self.radius + by).max(0.0),
        }
    }

    /// Whether the point lies inside the shape.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        if x < self.left || x > self.right || y < self.top || y > self.bottom {
            return false;
        }

        let half_side = ((self.right - self.left).min(self.bottom - self.top) / 2.0).max(0.0);
        let r = self.radius.clamp(0.0, half_side);
        if r == 0.0 {
            return true;
        }

        let cx = x.clamp(self.left + r, self.right - r);
        let cy = y.clamp(self.top + r, self.bottom - r);
        let (dx, dy) = (x - cx, y - cy);
        dx * dx + dy * dy <= r * r
    }

    /// Pixel index range `[x0, x1] x [y0, y1]` covering the shape, clipped to the image.
    fn pixel_bounds(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        (
            clamp_coordinate(self.left.floor(), width),
            clamp_coordinate(self.top.floor(), height),
            clamp_coordinate(self.right.ceil(), width),
            clamp_coordinate(self.bottom.ceil(), height),
        )
    }
}

/// Blend `color` over one pixel using its alpha.
pub fn blend(pixel: &mut Rgb<u8>, color: Rgba<u8>) {
    let mut rgba = pixel.to_rgba();
    rgba.blend(&color);
    *pixel = rgba.to_rgb();
}

/// Fill the shape with a translucent colour.
pub fn fill_rounded_rect(image: &mut RgbImage, rect: &RoundedRect, color: Rgba<u8>) {
    paint(image, rect, color, |x, y| rect.contains(x, y));
}

/// Draw a `width`-pixel outline centred on the shape's edge.
pub fn stroke_rounded_rect(image: &mut RgbImage, rect: &RoundedRect, width: f32, color: Rgba<u8>) {
    let half = width.max(0.0) / 2.0;
    let outer = rect.expand(half);
    let inner = rect.expand(-half);
    paint(image, &outer, color, |x, y| {
        outer.contains(x, y) && !inner.contains(x, y)
    });
}

fn paint<F>(image: &mut RgbImage, bounds: &RoundedRect, color: Rgba<u8>, covers: F)
where
    F: Fn(f32, f32) -> bool,
{
    if image.width() == 0 || image.height() == 0 {
        return;
    }
    #[allow(clippy::cast_precision_loss)]
    let (width, height) = (image.width() as f32, image.height() as f32);
    if bounds.right < 0.0 || bounds.bottom < 0.0 || bounds.left > width || bounds.top > height {
        return;
    }

    let (x0, y0, x1, y1) = bounds.pixel_bounds(image.width(), image.height());
    for y in y0..=y1 {
        for x in x0..=x1 {
            // sample pixel centres
            #[allow(clippy::cast_precision_loss)]
            let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
            if covers(px, py) {
                blend(image.get_pixel_mut(x, y), color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn test_contains_cuts_corners() {
        let rect = RoundedRect::new(0.0, 0.0, 100.0, 100.0, 20.0);
        assert!(rect.contains(50.0, 50.0));
        assert!(rect.contains(1.0, 50.0));
        assert!(!rect.contains(1.0, 1.0));
        assert!(rect.contains(10.0, 10.0));
        assert!(!rect.contains(101.0, 50.0));
    }

    #[test]
    fn test_blend_half_alpha() {
        let mut pixel = Rgb([0, 0, 0]);
        blend(&mut pixel, Rgba([200, 100, 50, 128]));
        assert!((99..=101).contains(&pixel[0]));
        assert!((49..=51).contains(&pixel[1]));
    }

    #[test]
    fn test_fill_stays_inside() {
        let mut image = RgbImage::new(40, 40);
        let rect = RoundedRect::new(10.0, 10.0, 30.0, 30.0, 0.0);
        fill_rounded_rect(&mut image, &rect, RED);
        assert_eq!(image.get_pixel(20, 20), &Rgb([255, 0, 0]));
        assert_eq!(image.get_pixel(5, 5), &Rgb([0, 0, 0]));
        assert_eq!(image.get_pixel(35, 35), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_stroke_leaves_centre() {
        let mut image = RgbImage::new(40, 40);
        let rect = RoundedRect::new(10.0, 10.0, 30.0, 30.0, 0.0);
        stroke_rounded_rect(&mut image, &rect, 4.0, RED);
        assert_eq!(image.get_pixel(10, 20), &Rgb([255, 0, 0]));
        assert_eq!(image.get_pixel(20, 20), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_offscreen_shapes_are_clipped() {
        let mut image = RgbImage::new(10, 10);
        fill_rounded_rect(
            &mut image,
            &RoundedRect::new(-50.0, -50.0, 500.0, 500.0, 8.0),
            RED,
        );
        assert_eq!(image.get_pixel(5, 5), &Rgb([255, 0, 0]));

        let mut image = RgbImage::new(10, 10);
        fill_rounded_rect(
            &mut image,
            &RoundedRect::new(200.0, 200.0, 300.0, 300.0, 8.0),
            RED,
        );
        assert!(image.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }
}
