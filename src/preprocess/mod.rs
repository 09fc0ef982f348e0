//! Region-of-interest extraction and normalisation for the breed classifiers.
//!
//! The sequence is fixed: expand the box by a margin, crop, resize the shorter
//! side to `target + RESIZE_MARGIN`, center-crop to `target x target`, then
//! normalise with `ImageNet` statistics into a channel-major buffer. Any change
//! to this sequence or its constants breaks compatibility with the trained
//! classifier weights.
//!
//! The resize and center crop are folded into one step: the centred window is
//! located in crop coordinates first and only that window is resized, so no
//! intermediate buffer grows past `target x target` however thin the crop is.

mod tensor;

pub use tensor::Tensor;

use crate::constants::preprocess::{MEAN, RESIZE_MARGIN, STD};
use crate::detection::BoundingBox;
use crate::error::{Error, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;

/// Pixel rectangle inside an image (always at least 1x1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    /// Left column.
    pub x: u32,
    /// Top row.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Build the classifier tensor for one detection box.
pub fn prepare(
    image: &RgbImage,
    bbox: &BoundingBox,
    margin_ratio: f32,
    target_size: u32,
) -> Result<Tensor> {
    if target_size == 0 {
        return Err(Error::ConfigValidation {
            message: "classifier input size must be greater than 0".to_string(),
        });
    }

    let region = crop_region(bbox, margin_ratio, image.width(), image.height())?;
    let window = center_window(region.width, region.height, target_size);
    let view = imageops::crop_imm(
        image,
        region.x + window.x,
        region.y + window.y,
        window.width,
        window.height,
    )
    .to_image();
    let square = imageops::resize(&view, target_size, target_size, FilterType::Triangle);
    normalize(&square)
}

/// Expand `bbox` by `margin_ratio` of its size on each side and clamp to the image.
///
/// Degenerate results are widened to one pixel. Fails only for an empty image.
pub fn crop_region(
    bbox: &BoundingBox,
    margin_ratio: f32,
    image_width: u32,
    image_height: u32,
) -> Result<CropRegion> {
    if image_width == 0 || image_height == 0 {
        return Err(Error::EmptyRegion {
            width: image_width,
            height: image_height,
        });
    }

    let margin = if margin_ratio.is_finite() {
        margin_ratio.max(0.0)
    } else {
        0.0
    };
    let pad_x = bbox.width() * margin;
    let pad_y = bbox.height() * margin;

    let (x, width) = clamp_span(bbox.left - pad_x, bbox.right + pad_x, image_width);
    let (y, height) = clamp_span(bbox.top - pad_y, bbox.bottom + pad_y, image_height);

    Ok(CropRegion {
        x,
        y,
        width,
        height,
    })
}

/// Clamp `[start, end)` into `[0, extent]`, returning the origin and a length of at least 1.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn clamp_span(start: f32, end: f32, extent: u32) -> (u32, u32) {
    let last = extent - 1;
    let start = if start.is_finite() {
        start.floor().clamp(0.0, last as f32) as u32
    } else {
        0
    };
    let end = if end.is_finite() {
        end.ceil().clamp(1.0, extent as f32) as u32
    } else {
        extent
    };
    let length = end.saturating_sub(start).max(1);
    (start, length.min(extent - start))
}

/// Part of a `width x height` crop that survives resizing the shorter side to
/// `target + RESIZE_MARGIN` and center-cropping `target x target`.
///
/// The window is square, centred and at least one pixel wide. Coordinates are
/// relative to the crop.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn center_window(width: u32, height: u32, target: u32) -> CropRegion {
    let shorter = width.min(height).max(1);
    let side = (f64::from(target) * f64::from(shorter) / f64::from(target + RESIZE_MARGIN))
        .round()
        .clamp(1.0, f64::from(shorter)) as u32;

    CropRegion {
        x: width.saturating_sub(side) / 2,
        y: height.saturating_sub(side) / 2,
        width: side,
        height: side,
    }
}

/// Normalise a square RGB image into a channel-major tensor.
///
/// Iteration order is channel, then row, then column.
pub fn normalize(image: &RgbImage) -> Result<Tensor> {
    let (w, h) = image.dimensions();
    if w != h {
        return Err(Error::Internal {
            message: format!("normalize expects a square image, got {w}x{h}"),
        });
    }

    let mut data = Vec::with_capacity(Tensor::expected_len(w));
    for channel in 0..3 {
        let mean = MEAN[channel];
        let std = STD[channel];
        for y in 0..h {
            for x in 0..w {
                let raw = f32::from(image.get_pixel(x, y)[channel]);
                data.push((raw / 255.0 - mean) / std);
            }
        }
    }
    Tensor::from_chw(w, data)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb(color))
    }

    #[test]
    fn test_shape_contract_across_aspect_ratios() {
        let cases = [(640, 480), (480, 640), (1000, 50), (50, 1000), (3, 3), (1, 1)];
        for (w, h) in cases {
            let image = solid(w, h, [120, 80, 40]);
            #[allow(clippy::cast_precision_loss)]
            let bbox = BoundingBox::new(0.0, 0.0, w as f32, h as f32);
            for target in [224, 456, 17] {
                let tensor = prepare(&image, &bbox, 0.15, target).unwrap();
                assert_eq!(tensor.len(), Tensor::expected_len(target), "{w}x{h} -> {target}");
                assert_eq!(tensor.size(), target);
            }
        }
    }

    #[test]
    fn test_box_outside_image_still_prepares() {
        let image = solid(100, 100, [10, 20, 30]);
        let bbox = BoundingBox::new(-50.0, 150.0, -10.0, 400.0);
        let tensor = prepare(&image, &bbox, 0.15, 32).unwrap();
        assert_eq!(tensor.len(), 3 * 32 * 32);
    }

    #[test]
    fn test_zero_target_rejected() {
        let image = solid(10, 10, [0, 0, 0]);
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(prepare(&image, &bbox, 0.15, 0).is_err());
    }

    #[test]
    fn test_empty_image_is_empty_region() {
        let image = RgbImage::new(0, 0);
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(matches!(
            prepare(&image, &bbox, 0.15, 8),
            Err(Error::EmptyRegion { .. })
        ));
    }

    #[test]
    fn test_crop_region_applies_margin() {
        let bbox = BoundingBox::new(100.0, 100.0, 200.0, 300.0);
        let region = crop_region(&bbox, 0.15, 1000, 1000).unwrap();
        assert_eq!(
            region,
            CropRegion {
                x: 85,
                y: 70,
                width: 130,
                height: 260
            }
        );
    }

    #[test]
    fn test_crop_region_clamps_to_image() {
        let bbox = BoundingBox::new(-20.0, -20.0, 120.0, 120.0);
        let region = crop_region(&bbox, 0.15, 100, 80).unwrap();
        assert_eq!(
            region,
            CropRegion {
                x: 0,
                y: 0,
                width: 100,
                height: 80
            }
        );
    }

    #[test]
    fn test_crop_region_forces_one_pixel() {
        let bbox = BoundingBox::new(50.0, 50.0, 50.0, 50.0);
        let region = crop_region(&bbox, 0.15, 100, 100).unwrap();
        assert_eq!(region.width, 1);
        assert_eq!(region.height, 1);

        let far = BoundingBox::new(500.0, 500.0, 600.0, 600.0);
        let region = crop_region(&far, 0.15, 100, 100).unwrap();
        assert_eq!((region.x, region.y), (99, 99));
        assert_eq!((region.width, region.height), (1, 1));
    }

    #[test]
    fn test_center_window_matches_resize_then_crop() {
        // 200x100 -> shorter side 256 gives 512x256; the 224 square maps back to 87.5 px.
        let window = center_window(200, 100, 224);
        assert_eq!(
            window,
            CropRegion {
                x: 56,
                y: 6,
                width: 88,
                height: 88
            }
        );

        let window = center_window(100, 300, 224);
        assert_eq!((window.width, window.height), (88, 88));
        assert_eq!((window.x, window.y), (6, 106));
    }

    #[test]
    fn test_center_window_thin_crop_is_one_pixel() {
        let window = center_window(1, 1280, 456);
        assert_eq!(
            window,
            CropRegion {
                x: 0,
                y: 639,
                width: 1,
                height: 1
            }
        );
    }

    #[test]
    fn test_off_image_box_stays_bounded() {
        let image = solid(1280, 1280, [200, 100, 50]);
        let bbox = BoundingBox::new(1300.0, 0.0, 1400.0, 1280.0);

        let region = crop_region(&bbox, 0.15, 1280, 1280).unwrap();
        assert_eq!((region.width, region.height), (1, 1280));
        let window = center_window(region.width, region.height, 456);
        assert!(window.width <= region.width && window.height <= region.height);

        let tensor = prepare(&image, &bbox, 0.15, 456).unwrap();
        assert_eq!(tensor.len(), Tensor::expected_len(456));
        let red = (200.0 / 255.0 - MEAN[0]) / STD[0];
        assert!((tensor.as_slice()[0] - red).abs() < 1e-5);
    }

    #[test]
    fn test_prepare_samples_the_centre() {
        let mut image = solid(64, 32, [0, 0, 0]);
        for y in 12..20 {
            for x in 28..36 {
                image.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        let bbox = BoundingBox::new(0.0, 0.0, 64.0, 32.0);
        let tensor = prepare(&image, &bbox, 0.0, 8).unwrap();
        // 6x6 window at (29, 13), inside the white block.
        let white = (1.0 - MEAN[0]) / STD[0];
        for value in &tensor.as_slice()[..64] {
            assert!((value - white).abs() < 1e-5, "{value}");
        }
    }

    #[test]
    fn test_normalize_is_channel_major() {
        let mut image = solid(2, 2, [0, 0, 0]);
        image.put_pixel(1, 0, Rgb([255, 128, 0]));
        let tensor = normalize(&image).unwrap();
        let data = tensor.as_slice();
        assert_eq!(data.len(), 12);

        let red_black = (0.0 - MEAN[0]) / STD[0];
        let red_full = (1.0 - MEAN[0]) / STD[0];
        let green_half = (128.0 / 255.0 - MEAN[1]) / STD[1];
        let blue_black = (0.0 - MEAN[2]) / STD[2];

        // R plane, row 0: (0,0) then (1,0)
        assert!((data[0] - red_black).abs() < 1e-6);
        assert!((data[1] - red_full).abs() < 1e-6);
        // G plane starts at index 4
        assert!((data[5] - green_half).abs() < 1e-6);
        // B plane starts at index 8
        assert!((data[9] - blue_black).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_rejects_non_square() {
        assert!(normalize(&solid(3, 2, [0, 0, 0])).is_err());
    }
}
