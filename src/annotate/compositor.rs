//! Overlay rendering: boxes, label bubbles and the timing watermark.

use super::font::LabelFont;
use super::fusion::{BreedMatch, plan_annotations};
use super::shapes::{RoundedRect, fill_rounded_rect, stroke_rounded_rect};
use crate::config::{RenderSection, resolve_path};
use crate::constants::render::{
    BOX_FILL, BOX_STROKE, CORNER_RATIO, LABEL_BACKGROUND, LABEL_TEXT_RATIO, MIN_CORNER,
    MIN_LABEL_TEXT, MIN_PAD_X, MIN_PAD_Y, MIN_STROKE, MIN_WATERMARK_PAD, MIN_WATERMARK_TEXT,
    PAD_X_RATIO, PAD_Y_RATIO, STROKE_RATIO, TEXT, TIMESTAMP_FORMAT, WATERMARK_BACKGROUND,
    WATERMARK_CORNER_RATIO, WATERMARK_PAD_RATIO, WATERMARK_TEXT_RATIO,
};
use crate::detection::{BoundingBox, Detection};
use crate::error::Result;
use crate::inference::ClassificationResult;
use chrono::{DateTime, Local};
use image::{Rgb, RgbImage, Rgba};
use std::fmt::Write;
use std::path::Path;
use tracing::debug;

/// Bottom-right timing stamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watermark {
    /// Analysis time in milliseconds.
    pub elapsed_ms: u64,
    /// Local time shown next to it.
    pub timestamp: DateTime<Local>,
}

impl Watermark {
    /// Watermark stamped with the current local time.
    pub fn now(elapsed_ms: u64) -> Self {
        Self {
            elapsed_ms,
            timestamp: Local::now(),
        }
    }

    /// Rendered text.
    pub fn text(&self) -> String {
        format!(
            "Detected in {}ms • {}",
            self.elapsed_ms,
            self.timestamp.format(TIMESTAMP_FORMAT)
        )
    }
}

/// Drawing sizes derived from the image width.
#[derive(Debug, Clone, Copy)]
struct Style {
    stroke: f32,
    label_text: f32,
    pad_x: f32,
    pad_y: f32,
    corner: f32,
    watermark_text: f32,
    watermark_pad: f32,
    watermark_corner: f32,
}

impl Style {
    #[allow(clippy::cast_precision_loss)]
    fn for_width(width: u32) -> Self {
        let w = width as f32;
        Self {
            stroke: MIN_STROKE.max(w * STROKE_RATIO),
            label_text: MIN_LABEL_TEXT.max(w * LABEL_TEXT_RATIO),
            pad_x: MIN_PAD_X.max(w * PAD_X_RATIO),
            pad_y: MIN_PAD_Y.max(w * PAD_Y_RATIO),
            corner: MIN_CORNER.max(w * CORNER_RATIO),
            watermark_text: MIN_WATERMARK_TEXT.max(w * WATERMARK_TEXT_RATIO),
            watermark_pad: MIN_WATERMARK_PAD.max(w * WATERMARK_PAD_RATIO),
            watermark_corner: MIN_CORNER.max(w * WATERMARK_CORNER_RATIO),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn percent(value: f32) -> i32 {
    (value * 100.0).round() as i32
}

/// Label for a box: `"{label} {score}%"`, plus `" · {breed} {prob}%"` when matched.
pub fn label_text(detection: &Detection, breed: &BreedMatch) -> String {
    let mut text = format!("{} {}%", detection.label, percent(detection.score));
    if let BreedMatch::Matched { label, probability } = breed {
        let _ = write!(text, " · {label} {}%", percent(*probability));
    }
    text
}

const fn rgba(color: [u8; 4]) -> Rgba<u8> {
    Rgba(color)
}

const fn rgb(color: [u8; 4]) -> Rgb<u8> {
    Rgb([color[0], color[1], color[2]])
}

/// Draws detections onto a copy of the source image.
#[derive(Debug, Clone)]
pub struct Compositor {
    font: LabelFont,
}

impl Compositor {
    /// Compositor using `font` for all text.
    pub fn new(font: LabelFont) -> Self {
        Self { font }
    }

    /// Compositor from the `[render]` table: the configured font or the bundled one.
    pub fn from_config(render: &RenderSection, base: Option<&Path>) -> Result<Self> {
        let font = match &render.font {
            Some(path) => LabelFont::from_file(&resolve_path(path, base))?,
            None => LabelFont::embedded()?,
        };
        debug!("Label font: {}", font.name());
        Ok(Self::new(font))
    }

    /// Render every detection with its fused breed and a watermark stamped now.
    pub fn render(
        &self,
        source: &RgbImage,
        detections: &[Detection],
        dog_results: &[ClassificationResult],
        cat_results: &[ClassificationResult],
        elapsed_ms: u64,
    ) -> RgbImage {
        self.render_with_watermark(
            source,
            detections,
            dog_results,
            cat_results,
            &Watermark::now(elapsed_ms),
        )
    }

    /// Render with an explicit watermark. The source image is not modified.
    pub fn render_with_watermark(
        &self,
        source: &RgbImage,
        detections: &[Detection],
        dog_results: &[ClassificationResult],
        cat_results: &[ClassificationResult],
        watermark: &Watermark,
    ) -> RgbImage {
        let mut canvas = source.clone();
        let style = Style::for_width(canvas.width());

        for annotation in plan_annotations(detections, dog_results, cat_results) {
            let bbox = &annotation.detection.bbox;
            let shape = RoundedRect::new(bbox.left, bbox.top, bbox.right, bbox.bottom, style.corner);
            fill_rounded_rect(&mut canvas, &shape, rgba(BOX_FILL));
            stroke_rounded_rect(&mut canvas, &shape, style.stroke, rgba(BOX_STROKE));

            let text = label_text(annotation.detection, &annotation.breed);
            self.draw_label(&mut canvas, bbox, &text, style);
        }

        self.draw_watermark(&mut canvas, &watermark.text(), style);
        canvas
    }

    /// Bubble directly above the box, left-aligned and kept inside the image.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn draw_label(&self, canvas: &mut RgbImage, bbox: &BoundingBox, text: &str, style: Style) {
        let (text_w, text_h) = self.font.measure(text, style.label_text);
        let bubble_w = text_w as f32 + style.pad_x * 2.0;
        let bubble_h = text_h as f32 + style.pad_y * 2.0;

        let max_left = (canvas.width() as f32 - bubble_w).max(0.0);
        let left = bbox.left.clamp(0.0, max_left);
        let top = (bbox.top - bubble_h).max(0.0);

        let bubble = RoundedRect::new(left, top, left + bubble_w, top + bubble_h, style.corner);
        fill_rounded_rect(canvas, &bubble, rgba(LABEL_BACKGROUND));
        self.font.draw(
            canvas,
            text,
            (left + style.pad_x) as i32,
            (top + style.pad_y) as i32,
            style.label_text,
            rgb(TEXT),
        );
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn draw_watermark(&self, canvas: &mut RgbImage, text: &str, style: Style) {
        let (text_w, text_h) = self.font.measure(text, style.watermark_text);
        let right = canvas.width() as f32;
        let bottom = canvas.height() as f32;
        let left = right - text_w as f32 - style.watermark_pad * 2.0;
        let top = bottom - text_h as f32 - style.watermark_pad * 2.0;

        let background = RoundedRect::new(left, top, right, bottom, style.watermark_corner);
        fill_rounded_rect(canvas, &background, rgba(WATERMARK_BACKGROUND));
        self.font.draw(
            canvas,
            text,
            (left + style.watermark_pad) as i32,
            (top + style.watermark_pad) as i32,
            style.watermark_text,
            rgb(TEXT),
        );
    }
}
