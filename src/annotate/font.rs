//! Label font loading and text measurement.

use crate::error::{Error, Result};
use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::path::Path;

/// Bundled bold sans-serif face (DejaVu Sans Bold, see `assets/fonts`).
static EMBEDDED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

/// Font used for box labels and the watermark.
#[derive(Clone)]
pub struct LabelFont {
    font: FontArc,
    name: String,
}

impl LabelFont {
    /// The bundled font.
    pub fn embedded() -> Result<Self> {
        let font = FontArc::try_from_slice(EMBEDDED_FONT).map_err(|source| Error::FontLoad {
            name: "DejaVu Sans Bold".to_string(),
            source,
        })?;
        Ok(Self {
            font,
            name: "DejaVu Sans Bold".to_string(),
        })
    }

    /// Load a TrueType or OpenType font file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path.display().to_string();
        let font = FontArc::try_from_vec(bytes).map_err(|source| Error::FontLoad {
            name: name.clone(),
            source,
        })?;
        Ok(Self { font, name })
    }

    /// Font name or file path.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rendered width and height of `text` at `px` pixels.
    pub fn measure(&self, text: &str, px: f32) -> (u32, u32) {
        text_size(PxScale::from(px), &self.font, text)
    }

    /// Draw `text` with its top-left corner at `(x, y)`.
    pub fn draw(&self, image: &mut RgbImage, text: &str, x: i32, y: i32, px: f32, color: Rgb<u8>) {
        draw_text_mut(image, color, x, y, PxScale::from(px), &self.font, text);
    }
}

impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelFont").field("name", &self.name).finish_non_exhaustive()
    }
}
