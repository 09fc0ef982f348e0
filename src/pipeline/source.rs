//! Candidate image references and decoding.

use crate::constants::IMAGE_EXTENSIONS;
use crate::error::{Error, Result};
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// An opaque reference to a candidate image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Image file on disk.
    Path(PathBuf),
    /// Encoded image bytes already in memory.
    Memory {
        /// Display name used in logs.
        name: String,
        /// Encoded bytes (JPEG, PNG).
        bytes: Arc<[u8]>,
    },
}

impl ImageRef {
    /// Reference encoded bytes under a display name.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Memory {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Name for logs and reports.
    pub fn name(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Memory { name, .. } => name.clone(),
        }
    }
}

impl From<PathBuf> for ImageRef {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ImageRef {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

/// Turns an image reference into an RGB raster.
pub trait ImageDecoder {
    /// Decode `source`, failing if it is unreadable or not an image.
    fn decode(&self, source: &ImageRef) -> Result<RgbImage>;
}

/// Decoder for files and in-memory bytes using the `image` crate.
///
/// Images whose long side exceeds `max_side` are downscaled, keeping aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileDecoder {
    max_side: u32,
}

impl Default for FileDecoder {
    fn default() -> Self {
        Self::new(crate::constants::decode::DEFAULT_MAX_SIDE)
    }
}

impl FileDecoder {
    /// Decoder with the given long-side limit (at least 1).
    pub fn new(max_side: u32) -> Self {
        Self {
            max_side: max_side.max(1),
        }
    }

    /// Long-side limit.
    pub fn max_side(&self) -> u32 {
        self.max_side
    }

    fn limit_size(&self, image: DynamicImage) -> DynamicImage {
        let (width, height) = (image.width(), image.height());
        if width.max(height) <= self.max_side {
            return image;
        }
        let resized = image.resize(self.max_side, self.max_side, FilterType::Triangle);
        debug!(
            "Downscaled {}x{} to {}x{}",
            width,
            height,
            resized.width(),
            resized.height()
        );
        resized
    }
}

impl ImageDecoder for FileDecoder {
    fn decode(&self, source: &ImageRef) -> Result<RgbImage> {
        let decoded = match source {
            ImageRef::Path(path) => image::open(path),
            ImageRef::Memory { bytes, .. } => image::load_from_memory(bytes),
        }
        .map_err(|e| Error::ImageDecode {
            source_name: source.name(),
            source: e,
        })?;

        Ok(self.limit_size(decoded).to_rgb8())
    }
}

/// Whether a path has a supported image extension.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Expand input paths into candidate images, in order.
///
/// Files are kept as given; directories contribute their image files sorted
/// by name (not recursive). Missing paths are skipped with a warning.
pub fn collect_image_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_image_file(p))
                .collect();
            entries.sort();
            files.extend(entries);
        } else {
            warn!("Skipping non-existent path: {}", path.display());
        }
    }

    Ok(files)
}
