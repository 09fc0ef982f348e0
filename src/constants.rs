//! Application-wide constants.
//!
//! Thresholds, model input sizes and normalisation values live here so the
//! pipeline and its tests agree on them.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "pawscan";

/// Default minimum detection confidence.
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.35;

/// Default IoU cutoff for non-maximum suppression.
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.45;

/// Default minimum box width and height in pixels.
pub const DEFAULT_MIN_BOX_PX: f32 = 12.0;

/// Labels accepted by default.
pub const DEFAULT_LABEL_FILTER: [&str; 2] = ["cat", "dog"];

/// Minimum time between two accepted pipeline invocations.
pub const DEFAULT_COOLDOWN_MS: u64 = 350;

/// Margin added around a detection box before cropping, as a fraction of its size.
pub const DEFAULT_MARGIN_RATIO: f32 = 0.15;

/// Label used when a classifier index has no entry in the label table.
pub const UNKNOWN_LABEL: &str = "UNKNOWN";

/// File extensions picked up when a directory is given as input.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Number of ranked classes logged for diagnostics.
pub const DIAGNOSTIC_TOP_K: usize = 5;

/// Region preprocessing constants shared with the trained classifiers.
pub mod preprocess {
    /// Shorter side is resized to `target_size + RESIZE_MARGIN` before center-cropping.
    ///
    /// Matches the training-time transform. Changing it breaks compatibility
    /// with the shipped classifier weights.
    pub const RESIZE_MARGIN: u32 = 32;

    /// Number of colour channels in a classifier tensor.
    pub const CHANNELS: usize = 3;

    /// `ImageNet` per-channel mean (R, G, B).
    pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];

    /// `ImageNet` per-channel standard deviation (R, G, B).
    pub const STD: [f32; 3] = [0.229, 0.224, 0.225];
}

/// Species classifier defaults.
pub mod classifier {
    /// Minimum top-1 probability for a breed to be reported.
    pub const DEFAULT_MIN_PROBABILITY: f32 = 0.30;

    /// Dog breed model input side.
    pub const DOG_INPUT_SIZE: u32 = 456;

    /// Cat breed model input side.
    pub const CAT_INPUT_SIZE: u32 = 224;
}

/// Association of breed results back to detection boxes.
pub mod fusion {
    /// A breed result is attached only when its IoU with the box exceeds this.
    pub const ASSOCIATION_IOU: f32 = 0.3;
}

/// Detector defaults.
pub mod detector {
    /// Default square model input side.
    pub const DEFAULT_INPUT_SIZE: u32 = 640;

    /// Raw score below which candidate boxes are discarded inside the detector.
    pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.25;

    /// Detector-local NMS cutoff.
    pub const DEFAULT_IOU_THRESHOLD: f32 = 0.5;

    /// Maximum boxes returned per image.
    pub const DEFAULT_MAX_DETECTIONS: usize = 30;

    /// Boxes with a side shorter than this (in source pixels) are dropped.
    pub const MIN_BOX_SIDE_PX: f32 = 12.0;

    /// COCO class index of "cat".
    pub const COCO_CAT: usize = 15;

    /// COCO class index of "dog".
    pub const COCO_DOG: usize = 16;

    /// Heads with at least this many classes are treated as COCO models.
    pub const COCO_MIN_CLASSES: usize = 80;
}

/// Decoding defaults.
pub mod decode {
    /// Decoded images are downscaled so their long side does not exceed this.
    pub const DEFAULT_MAX_SIDE: u32 = 1280;
}

/// Overlay styling, expressed relative to the image width.
pub mod render {
    /// Box fill colour (RGBA).
    pub const BOX_FILL: [u8; 4] = [0, 153, 255, 90];
    /// Box outline colour (RGBA).
    pub const BOX_STROKE: [u8; 4] = [0, 153, 255, 230];
    /// Label bubble colour (RGBA).
    pub const LABEL_BACKGROUND: [u8; 4] = [0, 0, 0, 190];
    /// Watermark background colour (RGBA).
    pub const WATERMARK_BACKGROUND: [u8; 4] = [0, 0, 0, 160];
    /// Text colour (RGBA).
    pub const TEXT: [u8; 4] = [255, 255, 255, 255];

    /// Minimum outline width in pixels.
    pub const MIN_STROKE: f32 = 3.0;
    /// Outline width as a fraction of image width.
    pub const STROKE_RATIO: f32 = 0.004;
    /// Minimum label text height in pixels.
    pub const MIN_LABEL_TEXT: f32 = 22.0;
    /// Label text height as a fraction of image width.
    pub const LABEL_TEXT_RATIO: f32 = 0.035;
    /// Minimum horizontal label padding.
    pub const MIN_PAD_X: f32 = 10.0;
    /// Horizontal label padding as a fraction of image width.
    pub const PAD_X_RATIO: f32 = 0.010;
    /// Minimum vertical label padding.
    pub const MIN_PAD_Y: f32 = 6.0;
    /// Vertical label padding as a fraction of image width.
    pub const PAD_Y_RATIO: f32 = 0.006;
    /// Minimum corner radius.
    pub const MIN_CORNER: f32 = 8.0;
    /// Corner radius as a fraction of image width.
    pub const CORNER_RATIO: f32 = 0.012;

    /// Minimum watermark text height in pixels.
    pub const MIN_WATERMARK_TEXT: f32 = 20.0;
    /// Watermark text height as a fraction of image width.
    pub const WATERMARK_TEXT_RATIO: f32 = 0.025;
    /// Minimum watermark padding.
    pub const MIN_WATERMARK_PAD: f32 = 10.0;
    /// Watermark padding as a fraction of image width.
    pub const WATERMARK_PAD_RATIO: f32 = 0.012;
    /// Watermark corner radius as a fraction of image width.
    pub const WATERMARK_CORNER_RATIO: f32 = 0.01;
    /// Watermark timestamp format.
    pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
}
