//! Error types for pawscan.

/// Result type alias for pawscan operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for pawscan.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// A model required for analysis is not configured.
    #[error("no {role} model configured (set [{section}] path in the config file)")]
    ModelNotConfigured {
        /// Human-readable role of the model (e.g. "detector").
        role: &'static str,
        /// Config section that should hold the model path.
        section: &'static str,
    },

    /// Model file does not exist.
    #[error("model file does not exist: {path}")]
    ModelFileNotFound {
        /// Path to the missing model file.
        path: std::path::PathBuf,
    },

    /// Failed to read a label table.
    #[error("failed to read label file '{path}'")]
    LabelsRead {
        /// Path to the label file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to build an inference session.
    #[error("failed to build inference session for '{path}': {reason}")]
    SessionBuild {
        /// Path to the model file.
        path: std::path::PathBuf,
        /// Description of the build failure.
        reason: String,
    },

    /// Inference failed.
    #[error("inference failed: {reason}")]
    Inference {
        /// Description of the inference failure.
        reason: String,
    },

    /// Model output had an unexpected layout.
    #[error("unexpected model output shape {shape:?}")]
    UnexpectedOutputShape {
        /// Shape reported by the runtime.
        shape: Vec<i64>,
    },

    /// Failed to decode an image.
    #[error("failed to decode image '{source_name}'")]
    ImageDecode {
        /// Display name of the image reference.
        source_name: String,
        /// Underlying image error.
        #[source]
        source: image::ImageError,
    },

    /// Region of interest collapsed to nothing.
    #[error("cannot crop a {width}x{height} image")]
    EmptyRegion {
        /// Width of the source image.
        width: u32,
        /// Height of the source image.
        height: u32,
    },

    /// Tensor buffer length does not match its declared shape.
    #[error("tensor of size {size} expects {expected} values, got {actual}")]
    TensorShape {
        /// Declared square side.
        size: u32,
        /// Expected number of values.
        expected: usize,
        /// Actual number of values.
        actual: usize,
    },

    /// Failed to load the label font.
    #[error("failed to load font '{name}'")]
    FontLoad {
        /// Font file path or name.
        name: String,
        /// Underlying font error.
        #[source]
        source: ab_glyph::InvalidFont,
    },

    /// Failed to write an image file.
    #[error("failed to write image '{path}'")]
    ImageWrite {
        /// Output path.
        path: std::path::PathBuf,
        /// Underlying image error.
        #[source]
        source: image::ImageError,
    },

    /// Failed to write the JSON report.
    #[error("failed to write JSON report")]
    ReportWrite {
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// No image inputs were given on the command line.
    #[error("no input images given")]
    NoInputs,

    /// Internal error (for unexpected failures).
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}
