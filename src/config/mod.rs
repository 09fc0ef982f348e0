//! Configuration loading and management.

mod file;
mod paths;
mod pipeline;
mod types;
mod validate;

pub use file::{load_config_file, load_default_config, save_config, save_default_config};
pub use paths::{config_dir, config_file_path, resolve_path};
pub use pipeline::PipelineConfig;
pub use types::{
    ClassifierSection, ClassifiersSection, Config, DecodeSection, DetectorSection,
    PipelineSection, RenderSection,
};
pub use validate::validate_config;
