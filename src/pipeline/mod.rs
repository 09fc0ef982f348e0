//! Analysis pipeline: candidate sources, throttling and orchestration.

mod cooldown;
mod orchestrator;
mod outcome;
mod source;

pub use cooldown::Cooldown;
pub use orchestrator::{PetPipeline, PipelineSettings};
pub use outcome::{
    AnalysisOutcome, AnalysisStatus, NO_DETECTION_SUMMARY, NO_INPUTS_SUMMARY, PipelineState,
    PrimaryPick, summarize,
};
pub use source::{FileDecoder, ImageDecoder, ImageRef, collect_image_files, is_image_file};
