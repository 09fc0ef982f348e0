//! Breed classification: the inference engine seam, ONNX sessions and the
//! per-species classifier.

mod classifier;
mod engine;
pub mod session;
pub mod softmax;

pub use classifier::{
    BreedPrediction, ClassificationResult, ClassifierSettings, Species, SpeciesClassifier,
};
pub use engine::InferenceEngine;
pub use session::OnnxEngine;
