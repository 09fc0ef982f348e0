//! Breed classification for one species.

use super::engine::InferenceEngine;
use super::session::OnnxEngine;
use super::softmax::{argmax, stable_softmax, top_k};
use crate::config::{ClassifierSection, resolve_path};
use crate::constants::{DIAGNOSTIC_TOP_K, UNKNOWN_LABEL, classifier};
use crate::detection::{BoundingBox, Detection};
use crate::error::{Error, Result};
use crate::preprocess::{self, Tensor};
use crate::utils::read_label_table;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// Species with a dedicated breed classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    /// Dogs.
    Dog,
    /// Cats.
    Cat,
}

impl Species {
    /// Detector label for this species.
    pub fn label(self) -> &'static str {
        match self {
            Self::Dog => "dog",
            Self::Cat => "cat",
        }
    }

    /// Whether a detection label belongs to this species (case-insensitive).
    pub fn matches(self, label: &str) -> bool {
        label.eq_ignore_ascii_case(self.label())
    }

    /// Model input side used when the config does not set one.
    pub fn default_input_size(self) -> u32 {
        match self {
            Self::Dog => classifier::DOG_INPUT_SIZE,
            Self::Cat => classifier::CAT_INPUT_SIZE,
        }
    }

    /// Config table holding this species' classifier.
    pub fn config_section(self) -> &'static str {
        match self {
            Self::Dog => "classifiers.dog",
            Self::Cat => "classifiers.cat",
        }
    }
}

impl std::fmt::Display for Species {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-species classifier parameters.
#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    /// Species this classifier handles.
    pub species: Species,
    /// Square input side of the model.
    pub input_size: u32,
    /// Breed names indexed by model output.
    pub labels: Vec<String>,
    /// Minimum top-1 probability for a result to be emitted.
    pub min_probability: f32,
}

impl ClassifierSettings {
    /// Settings with the species defaults and the given label table.
    pub fn new(species: Species, labels: Vec<String>) -> Self {
        Self {
            species,
            input_size: species.default_input_size(),
            labels,
            min_probability: classifier::DEFAULT_MIN_PROBABILITY,
        }
    }
}

/// Top-1 breed from one classifier call.
#[derive(Debug, Clone, PartialEq)]
pub struct BreedPrediction {
    /// Breed label, or `UNKNOWN` if the index has no label.
    pub label: String,
    /// Softmax probability.
    pub probability: f32,
    /// Model output index.
    pub index: usize,
}

/// A breed result tied to the detection it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Box copied from the originating detection.
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    /// Score of the originating detection.
    pub score: f32,
    /// Breed label.
    pub breed_label: String,
    /// Breed probability.
    pub breed_probability: f32,
}

/// Breed classifier for one species, owning its inference engine.
pub struct SpeciesClassifier {
    engine: Box<dyn InferenceEngine + Send>,
    settings: ClassifierSettings,
    width_checked: bool,
}

impl SpeciesClassifier {
    /// Wrap an engine with its settings.
    pub fn new(engine: Box<dyn InferenceEngine + Send>, settings: ClassifierSettings) -> Self {
        Self {
            engine,
            settings,
            width_checked: false,
        }
    }

    /// Load the model and label table named in a `[classifiers.*]` table.
    ///
    /// Relative paths are resolved against `base`.
    pub fn from_config(
        species: Species,
        section: &ClassifierSection,
        base: Option<&Path>,
    ) -> Result<Self> {
        let model_path = section.path.as_deref().ok_or(Error::ModelNotConfigured {
            role: match species {
                Species::Dog => "dog classifier",
                Species::Cat => "cat classifier",
            },
            section: species.config_section(),
        })?;
        let labels_path = section.labels.as_deref().ok_or(Error::ModelNotConfigured {
            role: match species {
                Species::Dog => "dog label table",
                Species::Cat => "cat label table",
            },
            section: species.config_section(),
        })?;

        let labels = read_label_table(&resolve_path(labels_path, base))?;
        let engine = OnnxEngine::from_file(&resolve_path(model_path, base))?;

        let settings = ClassifierSettings {
            species,
            input_size: section
                .input_size
                .unwrap_or_else(|| species.default_input_size()),
            labels,
            min_probability: section.min_probability,
        };

        info!(
            "{} classifier ready: {} labels, input {}x{}",
            species,
            settings.labels.len(),
            settings.input_size,
            settings.input_size
        );

        Ok(Self::new(Box::new(engine), settings))
    }

    /// Species handled by this classifier.
    pub fn species(&self) -> Species {
        self.settings.species
    }

    /// Classifier parameters.
    pub fn settings(&self) -> &ClassifierSettings {
        &self.settings
    }

    /// Run the model on a prepared tensor and return the top-1 breed.
    ///
    /// Returns `Ok(None)` when the top-1 probability is below `min_probability`.
    pub fn classify(&mut self, tensor: Tensor) -> Result<Option<BreedPrediction>> {
        let logits = self.engine.infer(tensor)?;

        if logits.is_empty() {
            return Err(Error::Inference {
                reason: format!("{} classifier returned no logits", self.settings.species),
            });
        }
        if logits.iter().any(|v| !v.is_finite()) {
            return Err(Error::Inference {
                reason: format!(
                    "{} classifier returned non-finite logits",
                    self.settings.species
                ),
            });
        }

        self.check_width(logits.len());

        let probabilities = stable_softmax(&logits);

        let ranked: Vec<String> = top_k(&probabilities, DIAGNOSTIC_TOP_K)
            .into_iter()
            .map(|i| format!("{} {:.3}", self.label_for(i), probabilities[i]))
            .collect();
        debug!("{} top-{}: {}", self.settings.species, DIAGNOSTIC_TOP_K, ranked.join(", "));

        let Some((index, probability)) = argmax(&probabilities) else {
            return Ok(None);
        };

        if probability < self.settings.min_probability {
            debug!(
                "{} top-1 {:.3} below minimum {:.2}",
                self.settings.species, probability, self.settings.min_probability
            );
            return Ok(None);
        }

        Ok(Some(BreedPrediction {
            label: self.label_for(index).to_string(),
            probability,
            index,
        }))
    }

    /// Crop, classify and collect results for every detection of this species.
    ///
    /// Crop and inference failures are logged and skip only that detection.
    pub fn classify_detections(
        &mut self,
        image: &RgbImage,
        detections: &[Detection],
        margin_ratio: f32,
    ) -> Vec<ClassificationResult> {
        let species = self.settings.species;
        let mut results = Vec::new();

        for detection in detections.iter().filter(|d| species.matches(&d.label)) {
            let tensor = match preprocess::prepare(
                image,
                &detection.bbox,
                margin_ratio,
                self.settings.input_size,
            ) {
                Ok(tensor) => tensor,
                Err(e) => {
                    warn!("Skipping {species} crop at {:?}: {e}", detection.bbox);
                    continue;
                }
            };

            match self.classify(tensor) {
                Ok(Some(prediction)) => results.push(ClassificationResult {
                    bbox: detection.bbox,
                    score: detection.score,
                    breed_label: prediction.label,
                    breed_probability: prediction.probability,
                }),
                Ok(None) => {}
                Err(e) => warn!("{species} classification failed: {e}"),
            }
        }

        results
    }

    fn label_for(&self, index: usize) -> &str {
        self.settings
            .labels
            .get(index)
            .map_or(UNKNOWN_LABEL, String::as_str)
    }

    fn check_width(&mut self, width: usize) {
        if self.width_checked {
            return;
        }
        self.width_checked = true;
        if width != self.settings.labels.len() {
            warn!(
                "{} classifier outputs {} classes but its label table has {} entries",
                self.settings.species,
                width,
                self.settings.labels.len()
            );
        }
    }
}

impl std::fmt::Debug for SpeciesClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeciesClassifier")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
