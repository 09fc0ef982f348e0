//! The `analyze` entry point: candidate iteration, first success wins.

use super::cooldown::Cooldown;
use super::outcome::{AnalysisOutcome, AnalysisStatus, PipelineState, summarize};
use super::source::{FileDecoder, ImageDecoder, ImageRef};
use crate::annotate::Compositor;
use crate::config::{Config, PipelineConfig, PipelineSection};
use crate::constants::{DEFAULT_COOLDOWN_MS, DEFAULT_MARGIN_RATIO};
use crate::detection::{Detector, YoloDetector, suppress};
use crate::error::Result;
use crate::inference::{Species, SpeciesClassifier};
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Orchestrator settings that stay fixed for the pipeline's lifetime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    /// Minimum spacing between accepted `analyze` calls.
    pub cooldown: Duration,
    /// Crop margin around detection boxes.
    pub margin_ratio: f32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_millis(DEFAULT_COOLDOWN_MS),
            margin_ratio: DEFAULT_MARGIN_RATIO,
        }
    }
}

impl PipelineSettings {
    /// Settings from the `[pipeline]` table.
    pub fn from_section(section: &PipelineSection) -> Self {
        Self {
            cooldown: Duration::from_millis(section.cooldown_ms),
            margin_ratio: section.margin_ratio,
        }
    }
}

/// Stateful model sessions, used by one call at a time.
struct Models {
    detector: Box<dyn Detector + Send>,
    dog: SpeciesClassifier,
    cat: SpeciesClassifier,
}

/// Dog and cat analysis pipeline.
///
/// Owns the detector and both classifiers; they are released together when
/// the pipeline is dropped.
pub struct PetPipeline {
    decoder: Box<dyn ImageDecoder + Send + Sync>,
    models: Mutex<Models>,
    compositor: Compositor,
    settings: PipelineSettings,
    cooldown: Cooldown,
    state: Mutex<PipelineState>,
}

impl PetPipeline {
    /// Assemble a pipeline from its collaborators.
    pub fn new(
        decoder: Box<dyn ImageDecoder + Send + Sync>,
        detector: Box<dyn Detector + Send>,
        dog: SpeciesClassifier,
        cat: SpeciesClassifier,
        compositor: Compositor,
        settings: PipelineSettings,
    ) -> Self {
        if dog.species() != Species::Dog || cat.species() != Species::Cat {
            warn!(
                "Classifier species mismatch: dog slot has {}, cat slot has {}",
                dog.species(),
                cat.species()
            );
        }

        Self {
            decoder,
            models: Mutex::new(Models { detector, dog, cat }),
            compositor,
            cooldown: Cooldown::new(settings.cooldown),
            settings,
            state: Mutex::new(PipelineState::Idle),
        }
    }

    /// Load every model named in the config. Relative paths resolve against `base`.
    pub fn from_config(config: &Config, base: Option<&Path>) -> Result<Self> {
        let detector = YoloDetector::from_config(&config.detector, base)?;
        let dog = SpeciesClassifier::from_config(Species::Dog, &config.classifiers.dog, base)?;
        let cat = SpeciesClassifier::from_config(Species::Cat, &config.classifiers.cat, base)?;
        let compositor = Compositor::from_config(&config.render, base)?;

        Ok(Self::new(
            Box::new(FileDecoder::new(config.decode.max_side)),
            Box::new(detector),
            dog,
            cat,
            compositor,
            PipelineSettings::from_section(&config.pipeline),
        ))
    }

    /// Current state.
    pub fn state(&self) -> PipelineState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fixed settings.
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    fn set_state(&self, state: PipelineState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Analyse candidates in order and stop at the first with a surviving detection.
    ///
    /// Returns `None` when the call arrives inside the cooldown window.
    pub fn analyze(&self, images: &[ImageRef], config: &PipelineConfig) -> Option<AnalysisOutcome> {
        if !self.cooldown.try_acquire() {
            debug!("analyze: throttled");
            return None;
        }

        // State changes happen under the models lock so a queued call cannot
        // be overwritten by the one it waited for.
        let mut models = self.models.lock().unwrap_or_else(PoisonError::into_inner);

        if images.is_empty() {
            info!("analyze: no images supplied");
            self.set_state(PipelineState::Error);
            return Some(AnalysisOutcome::no_inputs());
        }

        self.set_state(PipelineState::Analyzing);
        let start = Instant::now();

        let outcome = images
            .iter()
            .enumerate()
            .find_map(|(index, source)| {
                self.analyze_image(&mut models, index, source, config, start)
            })
            .unwrap_or_else(|| {
                let elapsed_ms = elapsed_ms(start);
                info!(
                    "No pet found across {} images in {}ms",
                    images.len(),
                    elapsed_ms
                );
                AnalysisOutcome::no_detection(elapsed_ms)
            });

        self.set_state(outcome.status.into());
        drop(models);
        Some(outcome)
    }

    /// Run one candidate; `None` means move on to the next.
    fn analyze_image(
        &self,
        models: &mut Models,
        index: usize,
        source: &ImageRef,
        config: &PipelineConfig,
        start: Instant,
    ) -> Option<AnalysisOutcome> {
        let name = source.name();

        let image = match self.decoder.decode(source) {
            Ok(image) => image,
            Err(e) => {
                warn!("image[{index}] {name}: decode failed: {e}");
                return None;
            }
        };

        let raw = match models.detector.detect(&image) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("image[{index}] {name}: detection failed: {e}");
                return None;
            }
        };

        let detections = suppress(&raw, config);
        debug!(
            "image[{index}] {name}: {} raw, {} after filter/NMS",
            raw.len(),
            detections.len()
        );
        if detections.is_empty() {
            return None;
        }

        let margin = self.settings.margin_ratio;
        let dog_results = models.dog.classify_detections(&image, &detections, margin);
        let cat_results = models.cat.classify_detections(&image, &detections, margin);

        let elapsed_ms = elapsed_ms(start);
        let annotated = self.compositor.render(
            &image,
            &detections,
            &dog_results,
            &cat_results,
            elapsed_ms,
        );

        let summary = summarize(&detections, &dog_results, &cat_results, index);
        info!("Result: {summary} in {elapsed_ms}ms");

        Some(AnalysisOutcome {
            status: AnalysisStatus::Success,
            annotated_image: Some(annotated),
            detections,
            dog_results,
            cat_results,
            summary,
            elapsed_ms,
            image_index: Some(index),
            source: Some(name),
        })
    }
}

impl std::fmt::Debug for PetPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PetPipeline")
            .field("settings", &self.settings)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
