//! Terminal artifact of one `analyze` call.

use crate::detection::{BoundingBox, Detection};
use crate::inference::{ClassificationResult, Species};
use image::RgbImage;
use serde::Serialize;
use std::fmt::Write;

/// Summary when every candidate was exhausted without a surviving detection.
pub const NO_DETECTION_SUMMARY: &str = "No dog or cat found";

/// Summary when the candidate list is empty.
pub const NO_INPUTS_SUMMARY: &str = "No images supplied";

/// How an analysis ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// A candidate image produced at least one surviving detection.
    Success,
    /// No candidate image produced a surviving detection.
    NoDetection,
    /// The call could not run (no candidates).
    Error,
}

/// Orchestrator state.
///
/// `Idle -> Analyzing -> (Success | NoDetection | Error)`. Terminal states
/// accept a new call exactly like `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// No call made yet.
    #[default]
    Idle,
    /// A call is iterating its candidates.
    Analyzing,
    /// Last call succeeded.
    Success,
    /// Last call found nothing.
    NoDetection,
    /// Last call could not run.
    Error,
}

impl From<AnalysisStatus> for PipelineState {
    fn from(status: AnalysisStatus) -> Self {
        match status {
            AnalysisStatus::Success => Self::Success,
            AnalysisStatus::NoDetection => Self::NoDetection,
            AnalysisStatus::Error => Self::Error,
        }
    }
}

/// Best breed across both species.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrimaryPick {
    /// Species of the winning result.
    pub species: Species,
    /// Breed label.
    pub breed_label: String,
    /// Breed probability.
    pub breed_probability: f32,
    /// Box of the winning detection.
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
}

/// Result returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    /// How the call ended.
    pub status: AnalysisStatus,
    /// Annotated copy of the winning image (success only).
    #[serde(skip)]
    pub annotated_image: Option<RgbImage>,
    /// Surviving detections of the winning image.
    pub detections: Vec<Detection>,
    /// Dog breed results.
    pub dog_results: Vec<ClassificationResult>,
    /// Cat breed results.
    pub cat_results: Vec<ClassificationResult>,
    /// Human-readable summary.
    pub summary: String,
    /// Time from the start of iteration to success or exhaustion.
    pub elapsed_ms: u64,
    /// Index of the winning candidate.
    pub image_index: Option<usize>,
    /// Name of the winning candidate.
    pub source: Option<String>,
}

impl AnalysisOutcome {
    /// Whether any detection survived.
    pub fn detected(&self) -> bool {
        self.status == AnalysisStatus::Success
    }

    /// Highest-probability breed across both species; dogs win ties.
    pub fn primary(&self) -> Option<PrimaryPick> {
        let pick = match (best(&self.dog_results), best(&self.cat_results)) {
            (None, None) => return None,
            (Some(dog), None) => (Species::Dog, dog),
            (None, Some(cat)) => (Species::Cat, cat),
            (Some(dog), Some(cat)) => {
                if dog.breed_probability >= cat.breed_probability {
                    (Species::Dog, dog)
                } else {
                    (Species::Cat, cat)
                }
            }
        };

        Some(PrimaryPick {
            species: pick.0,
            breed_label: pick.1.breed_label.clone(),
            breed_probability: pick.1.breed_probability,
            bbox: pick.1.bbox,
        })
    }

    pub(crate) fn no_inputs() -> Self {
        Self::empty(AnalysisStatus::Error, NO_INPUTS_SUMMARY.to_string(), 0)
    }

    pub(crate) fn no_detection(elapsed_ms: u64) -> Self {
        Self::empty(
            AnalysisStatus::NoDetection,
            NO_DETECTION_SUMMARY.to_string(),
            elapsed_ms,
        )
    }

    fn empty(status: AnalysisStatus, summary: String, elapsed_ms: u64) -> Self {
        Self {
            status,
            annotated_image: None,
            detections: Vec::new(),
            dog_results: Vec::new(),
            cat_results: Vec::new(),
            summary,
            elapsed_ms,
            image_index: None,
            source: None,
        }
    }
}

/// Highest breed probability in `results`; the earliest wins ties.
fn best(results: &[ClassificationResult]) -> Option<&ClassificationResult> {
    results.iter().fold(None, |best, r| match best {
        Some(b) if b.breed_probability >= r.breed_probability => Some(b),
        _ => Some(r),
    })
}

/// One-line description of a successful analysis.
///
/// `Detected: dog 0.90, cat 0.41 | Dog breeds: shiba 0.72 | Cat breeds: tabby 0.55 (image 0)`.
/// Breed sections are omitted when empty.
pub fn summarize(
    detections: &[Detection],
    dog_results: &[ClassificationResult],
    cat_results: &[ClassificationResult],
    image_index: usize,
) -> String {
    let joined = |items: Vec<String>| items.join(", ");

    let mut summary = format!(
        "Detected: {}",
        joined(
            detections
                .iter()
                .map(|d| format!("{} {:.2}", d.label, d.score))
                .collect()
        )
    );

    for (title, results) in [("Dog breeds", dog_results), ("Cat breeds", cat_results)] {
        if results.is_empty() {
            continue;
        }
        let _ = write!(
            summary,
            " | {title}: {}",
            joined(
                results
                    .iter()
                    .map(|r| format!("{} {:.2}", r.breed_label, r.breed_probability))
                    .collect()
            )
        );
    }

    let _ = write!(summary, " (image {image_index})");
    summary
}
