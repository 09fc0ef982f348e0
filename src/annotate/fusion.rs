//! Association of breed results back to detection boxes.

use crate::constants::fusion::ASSOCIATION_IOU;
use crate::detection::{BoundingBox, Detection};
use crate::inference::{ClassificationResult, Species};

/// Breed annotation for one detection box.
#[derive(Debug, Clone, PartialEq)]
pub enum BreedMatch {
    /// A breed result overlapping the box.
    Matched {
        /// Breed label.
        label: String,
        /// Breed probability.
        probability: f32,
    },
    /// No result overlaps the box enough; draw without breed text.
    Unmatched,
}

/// A detection to draw, with its optional breed.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation<'a> {
    /// Detection being drawn.
    pub detection: &'a Detection,
    /// Breed attached to it.
    pub breed: BreedMatch,
}

/// Pick the candidate with the highest IoU to `bbox`.
///
/// The match is accepted only if that IoU is strictly above the association
/// threshold. On equal IoU the earlier candidate wins.
pub fn match_breed(bbox: &BoundingBox, candidates: &[ClassificationResult]) -> BreedMatch {
    let mut best: Option<(&ClassificationResult, f32)> = None;
    for candidate in candidates {
        let overlap = bbox.iou(&candidate.bbox);
        if best.is_none_or(|(_, best_overlap)| overlap > best_overlap) {
            best = Some((candidate, overlap));
        }
    }

    match best {
        Some((candidate, overlap)) if overlap > ASSOCIATION_IOU => BreedMatch::Matched {
            label: candidate.breed_label.clone(),
            probability: candidate.breed_probability,
        },
        _ => BreedMatch::Unmatched,
    }
}

/// Attach at most one breed to every detection, using the results of the
/// detection's own species.
pub fn plan_annotations<'a>(
    detections: &'a [Detection],
    dog_results: &[ClassificationResult],
    cat_results: &[ClassificationResult],
) -> Vec<Annotation<'a>> {
    detections
        .iter()
        .map(|detection| {
            let candidates = if Species::Dog.matches(&detection.label) {
                dog_results
            } else if Species::Cat.matches(&detection.label) {
                cat_results
            } else {
                &[]
            };
            Annotation {
                detection,
                breed: match_breed(&detection.bbox, candidates),
            }
        })
        .collect()
}
