//! Confidence, size and label filtering followed by greedy non-maximum suppression.

use super::Detection;
use crate::config::PipelineConfig;
use tracing::trace;

/// Filter raw detections and remove overlapping duplicates.
///
/// The result is ordered by descending score. Equal scores keep their input
/// order. Boxes are returned untouched; clamping happens at crop and draw time.
pub fn suppress(detections: &[Detection], config: &PipelineConfig) -> Vec<Detection> {
    let filtered: Vec<Detection> = detections
        .iter()
        .filter(|d| passes_filter(d, config))
        .cloned()
        .collect();

    trace!(
        "Suppressor: {} of {} detections passed filtering",
        filtered.len(),
        detections.len()
    );

    let threshold = config.iou_threshold();
    greedy_nms(filtered, |overlap| overlap >= threshold)
}

/// Whether a detection survives the score, label and size checks.
pub fn passes_filter(detection: &Detection, config: &PipelineConfig) -> bool {
    detection.score >= config.score_threshold()
        && config.accepts_label(&detection.label)
        && detection.bbox.width() >= config.min_box_px()
        && detection.bbox.height() >= config.min_box_px()
}

/// Greedy NMS: repeatedly keep the best remaining box and drop the ones it overlaps.
///
/// `suppresses` decides, from the IoU with the kept box, whether a candidate is removed.
pub fn greedy_nms<F>(mut detections: Vec<Detection>, suppresses: F) -> Vec<Detection>
where
    F: Fn(f32) -> bool,
{
    // sort_by is stable, so ties keep input order.
    detections.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    let mut removed = vec![false; detections.len()];

    for i in 0..detections.len() {
        if removed[i] {
            continue;
        }
        let current = &detections[i];
        for j in (i + 1)..detections.len() {
            if !removed[j] && suppresses(current.bbox.iou(&detections[j].bbox)) {
                removed[j] = true;
            }
        }
        kept.push(current.clone());
    }

    kept
}
