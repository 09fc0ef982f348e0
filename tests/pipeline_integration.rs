//! End-to-end pipeline tests with deterministic model and decoder fakes.

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use image::RgbImage;
use pawscan::annotate::{Compositor, LabelFont};
use pawscan::config::{PipelineConfig, PipelineSection};
use pawscan::detection::{Detection, Detector};
use pawscan::inference::{ClassifierSettings, InferenceEngine, Species, SpeciesClassifier};
use pawscan::pipeline::{
    AnalysisStatus, ImageDecoder, ImageRef, NO_DETECTION_SUMMARY, NO_INPUTS_SUMMARY, PetPipeline,
    PipelineSettings, PipelineState,
};
use pawscan::preprocess::Tensor;
use pawscan::{Error, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Decodes every reference to a blank 640x480 image, except names starting with "broken".
struct BlankDecoder {
    calls: Arc<AtomicUsize>,
}

impl ImageDecoder for BlankDecoder {
    fn decode(&self, source: &ImageRef) -> Result<RgbImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if source.name().starts_with("broken") {
            return Err(Error::Internal {
                message: "truncated file".to_string(),
            });
        }
        Ok(RgbImage::from_pixel(640, 480, image::Rgb([90, 120, 150])))
    }
}

/// Returns one scripted detection list per call, then nothing.
struct ScriptedDetector {
    script: VecDeque<Result<Vec<Detection>>>,
    calls: Arc<AtomicUsize>,
}

impl Detector for ScriptedDetector {
    fn detect(&mut self, _image: &RgbImage) -> Result<Vec<Detection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Returns the same logits for every input and counts calls.
struct FixedEngine {
    logits: Vec<f32>,
    calls: Arc<AtomicUsize>,
}

impl InferenceEngine for FixedEngine {
    fn infer(&mut self, tensor: Tensor) -> Result<Vec<f32>> {
        assert_eq!(tensor.len(), 3 * tensor.size() as usize * tensor.size() as usize);
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.logits.clone())
    }
}

/// Reports entry to `detect` and waits for a release signal before returning nothing.
struct GatedDetector {
    entered: Sender<()>,
    release: Receiver<()>,
}

impl Detector for GatedDetector {
    fn detect(&mut self, _image: &RgbImage) -> Result<Vec<Detection>> {
        self.entered.send(()).unwrap();
        self.release.recv().unwrap();
        Ok(Vec::new())
    }
}

#[derive(Default)]
struct Counters {
    decodes: Arc<AtomicUsize>,
    detects: Arc<AtomicUsize>,
    dog_infers: Arc<AtomicUsize>,
    cat_infers: Arc<AtomicUsize>,
}

fn classifier(
    species: Species,
    labels: &[&str],
    logits: Vec<f32>,
    calls: &Arc<AtomicUsize>,
) -> SpeciesClassifier {
    let mut settings =
        ClassifierSettings::new(species, labels.iter().map(ToString::to_string).collect());
    settings.input_size = 32;
    SpeciesClassifier::new(
        Box::new(FixedEngine {
            logits,
            calls: Arc::clone(calls),
        }),
        settings,
    )
}

fn pipeline_with(
    script: Vec<Result<Vec<Detection>>>,
    cooldown: Duration,
    counters: &Counters,
) -> PetPipeline {
    PetPipeline::new(
        Box::new(BlankDecoder {
            calls: Arc::clone(&counters.decodes),
        }),
        Box::new(ScriptedDetector {
            script: script.into(),
            calls: Arc::clone(&counters.detects),
        }),
        classifier(
            Species::Dog,
            &["beagle", "shiba", "pug"],
            vec![0.1, 4.0, 0.2],
            &counters.dog_infers,
        ),
        classifier(
            Species::Cat,
            &["tabby", "sphynx"],
            vec![3.0, 0.5],
            &counters.cat_infers,
        ),
        Compositor::new(LabelFont::embedded().unwrap()),
        PipelineSettings {
            cooldown,
            ..PipelineSettings::default()
        },
    )
}

fn pipeline(script: Vec<Result<Vec<Detection>>>, counters: &Counters) -> PetPipeline {
    pipeline_with(script, Duration::ZERO, counters)
}

fn images(names: &[&str]) -> Vec<ImageRef> {
    names
        .iter()
        .map(|name| ImageRef::from_bytes(*name, Vec::<u8>::new()))
        .collect()
}

fn config() -> PipelineConfig {
    PipelineConfig::from_section(&PipelineSection::default())
}

#[test]
fn test_scenario_a_overlap_and_low_score_removed() {
    let counters = Counters::default();
    let pipeline = pipeline(
        vec![Ok(vec![
            Detection::new(0.0, 0.0, 100.0, 100.0, 0.9, "dog"),
            Detection::new(5.0, 5.0, 95.0, 95.0, 0.85, "dog"),
            Detection::new(500.0, 400.0, 600.0, 470.0, 0.4, "cat"),
        ])],
        &counters,
    );
    let mut config = config();
    config.set_score_threshold(0.5);
    config.set_iou_threshold(0.45);

    let outcome = pipeline.analyze(&images(&["a.jpg"]), &config).unwrap();

    assert_eq!(outcome.status, AnalysisStatus::Success);
    assert_eq!(outcome.detections.len(), 1);
    assert_eq!(outcome.detections[0].score, 0.9);
    assert_eq!(outcome.dog_results.len(), 1);
    assert_eq!(outcome.dog_results[0].breed_label, "shiba");
    assert!(outcome.cat_results.is_empty());
    assert_eq!(counters.cat_infers.load(Ordering::SeqCst), 0);
}

#[test]
fn test_scenario_b_label_filter() {
    let counters = Counters::default();
    let pipeline = pipeline(
        vec![Ok(vec![
            Detection::new(0.0, 0.0, 200.0, 200.0, 0.99, "dog"),
            Detection::new(300.0, 100.0, 500.0, 300.0, 0.36, "cat"),
        ])],
        &counters,
    );
    let mut config = config();
    config.set_label_filter(["cat"]);
    config.set_score_threshold(0.35);

    let outcome = pipeline.analyze(&images(&["a.jpg"]), &config).unwrap();

    assert_eq!(outcome.detections.len(), 1);
    assert_eq!(outcome.detections[0].label, "cat");
    assert_eq!(outcome.cat_results[0].breed_label, "tabby");
    assert_eq!(counters.dog_infers.load(Ordering::SeqCst), 0);
}

#[test]
fn test_scenario_d_small_box_dropped() {
    let counters = Counters::default();
    let pipeline = pipeline(
        vec![Ok(vec![Detection::new(10.0, 10.0, 20.0, 30.0, 0.99, "dog")])],
        &counters,
    );

    let outcome = pipeline.analyze(&images(&["a.jpg"]), &config()).unwrap();

    assert_eq!(outcome.status, AnalysisStatus::NoDetection);
    assert_eq!(counters.dog_infers.load(Ordering::SeqCst), 0);
}

#[test]
fn test_scenario_e_empty_image_moves_to_next_candidate() {
    let counters = Counters::default();
    let pipeline = pipeline(
        vec![
            Ok(Vec::new()),
            Ok(vec![Detection::new(50.0, 60.0, 250.0, 300.0, 0.8, "cat")]),
        ],
        &counters,
    );

    let outcome = pipeline.analyze(&images(&["empty.jpg", "cat.jpg"]), &config()).unwrap();

    assert_eq!(outcome.status, AnalysisStatus::Success);
    assert_eq!(outcome.image_index, Some(1));
    assert_eq!(outcome.source.as_deref(), Some("cat.jpg"));
    assert_eq!(counters.cat_infers.load(Ordering::SeqCst), 1);
    assert!(outcome.summary.ends_with("(image 1)"));
}

#[test]
fn test_first_success_wins() {
    let counters = Counters::default();
    let pipeline = pipeline(
        vec![
            Ok(vec![Detection::new(0.0, 0.0, 200.0, 200.0, 0.9, "dog")]),
            Ok(vec![Detection::new(0.0, 0.0, 200.0, 200.0, 0.9, "cat")]),
        ],
        &counters,
    );

    let outcome = pipeline
        .analyze(&images(&["one.jpg", "two.jpg", "three.jpg"]), &config())
        .unwrap();

    assert_eq!(outcome.image_index, Some(0));
    assert_eq!(counters.decodes.load(Ordering::SeqCst), 1);
    assert_eq!(counters.detects.load(Ordering::SeqCst), 1);
    assert_eq!(counters.cat_infers.load(Ordering::SeqCst), 0);
}

#[test]
fn test_decode_failure_continues() {
    let counters = Counters::default();
    let pipeline = pipeline(
        vec![Ok(vec![Detection::new(0.0, 0.0, 200.0, 200.0, 0.9, "dog")])],
        &counters,
    );

    let outcome = pipeline
        .analyze(&images(&["broken.jpg", "good.jpg"]), &config())
        .unwrap();

    assert_eq!(outcome.status, AnalysisStatus::Success);
    assert_eq!(outcome.image_index, Some(1));
    assert_eq!(counters.decodes.load(Ordering::SeqCst), 2);
    assert_eq!(counters.detects.load(Ordering::SeqCst), 1);
}

#[test]
fn test_detector_failure_continues() {
    let counters = Counters::default();
    let pipeline = pipeline(
        vec![
            Err(Error::Inference {
                reason: "session crashed".to_string(),
            }),
            Ok(vec![Detection::new(0.0, 0.0, 200.0, 200.0, 0.9, "dog")]),
        ],
        &counters,
    );

    let outcome = pipeline.analyze(&images(&["a.jpg", "b.jpg"]), &config()).unwrap();

    assert_eq!(outcome.image_index, Some(1));
}

#[test]
fn test_all_images_fail_is_no_detection() {
    let counters = Counters::default();
    let pipeline = pipeline(Vec::new(), &counters);

    let outcome = pipeline
        .analyze(&images(&["broken-1.jpg", "broken-2.jpg"]), &config())
        .unwrap();

    assert_eq!(outcome.status, AnalysisStatus::NoDetection);
    assert_eq!(outcome.summary, NO_DETECTION_SUMMARY);
    assert!(outcome.annotated_image.is_none());
    assert!(outcome.image_index.is_none());
    assert_eq!(pipeline.state(), PipelineState::NoDetection);
}

#[test]
fn test_empty_candidate_list_is_error() {
    let counters = Counters::default();
    let pipeline = pipeline(Vec::new(), &counters);

    let outcome = pipeline.analyze(&[], &config()).unwrap();

    assert_eq!(outcome.status, AnalysisStatus::Error);
    assert_eq!(outcome.summary, NO_INPUTS_SUMMARY);
    assert_eq!(pipeline.state(), PipelineState::Error);
    assert_eq!(counters.decodes.load(Ordering::SeqCst), 0);
}

#[test]
fn test_state_transitions() {
    let counters = Counters::default();
    let pipeline = pipeline(
        vec![Ok(vec![Detection::new(0.0, 0.0, 200.0, 200.0, 0.9, "dog")])],
        &counters,
    );
    assert_eq!(pipeline.state(), PipelineState::Idle);

    pipeline.analyze(&images(&["a.jpg"]), &config()).unwrap();
    assert_eq!(pipeline.state(), PipelineState::Success);

    // Terminal states accept a new call.
    pipeline.analyze(&images(&["b.jpg"]), &config()).unwrap();
    assert_eq!(pipeline.state(), PipelineState::NoDetection);
}

#[test]
fn test_annotated_image_is_a_copy() {
    let counters = Counters::default();
    let pipeline = pipeline(
        vec![Ok(vec![Detection::new(100.0, 100.0, 300.0, 300.0, 0.9, "dog")])],
        &counters,
    );

    let outcome = pipeline.analyze(&images(&["a.jpg"]), &config()).unwrap();
    let annotated = outcome.annotated_image.unwrap();

    assert_eq!(annotated.dimensions(), (640, 480));
    assert_ne!(*annotated.get_pixel(200, 200), image::Rgb([90, 120, 150]));
}

#[test]
fn test_low_probability_breed_is_dropped() {
    let counters = Counters::default();
    let pipeline = PetPipeline::new(
        Box::new(BlankDecoder {
            calls: Arc::clone(&counters.decodes),
        }),
        Box::new(ScriptedDetector {
            script: vec![Ok(vec![Detection::new(0.0, 0.0, 200.0, 200.0, 0.9, "dog")])].into(),
            calls: Arc::clone(&counters.detects),
        }),
        classifier(
            Species::Dog,
            &["a", "b", "c", "d", "e"],
            vec![0.0; 5],
            &counters.dog_infers,
        ),
        classifier(Species::Cat, &["tabby"], vec![1.0], &counters.cat_infers),
        Compositor::new(LabelFont::embedded().unwrap()),
        PipelineSettings {
            cooldown: Duration::ZERO,
            ..PipelineSettings::default()
        },
    );

    let outcome = pipeline.analyze(&images(&["a.jpg"]), &config()).unwrap();

    assert_eq!(outcome.status, AnalysisStatus::Success);
    assert_eq!(outcome.detections.len(), 1);
    assert!(outcome.dog_results.is_empty());
    assert!(outcome.primary().is_none());
}

#[test]
fn test_cooldown_drops_rapid_second_call() {
    let counters = Counters::default();
    let pipeline = pipeline_with(Vec::new(), Duration::from_millis(350), &counters);

    assert!(pipeline.analyze(&images(&["a.jpg"]), &config()).is_some());
    assert!(pipeline.analyze(&images(&["a.jpg"]), &config()).is_none());
    assert_eq!(counters.decodes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_concurrent_calls_single_winner() {
    let counters = Counters::default();
    let pipeline = pipeline_with(Vec::new(), Duration::from_secs(60), &counters);
    let accepted = Mutex::new(0_usize);

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                if pipeline.analyze(&images(&["a.jpg"]), &config()).is_some() {
                    *accepted.lock().unwrap() += 1;
                }
            });
        }
    });

    assert_eq!(*accepted.lock().unwrap(), 1);
    assert_eq!(counters.decodes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_queued_call_keeps_analyzing_state() {
    let counters = Counters::default();
    let (entered_tx, entered_rx) = channel();
    let (release_tx, release_rx) = channel();
    let pipeline = PetPipeline::new(
        Box::new(BlankDecoder {
            calls: Arc::clone(&counters.decodes),
        }),
        Box::new(GatedDetector {
            entered: entered_tx,
            release: release_rx,
        }),
        classifier(Species::Dog, &["pug"], vec![1.0], &counters.dog_infers),
        classifier(Species::Cat, &["tabby"], vec![1.0], &counters.cat_infers),
        Compositor::new(LabelFont::embedded().unwrap()),
        PipelineSettings {
            cooldown: Duration::ZERO,
            ..PipelineSettings::default()
        },
    );

    std::thread::scope(|scope| {
        let first = scope.spawn(|| pipeline.analyze(&images(&["a.jpg"]), &config()));
        entered_rx.recv().unwrap();
        assert_eq!(pipeline.state(), PipelineState::Analyzing);

        let second = scope.spawn(|| pipeline.analyze(&images(&["b.jpg"]), &config()));
        // Let the second call queue up behind the first.
        std::thread::sleep(Duration::from_millis(50));
        release_tx.send(()).unwrap();
        assert_eq!(
            first.join().unwrap().unwrap().status,
            AnalysisStatus::NoDetection
        );

        entered_rx.recv().unwrap();
        assert_eq!(pipeline.state(), PipelineState::Analyzing);
        release_tx.send(()).unwrap();
        assert!(second.join().unwrap().is_some());
    });

    assert_eq!(pipeline.state(), PipelineState::NoDetection);
}
