//! Configuration validation.

use crate::config::{ClassifierSection, Config};
use crate::error::{Error, Result};

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_pipeline(config)?;
    validate_detector(config)?;
    validate_classifier("classifiers.dog", &config.classifiers.dog)?;
    validate_classifier("classifiers.cat", &config.classifiers.cat)?;

    if config.decode.max_side == 0 {
        return Err(invalid("decode.max_side must be at least 1".to_string()));
    }

    Ok(())
}

fn invalid(message: String) -> Error {
    Error::ConfigValidation { message }
}

fn check_unit(name: &str, value: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(format!(
            "{name} must be between 0.0 and 1.0, got {value}"
        )));
    }
    Ok(())
}

/// Validate `[pipeline]`.
fn validate_pipeline(config: &Config) -> Result<()> {
    let pipeline = &config.pipeline;

    check_unit("pipeline.score_threshold", pipeline.score_threshold)?;
    check_unit("pipeline.iou_threshold", pipeline.iou_threshold)?;
    check_unit("pipeline.margin_ratio", pipeline.margin_ratio)?;

    if pipeline.min_box_px.is_nan() || pipeline.min_box_px < 0.0 {
        return Err(invalid(format!(
            "pipeline.min_box_px must be non-negative, got {}",
            pipeline.min_box_px
        )));
    }

    Ok(())
}

/// Validate `[detector]`.
fn validate_detector(config: &Config) -> Result<()> {
    let detector = &config.detector;

    check_unit("detector.score_threshold", detector.score_threshold)?;
    check_unit("detector.iou_threshold", detector.iou_threshold)?;

    if detector.input_size == 0 {
        return Err(invalid("detector.input_size must be at least 1".to_string()));
    }

    if detector.max_detections == 0 {
        return Err(invalid(
            "detector.max_detections must be at least 1".to_string(),
        ));
    }

    Ok(())
}

/// Validate one `[classifiers.*]` table.
fn validate_classifier(section_name: &str, section: &ClassifierSection) -> Result<()> {
    check_unit(
        &format!("{section_name}.min_probability"),
        section.min_probability,
    )?;

    if section.input_size == Some(0) {
        return Err(invalid(format!(
            "{section_name}.input_size must be at least 1"
        )));
    }

    Ok(())
}
