//! CLI argument validators.
//!
//! Shared validation functions for CLI argument parsing.

/// Parse and validate a unit-interval value (0.0-1.0).
pub fn parse_unit(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if !(0.0..=1.0).contains(&value) {
        return Err(format!("value must be between 0.0 and 1.0, got {value}"));
    }

    Ok(value)
}

/// Parse and validate a non-negative pixel length.
pub fn parse_pixels(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if !value.is_finite() || value < 0.0 {
        return Err(format!("pixel size must be a non-negative number, got {value}"));
    }

    Ok(value)
}
