//! Label table file reading.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Read a classifier label table.
///
/// # File Format
/// - One label per line; line `i` names model output `i`
/// - Surrounding whitespace is trimmed
/// - Trailing blank lines are dropped, inner blank lines are kept so indices
///   stay aligned with the model output
pub fn read_label_table(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| Error::LabelsRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut labels = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| Error::LabelsRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        labels.push(line.trim().to_string());
    }

    while labels.last().is_some_and(String::is_empty) {
        labels.pop();
    }

    Ok(labels)
}
