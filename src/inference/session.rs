//! ONNX Runtime sessions.

use super::engine::InferenceEngine;
use crate::error::{Error, Result};
use crate::preprocess::Tensor;
use ort::session::Session;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Intra-op threads per session.
const INTRA_THREADS: usize = 4;

/// Load a model file into a CPU session.
pub fn build_session(path: &Path) -> Result<Session> {
    if !path.exists() {
        return Err(Error::ModelFileNotFound {
            path: path.to_path_buf(),
        });
    }

    let session = Session::builder()
        .map_err(|e| build_error(path, e))?
        .with_intra_threads(INTRA_THREADS)
        .map_err(|e| build_error(path, e))?
        .commit_from_file(path)
        .map_err(|e| build_error(path, e))?;

    info!("Loaded model: {}", path.display());
    Ok(session)
}

fn build_error(path: &Path, e: impl std::fmt::Display) -> Error {
    Error::SessionBuild {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

/// Run a single-input session on an NCHW float buffer.
///
/// Returns the first output's shape and values.
pub fn run_nchw(
    session: &mut Session,
    shape: [usize; 4],
    data: Vec<f32>,
) -> Result<(Vec<i64>, Vec<f32>)> {
    let input =
        ort::value::Tensor::from_array((shape.to_vec(), data)).map_err(|e| Error::Inference {
            reason: format!("failed to create input tensor: {e}"),
        })?;

    let outputs = session
        .run(ort::inputs![input])
        .map_err(|e| Error::Inference {
            reason: e.to_string(),
        })?;

    let output = outputs.values().next().ok_or_else(|| Error::Inference {
        reason: "model produced no outputs".to_string(),
    })?;

    let (out_shape, values) = output
        .try_extract_tensor::<f32>()
        .map_err(|e| Error::Inference {
            reason: format!("failed to extract output tensor: {e}"),
        })?;

    Ok((out_shape.to_vec(), values.to_vec()))
}

/// Classification engine backed by an ONNX Runtime session.
pub struct OnnxEngine {
    session: Session,
    path: PathBuf,
}

impl OnnxEngine {
    /// Load the model at `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self {
            session: build_session(path)?,
            path: path.to_path_buf(),
        })
    }

    /// Model file this engine was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl InferenceEngine for OnnxEngine {
    fn infer(&mut self, tensor: Tensor) -> Result<Vec<f32>> {
        let shape = tensor.shape();
        let (out_shape, logits) = run_nchw(&mut self.session, shape, tensor.into_data())?;
        debug!("{}: output shape {:?}", self.path.display(), out_shape);
        Ok(logits)
    }
}

impl std::fmt::Debug for OnnxEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEngine").field("path", &self.path).finish_non_exhaustive()
    }
}
