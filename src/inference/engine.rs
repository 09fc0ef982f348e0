//! Inference engine seam between classifiers and the model runtime.

use crate::error::Result;
use crate::preprocess::Tensor;

/// Runs a fixed-shape classification model forward pass.
///
/// Sessions are stateful and not reentrant, so callers need exclusive access.
pub trait InferenceEngine {
    /// Consume `tensor` and return the raw logits.
    fn infer(&mut self, tensor: Tensor) -> Result<Vec<f32>>;
}

impl<E: InferenceEngine + ?Sized> InferenceEngine for Box<E> {
    fn infer(&mut self, tensor: Tensor) -> Result<Vec<f32>> {
        (**self).infer(tensor)
    }
}
