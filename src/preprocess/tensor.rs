//! Classifier input tensor.

use crate::constants::preprocess::CHANNELS;
use crate::error::{Error, Result};

/// A `(3, size, size)` float buffer in channel-major order.
///
/// Built once per detection and moved into the classifier, which consumes it.
#[derive(Debug, PartialEq)]
pub struct Tensor {
    size: u32,
    data: Vec<f32>,
}

impl Tensor {
    /// Wrap a channel-major buffer, checking its length against `size`.
    pub fn from_chw(size: u32, data: Vec<f32>) -> Result<Self> {
        let expected = Self::expected_len(size);
        if data.len() != expected {
            return Err(Error::TensorShape {
                size,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { size, data })
    }

    /// Number of values a tensor of the given side holds.
    pub fn expected_len(size: u32) -> usize {
        let side = size as usize;
        CHANNELS * side * side
    }

    /// Square side of the tensor.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// NCHW shape with a batch of one.
    pub fn shape(&self) -> [usize; 4] {
        let side = self.size as usize;
        [1, CHANNELS, side, side]
    }

    /// Flat view of the values.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the tensor holds no values (size 0).
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Give up the buffer.
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_chw_accepts_exact_length() {
        let tensor = Tensor::from_chw(4, vec![0.0; 48]);
        assert!(tensor.is_ok());
        if let Ok(tensor) = tensor {
            assert_eq!(tensor.shape(), [1, 3, 4, 4]);
            assert_eq!(tensor.len(), 48);
        }
    }

    #[test]
    fn test_from_chw_rejects_wrong_length() {
        let result = Tensor::from_chw(4, vec![0.0; 47]);
        assert!(matches!(
            result,
            Err(Error::TensorShape {
                size: 4,
                expected: 48,
                actual: 47
            })
        ));
    }

    #[test]
    fn test_into_data_returns_the_same_buffer() {
        let data = vec![0.5; 12];
        let ptr = data.as_ptr();
        let tensor = Tensor::from_chw(2, data).unwrap();
        let back = tensor.into_data();
        assert_eq!(back.as_ptr(), ptr);
        assert_eq!(back.len(), 12);
    }
}
