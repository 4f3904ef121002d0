//! Tensor implementation
//!
//! This module provides the core `Tensor` type, an N-dimensional array in
//! row-major order. Checkpoint tensors are immutable once constructed; the
//! only derived form is `transposed()`, which produces a new tensor rather
//! than a view, so no aliasing ever crosses the checkpoint/model boundary.

use num_traits::Num;

use crate::error::{InjertarError, Result};

/// N-dimensional tensor in row-major order
///
/// # Examples
///
/// ```
/// use injertar::Tensor;
///
/// let t = Tensor::from_vec(vec![2, 3], vec![
///     1.0, 2.0, 3.0,
///     4.0, 5.0, 6.0,
/// ]).unwrap();
///
/// assert_eq!(t.shape(), &[2, 3]);
/// assert_eq!(t.ndim(), 2);
/// assert_eq!(t.size(), 6);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T: Num> {
    /// Flattened data in row-major order
    data: Vec<T>,
    /// Shape of the tensor
    shape: Vec<usize>,
}

impl<T: Num + Clone> Tensor<T> {
    /// Create a new tensor from a vector and shape
    ///
    /// # Arguments
    ///
    /// * `shape` - Dimensions of the tensor
    /// * `data` - Flattened data in row-major order
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - Shape is empty
    /// - Shape contains zero
    /// - Data size doesn't match shape
    pub fn from_vec(shape: Vec<usize>, data: Vec<T>) -> Result<Self> {
        if shape.is_empty() {
            return Err(InjertarError::InvalidShape {
                reason: "Shape cannot be empty".to_string(),
            });
        }

        if shape.contains(&0) {
            return Err(InjertarError::InvalidShape {
                reason: "Shape dimensions cannot be zero".to_string(),
            });
        }

        let expected_size: usize = shape.iter().product();
        if data.len() != expected_size {
            return Err(InjertarError::InvalidShape {
                reason: format!(
                    "Data size {} doesn't match shape {:?} (expected {})",
                    data.len(),
                    shape,
                    expected_size
                ),
            });
        }

        Ok(Self { data, shape })
    }

    /// Get the shape of the tensor
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get the number of dimensions
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Get the total number of elements
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Get the flattened data in row-major order
    #[must_use]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Consume the tensor and return its flattened data
    #[must_use]
    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    /// Produce the transposed copy of a 2-D tensor
    ///
    /// A `[rows, cols]` tensor becomes `[cols, rows]` with every element
    /// moved, not merely a reinterpreted stride. TensorFlow stores dense
    /// kernels as `[in_features, out_features]` while this crate's
    /// parameters are `[out_features, in_features]`, so kernel tensors go
    /// through this before assignment.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the tensor is not 2-dimensional.
    ///
    /// # Examples
    ///
    /// ```
    /// use injertar::Tensor;
    ///
    /// let t = Tensor::from_vec(vec![2, 3], vec![1, 2, 3, 4, 5, 6]).unwrap();
    /// let tt = t.transposed().unwrap();
    /// assert_eq!(tt.shape(), &[3, 2]);
    /// assert_eq!(tt.data(), &[1, 4, 2, 5, 3, 6]);
    /// ```
    pub fn transposed(&self) -> Result<Self> {
        if self.shape.len() != 2 {
            return Err(InjertarError::InvalidShape {
                reason: format!(
                    "Transpose requires a 2-D tensor, got {} dimensions",
                    self.shape.len()
                ),
            });
        }

        let rows = self.shape[0];
        let cols = self.shape[1];
        let mut data = vec![T::zero(); self.data.len()];
        for i in 0..rows {
            for j in 0..cols {
                data[j * rows + i] = self.data[i * cols + j].clone();
            }
        }

        Ok(Self {
            data,
            shape: vec![cols, rows],
        })
    }
}
