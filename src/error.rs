//! Error types for the quaternion-array library
//!
//! This module provides the main error and result types used throughout the library.
//! All errors use the `thiserror` crate for automatic trait implementations.
//!
//! Errors are raised eagerly at the point where an invalid value is encountered. A
//! batched operation never returns partial results: it either succeeds for every
//! element or fails as a whole, reporting the first failing element (row-major order)
//! through [`QuaternionError::Element`].

use thiserror::Error;

/// Main result type used throughout the quaternion-array library
pub type QuaternionResult<T> = Result<T, QuaternionError>;

/// Main error type for the quaternion-array library
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuaternionError {
    /// Two batch shapes cannot be broadcast together
    #[error("Shape mismatch: cannot broadcast {left:?} against {right:?}")]
    ShapeMismatch { left: Vec<usize>, right: Vec<usize> },

    /// A buffer does not describe a valid array of the requested shape
    #[error("Invalid shape {shape:?}: {reason}")]
    InvalidShape { shape: Vec<usize>, reason: String },

    /// Normalization or axis extraction on a quaternion of (near) zero length
    #[error("Zero quaternion: norm {norm:e} is below the zero threshold")]
    ZeroQuaternion { norm: f64 },

    /// Normalization of a 3-vector of (near) zero length
    #[error("Zero vector: norm {norm:e} is below the zero threshold")]
    ZeroVector { norm: f64 },

    /// Division by a (near) zero scalar, or inversion of a (near) zero quaternion
    #[error("Division by zero: denominator {denominator:e} is below the zero threshold")]
    DivisionByZero { denominator: f64 },

    /// A matrix passed as a rotation matrix is not orthonormal with determinant +1
    #[error(
        "Invalid rotation matrix: orthogonality error {orthogonality_error:e}, determinant {determinant} (tolerance {tolerance:e})"
    )]
    InvalidRotationMatrix {
        orthogonality_error: f64,
        determinant: f64,
        tolerance: f64,
    },

    /// Unknown Euler-angle axis sequence key
    #[error("Invalid Euler sequence '{0}': expected one of xyz, xzy, yxz, yzx, zxy, zyx, xyx, xzx, yxy, yzy, zxz, zyz")]
    InvalidSequence(String),

    /// Malformed argument that is not a shape or value-range problem
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A NaN or infinite component was detected
    #[error("Non-finite value: {value}")]
    NonFinite { value: String },

    /// A batched operation failed on one element
    #[error("Element {index:?}: {source}")]
    Element {
        index: Vec<usize>,
        #[source]
        source: Box<QuaternionError>,
    },
}

impl QuaternionError {
    /// Attach the multi-index of the failing element to an element-level error.
    pub fn at(self, index: Vec<usize>) -> Self {
        QuaternionError::Element {
            index,
            source: Box::new(self),
        }
    }

    /// The innermost error, unwrapping any [`QuaternionError::Element`] layers.
    pub fn root(&self) -> &QuaternionError {
        match self {
            QuaternionError::Element { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_display() {
        let error = QuaternionError::ShapeMismatch {
            left: vec![3],
            right: vec![2],
        };
        assert_eq!(
            error.to_string(),
            "Shape mismatch: cannot broadcast [3] against [2]"
        );
    }

    #[test]
    fn test_element_error_wraps_source() {
        let error = QuaternionError::DivisionByZero { denominator: 0.0 }.at(vec![1, 2]);
        assert!(error.to_string().starts_with("Element [1, 2]:"));

        match error.root() {
            QuaternionError::DivisionByZero { denominator } => assert_eq!(*denominator, 0.0),
            other => panic!("Expected DivisionByZero, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_sequence_names_key() {
        let error = QuaternionError::InvalidSequence("abc".to_string());
        assert!(error.to_string().contains("'abc'"));
    }

    #[test]
    fn test_result_err() {
        let result: QuaternionResult<i32> = Err(QuaternionError::ZeroQuaternion { norm: 0.0 });
        assert!(result.is_err());
    }
}
