//! Conversions between quaternions and other rotation representations.
//!
//! Every conversion is available for a single [`Quaternion`] and element-wise for a
//! [`QuaternionArray`](crate::array::QuaternionArray). Array forms broadcast their inputs
//! and report the first failing element with [`QuaternionError::Element`](crate::error::QuaternionError::Element).
//!
//! # Sign conventions
//!
//! `q` and `−q` describe the same rotation. Conversions *into* matrices and vectors are
//! insensitive to the sign. Conversions *out of* matrices, axis-angle pairs and rotation
//! vectors return the representative with `w >= 0`; Euler and spherical constructors
//! return the plain product of their elementary rotations.

pub mod axis_angle;
pub mod euler;
pub mod matrix;
pub mod spherical;

pub use euler::EulerSequence;

use crate::array::BatchArray;
use crate::quaternion::Quaternion;

/// Rotation by `angle` about coordinate axis `axis` (0 = x, 1 = y, 2 = z).
pub(crate) fn axis_rotation(axis: usize, angle: f64) -> Quaternion {
    let (s, c) = (0.5 * angle).sin_cos();
    match axis {
        0 => Quaternion::new(c, s, 0.0, 0.0),
        1 => Quaternion::new(c, 0.0, s, 0.0),
        _ => Quaternion::new(c, 0.0, 0.0, s),
    }
}

/// Split an array of pairs into a pair of arrays with the same shape.
pub(crate) fn split_pairs<A, B>(pairs: BatchArray<(A, B)>) -> (BatchArray<A>, BatchArray<B>) {
    let shape = pairs.shape().clone();
    let (first, second): (Vec<A>, Vec<B>) = pairs.into_vec().into_iter().unzip();
    (
        BatchArray::from_parts_unchecked(first, shape.clone()),
        BatchArray::from_parts_unchecked(second, shape),
    )
}
