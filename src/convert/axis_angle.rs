//! Axis-angle pairs and rotation vectors.
//!
//! A rotation vector is `angle · axis`; it equals `2 · log(q)` for a unit quaternion
//! with `w >= 0`. Both representations returned here use that sign, so angles lie in
//! `[0, π]`.

use crate::array::{QuaternionArray, RealArray, VectorArray};
use crate::config::Tolerances;
use crate::convert::split_pairs;
use crate::error::{QuaternionError, QuaternionResult};
use crate::quaternion::Quaternion;
use crate::stability::{half_angle, normalize_vector};
use nalgebra::Vector3;
use tracing::debug;

impl Quaternion {
    /// Unit quaternion rotating by `angle` radians about `axis`.
    pub fn from_axis_angle(axis: &Vector3<f64>, angle: f64) -> QuaternionResult<Self> {
        Self::from_axis_angle_with(axis, angle, &Tolerances::default())
    }

    /// Unit quaternion from an axis-angle pair with explicit tolerances.
    ///
    /// The axis is normalized internally. A zero axis is accepted only together with a
    /// zero angle (giving the identity); otherwise it fails with
    /// [`QuaternionError::ZeroVector`]. A NaN or infinite angle fails with
    /// [`QuaternionError::NonFinite`].
    pub fn from_axis_angle_with(
        axis: &Vector3<f64>,
        angle: f64,
        tolerances: &Tolerances,
    ) -> QuaternionResult<Self> {
        if !angle.is_finite() {
            return Err(QuaternionError::NonFinite {
                value: format!("angle {angle}"),
            });
        }
        if angle == 0.0 {
            return Ok(Quaternion::IDENTITY);
        }
        let unit = normalize_vector(axis, tolerances)?;
        let (s, c) = (0.5 * angle).sin_cos();
        Ok(Quaternion::from_parts(c, &(unit * s)))
    }

    /// Axis and angle of `q / |q|`, with the angle in `[0, π]`.
    pub fn to_axis_angle(&self) -> QuaternionResult<(Vector3<f64>, f64)> {
        self.to_axis_angle_with(&Tolerances::default())
    }

    /// Axis and angle with explicit tolerances.
    ///
    /// When the vector part vanishes (`|v| < zero_norm` after normalization) the rotation
    /// is the identity and the result is the zero axis with angle 0.
    pub fn to_axis_angle_with(
        &self,
        tolerances: &Tolerances,
    ) -> QuaternionResult<(Vector3<f64>, f64)> {
        let q = self.normalize_with(tolerances)?.canonical();
        let v = q.vector();
        let sin_half = v.norm();

        if sin_half < tolerances.zero_norm {
            return Ok((Vector3::zeros(), 0.0));
        }

        Ok((v / sin_half, 2.0 * half_angle(&q)))
    }

    /// Unit quaternion of a rotation vector, `exp(v / 2)`.
    pub fn from_rotation_vector(v: &Vector3<f64>) -> Self {
        Self::from_rotation_vector_with(v, &Tolerances::default())
    }

    /// Unit quaternion of a rotation vector with explicit tolerances.
    pub fn from_rotation_vector_with(v: &Vector3<f64>, tolerances: &Tolerances) -> Self {
        Quaternion::pure(&(v * 0.5)).exp_with(tolerances)
    }

    /// Rotation vector `2 · log(q / |q|)` with the angle in `[0, π]`.
    pub fn to_rotation_vector(&self) -> QuaternionResult<Vector3<f64>> {
        self.to_rotation_vector_with(&Tolerances::default())
    }

    /// Rotation vector with explicit tolerances.
    pub fn to_rotation_vector_with(&self, tolerances: &Tolerances) -> QuaternionResult<Vector3<f64>> {
        let q = self.normalize_with(tolerances)?.canonical();
        Ok(q.log_with(tolerances)?.vector() * 2.0)
    }
}

impl QuaternionArray {
    /// Element-wise quaternions from broadcast axes and angles.
    pub fn from_axis_angle(axes: &VectorArray, angles: &RealArray) -> QuaternionResult<Self> {
        Self::from_axis_angle_with(axes, angles, &Tolerances::default())
    }

    /// Element-wise quaternions from axes and angles with explicit tolerances.
    pub fn from_axis_angle_with(
        axes: &VectorArray,
        angles: &RealArray,
        tolerances: &Tolerances,
    ) -> QuaternionResult<Self> {
        debug!(axes = %axes.shape(), angles = %angles.shape(), "axis-angle to quaternions");
        axes.try_zip_with(angles, |axis, angle| {
            Quaternion::from_axis_angle_with(axis, *angle, tolerances)
        })
    }

    /// Element-wise axes and angles.
    pub fn to_axis_angle(&self) -> QuaternionResult<(VectorArray, RealArray)> {
        self.to_axis_angle_with(&Tolerances::default())
    }

    /// Element-wise axes and angles with explicit tolerances.
    pub fn to_axis_angle_with(
        &self,
        tolerances: &Tolerances,
    ) -> QuaternionResult<(VectorArray, RealArray)> {
        debug!(shape = %self.shape(), "quaternions to axis-angle");
        let pairs = self.try_map(|q| q.to_axis_angle_with(tolerances))?;
        Ok(split_pairs(pairs))
    }

    /// Element-wise quaternions of rotation vectors.
    pub fn from_rotation_vector(vectors: &VectorArray) -> Self {
        Self::from_rotation_vector_with(vectors, &Tolerances::default())
    }

    /// Element-wise quaternions of rotation vectors with explicit tolerances.
    pub fn from_rotation_vector_with(vectors: &VectorArray, tolerances: &Tolerances) -> Self {
        vectors.map(|v| Quaternion::from_rotation_vector_with(v, tolerances))
    }

    /// Element-wise rotation vectors.
    pub fn to_rotation_vector(&self) -> QuaternionResult<VectorArray> {
        self.to_rotation_vector_with(&Tolerances::default())
    }

    /// Element-wise rotation vectors with explicit tolerances.
    pub fn to_rotation_vector_with(&self, tolerances: &Tolerances) -> QuaternionResult<VectorArray> {
        debug!(shape = %self.shape(), "quaternions to rotation vectors");
        self.try_map(|q| q.to_rotation_vector_with(tolerances))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    const TOLERANCE: f64 = 1e-12;

    #[test]
    fn test_from_axis_angle_normalizes_axis() {
        let q = Quaternion::from_axis_angle(&Vector3::new(0.0, 0.0, 5.0), FRAC_PI_2).unwrap();
        let expected = Quaternion::new(FRAC_PI_4.cos(), 0.0, 0.0, FRAC_PI_4.sin());
        assert!(q.is_approx(&expected, TOLERANCE));
    }

    #[test]
    fn test_zero_axis() {
        let q = Quaternion::from_axis_angle(&Vector3::zeros(), 0.0).unwrap();
        assert_eq!(q, Quaternion::IDENTITY);

        assert!(matches!(
            Quaternion::from_axis_angle(&Vector3::zeros(), 1.0),
            Err(QuaternionError::ZeroVector { .. })
        ));
    }

    #[test]
    fn test_non_finite_angle_is_rejected() {
        for angle in [f64::NAN, f64::INFINITY] {
            assert!(matches!(
                Quaternion::from_axis_angle(&Vector3::x(), angle),
                Err(QuaternionError::NonFinite { .. })
            ));
        }
        assert!(matches!(
            Quaternion::from_axis_angle(&Vector3::new(f64::NAN, 0.0, 1.0), 1.0),
            Err(QuaternionError::NonFinite { .. })
        ));
    }

    #[test]
    fn test_rotation_vector_zero_threshold_override() {
        let tiny = Quaternion::new(1e-13, 1e-14, 0.0, 0.0);
        assert!(tiny.to_rotation_vector().is_err());

        let tolerances = Tolerances::new().with_zero_norm(1e-20);
        let v = tiny.to_rotation_vector_with(&tolerances).unwrap();
        let expected = 2.0 * (0.1_f64).atan();
        assert!((v - Vector3::new(expected, 0.0, 0.0)).norm() < TOLERANCE);

        let batch = QuaternionArray::from_vec(vec![Quaternion::IDENTITY, tiny]);
        assert!(batch.to_rotation_vector().is_err());
        let vectors = batch.to_rotation_vector_with(&tolerances).unwrap();
        let back = QuaternionArray::from_rotation_vector_with(&vectors, &tolerances);
        assert!(back.as_slice()[1].is_approx_rotation(&tiny.normalize_with(&tolerances).unwrap(), TOLERANCE));
    }

    #[test]
    fn test_to_axis_angle() {
        let axis = Vector3::new(1.0, 2.0, -2.0) / 3.0;
        let q = Quaternion::from_axis_angle(&axis, 2.5).unwrap();
        let (a, angle) = q.to_axis_angle().unwrap();
        assert!((a - axis).norm() < TOLERANCE);
        assert!((angle - 2.5).abs() < TOLERANCE);

        // the negated quaternion reports the same rotation
        let (a, angle) = q.negate().to_axis_angle().unwrap();
        assert!((a - axis).norm() < TOLERANCE);
        assert!((angle - 2.5).abs() < TOLERANCE);
    }

    #[test]
    fn test_angle_above_pi_is_folded() {
        let q = Quaternion::from_axis_angle(&Vector3::x(), 1.5 * PI).unwrap();
        let (axis, angle) = q.to_axis_angle().unwrap();
        assert!((angle - 0.5 * PI).abs() < TOLERANCE);
        assert!((axis + Vector3::x()).norm() < TOLERANCE);
    }

    #[test]
    fn test_identity_has_zero_axis() {
        let (axis, angle) = Quaternion::IDENTITY.to_axis_angle().unwrap();
        assert_eq!(axis, Vector3::zeros());
        assert_eq!(angle, 0.0);
        assert!(Quaternion::ZERO.to_axis_angle().is_err());
    }

    #[test]
    fn test_rotation_vector() {
        let v = Vector3::new(0.2, -0.4, 1.1);
        let q = Quaternion::from_rotation_vector(&v);
        assert!((q.norm() - 1.0).abs() < TOLERANCE);
        assert!((q.to_rotation_vector().unwrap() - v).norm() < TOLERANCE);

        let (axis, angle) = q.to_axis_angle().unwrap();
        assert!((axis * angle - v).norm() < TOLERANCE);

        assert_eq!(Quaternion::from_rotation_vector(&Vector3::zeros()), Quaternion::IDENTITY);
        assert_eq!(Quaternion::IDENTITY.to_rotation_vector().unwrap(), Vector3::zeros());
    }

    #[test]
    fn test_array_axis_angle_broadcasts_angles() {
        let axes = VectorArray::from_vec(vec![Vector3::x(), Vector3::y(), Vector3::z()]);
        let angles = RealArray::new(vec![0.5, 1.0], [2, 1]).unwrap();
        let q = QuaternionArray::from_axis_angle(&axes, &angles).unwrap();
        assert_eq!(q.shape().dims(), &[2, 3]);

        let (back_axes, back_angles) = q.to_axis_angle().unwrap();
        assert_eq!(back_axes.shape().dims(), &[2, 3]);
        assert!((back_angles.get(&[1, 2]).unwrap() - 1.0).abs() < TOLERANCE);
        assert!((back_axes.get(&[0, 1]).unwrap() - Vector3::y()).norm() < TOLERANCE);

        let vectors = q.to_rotation_vector().unwrap();
        let rebuilt = QuaternionArray::from_rotation_vector(&vectors);
        assert!(rebuilt.approx_eq(&q, TOLERANCE).unwrap().iter().all(|b| *b));
    }
}
