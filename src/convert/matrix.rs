//! Rotation matrices, homogeneous transforms and vector rotation.

use crate::array::{BatchArray, MatrixArray, QuaternionArray, VectorArray};
use crate::config::Tolerances;
use crate::error::{QuaternionError, QuaternionResult};
use crate::quaternion::Quaternion;
use nalgebra::{Matrix3, Matrix4, Vector3};
use tracing::{debug, warn};

impl Quaternion {
    /// 3×3 rotation matrix of `q / |q|`.
    pub fn to_rotation_matrix(&self) -> QuaternionResult<Matrix3<f64>> {
        self.to_rotation_matrix_with(&Tolerances::default())
    }

    /// 3×3 rotation matrix with explicit tolerances.
    ///
    /// Non-unit input is handled by scaling the quadratic terms by `2 / |q|²`, which is
    /// the same as normalizing first. `q` and `−q` give the same matrix.
    pub fn to_rotation_matrix_with(&self, tolerances: &Tolerances) -> QuaternionResult<Matrix3<f64>> {
        let norm_sq = self.norm_squared();
        if !norm_sq.is_finite() {
            return Err(QuaternionError::NonFinite {
                value: self.to_string(),
            });
        }
        if norm_sq < tolerances.zero_norm * tolerances.zero_norm {
            return Err(QuaternionError::ZeroQuaternion {
                norm: norm_sq.sqrt(),
            });
        }
        let s = 2.0 / norm_sq;

        let (w, x, y, z) = (self.w(), self.x(), self.y(), self.z());
        let xx = x * x;
        let yy = y * y;
        let zz = z * z;
        let xy = x * y;
        let xz = x * z;
        let yz = y * z;
        let wx = w * x;
        let wy = w * y;
        let wz = w * z;

        Ok(Matrix3::new(
            1.0 - s * (yy + zz),
            s * (xy - wz),
            s * (xz + wy),
            s * (xy + wz),
            1.0 - s * (xx + zz),
            s * (yz - wx),
            s * (xz - wy),
            s * (yz + wx),
            1.0 - s * (xx + yy),
        ))
    }

    /// 4×4 homogeneous transformation matrix with zero translation.
    pub fn to_transformation_matrix(&self) -> QuaternionResult<Matrix4<f64>> {
        self.to_transformation_matrix_with(&Tolerances::default())
    }

    /// 4×4 homogeneous transformation matrix with explicit tolerances.
    pub fn to_transformation_matrix_with(
        &self,
        tolerances: &Tolerances,
    ) -> QuaternionResult<Matrix4<f64>> {
        let rotation = self.to_rotation_matrix_with(tolerances)?;
        Ok(rotation.to_homogeneous())
    }

    /// Quaternion (with `w >= 0`) of a proper rotation matrix.
    pub fn from_rotation_matrix(matrix: &Matrix3<f64>) -> QuaternionResult<Self> {
        Self::from_rotation_matrix_with(matrix, &Tolerances::default())
    }

    /// Quaternion of a rotation matrix with explicit tolerances.
    ///
    /// The matrix is rejected with [`QuaternionError::InvalidRotationMatrix`] when
    /// `max |MᵀM − I|` or `|det M − 1|` exceeds `rotation_matrix`.
    ///
    /// Extraction follows Shepperd's method: of `4w², 4x², 4y², 4z²` (all obtainable
    /// from the trace and diagonal) the largest is square-rooted, and the other three
    /// components come from off-diagonal sums and differences divided by it. This
    /// avoids the cancellation of the naive trace formula near 180° rotations.
    pub fn from_rotation_matrix_with(
        matrix: &Matrix3<f64>,
        tolerances: &Tolerances,
    ) -> QuaternionResult<Self> {
        let orthogonality_error = (matrix.transpose() * matrix - Matrix3::identity()).amax();
        let determinant = matrix.determinant();
        let tolerance = tolerances.rotation_matrix;

        if orthogonality_error.is_nan()
            || orthogonality_error > tolerance
            || determinant.is_nan()
            || (determinant - 1.0).abs() > tolerance
        {
            warn!(
                orthogonality_error,
                determinant, tolerance, "rejecting matrix that is not a proper rotation"
            );
            return Err(QuaternionError::InvalidRotationMatrix {
                orthogonality_error,
                determinant,
                tolerance,
            });
        }

        let m = matrix;
        let trace = m[(0, 0)] + m[(1, 1)] + m[(2, 2)];
        let candidates = [trace, m[(0, 0)], m[(1, 1)], m[(2, 2)]];
        let branch = (1..4).fold(0, |best, i| {
            if candidates[i] > candidates[best] { i } else { best }
        });

        let q = match branch {
            0 => {
                let s = (trace + 1.0).sqrt() * 2.0; // s = 4w
                Quaternion::new(
                    0.25 * s,
                    (m[(2, 1)] - m[(1, 2)]) / s,
                    (m[(0, 2)] - m[(2, 0)]) / s,
                    (m[(1, 0)] - m[(0, 1)]) / s,
                )
            }
            1 => {
                let s = (1.0 + m[(0, 0)] - m[(1, 1)] - m[(2, 2)]).sqrt() * 2.0; // s = 4x
                Quaternion::new(
                    (m[(2, 1)] - m[(1, 2)]) / s,
                    0.25 * s,
                    (m[(0, 1)] + m[(1, 0)]) / s,
                    (m[(0, 2)] + m[(2, 0)]) / s,
                )
            }
            2 => {
                let s = (1.0 + m[(1, 1)] - m[(0, 0)] - m[(2, 2)]).sqrt() * 2.0; // s = 4y
                Quaternion::new(
                    (m[(0, 2)] - m[(2, 0)]) / s,
                    (m[(0, 1)] + m[(1, 0)]) / s,
                    0.25 * s,
                    (m[(1, 2)] + m[(2, 1)]) / s,
                )
            }
            _ => {
                let s = (1.0 + m[(2, 2)] - m[(0, 0)] - m[(1, 1)]).sqrt() * 2.0; // s = 4z
                Quaternion::new(
                    (m[(1, 0)] - m[(0, 1)]) / s,
                    (m[(0, 2)] + m[(2, 0)]) / s,
                    (m[(1, 2)] + m[(2, 1)]) / s,
                    0.25 * s,
                )
            }
        };

        // absorb the small non-orthogonality the tolerance lets through
        Ok(q.normalize_with(tolerances)?.canonical())
    }

    /// Rotate a 3-vector: `q v q̄ / |q|²`.
    pub fn rotate_vector(&self, v: &Vector3<f64>) -> QuaternionResult<Vector3<f64>> {
        self.rotate_vector_with(v, &Tolerances::default())
    }

    /// Rotate a 3-vector with explicit tolerances.
    pub fn rotate_vector_with(
        &self,
        v: &Vector3<f64>,
        tolerances: &Tolerances,
    ) -> QuaternionResult<Vector3<f64>> {
        let unit = self.normalize_with(tolerances)?;
        let w = unit.w();
        let qv = unit.vector();

        // v' = v + w t + qv × t with t = 2 qv × v
        let t = 2.0 * qv.cross(v);
        Ok(v + w * t + qv.cross(&t))
    }
}

impl QuaternionArray {
    /// Element-wise rotation matrices.
    pub fn to_rotation_matrix(&self) -> QuaternionResult<MatrixArray> {
        self.to_rotation_matrix_with(&Tolerances::default())
    }

    /// Element-wise rotation matrices with explicit tolerances.
    pub fn to_rotation_matrix_with(&self, tolerances: &Tolerances) -> QuaternionResult<MatrixArray> {
        debug!(shape = %self.shape(), "quaternions to rotation matrices");
        self.try_map(|q| q.to_rotation_matrix_with(tolerances))
    }

    /// Element-wise homogeneous transformation matrices.
    pub fn to_transformation_matrix(&self) -> QuaternionResult<BatchArray<Matrix4<f64>>> {
        self.to_transformation_matrix_with(&Tolerances::default())
    }

    /// Element-wise homogeneous transformation matrices with explicit tolerances.
    pub fn to_transformation_matrix_with(
        &self,
        tolerances: &Tolerances,
    ) -> QuaternionResult<BatchArray<Matrix4<f64>>> {
        self.try_map(|q| q.to_transformation_matrix_with(tolerances))
    }

    /// Element-wise quaternions of rotation matrices.
    pub fn from_rotation_matrix(matrices: &MatrixArray) -> QuaternionResult<QuaternionArray> {
        Self::from_rotation_matrix_with(matrices, &Tolerances::default())
    }

    /// Element-wise quaternions of rotation matrices with explicit tolerances.
    pub fn from_rotation_matrix_with(
        matrices: &MatrixArray,
        tolerances: &Tolerances,
    ) -> QuaternionResult<QuaternionArray> {
        debug!(shape = %matrices.shape(), "rotation matrices to quaternions");
        matrices.try_map(|m| Quaternion::from_rotation_matrix_with(m, tolerances))
    }

    /// Rotate vectors, broadcasting the quaternion and vector batch shapes.
    pub fn rotate_vectors(&self, vectors: &VectorArray) -> QuaternionResult<VectorArray> {
        self.rotate_vectors_with(vectors, &Tolerances::default())
    }

    /// Rotate vectors with explicit tolerances.
    pub fn rotate_vectors_with(
        &self,
        vectors: &VectorArray,
        tolerances: &Tolerances,
    ) -> QuaternionResult<VectorArray> {
        debug!(
            quaternions = %self.shape(),
            vectors = %vectors.shape(),
            "rotating vectors"
        );
        self.try_zip_with(vectors, |q, v| q.rotate_vector_with(v, tolerances))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    const TOLERANCE: f64 = 1e-12;

    fn about_x(angle: f64) -> Matrix3<f64> {
        let (s, c) = angle.sin_cos();
        Matrix3::new(1.0, 0.0, 0.0, 0.0, c, -s, 0.0, s, c)
    }

    #[test]
    fn test_identity_matrix() {
        let m = Quaternion::IDENTITY.to_rotation_matrix().unwrap();
        assert!((m - Matrix3::identity()).amax() < TOLERANCE);
        let q = Quaternion::from_rotation_matrix(&Matrix3::identity()).unwrap();
        assert_eq!(q, Quaternion::IDENTITY);
    }

    #[test]
    fn test_ninety_degrees_about_x() {
        let q = Quaternion::from_rotation_matrix(&about_x(FRAC_PI_2)).unwrap();
        let expected = Quaternion::new(FRAC_PI_4.cos(), FRAC_PI_4.sin(), 0.0, 0.0);
        assert!(q.is_approx_rotation(&expected, TOLERANCE));

        let m = expected.to_rotation_matrix().unwrap();
        assert!((m - about_x(FRAC_PI_2)).amax() < TOLERANCE);
    }

    #[test]
    fn test_sign_and_scale_do_not_change_matrix() {
        let q = Quaternion::new(0.3, -0.5, 0.1, 0.8);
        let m = q.to_rotation_matrix().unwrap();
        let m_neg = q.negate().to_rotation_matrix().unwrap();
        let m_scaled = q.scalar_multiply(7.5).to_rotation_matrix().unwrap();
        assert!((m - m_neg).amax() < TOLERANCE);
        assert!((m - m_scaled).amax() < TOLERANCE);
        assert!((m.determinant() - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_half_turns_use_stable_branches() {
        for (axis, q) in [
            (0, Quaternion::new(0.0, 1.0, 0.0, 0.0)),
            (1, Quaternion::new(0.0, 0.0, 1.0, 0.0)),
            (2, Quaternion::new(0.0, 0.0, 0.0, 1.0)),
        ] {
            let m = q.to_rotation_matrix().unwrap();
            let back = Quaternion::from_rotation_matrix(&m).unwrap();
            assert!(back.is_approx_rotation(&q, TOLERANCE), "half turn about {axis}");
        }

        let near = about_x(PI - 1e-7);
        let q = Quaternion::from_rotation_matrix(&near).unwrap();
        let m = q.to_rotation_matrix().unwrap();
        assert!((m - near).amax() < TOLERANCE);
    }

    #[test]
    fn test_returns_non_negative_w() {
        let q = Quaternion::new(-0.2, 0.6, -0.3, 0.7).normalize().unwrap();
        let back = Quaternion::from_rotation_matrix(&q.to_rotation_matrix().unwrap()).unwrap();
        assert!(back.w() >= 0.0);
        assert!(back.is_approx(&q.negate(), TOLERANCE));
    }

    #[test]
    fn test_rejects_invalid_matrices() {
        let scaled = Matrix3::identity() * 2.0;
        assert!(matches!(
            Quaternion::from_rotation_matrix(&scaled),
            Err(QuaternionError::InvalidRotationMatrix { .. })
        ));

        let reflection = Matrix3::new(-1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);
        match Quaternion::from_rotation_matrix(&reflection).unwrap_err() {
            QuaternionError::InvalidRotationMatrix { determinant, .. } => {
                assert!((determinant + 1.0).abs() < TOLERANCE);
            }
            other => panic!("Expected invalid rotation matrix, got {other:?}"),
        }

        let loose = Tolerances::default().with_rotation_matrix(1e-3);
        let perturbed = about_x(0.3) + Matrix3::from_element(1e-5);
        assert!(Quaternion::from_rotation_matrix(&perturbed).is_err());
        let q = Quaternion::from_rotation_matrix_with(&perturbed, &loose).unwrap();
        assert!((q.norm() - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_zero_quaternion_has_no_matrix() {
        assert!(matches!(
            Quaternion::ZERO.to_rotation_matrix(),
            Err(QuaternionError::ZeroQuaternion { .. })
        ));
    }

    #[test]
    fn test_non_finite_quaternion_has_no_matrix() {
        let q = Quaternion::new(f64::INFINITY, 0.0, 0.0, 0.0);
        assert!(matches!(
            q.to_rotation_matrix(),
            Err(QuaternionError::NonFinite { .. })
        ));
        assert!(q.rotate_vector(&Vector3::x()).is_err());
    }

    #[test]
    fn test_zero_threshold_override_for_small_quaternions() {
        let tiny = Quaternion::new(0.0, 0.0, 0.0, 1e-13);
        let tolerances = Tolerances::new().with_zero_norm(1e-20);
        assert!(tiny.to_transformation_matrix().is_err());

        let t = tiny.to_transformation_matrix_with(&tolerances).unwrap();
        let half_turn_z = Matrix3::new(-1.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 1.0);
        assert!((t.fixed_view::<3, 3>(0, 0) - half_turn_z).amax() < TOLERANCE);

        let batch = QuaternionArray::from_vec(vec![tiny]);
        let vectors = VectorArray::scalar(Vector3::x());
        assert!(batch.rotate_vectors(&vectors).is_err());
        let rotated = batch.rotate_vectors_with(&vectors, &tolerances).unwrap();
        assert!((rotated.as_slice()[0] + Vector3::x()).norm() < TOLERANCE);
        assert_eq!(batch.to_transformation_matrix_with(&tolerances).unwrap().len(), 1);
    }

    #[test]
    fn test_transformation_matrix() {
        let q = Quaternion::new(FRAC_PI_4.cos(), 0.0, 0.0, FRAC_PI_4.sin());
        let t = q.to_transformation_matrix().unwrap();
        let r = q.to_rotation_matrix().unwrap();
        assert!((t.fixed_view::<3, 3>(0, 0) - r).amax() < TOLERANCE);
        assert_eq!(t[(3, 3)], 1.0);
        assert_eq!(t[(0, 3)], 0.0);
        assert_eq!(t[(3, 0)], 0.0);
    }

    #[test]
    fn test_rotate_vector_matches_matrix() {
        let q = Quaternion::new(0.9, 0.1, -0.3, 0.2);
        let v = Vector3::new(1.0, -2.0, 0.5);
        let rotated = q.rotate_vector(&v).unwrap();
        let expected = q.to_rotation_matrix().unwrap() * v;
        assert!((rotated - expected).norm() < TOLERANCE);

        let quarter_z = Quaternion::new(FRAC_PI_4.cos(), 0.0, 0.0, FRAC_PI_4.sin());
        let r = quarter_z.rotate_vector(&Vector3::x()).unwrap();
        assert!((r - Vector3::y()).norm() < TOLERANCE);
    }

    #[test]
    fn test_array_conversions() {
        let q = QuaternionArray::from_vec(vec![
            Quaternion::IDENTITY,
            Quaternion::new(FRAC_PI_4.cos(), FRAC_PI_4.sin(), 0.0, 0.0),
        ]);
        let matrices = q.to_rotation_matrix().unwrap();
        assert!((matrices.as_slice()[1] - about_x(FRAC_PI_2)).amax() < TOLERANCE);

        let back = QuaternionArray::from_rotation_matrix(&matrices).unwrap();
        assert!(back.approx_eq(&q, TOLERANCE).unwrap().iter().all(|b| *b));

        let transforms = q.to_transformation_matrix().unwrap();
        assert_eq!(transforms.len(), 2);

        let vectors = VectorArray::new(vec![Vector3::y(), Vector3::z()], [2, 1]).unwrap();
        let rotated = q.rotate_vectors(&vectors).unwrap();
        assert_eq!(rotated.shape().dims(), &[2, 2]);
        assert!((rotated.get(&[0, 1]).unwrap() - Vector3::z()).norm() < TOLERANCE);
        assert!((rotated.get(&[1, 0]).unwrap() - Vector3::z()).norm() < TOLERANCE);
    }

    #[test]
    fn test_array_reports_bad_matrix_index() {
        let matrices = MatrixArray::from_vec(vec![Matrix3::identity(), Matrix3::zeros()]);
        match QuaternionArray::from_rotation_matrix(&matrices).unwrap_err() {
            QuaternionError::Element { index, source } => {
                assert_eq!(index, vec![1]);
                assert!(matches!(*source, QuaternionError::InvalidRotationMatrix { .. }));
            }
            other => panic!("Expected element error, got {other:?}"),
        }
    }
}
