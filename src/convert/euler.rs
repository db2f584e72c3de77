//! Euler angles for the twelve axis sequences.
//!
//! Angles are intrinsic: for the sequence `zyx` with angles `(a, b, c)` the rotation is
//! `R_z(a) · R_y(b) · R_x(c)`, i.e. rotate about z, then about the *new* y, then about the
//! newest x. For Tait-Bryan sequences (three distinct axes) the middle angle lies in
//! `[−π/2, π/2]`; for proper Euler sequences (first axis repeated) it lies in `[0, π]`.
//! The outer angles lie in `[−π, π)`.
//!
//! # Gimbal lock
//!
//! When the middle angle sits at a singular value (±π/2 for Tait-Bryan, 0 or π for
//! proper sequences) only the sum or difference of the outer angles is determined.
//! Within `gimbal_lock` of those values the third angle is set to 0 and the first angle
//! carries the whole remaining rotation.
//!
//! Extraction works directly on the quaternion components (Bernardes & Viollet, 2022)
//! instead of going through a rotation matrix.

use crate::array::{QuaternionArray, VectorArray};
use crate::config::Tolerances;
use crate::convert::axis_rotation;
use crate::error::{QuaternionError, QuaternionResult};
use crate::quaternion::Quaternion;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

/// One of the twelve Euler axis sequences, named by its lowercase key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EulerSequence {
    Xyz,
    Xzy,
    Yxz,
    Yzx,
    Zxy,
    /// Yaw, pitch, roll
    #[default]
    Zyx,
    Xyx,
    Xzx,
    Yxy,
    Yzy,
    Zxz,
    Zyz,
}

impl EulerSequence {
    /// All twelve sequences, Tait-Bryan first.
    pub const ALL: [EulerSequence; 12] = [
        EulerSequence::Xyz,
        EulerSequence::Xzy,
        EulerSequence::Yxz,
        EulerSequence::Yzx,
        EulerSequence::Zxy,
        EulerSequence::Zyx,
        EulerSequence::Xyx,
        EulerSequence::Xzx,
        EulerSequence::Yxy,
        EulerSequence::Yzy,
        EulerSequence::Zxz,
        EulerSequence::Zyz,
    ];

    /// Axis indices (0 = x, 1 = y, 2 = z) in rotation order.
    pub fn axes(&self) -> [usize; 3] {
        match self {
            EulerSequence::Xyz => [0, 1, 2],
            EulerSequence::Xzy => [0, 2, 1],
            EulerSequence::Yxz => [1, 0, 2],
            EulerSequence::Yzx => [1, 2, 0],
            EulerSequence::Zxy => [2, 0, 1],
            EulerSequence::Zyx => [2, 1, 0],
            EulerSequence::Xyx => [0, 1, 0],
            EulerSequence::Xzx => [0, 2, 0],
            EulerSequence::Yxy => [1, 0, 1],
            EulerSequence::Yzy => [1, 2, 1],
            EulerSequence::Zxz => [2, 0, 2],
            EulerSequence::Zyz => [2, 1, 2],
        }
    }

    /// Lowercase key such as `"zyx"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EulerSequence::Xyz => "xyz",
            EulerSequence::Xzy => "xzy",
            EulerSequence::Yxz => "yxz",
            EulerSequence::Yzx => "yzx",
            EulerSequence::Zxy => "zxy",
            EulerSequence::Zyx => "zyx",
            EulerSequence::Xyx => "xyx",
            EulerSequence::Xzx => "xzx",
            EulerSequence::Yxy => "yxy",
            EulerSequence::Yzy => "yzy",
            EulerSequence::Zxz => "zxz",
            EulerSequence::Zyz => "zyz",
        }
    }

    /// True for proper Euler sequences (first and last axis equal).
    pub fn is_proper(&self) -> bool {
        let [first, _, last] = self.axes();
        first == last
    }
}

impl fmt::Display for EulerSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EulerSequence {
    type Err = QuaternionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EulerSequence::ALL
            .into_iter()
            .find(|sequence| sequence.as_str() == s)
            .ok_or_else(|| QuaternionError::InvalidSequence(s.to_string()))
    }
}

/// Wrap an angle into `[−π, π)`.
fn wrap_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(TAU) - PI
}

impl Quaternion {
    /// Quaternion of intrinsic Euler angles `(first, second, third)`.
    pub fn from_euler_angles(angles: &Vector3<f64>, sequence: EulerSequence) -> Self {
        let [a, b, c] = sequence.axes();
        axis_rotation(a, angles.x) * axis_rotation(b, angles.y) * axis_rotation(c, angles.z)
    }

    /// Intrinsic Euler angles of `q / |q|`.
    pub fn to_euler_angles(&self, sequence: EulerSequence) -> QuaternionResult<Vector3<f64>> {
        self.to_euler_angles_with(sequence, &Tolerances::default())
    }

    /// Intrinsic Euler angles with explicit tolerances.
    pub fn to_euler_angles_with(
        &self,
        sequence: EulerSequence,
        tolerances: &Tolerances,
    ) -> QuaternionResult<Vector3<f64>> {
        let q = self.normalize_with(tolerances)?;
        let [first, second, third] = sequence.axes();

        // intrinsic (e1, e2, e3) equals extrinsic (e3, e2, e1)
        let i = third;
        let j = second;
        let proper = i == first;
        let k = if proper { 3 - i - j } else { first };

        let (si, sj, sk) = (i as i32, j as i32, k as i32);
        let sign = f64::from((si - sj) * (sj - sk) * (sk - si) / 2);

        let w = q.w();
        let v = q.vector();
        let (a, b, c, d) = if proper {
            (w, v[i], v[j], v[k] * sign)
        } else {
            (w - v[j], v[i] + v[k] * sign, v[j] + w, v[k] * sign - v[i])
        };

        let mut middle = 2.0 * c.hypot(d).atan2(a.hypot(b));
        let half_sum = b.atan2(a);
        let half_diff = d.atan2(c);

        let eps = tolerances.gimbal_lock;
        let (extrinsic_first, mut extrinsic_last) = if middle.abs() <= eps {
            trace!(%sequence, middle, "gimbal lock, third angle set to zero");
            (0.0, 2.0 * half_sum)
        } else if (middle - PI).abs() <= eps {
            trace!(%sequence, middle, "gimbal lock, third angle set to zero");
            (0.0, 2.0 * half_diff)
        } else {
            (half_sum - half_diff, half_sum + half_diff)
        };

        if !proper {
            extrinsic_last *= sign;
            middle -= FRAC_PI_2;
        }

        Ok(Vector3::new(
            wrap_angle(extrinsic_last),
            middle,
            wrap_angle(extrinsic_first),
        ))
    }
}

impl QuaternionArray {
    /// Element-wise quaternions of Euler angle triples.
    pub fn from_euler_angles(angles: &VectorArray, sequence: EulerSequence) -> Self {
        debug!(shape = %angles.shape(), %sequence, "Euler angles to quaternions");
        angles.map(|a| Quaternion::from_euler_angles(a, sequence))
    }

    /// Element-wise Euler angle triples.
    pub fn to_euler_angles(&self, sequence: EulerSequence) -> QuaternionResult<VectorArray> {
        self.to_euler_angles_with(sequence, &Tolerances::default())
    }

    /// Element-wise Euler angle triples with explicit tolerances.
    pub fn to_euler_angles_with(
        &self,
        sequence: EulerSequence,
        tolerances: &Tolerances,
    ) -> QuaternionResult<VectorArray> {
        debug!(shape = %self.shape(), %sequence, "quaternions to Euler angles");
        self.try_map(|q| q.to_euler_angles_with(sequence, tolerances))
    }
}
