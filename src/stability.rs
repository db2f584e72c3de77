//! Normalization and numerical stability guards.
//!
//! Formulas involving `sin(θ)/θ` or a rotation axis `v/|v|` are ill-conditioned at the
//! singular angles θ = 0 and θ = π. Rather than scattering threshold checks through the
//! exp/log and conversion code, every caller first classifies the angle into an
//! [`AngleRegime`] and then dispatches to one of the small pure functions below.

use crate::config::Tolerances;
use crate::error::{QuaternionError, QuaternionResult};
use crate::quaternion::Quaternion;
use nalgebra::Vector3;
use std::f64::consts::PI;

/// Numerical regime of a rotation (half-)angle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AngleRegime {
    /// Away from both singular points; direct formulas are well conditioned
    Regular,
    /// θ within `small_angle` of 0; series expansions replace `sin(θ)/θ`
    NearZero,
    /// θ within `near_pi` of π; axis extraction cannot rely on normalizing `v`
    NearPi,
}

/// Classify an angle θ ∈ [0, π].
pub fn classify_angle(theta: f64, tolerances: &Tolerances) -> AngleRegime {
    let theta = theta.abs();
    if theta < tolerances.small_angle {
        AngleRegime::NearZero
    } else if PI - theta < tolerances.near_pi {
        AngleRegime::NearPi
    } else {
        AngleRegime::Regular
    }
}

/// `sin(θ)/θ`, using its Taylor expansion near zero.
pub fn sinc(theta: f64, regime: AngleRegime) -> f64 {
    match regime {
        AngleRegime::NearZero => {
            let t2 = theta * theta;
            1.0 - t2 / 6.0 + t2 * t2 / 120.0
        }
        AngleRegime::Regular | AngleRegime::NearPi => theta.sin() / theta,
    }
}

/// `θ/sin(θ)`, using its Taylor expansion near zero.
///
/// Not defined in the [`AngleRegime::NearPi`] regime; callers must branch on the regime
/// before using it there.
pub fn inverse_sinc(theta: f64, regime: AngleRegime) -> f64 {
    match regime {
        AngleRegime::NearZero => {
            let t2 = theta * theta;
            1.0 + t2 / 6.0 + 7.0 * t2 * t2 / 360.0
        }
        AngleRegime::Regular | AngleRegime::NearPi => theta / theta.sin(),
    }
}

/// Unit direction of `v`, robust to `v` being (almost) zero.
///
/// When `|v| >= zero_norm` this is `v/|v|`. Otherwise the axis is taken from the
/// largest-magnitude component of `v` (keeping its sign), and the x axis is used when
/// every component is exactly zero. The result is always a unit vector.
pub fn stable_axis(v: &Vector3<f64>, tolerances: &Tolerances) -> Vector3<f64> {
    let norm = v.norm();
    if norm >= tolerances.zero_norm && norm.is_finite() {
        return v / norm;
    }

    let index = v.iamax();
    let component = v[index];
    let mut axis = Vector3::zeros();
    if component == 0.0 || !component.is_finite() {
        axis.x = 1.0;
    } else {
        axis[index] = component.signum();
    }
    axis
}

/// Unit vector in the direction of `v`, failing with [`QuaternionError::ZeroVector`].
pub fn normalize_vector(v: &Vector3<f64>, tolerances: &Tolerances) -> QuaternionResult<Vector3<f64>> {
    let norm = v.norm();
    if !norm.is_finite() {
        return Err(QuaternionError::NonFinite {
            value: format!("[{}, {}, {}]", v.x, v.y, v.z),
        });
    }
    if norm < tolerances.zero_norm {
        return Err(QuaternionError::ZeroVector { norm });
    }
    Ok(v / norm)
}

/// Rotation angle carried by a quaternion's direction: `atan2(|v|, w)` ∈ [0, π].
///
/// For a unit quaternion this equals `arccos(clamp(w, -1, 1))` but keeps full precision
/// near 0 and π, where `arccos` loses half of the significant digits.
#[inline]
pub fn half_angle(q: &Quaternion) -> f64 {
    q.vector_norm_squared().sqrt().atan2(q.w())
}

impl Quaternion {
    /// Unit quaternion `q / |q|`.
    pub fn normalize(&self) -> QuaternionResult<Self> {
        self.normalize_with(&Tolerances::default())
    }

    /// Unit quaternion `q / |q|`, failing with [`QuaternionError::ZeroQuaternion`] when
    /// `|q| < zero_norm` and with [`QuaternionError::NonFinite`] when `|q|` is NaN or
    /// infinite.
    pub fn normalize_with(&self, tolerances: &Tolerances) -> QuaternionResult<Self> {
        let norm = self.norm();
        if !norm.is_finite() {
            return Err(QuaternionError::NonFinite {
                value: self.to_string(),
            });
        }
        if norm < tolerances.zero_norm {
            return Err(QuaternionError::ZeroQuaternion { norm });
        }
        Ok(self.scalar_multiply(1.0 / norm))
    }

    /// Return `self` or `−self`, whichever has a non-negative dot product with `reference`.
    ///
    /// Both represent the same rotation; picking the one closest to `reference`
    /// suppresses double-cover jumps along trajectories.
    #[inline]
    pub fn aligned_with(&self, reference: &Self) -> Self {
        if self.dot(reference) < 0.0 {
            self.negate()
        } else {
            *self
        }
    }

    /// Return `self` or `−self`, whichever has `w >= 0`.
    #[inline]
    pub fn canonical(&self) -> Self {
        if self.w() < 0.0 {
            self.negate()
        } else {
            *self
        }
    }
}

/// Flip signs along a sequence so consecutive elements have non-negative dot products.
///
/// The first element is left untouched. Works in place.
pub fn unflip_sequence(sequence: &mut [Quaternion]) {
    for i in 1..sequence.len() {
        sequence[i] = sequence[i].aligned_with(&sequence[i - 1]);
    }
}
