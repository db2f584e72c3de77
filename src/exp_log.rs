//! Exponential and logarithm maps.
//!
//! For a pure quaternion `(0, v)` with `θ = |v|`, the exponential is the unit quaternion
//! `(cos θ, sin θ · v/θ)`: a rotation by `2θ` about `v`. A general quaternion
//! `(w, v)` exponentiates its scalar part multiplicatively, `exp(q) = e^w · exp((0, v))`.
//!
//! The logarithm is the inverse map. For `q = |q| · (cos θ, sin θ · n)` with `θ ∈ [0, π]`
//! it returns `(ln|q|, θ · n)`. On the branch cut θ = π the axis `n` is not determined
//! by `q`, so `exp(log(q)) = q` still holds but `log(exp(p)) = p` only for `|v| < π`.
//!
//! # Regimes
//!
//! | regime     | exp                          | log                             |
//! | ---------- | ---------------------------- | ------------------------------- |
//! | `Regular`  | `sin θ / θ`                  | `θ / |v|`                       |
//! | `NearZero` | series for `sin θ / θ`       | series for `θ / sin θ`          |
//! | `NearPi`   | (not singular)               | axis from [`stable_axis`]       |

use crate::config::Tolerances;
use crate::error::{QuaternionError, QuaternionResult};
use crate::quaternion::Quaternion;
use crate::stability::{
    AngleRegime, classify_angle, half_angle, inverse_sinc, sinc, stable_axis,
};
use tracing::trace;

impl Quaternion {
    /// Quaternion exponential.
    pub fn exp(&self) -> Self {
        self.exp_with(&Tolerances::default())
    }

    /// Quaternion exponential with explicit tolerances.
    ///
    /// A large scalar part overflows `e^w` to infinity; zero vector components stay zero
    /// instead of turning into NaN, so the overflow is left for
    /// [`Quaternion::ensure_finite`] (or any normalizing consumer) to report.
    pub fn exp_with(&self, tolerances: &Tolerances) -> Self {
        let v = self.vector();
        let theta = v.norm();

        // exp has no singularity at π; only the 0/0 at θ = 0 needs a guard
        let regime = if theta < tolerances.small_angle {
            AngleRegime::NearZero
        } else {
            AngleRegime::Regular
        };

        let scale = if self.w() == 0.0 { 1.0 } else { self.w().exp() };
        let vector_scale = scale * sinc(theta, regime);
        let scaled = |c: f64| if c == 0.0 { 0.0 } else { c * vector_scale };

        Quaternion::new(
            scale * theta.cos(),
            scaled(v.x),
            scaled(v.y),
            scaled(v.z),
        )
    }

    /// Quaternion logarithm.
    pub fn log(&self) -> QuaternionResult<Self> {
        self.log_with(&Tolerances::default())
    }

    /// Quaternion logarithm, failing with [`QuaternionError::ZeroQuaternion`] for `q ≈ 0`
    /// and with [`QuaternionError::NonFinite`] for NaN or infinite input.
    pub fn log_with(&self, tolerances: &Tolerances) -> QuaternionResult<Self> {
        let norm = self.norm();
        if !norm.is_finite() {
            return Err(QuaternionError::NonFinite {
                value: self.to_string(),
            });
        }
        if norm < tolerances.zero_norm {
            return Err(QuaternionError::ZeroQuaternion { norm });
        }

        let v = self.vector();
        let theta = half_angle(self);
        let regime = classify_angle(theta, tolerances);

        let vector = match regime {
            AngleRegime::Regular => v * (theta / v.norm()),
            AngleRegime::NearZero => v * (inverse_sinc(theta, regime) / norm),
            AngleRegime::NearPi => {
                trace!(theta, "log on the branch cut, axis chosen from largest component");
                stable_axis(&v, tolerances) * theta
            }
        };

        Ok(Quaternion::from_parts(norm.ln(), &vector))
    }

    /// Real power `q^t = exp(t · log(q))`.
    ///
    /// For a unit quaternion this is the fractional rotation by `t` times the angle.
    pub fn power(&self, t: f64) -> QuaternionResult<Self> {
        self.power_with(t, &Tolerances::default())
    }

    /// Real power with explicit tolerances.
    ///
    /// Fails with [`QuaternionError::NonFinite`] when `t` is not finite or `|q|^t`
    /// overflows.
    pub fn power_with(&self, t: f64, tolerances: &Tolerances) -> QuaternionResult<Self> {
        self.log_with(tolerances)?
            .scalar_multiply(t)
            .exp_with(tolerances)
            .ensure_finite()
    }

    /// Principal square root.
    ///
    /// For a negative real input `(−r, 0, 0, 0)` every `√r · (0, n)` with unit `n` is a
    /// root; the axis is picked with [`stable_axis`] so the result is deterministic.
    pub fn sqrt(&self) -> Self {
        self.sqrt_with(&Tolerances::default())
    }

    /// Principal square root with explicit tolerances.
    ///
    /// `zero_norm` decides when the input counts as zero, and the axis of a negative real
    /// input is picked with the same tolerance.
    pub fn sqrt_with(&self, tolerances: &Tolerances) -> Self {
        let norm = self.norm();
        if norm < tolerances.zero_norm {
            return Quaternion::ZERO;
        }

        let w = self.w();
        let v = self.vector();
        let v_norm_sq = self.vector_norm_squared();

        // |q| + w without cancellation when w < 0
        let s = if w >= 0.0 {
            norm + w
        } else {
            v_norm_sq / (norm - w)
        };

        if s > 0.0 {
            let inv = 1.0 / (2.0 * s).sqrt();
            Quaternion::new(s * inv, v.x * inv, v.y * inv, v.z * inv)
        } else {
            Quaternion::pure(&(stable_axis(&v, tolerances) * norm.sqrt()))
        }
    }
}
