//! Numerical tolerances for the stability guards.
//!
//! Every tolerance-sensitive operation in the crate comes in two flavours: a plain form
//! that uses [`Tolerances::default()`] and a `*_with` form taking an explicit
//! `&Tolerances`. Thresholds are absolute; quaternion inputs are expected to have
//! magnitudes of order one.
//!
//! | field             | default | used by                                          |
//! | ----------------- | ------- | ------------------------------------------------ |
//! | `zero_norm`       | 1e-12   | normalize, inverse, divide, axis extraction      |
//! | `small_angle`     | 1e-6    | Taylor branches of exp/log, slerp lerp fallback  |
//! | `near_pi`         | 1e-6    | log / axis extraction near the branch cut        |
//! | `rotation_matrix` | 1e-8    | orthonormality and determinant check             |
//! | `gimbal_lock`     | 1e-9    | Euler-angle degeneracy detection                 |
//! | `unit_norm`       | 1e-9    | `is_unit` checks                                 |

use crate::error::{QuaternionError, QuaternionResult};
use serde::{Deserialize, Serialize};

/// Caller-overridable thresholds for near-zero, near-π and near-singular detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerances {
    /// Norms (of quaternions, vectors and scalar divisors) below this are treated as zero
    pub zero_norm: f64,
    /// Angles below this use series expansions instead of `sin(θ)/θ`
    pub small_angle: f64,
    /// Angles within this distance of π are treated as lying on the branch cut
    pub near_pi: f64,
    /// Maximum deviation of `MᵀM` from identity and of `det M` from +1
    pub rotation_matrix: f64,
    /// Distance of the internal middle Euler angle from 0 or π that counts as gimbal lock
    pub gimbal_lock: f64,
    /// Maximum `| |q| - 1 |` for a quaternion to count as unit
    pub unit_norm: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            zero_norm: 1e-12,
            small_angle: 1e-6,
            near_pi: 1e-6,
            rotation_matrix: 1e-8,
            gimbal_lock: 1e-9,
            unit_norm: 1e-9,
        }
    }
}

impl Tolerances {
    /// Create the default tolerances.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the zero-norm threshold.
    pub fn with_zero_norm(mut self, zero_norm: f64) -> Self {
        self.zero_norm = zero_norm;
        self
    }

    /// Set the small-angle threshold.
    pub fn with_small_angle(mut self, small_angle: f64) -> Self {
        self.small_angle = small_angle;
        self
    }

    /// Set the near-π threshold.
    pub fn with_near_pi(mut self, near_pi: f64) -> Self {
        self.near_pi = near_pi;
        self
    }

    /// Set the rotation-matrix validation tolerance.
    pub fn with_rotation_matrix(mut self, rotation_matrix: f64) -> Self {
        self.rotation_matrix = rotation_matrix;
        self
    }

    /// Set the gimbal-lock detection threshold.
    pub fn with_gimbal_lock(mut self, gimbal_lock: f64) -> Self {
        self.gimbal_lock = gimbal_lock;
        self
    }

    /// Set the unit-norm tolerance.
    pub fn with_unit_norm(mut self, unit_norm: f64) -> Self {
        self.unit_norm = unit_norm;
        self
    }

    /// Check that every threshold is finite and non-negative.
    pub fn validate(&self) -> QuaternionResult<()> {
        let fields = [
            ("zero_norm", self.zero_norm),
            ("small_angle", self.small_angle),
            ("near_pi", self.near_pi),
            ("rotation_matrix", self.rotation_matrix),
            ("gimbal_lock", self.gimbal_lock),
            ("unit_norm", self.unit_norm),
        ];

        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(QuaternionError::InvalidArgument(format!(
                    "tolerance '{name}' must be finite and non-negative, got {value}"
                )));
            }
        }

        Ok(())
    }
}
