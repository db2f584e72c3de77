//! Spherical coordinates of the rotated z axis.
//!
//! `from_spherical_coordinates(θ, φ)` is the rotation `R_z(φ) · R_y(θ)`, which carries
//! the z axis to the unit vector with polar angle θ and azimuth φ. The inverse only
//! recovers those two angles; any twist about the final direction is lost.

use crate::array::{QuaternionArray, RealArray};
use crate::config::Tolerances;
use crate::convert::{axis_rotation, split_pairs};
use crate::error::QuaternionResult;
use crate::quaternion::Quaternion;
use nalgebra::Vector3;
use tracing::debug;

impl Quaternion {
    /// Rotation taking the z axis to polar angle `theta` and azimuth `phi`.
    pub fn from_spherical_coordinates(theta: f64, phi: f64) -> Self {
        axis_rotation(2, phi) * axis_rotation(1, theta)
    }

    /// Polar angle θ ∈ [0, π] and azimuth φ ∈ (−π, π] of the rotated z axis.
    pub fn to_spherical_coordinates(&self) -> QuaternionResult<(f64, f64)> {
        self.to_spherical_coordinates_with(&Tolerances::default())
    }

    /// Spherical coordinates with explicit tolerances.
    pub fn to_spherical_coordinates_with(
        &self,
        tolerances: &Tolerances,
    ) -> QuaternionResult<(f64, f64)> {
        let n = self.rotate_vector_with(&Vector3::z(), tolerances)?;
        let theta = n.x.hypot(n.y).atan2(n.z);
        let phi = n.y.atan2(n.x);
        Ok((theta, phi))
    }
}

impl QuaternionArray {
    /// Element-wise rotations from broadcast polar and azimuthal angles.
    pub fn from_spherical_coordinates(
        theta: &RealArray,
        phi: &RealArray,
    ) -> QuaternionResult<Self> {
        debug!(theta = %theta.shape(), phi = %phi.shape(), "spherical coordinates to quaternions");
        theta.zip_with(phi, |t, p| Quaternion::from_spherical_coordinates(*t, *p))
    }

    /// Element-wise polar and azimuthal angles.
    pub fn to_spherical_coordinates(&self) -> QuaternionResult<(RealArray, RealArray)> {
        self.to_spherical_coordinates_with(&Tolerances::default())
    }

    /// Element-wise polar and azimuthal angles with explicit tolerances.
    pub fn to_spherical_coordinates_with(
        &self,
        tolerances: &Tolerances,
    ) -> QuaternionResult<(RealArray, RealArray)> {
        debug!(shape = %self.shape(), "quaternions to spherical coordinates");
        let pairs = self.try_map(|q| q.to_spherical_coordinates_with(tolerances))?;
        Ok(split_pairs(pairs))
    }
}
