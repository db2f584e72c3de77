//! Shared utilities for quaternion integration tests
//!
//! Random inputs are drawn from a seeded generator so every run sees the same samples.

#![allow(dead_code)]

use nalgebra::Vector3;
use quaternion_array::{Quaternion, QuaternionArray};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seed shared by all integration tests
pub const SEED: u64 = 0x5eed_cafe;

/// Deterministic generator for test inputs
pub fn test_rng() -> StdRng {
    StdRng::seed_from_u64(SEED)
}

/// Generate `n` uniformly distributed unit quaternions
///
/// # Arguments
/// * `n` - Number of quaternions to generate
/// * `seed` - Random seed
pub fn random_unit_quaternions(n: usize, seed: u64) -> Vec<Quaternion> {
    let mut rng = StdRng::seed_from_u64(seed);
    QuaternionArray::random_with([n], &mut rng).into_vec()
}

/// Generate `n` unit quaternions whose rotation angle lies in `[min_angle, max_angle]`
///
/// Useful for properties that exclude the singular angles 0 and π.
pub fn random_rotations_in_range(n: usize, min_angle: f64, max_angle: f64, seed: u64) -> Vec<Quaternion> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let axis = random_direction(&mut rng);
            let angle = rng.random_range(min_angle..max_angle);
            Quaternion::from_axis_angle(&axis, angle).expect("random axis is never zero")
        })
        .collect()
}

/// Unit vector uniformly distributed on the sphere
pub fn random_direction<R: Rng>(rng: &mut R) -> Vector3<f64> {
    let z: f64 = rng.random_range(-1.0..1.0);
    let phi: f64 = rng.random_range(0.0..std::f64::consts::TAU);
    let r = (1.0 - z * z).sqrt();
    Vector3::new(r * phi.cos(), r * phi.sin(), z)
}

/// Generic (non-unit) quaternion with components in `[-scale, scale]`
pub fn random_quaternion<R: Rng>(rng: &mut R, scale: f64) -> Quaternion {
    Quaternion::new(
        rng.random_range(-scale..scale),
        rng.random_range(-scale..scale),
        rng.random_range(-scale..scale),
        rng.random_range(-scale..scale),
    )
}
