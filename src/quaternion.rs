//! Scalar quaternion arithmetic.
//!
//! [`Quaternion`] is a plain `Copy` value `w + x·i + y·j + z·k`. Unlike a unit-quaternion
//! rotation type it does not renormalize: every operation here is exact algebra on four
//! `f64` components, and rotation semantics are layered on top by the conversion and
//! interpolation modules.
//!
//! Infallible operations are exposed both as methods and through the std operators
//! (`+`, `-`, `*` for the Hamilton product and for scaling, unary `-`). Operations that
//! divide ([`Quaternion::inverse`], [`Quaternion::divide`], ...) return a
//! [`QuaternionResult`] and fail with [`QuaternionError::DivisionByZero`] instead of
//! producing infinities.

use crate::config::Tolerances;
use crate::error::{QuaternionError, QuaternionResult};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// A quaternion `w + x·i + y·j + z·k`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    w: f64,
    x: f64,
    y: f64,
    z: f64,
}

impl fmt::Display for Quaternion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Quaternion(w: {:.4}, x: {:.4}, y: {:.4}, z: {:.4})",
            self.w, self.x, self.y, self.z
        )
    }
}

impl From<[f64; 4]> for Quaternion {
    fn from(c: [f64; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

impl From<Quaternion> for [f64; 4] {
    fn from(q: Quaternion) -> Self {
        q.coords()
    }
}

impl Quaternion {
    /// The additive identity `0`.
    pub const ZERO: Quaternion = Quaternion::new(0.0, 0.0, 0.0, 0.0);

    /// The multiplicative identity `1` (the identity rotation).
    pub const IDENTITY: Quaternion = Quaternion::new(1.0, 0.0, 0.0, 0.0);

    /// Create a quaternion from its components.
    #[inline]
    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// The identity rotation `(1, 0, 0, 0)`.
    #[inline]
    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    /// Build a quaternion from its scalar part and vector part.
    #[inline]
    pub fn from_parts(scalar: f64, vector: &Vector3<f64>) -> Self {
        Self::new(scalar, vector.x, vector.y, vector.z)
    }

    /// A pure quaternion `(0, v)`.
    #[inline]
    pub fn pure(vector: &Vector3<f64>) -> Self {
        Self::from_parts(0.0, vector)
    }

    /// Scalar (real) component.
    #[inline]
    pub fn w(&self) -> f64 {
        self.w
    }

    /// i component.
    #[inline]
    pub fn x(&self) -> f64 {
        self.x
    }

    /// j component.
    #[inline]
    pub fn y(&self) -> f64 {
        self.y
    }

    /// k component.
    #[inline]
    pub fn z(&self) -> f64 {
        self.z
    }

    /// Scalar part, same as [`Quaternion::w`].
    #[inline]
    pub fn scalar(&self) -> f64 {
        self.w
    }

    /// Vector part `(x, y, z)`.
    #[inline]
    pub fn vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Components as `[w, x, y, z]`.
    #[inline]
    pub fn coords(&self) -> [f64; 4] {
        [self.w, self.x, self.y, self.z]
    }

    /// Real part, same as [`Quaternion::w`].
    #[inline]
    pub fn real(&self) -> f64 {
        self.w
    }

    /// Imaginary part, same as [`Quaternion::vector`].
    #[inline]
    pub fn imag(&self) -> Vector3<f64> {
        self.vector()
    }

    /// Coefficient of `i`.
    #[inline]
    pub fn i(&self) -> f64 {
        self.x
    }

    /// Coefficient of `j`.
    #[inline]
    pub fn j(&self) -> f64 {
        self.y
    }

    /// Coefficient of `k`.
    #[inline]
    pub fn k(&self) -> f64 {
        self.z
    }

    /// Magnitude, same as [`Quaternion::norm`].
    #[inline]
    pub fn abs(&self) -> f64 {
        self.norm()
    }

    /// Squared magnitude, same as [`Quaternion::norm_squared`].
    #[inline]
    pub fn abs2(&self) -> f64 {
        self.norm_squared()
    }

    /// Component-wise sum.
    #[inline]
    pub fn add(&self, other: &Self) -> Self {
        Self::new(
            self.w + other.w,
            self.x + other.x,
            self.y + other.y,
            self.z + other.z,
        )
    }

    /// Component-wise difference.
    #[inline]
    pub fn subtract(&self, other: &Self) -> Self {
        Self::new(
            self.w - other.w,
            self.x - other.x,
            self.y - other.y,
            self.z - other.z,
        )
    }

    /// Hamilton product `self · other` (non-commutative).
    ///
    /// For a = (aw, ax, ay, az) and b = (bw, bx, by, bz):
    /// ```text
    /// w = aw·bw − ax·bx − ay·by − az·bz
    /// x = aw·bx + ax·bw + ay·bz − az·by
    /// y = aw·by − ax·bz + ay·bw + az·bx
    /// z = aw·bz + ax·by − ay·bx + az·bw
    /// ```
    #[inline]
    pub fn multiply(&self, other: &Self) -> Self {
        let (aw, ax, ay, az) = (self.w, self.x, self.y, self.z);
        let (bw, bx, by, bz) = (other.w, other.x, other.y, other.z);

        Self::new(
            aw * bw - ax * bx - ay * by - az * bz,
            aw * bx + ax * bw + ay * bz - az * by,
            aw * by - ax * bz + ay * bw + az * bx,
            aw * bz + ax * by - ay * bx + az * bw,
        )
    }

    /// Commutator `self·other − other·self`, twice the cross product of the vector parts.
    #[inline]
    pub fn commutator(&self, other: &Self) -> Self {
        self.multiply(other).subtract(&other.multiply(self))
    }

    /// Scalar product: the grade-0 part of `self · other`, `w₁w₂ − v₁·v₂`.
    ///
    /// The vector part of the result is zero.
    #[inline]
    pub fn scalar_product(&self, other: &Self) -> Self {
        Self::new(self.multiply(other).w, 0.0, 0.0, 0.0)
    }

    /// Outer (wedge) product `(w₁w₂, w₁v₂ + w₂v₁)`.
    ///
    /// Treating the vector parts as bivectors, their wedge vanishes in three dimensions,
    /// so only the products involving a scalar part survive.
    #[inline]
    pub fn outer_product(&self, other: &Self) -> Self {
        Self::new(
            self.w * other.w,
            self.w * other.x + self.x * other.w,
            self.w * other.y + self.y * other.w,
            self.w * other.z + self.z * other.w,
        )
    }

    /// Left contraction `self ⌋ other`: the scalar product plus `w₁ v₂`.
    #[inline]
    pub fn left_contraction(&self, other: &Self) -> Self {
        Self::new(
            self.scalar_product(other).w,
            self.w * other.x,
            self.w * other.y,
            self.w * other.z,
        )
    }

    /// Right contraction `self ⌊ other`: the scalar product plus `v₁ w₂`.
    #[inline]
    pub fn right_contraction(&self, other: &Self) -> Self {
        Self::new(
            self.scalar_product(other).w,
            self.x * other.w,
            self.y * other.w,
            self.z * other.w,
        )
    }

    /// Conjugate `(w, −x, −y, −z)`.
    #[inline]
    pub fn conjugate(&self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Additive inverse `(−w, −x, −y, −z)`; the same rotation under the double cover.
    #[inline]
    pub fn negate(&self) -> Self {
        Self::new(-self.w, -self.x, -self.y, -self.z)
    }

    /// Four-dimensional inner product.
    #[inline]
    pub fn dot(&self, other: &Self) -> f64 {
        self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Sum of squared components.
    #[inline]
    pub fn norm_squared(&self) -> f64 {
        self.dot(self)
    }

    /// Euclidean norm `|q|`.
    #[inline]
    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// Squared norm of the vector part.
    #[inline]
    pub fn vector_norm_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Multiply every component by a real scalar.
    #[inline]
    pub fn scalar_multiply(&self, s: f64) -> Self {
        Self::new(self.w * s, self.x * s, self.y * s, self.z * s)
    }

    /// Divide every component by a real scalar.
    pub fn divide(&self, s: f64) -> QuaternionResult<Self> {
        self.divide_with(s, &Tolerances::default())
    }

    /// Divide every component by a real scalar, failing when `|s| < zero_norm`.
    pub fn divide_with(&self, s: f64, tolerances: &Tolerances) -> QuaternionResult<Self> {
        if s.is_nan() || s.abs() < tolerances.zero_norm {
            return Err(QuaternionError::DivisionByZero { denominator: s });
        }
        Ok(self.scalar_multiply(1.0 / s))
    }

    /// Multiplicative inverse `conj(q) / |q|²`.
    pub fn inverse(&self) -> QuaternionResult<Self> {
        self.inverse_with(&Tolerances::default())
    }

    /// Multiplicative inverse, failing when `|q| < zero_norm` or when a component is
    /// not finite.
    ///
    /// The test is done on the squared norm so no square root is taken.
    pub fn inverse_with(&self, tolerances: &Tolerances) -> QuaternionResult<Self> {
        let norm_sq = self.norm_squared();
        if !norm_sq.is_finite() {
            return Err(QuaternionError::NonFinite {
                value: self.to_string(),
            });
        }
        if norm_sq < tolerances.zero_norm * tolerances.zero_norm {
            return Err(QuaternionError::DivisionByZero {
                denominator: norm_sq,
            });
        }
        Ok(self.conjugate().scalar_multiply(1.0 / norm_sq))
    }

    /// Same as [`Quaternion::inverse`].
    pub fn reciprocal(&self) -> QuaternionResult<Self> {
        self.inverse()
    }

    /// Quaternion quotient `self · other⁻¹`.
    pub fn divide_by(&self, other: &Self) -> QuaternionResult<Self> {
        self.divide_by_with(other, &Tolerances::default())
    }

    /// Quaternion quotient `self · other⁻¹` with explicit tolerances.
    pub fn divide_by_with(&self, other: &Self, tolerances: &Tolerances) -> QuaternionResult<Self> {
        Ok(self.multiply(&other.inverse_with(tolerances)?))
    }

    /// Real scalar divided by a quaternion, `s · q⁻¹`.
    pub fn scalar_divide(s: f64, q: &Self) -> QuaternionResult<Self> {
        Self::scalar_divide_with(s, q, &Tolerances::default())
    }

    /// Real scalar divided by a quaternion with explicit tolerances.
    pub fn scalar_divide_with(s: f64, q: &Self, tolerances: &Tolerances) -> QuaternionResult<Self> {
        Ok(q.inverse_with(tolerances)?.scalar_multiply(s))
    }

    /// `q · q`.
    #[inline]
    pub fn square(&self) -> Self {
        self.multiply(self)
    }

    /// True if all components are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.w.is_finite() && self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// True if any component is NaN.
    #[inline]
    pub fn is_nan(&self) -> bool {
        self.w.is_nan() || self.x.is_nan() || self.y.is_nan() || self.z.is_nan()
    }

    /// True if any component is infinite.
    #[inline]
    pub fn is_infinite(&self) -> bool {
        self.w.is_infinite() || self.x.is_infinite() || self.y.is_infinite() || self.z.is_infinite()
    }

    /// Fail with [`QuaternionError::NonFinite`] if a component is NaN or infinite.
    pub fn ensure_finite(&self) -> QuaternionResult<Self> {
        if self.is_finite() {
            Ok(*self)
        } else {
            Err(QuaternionError::NonFinite {
                value: self.to_string(),
            })
        }
    }

    /// True if `| |q| - 1 | <= unit_norm`.
    pub fn is_unit(&self, tolerances: &Tolerances) -> bool {
        (self.norm() - 1.0).abs() <= tolerances.unit_norm
    }

    /// Component-wise approximate equality (sign sensitive).
    pub fn is_approx(&self, other: &Self, tolerance: f64) -> bool {
        (self.w - other.w).abs() < tolerance
            && (self.x - other.x).abs() < tolerance
            && (self.y - other.y).abs() < tolerance
            && (self.z - other.z).abs() < tolerance
    }

    /// Approximate equality up to the double cover: true if `self ≈ other` or `self ≈ −other`.
    pub fn is_approx_rotation(&self, other: &Self, tolerance: f64) -> bool {
        self.is_approx(other, tolerance) || self.is_approx(&other.negate(), tolerance)
    }
}

impl Add for Quaternion {
    type Output = Quaternion;

    #[inline]
    fn add(self, rhs: Quaternion) -> Quaternion {
        Quaternion::add(&self, &rhs)
    }
}

impl Sub for Quaternion {
    type Output = Quaternion;

    #[inline]
    fn sub(self, rhs: Quaternion) -> Quaternion {
        self.subtract(&rhs)
    }
}

impl Mul for Quaternion {
    type Output = Quaternion;

    #[inline]
    fn mul(self, rhs: Quaternion) -> Quaternion {
        self.multiply(&rhs)
    }
}

impl Mul<f64> for Quaternion {
    type Output = Quaternion;

    #[inline]
    fn mul(self, rhs: f64) -> Quaternion {
        self.scalar_multiply(rhs)
    }
}

impl Mul<Quaternion> for f64 {
    type Output = Quaternion;

    #[inline]
    fn mul(self, rhs: Quaternion) -> Quaternion {
        rhs.scalar_multiply(self)
    }
}

impl Neg for Quaternion {
    type Output = Quaternion;

    #[inline]
    fn neg(self) -> Quaternion {
        self.negate()
    }
}

impl AddAssign for Quaternion {
    #[inline]
    fn add_assign(&mut self, rhs: Quaternion) {
        *self = *self + rhs;
    }
}

impl SubAssign for Quaternion {
    #[inline]
    fn sub_assign(&mut self, rhs: Quaternion) {
        *self = *self - rhs;
    }
}

impl MulAssign for Quaternion {
    #[inline]
    fn mul_assign(&mut self, rhs: Quaternion) {
        *self = *self * rhs;
    }
}

impl MulAssign<f64> for Quaternion {
    #[inline]
    fn mul_assign(&mut self, rhs: f64) {
        *self = *self * rhs;
    }
}

// ============================================================================
// Tests
// ============================================================================
