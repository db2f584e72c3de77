//! Element-wise quaternion algebra over batch arrays.
//!
//! Every binary operation broadcasts its operands with the rules of
//! [`broadcast_shapes`](crate::broadcast::broadcast_shapes): a single quaternion
//! (batch shape `[]`) combines with an array of any shape, a `[3, 1]` batch with a
//! `[4]` batch gives `[3, 4]`, and so on. Real-valued operands ([`RealArray`]) broadcast
//! against the quaternion batch shape in the same way.

use crate::array::{BatchArray, QuaternionArray, RealArray};
use crate::config::Tolerances;
use crate::error::{QuaternionError, QuaternionResult};
use crate::quaternion::Quaternion;
use crate::stability::unflip_sequence;

impl QuaternionArray {
    /// Element-wise sum.
    pub fn add(&self, other: &QuaternionArray) -> QuaternionResult<QuaternionArray> {
        self.zip_with(other, Quaternion::add)
    }

    /// Element-wise difference.
    pub fn subtract(&self, other: &QuaternionArray) -> QuaternionResult<QuaternionArray> {
        self.zip_with(other, Quaternion::subtract)
    }

    /// Element-wise Hamilton product `self · other`.
    pub fn multiply(&self, other: &QuaternionArray) -> QuaternionResult<QuaternionArray> {
        self.zip_with(other, Quaternion::multiply)
    }

    /// Element-wise quotient `self · other⁻¹`.
    pub fn divide(&self, other: &QuaternionArray) -> QuaternionResult<QuaternionArray> {
        self.divide_with(other, &Tolerances::default())
    }

    /// Element-wise quotient with explicit tolerances.
    pub fn divide_with(
        &self,
        other: &QuaternionArray,
        tolerances: &Tolerances,
    ) -> QuaternionResult<QuaternionArray> {
        self.try_zip_with(other, |a, b| a.divide_by_with(b, tolerances))
    }

    /// Element-wise commutator `ab − ba`.
    pub fn commutator(&self, other: &QuaternionArray) -> QuaternionResult<QuaternionArray> {
        self.zip_with(other, Quaternion::commutator)
    }

    /// Element-wise four-dimensional inner product.
    pub fn dot(&self, other: &QuaternionArray) -> QuaternionResult<RealArray> {
        self.zip_with(other, Quaternion::dot)
    }

    /// Multiply every element by the same real scalar.
    pub fn scale(&self, s: f64) -> QuaternionArray {
        self.map(|q| q.scalar_multiply(s))
    }

    /// Multiply by a broadcast array of real scalars.
    pub fn scalar_multiply(&self, s: &RealArray) -> QuaternionResult<QuaternionArray> {
        self.zip_with(s, |q, s| q.scalar_multiply(*s))
    }

    /// Divide by a broadcast array of real scalars.
    pub fn scalar_divide(&self, s: &RealArray) -> QuaternionResult<QuaternionArray> {
        self.scalar_divide_with(s, &Tolerances::default())
    }

    /// Divide by a broadcast array of real scalars with explicit tolerances.
    pub fn scalar_divide_with(
        &self,
        s: &RealArray,
        tolerances: &Tolerances,
    ) -> QuaternionResult<QuaternionArray> {
        self.try_zip_with(s, |q, s| q.divide_with(*s, tolerances))
    }

    /// Real scalars divided by quaternions, `s · q⁻¹` (broadcast).
    pub fn divide_scalar_by(&self, s: &RealArray) -> QuaternionResult<QuaternionArray> {
        self.divide_scalar_by_with(s, &Tolerances::default())
    }

    /// Real scalars divided by quaternions with explicit tolerances.
    pub fn divide_scalar_by_with(
        &self,
        s: &RealArray,
        tolerances: &Tolerances,
    ) -> QuaternionResult<QuaternionArray> {
        self.try_zip_with(s, |q, s| Quaternion::scalar_divide_with(*s, q, tolerances))
    }

    /// Element-wise negation.
    pub fn negate(&self) -> QuaternionArray {
        self.map(Quaternion::negate)
    }

    /// Element-wise conjugate.
    pub fn conjugate(&self) -> QuaternionArray {
        self.map(Quaternion::conjugate)
    }

    /// Element-wise squared norm.
    pub fn norm_squared(&self) -> RealArray {
        self.map(Quaternion::norm_squared)
    }

    /// Element-wise norm.
    pub fn norm(&self) -> RealArray {
        self.map(Quaternion::norm)
    }

    /// Element-wise inverse.
    pub fn inverse(&self) -> QuaternionResult<QuaternionArray> {
        self.inverse_with(&Tolerances::default())
    }

    /// Element-wise inverse with explicit tolerances.
    pub fn inverse_with(&self, tolerances: &Tolerances) -> QuaternionResult<QuaternionArray> {
        self.try_map(|q| q.inverse_with(tolerances))
    }

    /// Element-wise normalization.
    pub fn normalize(&self) -> QuaternionResult<QuaternionArray> {
        self.normalize_with(&Tolerances::default())
    }

    /// Element-wise normalization with explicit tolerances.
    pub fn normalize_with(&self, tolerances: &Tolerances) -> QuaternionResult<QuaternionArray> {
        self.try_map(|q| q.normalize_with(tolerances))
    }

    /// Normalize every element in place.
    ///
    /// All elements are checked before any is modified, so on error the array is left
    /// unchanged.
    pub fn normalize_in_place(&mut self, tolerances: &Tolerances) -> QuaternionResult<()> {
        let normalized = self.normalize_with(tolerances)?;
        self.as_mut_slice().copy_from_slice(normalized.as_slice());
        Ok(())
    }

    /// Element-wise square.
    pub fn square(&self) -> QuaternionArray {
        self.map(Quaternion::square)
    }

    /// Element-wise principal square root.
    pub fn sqrt(&self) -> QuaternionArray {
        self.sqrt_with(&Tolerances::default())
    }

    /// Element-wise principal square root with explicit tolerances.
    pub fn sqrt_with(&self, tolerances: &Tolerances) -> QuaternionArray {
        self.map(|q| q.sqrt_with(tolerances))
    }

    /// Element-wise exponential.
    pub fn exp(&self) -> QuaternionArray {
        self.exp_with(&Tolerances::default())
    }

    /// Element-wise exponential with explicit tolerances.
    pub fn exp_with(&self, tolerances: &Tolerances) -> QuaternionArray {
        self.map(|q| q.exp_with(tolerances))
    }

    /// Element-wise logarithm.
    pub fn log(&self) -> QuaternionResult<QuaternionArray> {
        self.log_with(&Tolerances::default())
    }

    /// Element-wise logarithm with explicit tolerances.
    pub fn log_with(&self, tolerances: &Tolerances) -> QuaternionResult<QuaternionArray> {
        self.try_map(|q| q.log_with(tolerances))
    }

    /// Element-wise real power with a broadcast exponent.
    pub fn power(&self, t: &RealArray) -> QuaternionResult<QuaternionArray> {
        self.power_with(t, &Tolerances::default())
    }

    /// Element-wise real power with explicit tolerances.
    pub fn power_with(
        &self,
        t: &RealArray,
        tolerances: &Tolerances,
    ) -> QuaternionResult<QuaternionArray> {
        self.try_zip_with(t, |q, t| q.power_with(*t, tolerances))
    }

    /// Element-wise scalar product `a | b` (grade-0 part of `ab`).
    pub fn scalar_product(&self, other: &QuaternionArray) -> QuaternionResult<QuaternionArray> {
        self.zip_with(other, Quaternion::scalar_product)
    }

    /// Element-wise outer (wedge) product `a ^ b`.
    pub fn outer_product(&self, other: &QuaternionArray) -> QuaternionResult<QuaternionArray> {
        self.zip_with(other, Quaternion::outer_product)
    }

    /// Element-wise left contraction `a ⌋ b`.
    pub fn left_contraction(&self, other: &QuaternionArray) -> QuaternionResult<QuaternionArray> {
        self.zip_with(other, Quaternion::left_contraction)
    }

    /// Element-wise right contraction `a ⌊ b`.
    pub fn right_contraction(&self, other: &QuaternionArray) -> QuaternionResult<QuaternionArray> {
        self.zip_with(other, Quaternion::right_contraction)
    }

    /// Element-wise exact equality of all four components.
    pub fn equal(&self, other: &QuaternionArray) -> QuaternionResult<BatchArray<bool>> {
        self.zip_with(other, |a, b| a == b)
    }

    /// Element-wise negation of [`QuaternionArray::equal`].
    pub fn not_equal(&self, other: &QuaternionArray) -> QuaternionResult<BatchArray<bool>> {
        self.zip_with(other, |a, b| a != b)
    }

    /// Element-wise magnitude, same as [`QuaternionArray::norm`].
    pub fn abs(&self) -> RealArray {
        self.norm()
    }

    /// Element-wise squared magnitude, same as [`QuaternionArray::norm_squared`].
    pub fn abs2(&self) -> RealArray {
        self.norm_squared()
    }

    /// Element-wise approximate equality up to `tolerance` per component.
    pub fn approx_eq(
        &self,
        other: &QuaternionArray,
        tolerance: f64,
    ) -> QuaternionResult<BatchArray<bool>> {
        self.zip_with(other, |a, b| a.is_approx(b, tolerance))
    }

    /// Element-wise approximate equality up to the double-cover sign.
    pub fn approx_eq_rotation(
        &self,
        other: &QuaternionArray,
        tolerance: f64,
    ) -> QuaternionResult<BatchArray<bool>> {
        self.zip_with(other, |a, b| a.is_approx_rotation(b, tolerance))
    }

    /// Flip signs along `axis` so neighbouring elements have non-negative dot products.
    ///
    /// Each element is compared with its predecessor along `axis` (after that one has
    /// itself been aligned), removing the discontinuous `q → −q` jumps that appear when
    /// a trajectory is sampled from a representation with another sign convention.
    pub fn unflip(&self, axis: usize) -> QuaternionResult<QuaternionArray> {
        let mut out = self.clone();
        out.unflip_in_place(axis)?;
        Ok(out)
    }

    /// In-place version of [`QuaternionArray::unflip`].
    pub fn unflip_in_place(&mut self, axis: usize) -> QuaternionResult<()> {
        let ndim = self.ndim();
        if axis >= ndim {
            return Err(QuaternionError::InvalidArgument(format!(
                "axis {axis} is out of range for batch shape {}",
                self.shape()
            )));
        }

        if ndim == 1 {
            unflip_sequence(self.as_mut_slice());
            return Ok(());
        }

        let dim = self.shape().dims()[axis];
        let stride = self.shape().strides()[axis];
        let data = self.as_mut_slice();
        for flat in 0..data.len() {
            if (flat / stride) % dim != 0 {
                data[flat] = data[flat].aligned_with(&data[flat - stride]);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::Shape;

    const TOLERANCE: f64 = 1e-12;

    fn sample() -> QuaternionArray {
        QuaternionArray::from_vec(vec![
            Quaternion::new(1.0, 2.0, 3.0, 4.0),
            Quaternion::new(-0.5, 0.25, 1.0, 0.0),
            Quaternion::new(0.0, 0.0, 0.0, 1.0),
        ])
    }

    #[test]
    fn test_multiply_broadcasts_single_quaternion() {
        let batch = sample();
        let single = QuaternionArray::from_components(&[0.5, -1.0, 0.25, 2.0], &[4]).unwrap();

        let product = batch.multiply(&single).unwrap();
        assert_eq!(product.full_shape(), vec![3, 4]);
        for (i, q) in batch.iter().enumerate() {
            let expected = q.multiply(&single.as_slice()[0]);
            assert_eq!(product.as_slice()[i], expected);
        }

        let reversed = single.multiply(&batch).unwrap();
        assert_eq!(reversed.shape().dims(), &[3]);
        assert_ne!(reversed, product);
    }

    #[test]
    fn test_outer_broadcast() {
        let a = sample().reshape([3, 1]).unwrap();
        let b = QuaternionArray::identity([2]);
        let sum = a.add(&b).unwrap();
        assert_eq!(sum.shape().dims(), &[3, 2]);
        assert_eq!(
            sum.get(&[1, 1]),
            Some(&(Quaternion::new(-0.5, 0.25, 1.0, 0.0) + Quaternion::IDENTITY))
        );
    }

    #[test]
    fn test_shape_mismatch() {
        let a = QuaternionArray::identity([3]);
        let b = QuaternionArray::identity([2]);
        let err = a.multiply(&b).unwrap_err();
        assert_eq!(
            err,
            QuaternionError::ShapeMismatch {
                left: vec![3],
                right: vec![2],
            }
        );
    }

    #[test]
    fn test_multiply_by_inverse_is_identity() {
        let a = sample();
        let product = a.multiply(&a.inverse().unwrap()).unwrap();
        assert!(
            product
                .iter()
                .all(|q| q.is_approx(&Quaternion::IDENTITY, TOLERANCE))
        );
    }

    #[test]
    fn test_inverse_fails_as_a_whole() {
        let mut a = sample();
        a.as_mut_slice()[1] = Quaternion::ZERO;

        match a.inverse().unwrap_err() {
            QuaternionError::Element { index, source } => {
                assert_eq!(index, vec![1]);
                assert!(matches!(*source, QuaternionError::DivisionByZero { .. }));
            }
            other => panic!("Expected element error, got {other:?}"),
        }
    }

    #[test]
    fn test_divide_and_scalar_ops() {
        let a = sample();
        let quotient = a.divide(&a).unwrap();
        assert!(
            quotient
                .iter()
                .all(|q| q.is_approx(&Quaternion::IDENTITY, TOLERANCE))
        );

        let s = RealArray::from_vec(vec![2.0, 4.0, 0.5]);
        let scaled = a.scalar_multiply(&s).unwrap();
        assert_eq!(scaled.as_slice()[1], a.as_slice()[1] * 4.0);
        assert_eq!(a.scale(2.0).as_slice()[0], a.as_slice()[0] * 2.0);

        let back = scaled.scalar_divide(&s).unwrap();
        assert!(back.approx_eq(&a, TOLERANCE).unwrap().iter().all(|b| *b));

        let zeros = RealArray::scalar(0.0);
        assert!(a.scalar_divide(&zeros).is_err());

        let reciprocal = a.divide_scalar_by(&RealArray::scalar(1.0)).unwrap();
        assert_eq!(reciprocal, a.inverse().unwrap());
    }

    #[test]
    fn test_norms_and_normalize() {
        let a = sample();
        let norms = a.norm();
        assert!((norms.as_slice()[0] - 30.0_f64.sqrt()).abs() < TOLERANCE);
        assert_eq!(a.norm_squared().as_slice()[2], 1.0);

        let unit = a.normalize().unwrap();
        assert!(unit.norm().iter().all(|n| (n - 1.0).abs() < TOLERANCE));

        let mut in_place = a.clone();
        in_place.normalize_in_place(&Tolerances::default()).unwrap();
        assert_eq!(in_place, unit);

        let mut with_zero = a.clone();
        with_zero.as_mut_slice()[0] = Quaternion::ZERO;
        let before = with_zero.clone();
        assert!(with_zero.normalize_in_place(&Tolerances::default()).is_err());
        assert_eq!(with_zero, before);
    }

    #[test]
    fn test_exp_log_power_arrays() {
        let a = sample().normalize().unwrap();
        let back = a.log().unwrap().exp();
        assert!(back.approx_eq(&a, 1e-12).unwrap().iter().all(|b| *b));

        let t = RealArray::new(vec![0.0, 1.0], [2, 1]).unwrap();
        let powers = a.power(&t).unwrap();
        assert_eq!(powers.shape().dims(), &[2, 3]);
        assert!(powers.get(&[0, 2]).unwrap().is_approx(&Quaternion::IDENTITY, TOLERANCE));
        assert!(powers.get(&[1, 0]).unwrap().is_approx(&a.as_slice()[0], TOLERANCE));
    }

    #[test]
    fn test_sqrt_square_conjugate_negate() {
        let a = sample();
        let roots = a.sqrt();
        assert!(roots.square().approx_eq(&a, 1e-12).unwrap().iter().all(|b| *b));
        assert_eq!(a.conjugate().as_slice()[0], Quaternion::new(1.0, -2.0, -3.0, -4.0));
        assert_eq!(a.negate().as_slice()[0], Quaternion::new(-1.0, -2.0, -3.0, -4.0));
        assert_eq!(a.dot(&a).unwrap(), a.norm_squared());
        assert_eq!(
            a.subtract(&a).unwrap(),
            QuaternionArray::filled(Quaternion::ZERO, [3])
        );
        assert!(a.commutator(&a).unwrap().iter().all(|q| *q == Quaternion::ZERO));
    }

    #[test]
    fn test_geometric_products_broadcast() {
        let a = sample();
        let single = QuaternionArray::scalar(Quaternion::new(2.0, 0.5, -1.0, 0.25));

        let scalar = a.scalar_product(&single).unwrap();
        let outer = a.outer_product(&single).unwrap();
        let left = a.left_contraction(&single).unwrap();
        let right = single.right_contraction(&a).unwrap();
        assert_eq!(outer.shape().dims(), &[3]);

        let b = single.as_slice()[0];
        for (i, q) in a.iter().enumerate() {
            assert_eq!(scalar.as_slice()[i], q.scalar_product(&b));
            assert_eq!(outer.as_slice()[i], q.outer_product(&b));
            assert_eq!(left.as_slice()[i], q.left_contraction(&b));
            assert_eq!(right.as_slice()[i], b.right_contraction(q));
        }
        assert!(a.outer_product(&QuaternionArray::identity([2])).is_err());
    }

    #[test]
    fn test_equal_and_not_equal() {
        let a = sample();
        let mut b = a.clone();
        b.as_mut_slice()[1] = Quaternion::IDENTITY;

        let eq = a.equal(&b).unwrap();
        assert_eq!(eq.as_slice(), &[true, false, true]);
        let ne = a.not_equal(&b).unwrap();
        assert_eq!(ne.as_slice(), &[false, true, false]);

        let rows = a.reshape([3, 1]).unwrap();
        let grid = rows.equal(&sample()).unwrap();
        assert_eq!(grid.shape().dims(), &[3, 3]);
        assert_eq!(grid.iter().filter(|e| **e).count(), 3);

        assert_eq!(sample().abs(), sample().norm());
        assert_eq!(sample().abs2(), sample().norm_squared());
    }

    #[test]
    fn test_tolerance_overrides_for_sqrt_and_reciprocal() {
        let tiny = QuaternionArray::from_vec(vec![Quaternion::new(1e-13, 0.0, 0.0, 0.0)]);
        let loose = Tolerances::new().with_zero_norm(1e-20);

        assert_eq!(tiny.sqrt().as_slice()[0], Quaternion::ZERO);
        assert!(tiny.sqrt_with(&loose).as_slice()[0].w() > 0.0);

        let one = RealArray::scalar(1.0);
        assert!(tiny.divide_scalar_by(&one).is_err());
        let reciprocal = tiny.divide_scalar_by_with(&one, &loose).unwrap();
        assert!((reciprocal.as_slice()[0].w() - 1e13).abs() < 1e-2);
    }

    #[test]
    fn test_unflip_along_axis() {
        let p = Quaternion::new(0.9, 0.1, 0.0, 0.0).normalize().unwrap();
        let q = Quaternion::new(0.8, 0.0, 0.2, 0.0).normalize().unwrap();
        let data = vec![p, -p, p, q, -q, -q];
        let array = QuaternionArray::new(data, Shape::from([3, 2])).unwrap();

        let along_rows = array.unflip(0).unwrap();
        assert_eq!(along_rows.as_slice(), &[p, -p, p, -q, q, -q]);

        let along_cols = array.unflip(1).unwrap();
        assert_eq!(along_cols.as_slice()[1], p);
        assert_eq!(along_cols.as_slice()[3], q);

        assert!(array.unflip(2).is_err());

        let mut sequence = QuaternionArray::from_vec(vec![p, -p, p]);
        sequence.unflip_in_place(0).unwrap();
        assert_eq!(sequence.as_slice(), &[p, p, p]);
    }
}
