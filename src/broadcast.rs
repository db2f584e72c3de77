//! Generic broadcasting engine.
//!
//! This module knows nothing about quaternions. It provides:
//! - [`Shape`]: a row-major batch shape of arbitrary rank
//! - [`broadcast_shapes`]: the standard broadcasting rule (dimensions aligned from the
//!   right, size-1 dimensions stretch, any other mismatch is an error)
//! - [`BroadcastPlan`]: maps every flat index of the broadcast output back to a flat
//!   index of each operand
//! - `map_*` / `zip_*` kernels that evaluate an element-wise function over one, two or
//!   three operands and collect a fresh output buffer
//!
//! Batches larger than [`PARALLEL_THRESHOLD`] elements are evaluated with rayon. Output
//! order and error reporting do not depend on which path was taken: fallible kernels
//! always report the first failing element in row-major order.

use crate::error::{QuaternionError, QuaternionResult};
use rayon::prelude::*;
use std::fmt;

/// Number of output elements above which kernels run on the rayon thread pool
pub const PARALLEL_THRESHOLD: usize = 4096;

/// Row-major batch shape. The empty shape `[]` describes a single element.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Shape(Vec<usize>);

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape(dims.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Shape(dims.to_vec())
    }
}

impl Shape {
    /// Create a shape from its dimensions.
    pub fn new(dims: Vec<usize>) -> Self {
        Shape(dims)
    }

    /// The rank-0 shape of a single element.
    pub fn scalar() -> Self {
        Shape(Vec::new())
    }

    /// The dimensions of this shape.
    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Number of dimensions.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.0.len()
    }

    /// Number of elements described by this shape.
    #[inline]
    pub fn size(&self) -> usize {
        self.0.iter().product()
    }

    /// Row-major strides, in elements.
    pub fn strides(&self) -> Vec<usize> {
        let mut strides = vec![1; self.0.len()];
        for axis in (0..self.0.len().saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * self.0[axis + 1];
        }
        strides
    }

    /// Convert a flat row-major offset into a multi-index.
    pub fn unravel(&self, mut flat: usize) -> Vec<usize> {
        let mut index = vec![0; self.0.len()];
        for axis in (0..self.0.len()).rev() {
            let dim = self.0[axis].max(1);
            index[axis] = flat % dim;
            flat /= dim;
        }
        index
    }

    /// Convert a multi-index into a flat row-major offset, or `None` when out of bounds.
    pub fn ravel(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.0.len() {
            return None;
        }
        let mut flat = 0;
        for (&i, &dim) in index.iter().zip(&self.0) {
            if i >= dim {
                return None;
            }
            flat = flat * dim + i;
        }
        Some(flat)
    }

    /// Broadcast this shape against another.
    pub fn broadcast(&self, other: &Shape) -> QuaternionResult<Shape> {
        broadcast_shapes(self, other)
    }

    /// Append trailing dimensions, e.g. the component axis of a quaternion array.
    pub fn with_trailing(&self, trailing: &[usize]) -> Vec<usize> {
        let mut dims = self.0.clone();
        dims.extend_from_slice(trailing);
        dims
    }
}

/// Compute the broadcast shape of two batch shapes.
///
/// Dimensions are aligned right-to-left. A dimension of size 1 stretches to match the
/// other operand; any other mismatch fails with [`QuaternionError::ShapeMismatch`].
pub fn broadcast_shapes(left: &Shape, right: &Shape) -> QuaternionResult<Shape> {
    let ndim = left.ndim().max(right.ndim());
    let mut dims = vec![0; ndim];

    for offset in 0..ndim {
        let l = dim_from_right(left, offset);
        let r = dim_from_right(right, offset);
        dims[ndim - 1 - offset] = match (l, r) {
            (a, b) if a == b => a,
            (1, b) => b,
            (a, 1) => a,
            _ => {
                return Err(QuaternionError::ShapeMismatch {
                    left: left.dims().to_vec(),
                    right: right.dims().to_vec(),
                });
            }
        };
    }

    Ok(Shape(dims))
}

/// Broadcast any number of shapes together.
pub fn broadcast_all(shapes: &[&Shape]) -> QuaternionResult<Shape> {
    shapes
        .iter()
        .try_fold(Shape::scalar(), |acc, shape| broadcast_shapes(&acc, shape))
}

#[inline]
fn dim_from_right(shape: &Shape, offset: usize) -> usize {
    if offset < shape.ndim() {
        shape.0[shape.ndim() - 1 - offset]
    } else {
        1
    }
}

/// Maps output offsets of a broadcast to source offsets of one operand.
#[derive(Clone, Debug)]
struct OperandIndexer {
    /// Source strides aligned with the output axes; 0 on stretched or missing axes
    strides: Vec<usize>,
    /// True when the operand already has the output shape
    contiguous: bool,
}

impl OperandIndexer {
    fn new(source: &Shape, output: &Shape) -> Self {
        let source_strides = source.strides();
        let lead = output.ndim() - source.ndim();
        let strides = (0..output.ndim())
            .map(|axis| {
                if axis < lead {
                    0
                } else {
                    let source_axis = axis - lead;
                    if source.dims()[source_axis] == 1 && output.dims()[axis] != 1 {
                        0
                    } else {
                        source_strides[source_axis]
                    }
                }
            })
            .collect();

        Self {
            strides,
            contiguous: source == output,
        }
    }

    #[inline]
    fn source(&self, output_dims: &[usize], mut flat: usize) -> usize {
        if self.contiguous {
            return flat;
        }
        let mut offset = 0;
        for axis in (0..output_dims.len()).rev() {
            let dim = output_dims[axis];
            offset += (flat % dim) * self.strides[axis];
            flat /= dim;
        }
        offset
    }
}

/// Index mapping from a broadcast output back to each of its operands.
#[derive(Clone, Debug)]
pub struct BroadcastPlan {
    shape: Shape,
    operands: Vec<OperandIndexer>,
}

impl BroadcastPlan {
    /// Plan a broadcast over the given operand shapes.
    pub fn new(shapes: &[&Shape]) -> QuaternionResult<Self> {
        let shape = broadcast_all(shapes)?;
        let operands = shapes
            .iter()
            .map(|source| OperandIndexer::new(source, &shape))
            .collect();
        Ok(Self { shape, operands })
    }

    /// Output shape of the broadcast.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Number of output elements.
    pub fn len(&self) -> usize {
        self.shape.size()
    }

    /// True if the broadcast produces no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat offset into operand `operand` for output offset `flat`.
    #[inline]
    pub fn source(&self, operand: usize, flat: usize) -> usize {
        self.operands[operand].source(self.shape.dims(), flat)
    }

    /// Evaluate `f` for every output offset.
    pub fn generate<R, F>(&self, f: F) -> Vec<R>
    where
        R: Send,
        F: Fn(usize) -> R + Sync + Send,
    {
        let len = self.len();
        if len >= PARALLEL_THRESHOLD {
            (0..len).into_par_iter().map(f).collect()
        } else {
            (0..len).map(f).collect()
        }
    }

    /// Evaluate a fallible `f` for every output offset.
    ///
    /// The reported error is the one of the first failing element in row-major order,
    /// tagged with that element's multi-index.
    pub fn try_generate<R, F>(&self, f: F) -> QuaternionResult<Vec<R>>
    where
        R: Send,
        F: Fn(usize) -> QuaternionResult<R> + Sync + Send,
    {
        let results = self.generate(f);
        let mut output = Vec::with_capacity(results.len());
        for (flat, result) in results.into_iter().enumerate() {
            match result {
                Ok(value) => output.push(value),
                Err(err) => return Err(err.at(self.shape.unravel(flat))),
            }
        }
        Ok(output)
    }
}

/// Apply `f` to every element of a buffer.
pub fn map_elements<T, R, F>(input: &[T], f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    if input.len() >= PARALLEL_THRESHOLD {
        input.par_iter().map(f).collect()
    } else {
        input.iter().map(f).collect()
    }
}

/// Apply a fallible `f` to every element of a buffer of the given shape.
pub fn try_map_elements<T, R, F>(input: &[T], shape: &Shape, f: F) -> QuaternionResult<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> QuaternionResult<R> + Sync + Send,
{
    let results = map_elements(input, f);
    let mut output = Vec::with_capacity(results.len());
    for (flat, result) in results.into_iter().enumerate() {
        match result {
            Ok(value) => output.push(value),
            Err(err) => return Err(err.at(shape.unravel(flat))),
        }
    }
    Ok(output)
}

/// Broadcast two operands and apply `f` element-wise.
pub fn zip_elements<A, B, R, F>(
    a: (&[A], &Shape),
    b: (&[B], &Shape),
    f: F,
) -> QuaternionResult<(Vec<R>, Shape)>
where
    A: Sync,
    B: Sync,
    R: Send,
    F: Fn(&A, &B) -> R + Sync + Send,
{
    let plan = BroadcastPlan::new(&[a.1, b.1])?;
    let data = plan.generate(|flat| f(&a.0[plan.source(0, flat)], &b.0[plan.source(1, flat)]));
    Ok((data, plan.shape))
}

/// Broadcast two operands and apply a fallible `f` element-wise.
pub fn try_zip_elements<A, B, R, F>(
    a: (&[A], &Shape),
    b: (&[B], &Shape),
    f: F,
) -> QuaternionResult<(Vec<R>, Shape)>
where
    A: Sync,
    B: Sync,
    R: Send,
    F: Fn(&A, &B) -> QuaternionResult<R> + Sync + Send,
{
    let plan = BroadcastPlan::new(&[a.1, b.1])?;
    let data =
        plan.try_generate(|flat| f(&a.0[plan.source(0, flat)], &b.0[plan.source(1, flat)]))?;
    Ok((data, plan.shape))
}

/// Broadcast three operands and apply `f` element-wise.
pub fn zip3_elements<A, B, C, R, F>(
    a: (&[A], &Shape),
    b: (&[B], &Shape),
    c: (&[C], &Shape),
    f: F,
) -> QuaternionResult<(Vec<R>, Shape)>
where
    A: Sync,
    B: Sync,
    C: Sync,
    R: Send,
    F: Fn(&A, &B, &C) -> R + Sync + Send,
{
    let plan = BroadcastPlan::new(&[a.1, b.1, c.1])?;
    let data = plan.generate(|flat| {
        f(
            &a.0[plan.source(0, flat)],
            &b.0[plan.source(1, flat)],
            &c.0[plan.source(2, flat)],
        )
    });
    Ok((data, plan.shape))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(dims: &[usize]) -> Shape {
        Shape::from(dims)
    }

    #[test]
    fn test_broadcast_equal_shapes() {
        let result = broadcast_shapes(&shape(&[2, 3]), &shape(&[2, 3])).unwrap();
        assert_eq!(result.dims(), &[2, 3]);
    }

    #[test]
    fn test_broadcast_scalar_against_batch() {
        let result = broadcast_shapes(&Shape::scalar(), &shape(&[3])).unwrap();
        assert_eq!(result.dims(), &[3]);

        let result = broadcast_shapes(&shape(&[5, 1, 4]), &Shape::scalar()).unwrap();
        assert_eq!(result.dims(), &[5, 1, 4]);
    }

    #[test]
    fn test_broadcast_stretches_unit_dimensions() {
        let result = broadcast_shapes(&shape(&[4, 1]), &shape(&[1, 3])).unwrap();
        assert_eq!(result.dims(), &[4, 3]);

        let result = broadcast_shapes(&shape(&[8, 1, 6, 1]), &shape(&[7, 1, 5])).unwrap();
        assert_eq!(result.dims(), &[8, 7, 6, 5]);
    }

    #[test]
    fn test_broadcast_zero_sized_dimension() {
        let result = broadcast_shapes(&shape(&[0]), &shape(&[1])).unwrap();
        assert_eq!(result.dims(), &[0]);
        assert_eq!(result.size(), 0);
    }

    #[test]
    fn test_broadcast_mismatch_names_both_shapes() {
        let err = broadcast_shapes(&shape(&[3]), &shape(&[2])).unwrap_err();
        assert_eq!(
            err,
            QuaternionError::ShapeMismatch {
                left: vec![3],
                right: vec![2],
            }
        );
    }

    #[test]
    fn test_strides_and_ravel_roundtrip() {
        let s = shape(&[2, 3, 4]);
        assert_eq!(s.strides(), vec![12, 4, 1]);
        for flat in 0..s.size() {
            let index = s.unravel(flat);
            assert_eq!(s.ravel(&index), Some(flat));
        }
        assert_eq!(s.ravel(&[2, 0, 0]), None);
        assert_eq!(s.ravel(&[0, 0]), None);
    }

    #[test]
    fn test_zip_outer_product() {
        let a = [1.0, 2.0, 3.0];
        let b = [10.0, 20.0];
        let (data, out) =
            zip_elements((&a, &shape(&[3, 1])), (&b, &shape(&[2])), |x, y| x * y).unwrap();
        assert_eq!(out.dims(), &[3, 2]);
        assert_eq!(data, vec![10.0, 20.0, 20.0, 40.0, 30.0, 60.0]);
    }

    #[test]
    fn test_zip3_broadcast() {
        let a = [1.0, 2.0];
        let b = [10.0];
        let c = [100.0, 200.0, 300.0];
        let (data, out) = zip3_elements(
            (&a, &shape(&[2, 1])),
            (&b, &Shape::scalar()),
            (&c, &shape(&[3])),
            |x, y, z| x + y + z,
        )
        .unwrap();
        assert_eq!(out.dims(), &[2, 3]);
        assert_eq!(data, vec![111.0, 211.0, 311.0, 112.0, 212.0, 312.0]);
    }

    #[test]
    fn test_try_zip_reports_first_failing_index() {
        let a = [1.0, 0.0, 2.0, 0.0];
        let b = [1.0];
        let err = try_zip_elements((&a, &shape(&[2, 2])), (&b, &shape(&[1])), |x, y| {
            if *x == 0.0 {
                Err(QuaternionError::DivisionByZero { denominator: *x })
            } else {
                Ok(y / x)
            }
        })
        .unwrap_err();

        match err {
            QuaternionError::Element { index, .. } => assert_eq!(index, vec![0, 1]),
            other => panic!("Expected element error, got {other:?}"),
        }
    }

    #[test]
    fn test_parallel_path_matches_sequential() {
        let n = PARALLEL_THRESHOLD * 2 + 7;
        let a: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let b = [2.0];
        let (data, out) =
            zip_elements((&a, &shape(&[n])), (&b, &Shape::scalar()), |x, y| x * y).unwrap();
        assert_eq!(out.dims(), &[n]);
        assert!(data.iter().enumerate().all(|(i, v)| *v == 2.0 * i as f64));

        let mapped = map_elements(&a, |x| x + 1.0);
        assert_eq!(mapped[n - 1], n as f64);
    }

    #[test]
    fn test_try_map_reports_index_in_shape() {
        let a = [1.0_f64, 2.0, 3.0, -1.0, 5.0, 6.0];
        let err = try_map_elements(&a, &shape(&[2, 3]), |x| {
            if *x < 0.0 {
                Err(QuaternionError::InvalidArgument("negative".to_string()))
            } else {
                Ok(x.sqrt())
            }
        })
        .unwrap_err();

        match err {
            QuaternionError::Element { index, .. } => assert_eq!(index, vec![1, 0]),
            other => panic!("Expected element error, got {other:?}"),
        }
    }
}
