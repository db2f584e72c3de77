//! Shape-tagged batch arrays.
//!
//! [`BatchArray<T>`] owns a contiguous row-major buffer of elements together with its
//! batch [`Shape`]. For quaternions the element is a whole [`Quaternion`], so the
//! trailing axis of size 4 is part of the element type and can never be broadcast
//! against anything else. The flat component view (`batch shape + [4]`) is available
//! through [`QuaternionArray::from_components`] and [`QuaternionArray::to_components`].
//!
//! Every operation returns a new array. The only in-place methods are the ones whose
//! names end in `_in_place`; they take `&mut self`, so the borrow checker rules out
//! passing the same array as input and output.

use crate::broadcast::{
    Shape, map_elements, try_map_elements, try_zip_elements, zip3_elements, zip_elements,
};
use crate::error::{QuaternionError, QuaternionResult};
use crate::quaternion::Quaternion;
use nalgebra::{Matrix3, Vector3};
use rand::Rng;

/// A batch of values of type `T` with an arbitrary-rank row-major shape.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchArray<T> {
    data: Vec<T>,
    shape: Shape,
}

/// Batch of quaternions (component shape `batch + [4]`)
pub type QuaternionArray = BatchArray<Quaternion>;

/// Batch of real scalars
pub type RealArray = BatchArray<f64>;

/// Batch of 3-vectors (axes, rotation vectors, Euler triples)
pub type VectorArray = BatchArray<Vector3<f64>>;

/// Batch of 3×3 matrices
pub type MatrixArray = BatchArray<Matrix3<f64>>;

impl<T> From<T> for BatchArray<T> {
    fn from(value: T) -> Self {
        Self::scalar(value)
    }
}

impl<T> BatchArray<T> {
    /// Create an array from a row-major buffer and a shape.
    pub fn new(data: Vec<T>, shape: impl Into<Shape>) -> QuaternionResult<Self> {
        let shape = shape.into();
        if data.len() != shape.size() {
            return Err(QuaternionError::InvalidShape {
                shape: shape.dims().to_vec(),
                reason: format!(
                    "buffer holds {} elements but the shape needs {}",
                    data.len(),
                    shape.size()
                ),
            });
        }
        Ok(Self { data, shape })
    }

    /// Rank-0 array holding a single value.
    pub fn scalar(value: T) -> Self {
        Self {
            data: vec![value],
            shape: Shape::scalar(),
        }
    }

    /// One-dimensional array.
    pub fn from_vec(data: Vec<T>) -> Self {
        let shape = Shape::new(vec![data.len()]);
        Self { data, shape }
    }

    /// Array of the given shape with every element equal to `value`.
    pub fn filled(value: T, shape: impl Into<Shape>) -> Self
    where
        T: Clone,
    {
        let shape = shape.into();
        Self {
            data: vec![value; shape.size()],
            shape,
        }
    }

    /// Batch shape.
    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the array holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of batch dimensions.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Elements in row-major order.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable elements in row-major order.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the array and return its row-major buffer.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Iterate over elements in row-major order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Element at a multi-index.
    pub fn get(&self, index: &[usize]) -> Option<&T> {
        self.shape.ravel(index).map(|flat| &self.data[flat])
    }

    /// Same elements under a different shape of equal size.
    pub fn reshape(self, shape: impl Into<Shape>) -> QuaternionResult<Self> {
        Self::new(self.data, shape)
    }

    /// Apply `f` element-wise.
    pub fn map<R, F>(&self, f: F) -> BatchArray<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        BatchArray {
            data: map_elements(&self.data, f),
            shape: self.shape.clone(),
        }
    }

    /// Apply a fallible `f` element-wise; fails on the first failing element.
    pub fn try_map<R, F>(&self, f: F) -> QuaternionResult<BatchArray<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> QuaternionResult<R> + Sync + Send,
    {
        Ok(BatchArray {
            data: try_map_elements(&self.data, &self.shape, f)?,
            shape: self.shape.clone(),
        })
    }

    /// Broadcast against `other` and apply `f` element-wise.
    pub fn zip_with<U, R, F>(&self, other: &BatchArray<U>, f: F) -> QuaternionResult<BatchArray<R>>
    where
        T: Sync,
        U: Sync,
        R: Send,
        F: Fn(&T, &U) -> R + Sync + Send,
    {
        let (data, shape) = zip_elements(
            (&self.data, &self.shape),
            (&other.data, &other.shape),
            f,
        )?;
        Ok(BatchArray { data, shape })
    }

    /// Broadcast against `other` and apply a fallible `f` element-wise.
    pub fn try_zip_with<U, R, F>(
        &self,
        other: &BatchArray<U>,
        f: F,
    ) -> QuaternionResult<BatchArray<R>>
    where
        T: Sync,
        U: Sync,
        R: Send,
        F: Fn(&T, &U) -> QuaternionResult<R> + Sync + Send,
    {
        let (data, shape) = try_zip_elements(
            (&self.data, &self.shape),
            (&other.data, &other.shape),
            f,
        )?;
        Ok(BatchArray { data, shape })
    }

    /// Broadcast three arrays together and apply `f` element-wise.
    pub fn zip3_with<U, V, R, F>(
        &self,
        second: &BatchArray<U>,
        third: &BatchArray<V>,
        f: F,
    ) -> QuaternionResult<BatchArray<R>>
    where
        T: Sync,
        U: Sync,
        V: Sync,
        R: Send,
        F: Fn(&T, &U, &V) -> R + Sync + Send,
    {
        let (data, shape) = zip3_elements(
            (&self.data, &self.shape),
            (&second.data, &second.shape),
            (&third.data, &third.shape),
            f,
        )?;
        Ok(BatchArray { data, shape })
    }

    pub(crate) fn from_parts_unchecked(data: Vec<T>, shape: Shape) -> Self {
        debug_assert_eq!(data.len(), shape.size());
        Self { data, shape }
    }
}

impl<'a, T> IntoIterator for &'a BatchArray<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl QuaternionArray {
    /// Interpret a flat `f64` buffer whose trailing axis has size 4 as quaternions.
    ///
    /// `full_shape` includes the trailing 4; the resulting batch shape drops it.
    pub fn from_components(components: &[f64], full_shape: &[usize]) -> QuaternionResult<Self> {
        match full_shape.last() {
            Some(4) => {}
            _ => {
                return Err(QuaternionError::InvalidShape {
                    shape: full_shape.to_vec(),
                    reason: "last dimension must have size 4 to hold quaternion components"
                        .to_string(),
                });
            }
        }

        let expected: usize = full_shape.iter().product();
        if components.len() != expected {
            return Err(QuaternionError::InvalidShape {
                shape: full_shape.to_vec(),
                reason: format!(
                    "buffer holds {} values but the shape needs {}",
                    components.len(),
                    expected
                ),
            });
        }

        let data = components
            .chunks_exact(4)
            .map(|c| Quaternion::new(c[0], c[1], c[2], c[3]))
            .collect();
        let batch = Shape::from(&full_shape[..full_shape.len() - 1]);
        Ok(Self::from_parts_unchecked(data, batch))
    }

    /// Flat component buffer and full shape (batch shape followed by 4).
    pub fn to_components(&self) -> (Vec<f64>, Vec<usize>) {
        let components = self.data.iter().flat_map(|q| q.coords()).collect();
        (components, self.full_shape())
    }

    /// Batch shape followed by the component axis of size 4.
    pub fn full_shape(&self) -> Vec<usize> {
        self.shape.with_trailing(&[4])
    }

    /// Identity rotations of the given batch shape.
    pub fn identity(shape: impl Into<Shape>) -> Self {
        Self::filled(Quaternion::IDENTITY, shape)
    }

    /// Uniformly distributed random unit quaternions of the given batch shape.
    pub fn random(shape: impl Into<Shape>) -> Self {
        let mut rng = rand::rng();
        Self::random_with(shape, &mut rng)
    }

    /// Uniformly distributed random unit quaternions drawn from `rng`.
    ///
    /// Uses Shoemake's subgroup algorithm, which needs three uniform samples per
    /// quaternion and never rejects.
    pub fn random_with<R: Rng>(shape: impl Into<Shape>, rng: &mut R) -> Self {
        use std::f64::consts::TAU;

        let shape = shape.into();
        let data = (0..shape.size())
            .map(|_| {
                let u1: f64 = rng.random();
                let u2: f64 = rng.random();
                let u3: f64 = rng.random();
                let a = (1.0 - u1).sqrt();
                let b = u1.sqrt();
                Quaternion::new(
                    b * (TAU * u3).cos(),
                    a * (TAU * u2).sin(),
                    a * (TAU * u2).cos(),
                    b * (TAU * u3).sin(),
                )
            })
            .collect();
        Self::from_parts_unchecked(data, shape)
    }

    /// Build quaternions from scalar parts and vector parts (broadcast).
    pub fn from_scalar_and_vector(
        scalar: &RealArray,
        vector: &VectorArray,
    ) -> QuaternionResult<Self> {
        scalar.zip_with(vector, |w, v| Quaternion::from_parts(*w, v))
    }

    /// Scalar components.
    pub fn w(&self) -> RealArray {
        self.map(Quaternion::w)
    }

    /// i components.
    pub fn x(&self) -> RealArray {
        self.map(Quaternion::x)
    }

    /// j components.
    pub fn y(&self) -> RealArray {
        self.map(Quaternion::y)
    }

    /// k components.
    pub fn z(&self) -> RealArray {
        self.map(Quaternion::z)
    }

    /// Vector parts.
    pub fn vector(&self) -> VectorArray {
        self.map(Quaternion::vector)
    }

    /// Element-wise finiteness mask.
    pub fn is_finite(&self) -> BatchArray<bool> {
        self.map(Quaternion::is_finite)
    }

    /// Fail with a [`QuaternionError::NonFinite`] element error if any element has a
    /// NaN or infinite component.
    pub fn ensure_finite(&self) -> QuaternionResult<()> {
        match self.data.iter().position(|q| !q.is_finite()) {
            None => Ok(()),
            Some(flat) => Err(QuaternionError::NonFinite {
                value: self.data[flat].to_string(),
            }
            .at(self.shape.unravel(flat))),
        }
    }
}
