//! Batched quaternion algebra with array broadcasting.
//!
//! [`Quaternion`] is the scalar type. [`QuaternionArray`] holds any number of them with an
//! arbitrary batch shape, and every operation on it broadcasts its operands the way
//! numeric array libraries do. On top of the algebra sit the exp/log maps, conversions
//! to and from other rotation representations, and SLERP/SQUAD interpolation.
//!
//! ```
//! use quaternion_array::{Quaternion, QuaternionArray, RealArray};
//! use nalgebra::Vector3;
//!
//! let q0 = QuaternionArray::scalar(Quaternion::IDENTITY);
//! let q1 = QuaternionArray::scalar(
//!     Quaternion::from_axis_angle(&Vector3::z(), std::f64::consts::FRAC_PI_2).unwrap(),
//! );
//! let t = RealArray::from_vec(vec![0.0, 0.5, 1.0]);
//! let path = q0.slerp(&q1, &t).unwrap();
//! assert_eq!(path.full_shape(), vec![3, 4]);
//! ```

pub mod array;
pub mod broadcast;
pub mod config;
pub mod convert;
pub mod error;
mod exp_log;
pub mod interpolate;
pub mod logger;
mod ops;
pub mod quaternion;
pub mod stability;

pub use array::{BatchArray, MatrixArray, QuaternionArray, RealArray, VectorArray};
pub use broadcast::{Shape, broadcast_shapes};
pub use config::Tolerances;
pub use convert::EulerSequence;
pub use error::{QuaternionError, QuaternionResult};
pub use interpolate::{
    squad, squad_control_point, squad_control_point_with, squad_segment, squad_segment_with,
    squad_sequence, squad_sequence_with, squad_with,
};
pub use logger::{init_logger, init_logger_with_level};
pub use quaternion::Quaternion;
pub use stability::AngleRegime;
