pub mod quaternion;
pub mod rotation_matrix;

use nalgebra::Vector3;

pub mod prelude {
    pub use crate::quaternion::*;
    pub use crate::rotation_matrix::*;
    pub use crate::RotationTrait;
}

/// Trait defining rotation and transformation operations.
///
/// Every rotation in this workspace maps body-fixed axes to the inertial frame.
pub trait RotationTrait {
    /// Rotates a vector by the rotation, i.e. re-expresses a body-axis vector
    /// in inertial axes.
    ///
    /// # Arguments
    ///
    /// * `v` - The vector to be rotated.
    ///
    /// # Returns
    ///
    /// The rotated vector.
    fn rotate(&self, v: &Vector3<f64>) -> Vector3<f64>;

    /// Transforms a vector by the rotation, i.e. re-expresses an inertial-axis
    /// vector in body axes.
    ///
    /// # Arguments
    ///
    /// * `v` - The vector to be transformed.
    ///
    /// # Returns
    ///
    /// The transformed vector.
    fn transform(&self, v: &Vector3<f64>) -> Vector3<f64>;

    fn inv(&self) -> Self;

    fn identity() -> Self;
}
