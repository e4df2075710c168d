use nalgebra::{Matrix3, Matrix4, Vector3};
use rotations::{quaternion::Quaternion, rotation_matrix::RotationMatrix};
use serde::{Deserialize, Serialize};

use crate::state::{BodyMode, read3};

/// Homogeneous body-to-inertial transform, `[R r; 0 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseTransform(pub Matrix4<f64>);

impl Default for PoseTransform {
    fn default() -> Self {
        Self(Matrix4::identity())
    }
}

impl PoseTransform {
    /// Builds the transform from an orientation and an inertial position.
    ///
    /// `q` is used as given, it is not normalized here.
    pub fn new(q: &Quaternion, r: &Vector3<f64>) -> Self {
        let rotation = RotationMatrix::from(q).get_value();
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(&rotation);
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(r);
        Self(m)
    }

    /// Reads the pose out of a state vector laid out for `mode`. Rotation-only bodies
    /// sit at the origin.
    pub fn from_state(mode: BodyMode, x: &[f64]) -> Self {
        let r = match mode.position_index() {
            Some(i) => read3(x, i),
            None => Vector3::zeros(),
        };
        Self::new(&Quaternion::from_slice(x), &r)
    }

    pub fn rotation(&self) -> Matrix3<f64> {
        self.0.fixed_view::<3, 3>(0, 0).into_owned()
    }

    pub fn translation(&self) -> Vector3<f64> {
        self.0.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// Maps a body-fixed point into the inertial frame.
    pub fn transform_point(&self, p: &Vector3<f64>) -> Vector3<f64> {
        self.rotation() * p + self.translation()
    }

    /// Column-major element order, as consumed by graphics APIs.
    pub fn to_column_major(&self) -> [f64; 16] {
        let mut out = [0.0; 16];
        out.copy_from_slice(self.0.as_slice());
        out
    }
}
