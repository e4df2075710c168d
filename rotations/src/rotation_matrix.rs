use crate::RotationTrait;
use crate::quaternion::Quaternion;
use nalgebra::{Matrix3, Vector3};
use std::ops::Mul;

/// A 3x3 direction cosine matrix mapping body axes to inertial axes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RotationMatrix(pub Matrix3<f64>);

impl RotationMatrix {
    pub fn get_value(&self) -> Matrix3<f64> {
        self.0
    }

    /// True when every column has unit length and the columns are mutually
    /// orthogonal to within `tol`.
    pub fn is_orthonormal(&self, tol: f64) -> bool {
        let m = &self.0;
        for i in 0..3 {
            if (m.column(i).norm() - 1.0).abs() > tol {
                return false;
            }
            for j in (i + 1)..3 {
                if m.column(i).dot(&m.column(j)).abs() > tol {
                    return false;
                }
            }
        }
        true
    }
}

impl From<Matrix3<f64>> for RotationMatrix {
    fn from(value: Matrix3<f64>) -> Self {
        Self(value)
    }
}

impl From<&Quaternion> for RotationMatrix {
    /// Converts Euler parameters into the body-to-inertial rotation matrix.
    ///
    /// The quaternion is used as is. A non-unit quaternion gives a scaled,
    /// non-orthonormal matrix, which is how drift shows up downstream.
    fn from(q: &Quaternion) -> Self {
        let (x, y, z, s) = (q.x, q.y, q.z, q.w);

        let e11 = 1.0 - 2.0 * y * y - 2.0 * z * z;
        let e12 = 2.0 * x * y - 2.0 * s * z;
        let e13 = 2.0 * x * z + 2.0 * s * y;
        let e21 = 2.0 * x * y + 2.0 * s * z;
        let e22 = 1.0 - 2.0 * x * x - 2.0 * z * z;
        let e23 = 2.0 * y * z - 2.0 * s * x;
        let e31 = 2.0 * x * z - 2.0 * s * y;
        let e32 = 2.0 * y * z + 2.0 * s * x;
        let e33 = 1.0 - 2.0 * x * x - 2.0 * y * y;

        RotationMatrix(Matrix3::new(e11, e12, e13, e21, e22, e23, e31, e32, e33))
    }
}

impl Mul<RotationMatrix> for RotationMatrix {
    type Output = Self;

    fn mul(self, rhs: RotationMatrix) -> RotationMatrix {
        RotationMatrix(self.0 * rhs.0)
    }
}

impl RotationTrait for RotationMatrix {
    fn rotate(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.0 * v
    }

    fn transform(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.0.tr_mul(v)
    }

    fn inv(&self) -> Self {
        RotationMatrix(self.0.transpose())
    }

    fn identity() -> Self {
        RotationMatrix(Matrix3::identity())
    }
}
