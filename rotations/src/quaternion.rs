use nalgebra::{Matrix4, Matrix4x3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Mul, MulAssign};
use thiserror::Error;

use crate::RotationTrait;
use crate::rotation_matrix::RotationMatrix;

/// Euler parameters `(e0, e1, e2, e3)` stored as `(x, y, z, w)`.
///
/// The scalar part is last, so the identity orientation is `e3 = 1`.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

/// Errors that can occur when working with a `Quaternion`.
#[derive(Debug, Clone, Error, Copy)]
pub enum QuaternionErrors {
    #[error("got zero magnitude quaternion")]
    ZeroMagnitude,
    #[error("got non-finite quaternion component")]
    NonFinite,
    #[error("rotation axis has zero magnitude")]
    ZeroMagnitudeAxis,
}

impl Quaternion {
    /// The identity quaternion, representing no rotation.
    pub const IDENTITY: Self = Self { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    /// Creates a new `Quaternion` without normalizing.
    ///
    /// # Arguments
    ///
    /// * `x` - e0, first vector component.
    /// * `y` - e1, second vector component.
    /// * `z` - e2, third vector component.
    /// * `w` - e3, the scalar component.
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Reads the four Euler parameters from the front of a slice.
    pub fn from_slice(e: &[f64]) -> Self {
        Self::new(e[0], e[1], e[2], e[3])
    }

    /// Writes the four Euler parameters to the front of a slice.
    pub fn write_slice(&self, e: &mut [f64]) {
        e[0] = self.x;
        e[1] = self.y;
        e[2] = self.z;
        e[3] = self.w;
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.x, self.y, self.z, self.w]
    }

    /// Builds a unit quaternion rotating by `angle` radians about `axis`.
    pub fn from_axis_angle(axis: &Vector3<f64>, angle: f64) -> Result<Self, QuaternionErrors> {
        let n = axis.norm();
        if n < f64::EPSILON {
            return Err(QuaternionErrors::ZeroMagnitudeAxis);
        }
        let u = axis / n;
        let (s, c) = (0.5 * angle).sin_cos();
        Ok(Self::new(u[0] * s, u[1] * s, u[2] * s, c))
    }

    // Dot product of two quaternions
    pub fn dot(&self, other: &Quaternion) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    pub fn mag(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.w.is_finite()
    }

    /// Conjugate. For a unit quaternion this is also the inverse.
    pub fn conjugate(&self) -> Quaternion {
        Quaternion::new(-self.x, -self.y, -self.z, self.w)
    }

    pub fn normalize(&self) -> Result<Self, QuaternionErrors> {
        if !self.is_finite() {
            return Err(QuaternionErrors::NonFinite);
        }
        let mag = self.mag();
        if mag < f64::EPSILON {
            return Err(QuaternionErrors::ZeroMagnitude);
        }
        Ok(Quaternion::new(
            self.x / mag,
            self.y / mag,
            self.z / mag,
            self.w / mag,
        ))
    }

    /// Markley eq 3.20, maps body rates to Euler parameter rates through
    /// `q_dot = 0.5 * xi(q) * w`.
    pub fn xi(&self) -> Matrix4x3<f64> {
        Matrix4x3::new(
            self.w, -self.z, self.y, //
            self.z, self.w, -self.x, //
            -self.y, self.x, self.w, //
            -self.x, -self.y, -self.z,
        )
    }

    /// Skew coupling matrix such that `q_dot = 0.5 * omega(w) * q`.
    pub fn omega(w: &Vector3<f64>) -> Matrix4<f64> {
        Matrix4::new(
            0.0, w[2], -w[1], w[0], //
            -w[2], 0.0, w[0], w[1], //
            w[1], -w[0], 0.0, w[2], //
            -w[0], -w[1], -w[2], 0.0,
        )
    }

    /// Time derivative of the Euler parameters for body-fixed angular rate `w`.
    pub fn rate(&self, w: &Vector3<f64>) -> Quaternion {
        Quaternion::new(
            0.5 * (self.w * w[0] - self.z * w[1] + self.y * w[2]),
            0.5 * (self.z * w[0] + self.w * w[1] - self.x * w[2]),
            0.5 * (-self.y * w[0] + self.x * w[1] + self.w * w[2]),
            -0.5 * (self.x * w[0] + self.y * w[1] + self.z * w[2]),
        )
    }
}

impl Default for Quaternion {
    /// The identity quaternion.
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl fmt::Debug for Quaternion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Quaternion {{ e0: {:.6}, e1: {:.6}, e2: {:.6}, e3: {:.6} }}",
            self.x, self.y, self.z, self.w
        )
    }
}

impl Mul<Quaternion> for Quaternion {
    type Output = Self;

    /// Hamilton product with the scalar part last.
    /// Successive products compose like rotation matrices:
    /// `q_n_from_c = q_n_from_b * q_b_from_c`.
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y + self.y * rhs.w + self.z * rhs.x - self.x * rhs.z,
            self.w * rhs.z + self.z * rhs.w + self.x * rhs.y - self.y * rhs.x,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }
}

impl Mul<f64> for Quaternion {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs, self.w * rhs)
    }
}

impl MulAssign<f64> for Quaternion {
    fn mul_assign(&mut self, rhs: f64) {
        self.x *= rhs;
        self.y *= rhs;
        self.z *= rhs;
        self.w *= rhs;
    }
}

impl RotationTrait for Quaternion {
    fn rotate(&self, v: &Vector3<f64>) -> Vector3<f64> {
        RotationMatrix::from(self).rotate(v)
    }

    fn transform(&self, v: &Vector3<f64>) -> Vector3<f64> {
        RotationMatrix::from(self).transform(v)
    }

    fn inv(&self) -> Self {
        self.conjugate()
    }

    fn identity() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;
    const TOL: f64 = 1e-12;

    #[test]
    fn test_quaternion_normalization() {
        let q = Quaternion::new(1.0, 2.0, 3.0, 4.0).normalize().unwrap();

        assert_abs_diff_eq!(q.x, 0.18257418583505536, epsilon = TOL);
        assert_abs_diff_eq!(q.y, 0.3651483716701107, epsilon = TOL);
        assert_abs_diff_eq!(q.z, 0.5477225575051661, epsilon = TOL);
        assert_abs_diff_eq!(q.w, 0.7302967433402214, epsilon = TOL);
        assert_abs_diff_eq!(q.mag(), 1.0, epsilon = TOL);
    }

    #[test]
    fn test_normalize_rejects_degenerate() {
        assert!(matches!(
            Quaternion::new(0.0, 0.0, 0.0, 0.0).normalize(),
            Err(QuaternionErrors::ZeroMagnitude)
        ));
        assert!(matches!(
            Quaternion::new(f64::NAN, 0.0, 0.0, 1.0).normalize(),
            Err(QuaternionErrors::NonFinite)
        ));
    }

    #[test]
    fn test_rate_matches_product_form() {
        let q = Quaternion::new(0.1, -0.4, 0.3, 0.8).normalize().unwrap();
        let w = Vector3::new(0.3, -1.2, 2.5);

        // q_dot = 0.5 * q * (w, 0)
        let product = q * Quaternion::new(w[0], w[1], w[2], 0.0) * 0.5;
        let rate = q.rate(&w);
        let xi = 0.5 * q.xi() * w;
        let omega = 0.5 * Quaternion::omega(&w) * nalgebra::Vector4::new(q.x, q.y, q.z, q.w);

        for (i, &expected) in product.to_array().iter().enumerate() {
            assert_abs_diff_eq!(rate.to_array()[i], expected, epsilon = TOL);
            assert_abs_diff_eq!(xi[i], expected, epsilon = TOL);
            assert_abs_diff_eq!(omega[i], expected, epsilon = TOL);
        }
    }

    #[test]
    fn test_rate_preserves_norm() {
        // d/dt |q|^2 = 2 q . q_dot = 0 for any body rate
        let q = Quaternion::new(0.2, 0.5, -0.1, 0.7).normalize().unwrap();
        let w = Vector3::new(-4.0, 0.7, 1.1);
        assert_abs_diff_eq!(q.dot(&q.rate(&w)), 0.0, epsilon = TOL);
    }

    #[test]
    fn test_axis_angle() {
        let q = Quaternion::from_axis_angle(&Vector3::z(), PI / 2.0).unwrap();
        let v = q.rotate(&Vector3::x());
        assert_abs_diff_eq!(v[0], 0.0, epsilon = TOL);
        assert_abs_diff_eq!(v[1], 1.0, epsilon = TOL);
        assert_abs_diff_eq!(v[2], 0.0, epsilon = TOL);

        let back = q.transform(&v);
        assert_abs_diff_eq!(back[0], 1.0, epsilon = TOL);
        assert_abs_diff_eq!(back[1], 0.0, epsilon = TOL);

        assert!(Quaternion::from_axis_angle(&Vector3::zeros(), 1.0).is_err());
    }

    #[test]
    fn test_product_composes_rotations() {
        let a = Quaternion::from_axis_angle(&Vector3::z(), PI / 2.0).unwrap();
        let b = Quaternion::from_axis_angle(&Vector3::x(), PI / 2.0).unwrap();
        // rotate about body x first, then about z
        let v = (a * b).rotate(&Vector3::y());
        let expected = a.rotate(&b.rotate(&Vector3::y()));
        for i in 0..3 {
            assert_abs_diff_eq!(v[i], expected[i], epsilon = TOL);
        }
    }

    #[test]
    fn test_conjugate_is_inverse() {
        let q = Quaternion::new(0.3, -0.2, 0.6, 0.5).normalize().unwrap();
        let p = q * q.inv();
        assert_abs_diff_eq!(p.x, 0.0, epsilon = TOL);
        assert_abs_diff_eq!(p.y, 0.0, epsilon = TOL);
        assert_abs_diff_eq!(p.z, 0.0, epsilon = TOL);
        assert_abs_diff_eq!(p.w, 1.0, epsilon = TOL);
    }
}
