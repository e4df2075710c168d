use nalgebra::{Matrix3, SMatrix, Vector3};
use rotations::quaternion::Quaternion;
use thiserror::Error;

use crate::{
    eoms::RigidBody,
    state::{BodyMode, read3},
};

#[derive(Debug, Clone, Copy, Error, PartialEq)]
pub enum LinearizationErrors {
    #[error("linearization is only available for rotation-only bodies, got {0:?}")]
    UnsupportedMode(BodyMode),
}

/// Jacobians of the rotation-only equations of motion about an operating point.
///
/// `x_dot ~= a * dx + b * du`, where `u` is the body-axis torque.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Linearization {
    pub a: SMatrix<f64, 7, 7>,
    pub b: SMatrix<f64, 7, 3>,
}

impl RigidBody {
    /// Evaluates the state and input Jacobians at state `x`.
    ///
    /// Euler's equations do not depend on attitude here, so the rate rows of `a` have
    /// zero quaternion columns.
    pub fn linearize(&self, x: &[f64]) -> Result<Linearization, LinearizationErrors> {
        if self.mode() != BodyMode::RotationOnly {
            return Err(LinearizationErrors::UnsupportedMode(self.mode()));
        }
        let q = Quaternion::from_slice(x);
        let w = read3(x, 4);
        let inertia = self.inertia_matrix();
        let h = inertia * w;

        let mut a = SMatrix::<f64, 7, 7>::zeros();
        let mut b = SMatrix::<f64, 7, 3>::zeros();

        a.fixed_view_mut::<4, 4>(0, 0)
            .copy_from(&(0.5 * Quaternion::omega(&w)));
        a.fixed_view_mut::<4, 3>(0, 4).copy_from(&(0.5 * q.xi()));

        // d/dw of -(w x I w) is -(e_j x h + w x I e_j) per column
        let mut dw = Matrix3::zeros();
        let mut inverse = Matrix3::zeros();
        for j in 0..3 {
            let e = Vector3::ith(j, 1.0);
            let gyro = e.cross(&h) + w.cross(&(inertia * e));
            dw.set_column(j, &self.solver().solve(&(-gyro)));
            inverse.set_column(j, &self.solver().solve(&e));
        }
        a.fixed_view_mut::<3, 3>(4, 4).copy_from(&dw);
        b.fixed_view_mut::<3, 3>(4, 0).copy_from(&inverse);

        Ok(Linearization { a, b })
    }
}
