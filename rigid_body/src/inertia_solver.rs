//! Closed-form solution of `I * x = rhs` for a symmetric 3x3 inertia tensor.
//!
//! The tensor is inverted through its adjugate: the six independent cofactors and the
//! determinant are computed once, after which every solve is a fixed linear
//! combination of the right hand side.

use mass_properties::Inertia;
use nalgebra::{Matrix3, Vector3};
use thiserror::Error;

/// Determinants below this fraction of the cubed largest moment are singular.
const SINGULAR_TOL: f64 = 1e-12;

#[derive(Debug, Clone, Copy, Error, PartialEq)]
pub enum InertiaSolverErrors {
    #[error("inertia tensor is singular (determinant {0:e})")]
    Singular(f64),
    #[error("closed form x-z solve requires ixy = iyz = 0")]
    NotXzSymmetric,
}

/// Cofactors of a symmetric tensor
/// ```text
///     | ixx ixy ixz |
/// I = | ixy iyy iyz |
///     | ixz iyz izz |
/// ```
/// The adjugate is symmetric, so six entries describe it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InertiaCofactors {
    pub c_xx: f64,
    pub c_yy: f64,
    pub c_zz: f64,
    pub c_xy: f64,
    pub c_yz: f64,
    pub c_xz: f64,
    pub det: f64,
}

impl InertiaCofactors {
    pub fn new(inertia: &Inertia) -> Result<Self, InertiaSolverErrors> {
        let Inertia {
            ixx,
            iyy,
            izz,
            ixy,
            iyz,
            ixz,
        } = *inertia;

        let c_xx = iyy * izz - iyz * iyz;
        let c_yy = ixx * izz - ixz * ixz;
        let c_zz = ixx * iyy - ixy * ixy;
        let c_xy = iyz * ixz - ixy * izz;
        let c_yz = ixy * ixz - ixx * iyz;
        let c_xz = ixy * iyz - iyy * ixz;
        let det = ixx * c_xx + ixy * c_xy + ixz * c_xz;

        let scale = ixx.abs().max(iyy.abs()).max(izz.abs());
        if !det.is_finite() || det.abs() <= SINGULAR_TOL * scale.powi(3) {
            return Err(InertiaSolverErrors::Singular(det));
        }

        Ok(Self {
            c_xx,
            c_yy,
            c_zz,
            c_xy,
            c_yz,
            c_xz,
            det,
        })
    }

    /// Solves `I * x = rhs`.
    pub fn solve(&self, rhs: &Vector3<f64>) -> Vector3<f64> {
        Vector3::new(
            (self.c_xx * rhs[0] + self.c_xy * rhs[1] + self.c_xz * rhs[2]) / self.det,
            (self.c_xy * rhs[0] + self.c_yy * rhs[1] + self.c_yz * rhs[2]) / self.det,
            (self.c_xz * rhs[0] + self.c_yz * rhs[1] + self.c_zz * rhs[2]) / self.det,
        )
    }

    /// `I^-1`, assembled from the same cofactors used by `solve`.
    pub fn inverse(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.c_xx, self.c_xy, self.c_xz, //
            self.c_xy, self.c_yy, self.c_yz, //
            self.c_xz, self.c_yz, self.c_zz,
        ) / self.det
    }
}

/// Solver used for Euler's equations, picked once from the tensor's structure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EulerSolver {
    /// Full cofactor solve, valid for any positive definite tensor.
    General(InertiaCofactors),
    /// Principal axes except for one x-z product of inertia. The y axis decouples and
    /// the x-z block is a 2x2 solve.
    CrossTermXz {
        ixx: f64,
        iyy: f64,
        izz: f64,
        ixz: f64,
        det_xz: f64,
    },
}

impl EulerSolver {
    pub fn general(inertia: &Inertia) -> Result<Self, InertiaSolverErrors> {
        Ok(EulerSolver::General(InertiaCofactors::new(inertia)?))
    }

    pub fn cross_term_xz(inertia: &Inertia) -> Result<Self, InertiaSolverErrors> {
        if !inertia.is_xz_symmetric() {
            return Err(InertiaSolverErrors::NotXzSymmetric);
        }
        let det_xz = inertia.ixx * inertia.izz - inertia.ixz * inertia.ixz;
        let scale = inertia.ixx.abs().max(inertia.izz.abs());
        if !det_xz.is_finite()
            || det_xz.abs() <= SINGULAR_TOL * scale * scale
            || inertia.iyy.abs() <= SINGULAR_TOL * inertia.iyy.abs().max(scale)
        {
            return Err(InertiaSolverErrors::Singular(det_xz * inertia.iyy));
        }
        Ok(EulerSolver::CrossTermXz {
            ixx: inertia.ixx,
            iyy: inertia.iyy,
            izz: inertia.izz,
            ixz: inertia.ixz,
            det_xz,
        })
    }

    pub fn solve(&self, rhs: &Vector3<f64>) -> Vector3<f64> {
        match self {
            EulerSolver::General(cofactors) => cofactors.solve(rhs),
            EulerSolver::CrossTermXz {
                ixx,
                iyy,
                izz,
                ixz,
                det_xz,
            } => Vector3::new(
                (izz * rhs[0] - ixz * rhs[2]) / det_xz,
                rhs[1] / iyy,
                (ixx * rhs[2] - ixz * rhs[0]) / det_xz,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const TOL: f64 = 1e-12;

    fn general_tensor() -> Inertia {
        Inertia::new(4.0, 5.0, 6.0, 0.4, -0.3, 0.8).unwrap()
    }

    #[test]
    fn test_solve_recovers_x() {
        let inertia = general_tensor();
        let cofactors = InertiaCofactors::new(&inertia).unwrap();
        let x = Vector3::new(0.7, -1.3, 2.2);
        let rhs = inertia.matrix() * x;
        let solved = cofactors.solve(&rhs);
        for i in 0..3 {
            assert_abs_diff_eq!(solved[i], x[i], epsilon = TOL);
        }
    }

    #[test]
    fn test_inverse_and_determinant() {
        let inertia = general_tensor();
        let cofactors = InertiaCofactors::new(&inertia).unwrap();
        assert_abs_diff_eq!(cofactors.det, inertia.matrix().determinant(), epsilon = TOL);
        let identity = inertia.matrix() * cofactors.inverse();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(identity[(i, j)], expected, epsilon = TOL);
            }
        }
    }

    #[test]
    fn test_spherical_tensor_is_scalar_division() {
        let inertia = Inertia::diagonal(2.0, 2.0, 2.0).unwrap();
        let cofactors = InertiaCofactors::new(&inertia).unwrap();
        assert_eq!(cofactors.c_xy, 0.0);
        assert_eq!(cofactors.c_yz, 0.0);
        assert_eq!(cofactors.c_xz, 0.0);
        let rhs = Vector3::new(3.0, -0.5, 7.25);
        assert_eq!(cofactors.solve(&rhs), rhs / 2.0);
    }

    #[test]
    fn test_singular_tensor_is_rejected() {
        // bypasses Inertia::new validation on purpose
        let inertia = Inertia {
            ixx: 1.0,
            iyy: 1.0,
            izz: 2.0,
            ixy: 1.0,
            iyz: 0.0,
            ixz: 0.0,
        };
        assert!(matches!(
            InertiaCofactors::new(&inertia),
            Err(InertiaSolverErrors::Singular(_))
        ));
    }

    #[test]
    fn test_cross_term_matches_general() {
        let inertia = Inertia::new(2.0, 3.0, 4.0, 0.0, 0.0, 0.5).unwrap();
        let general = EulerSolver::general(&inertia).unwrap();
        let closed = EulerSolver::cross_term_xz(&inertia).unwrap();
        let rhs = Vector3::new(1.0, -2.0, 0.3);
        let a = general.solve(&rhs);
        let b = closed.solve(&rhs);
        for i in 0..3 {
            assert_abs_diff_eq!(a[i], b[i], epsilon = TOL);
        }
        assert_eq!(
            EulerSolver::cross_term_xz(&general_tensor()),
            Err(InertiaSolverErrors::NotXzSymmetric)
        );
    }
}
