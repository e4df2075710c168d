use diffeq::{OdeModel, state::StateVector};
use mass_properties::MassProperties;
use nalgebra::{Matrix3, Vector3};
use rotations::{RotationTrait, quaternion::Quaternion, rotation_matrix::RotationMatrix};
use std::error::Error;

use crate::{
    config::{ConfigErrors, SimulationConfig},
    inertia_solver::EulerSolver,
    load::AppliedLoad,
    state::{BodyMode, read3, write3},
};

/// Physical model of a single rigid body: mass properties, the active loads and
/// the solver for Euler's equations chosen from the inertia tensor.
///
/// Evaluating the equations of motion only reads from this struct.
#[derive(Debug, Clone)]
pub struct RigidBody {
    mode: BodyMode,
    mass_properties: MassProperties,
    inertia: Matrix3<f64>,
    solver: EulerSolver,
    load: AppliedLoad,
    gravity: Vector3<f64>,
}

impl RigidBody {
    pub fn new(
        mode: BodyMode,
        mass_properties: MassProperties,
        load: AppliedLoad,
        gravity: Vector3<f64>,
    ) -> Result<Self, ConfigErrors> {
        mass_properties.validate()?;
        let inertia = &mass_properties.inertia;
        // the general tensor is the canonical path, the x-z closed form is only a
        // shortcut for free bodies that already have that structure
        let solver = match mode {
            BodyMode::FreeBody if inertia.is_xz_symmetric() => EulerSolver::cross_term_xz(inertia)?,
            _ => EulerSolver::general(inertia)?,
        };
        check_load(mode, &load, &gravity)?;

        Ok(Self {
            mode,
            mass_properties,
            inertia: inertia.matrix(),
            solver,
            load,
            gravity,
        })
    }

    pub fn from_config(config: &SimulationConfig) -> Result<Self, ConfigErrors> {
        Self::new(
            config.mode,
            config.mass_properties,
            config.load,
            config.gravity,
        )
    }

    pub fn mode(&self) -> BodyMode {
        self.mode
    }

    pub fn mass_properties(&self) -> &MassProperties {
        &self.mass_properties
    }

    pub fn inertia_matrix(&self) -> &Matrix3<f64> {
        &self.inertia
    }

    pub fn solver(&self) -> &EulerSolver {
        &self.solver
    }

    pub fn load(&self) -> &AppliedLoad {
        &self.load
    }

    pub fn gravity(&self) -> &Vector3<f64> {
        &self.gravity
    }

    /// Replaces the applied load. Takes effect on the next evaluation.
    pub fn set_load(&mut self, load: AppliedLoad) -> Result<(), ConfigErrors> {
        check_load(self.mode, &load, &self.gravity)?;
        self.load = load;
        Ok(())
    }

    /// Gyroscopic term `w x (I w)`.
    pub fn gyroscopic(&self, w: &Vector3<f64>) -> Vector3<f64> {
        w.cross(&(self.inertia * w))
    }

    /// Euler's equations, solves `I * w_dot = torque - w x (I w)`.
    pub fn angular_acceleration(&self, w: &Vector3<f64>, torque: &Vector3<f64>) -> Vector3<f64> {
        self.solver.solve(&(torque - self.gyroscopic(w)))
    }

    /// Time derivative of the state vector `x`, written into `dx`.
    ///
    /// Both slices are laid out for this body's mode. Non-finite input is not checked
    /// and propagates into `dx`.
    pub fn derivative(&self, x: &[f64], dx: &mut [f64]) {
        let q = Quaternion::from_slice(x);
        let wi = self.mode.rate_index();
        let w = read3(x, wi);

        q.rate(&w).write_slice(dx);

        match (self.mode.position_index(), self.mode.velocity_index()) {
            (Some(ri), Some(vi)) => {
                let rotation = RotationMatrix::from(&q);
                let v = read3(x, vi);

                // position kinematics in the inertial frame
                write3(dx, ri, &rotation.rotate(&v));

                let torque = self.load.body_torque(&rotation);
                write3(dx, wi, &self.angular_acceleration(&w, &torque));

                // Newton in the rotating body frame
                let mass = self.mass_properties.mass;
                let force = self.load.body_force(&rotation, mass, &self.gravity);
                write3(dx, vi, &(force / mass - w.cross(&v)));
            }
            // pinned body, only body-axis torque is accepted
            _ => {
                let w_dot = self.angular_acceleration(&w, &self.load.torque_body);
                write3(dx, wi, &w_dot);
            }
        }
    }
}

/// A rotation-only body must keep `w_dot` independent of orientation.
fn check_load(
    mode: BodyMode,
    load: &AppliedLoad,
    gravity: &Vector3<f64>,
) -> Result<(), ConfigErrors> {
    if !load.is_finite() {
        return Err(ConfigErrors::NonFinite("load"));
    }
    if !gravity.iter().all(|g| g.is_finite()) {
        return Err(ConfigErrors::NonFinite("gravity"));
    }
    if mode == BodyMode::RotationOnly {
        if !load.is_body_torque_only() {
            return Err(ConfigErrors::UnsupportedLoad(
                "rotation-only bodies accept body-axis torque only",
            ));
        }
        if *gravity != Vector3::zeros() {
            return Err(ConfigErrors::UnsupportedLoad(
                "rotation-only bodies do not model gravity",
            ));
        }
    }
    Ok(())
}

impl OdeModel for RigidBody {
    type State = StateVector;

    fn f(&self, _t: f64, x: &StateVector, dx: &mut StateVector) -> Result<(), Box<dyn Error>> {
        self.derivative(x, dx);
        Ok(())
    }
}
