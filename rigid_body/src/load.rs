use nalgebra::Vector3;
use rotations::{RotationTrait, rotation_matrix::RotationMatrix};
use serde::{Deserialize, Serialize};

/// Forces and torques applied to the body, held constant until replaced.
///
/// Quantities with `_body` are expressed in body axes, those with `_inertial` in the
/// inertial frame and resolved into body axes through the current orientation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AppliedLoad {
    /// Force at the mass center.
    pub force_body: Vector3<f64>,
    /// Force applied at `application_point`.
    pub force_inertial: Vector3<f64>,
    /// Body-fixed point where `force_inertial` acts, relative to the mass center (or pivot).
    pub application_point: Vector3<f64>,
    pub torque_body: Vector3<f64>,
    pub torque_inertial: Vector3<f64>,
}

impl AppliedLoad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_force_body(mut self, f: Vector3<f64>) -> Self {
        self.force_body = f;
        self
    }

    /// Inertial-axis force acting at a body-fixed point.
    pub fn with_force_inertial(mut self, f: Vector3<f64>, point: Vector3<f64>) -> Self {
        self.force_inertial = f;
        self.application_point = point;
        self
    }

    pub fn with_torque_body(mut self, t: Vector3<f64>) -> Self {
        self.torque_body = t;
        self
    }

    pub fn with_torque_inertial(mut self, t: Vector3<f64>) -> Self {
        self.torque_inertial = t;
        self
    }

    pub fn is_finite(&self) -> bool {
        [
            self.force_body,
            self.force_inertial,
            self.application_point,
            self.torque_body,
            self.torque_inertial,
        ]
        .iter()
        .all(|v| v.iter().all(|x| x.is_finite()))
    }

    /// True when nothing but a body-axis torque is applied, so the resulting
    /// angular acceleration does not depend on orientation.
    pub fn is_body_torque_only(&self) -> bool {
        self.force_body == Vector3::zeros()
            && self.force_inertial == Vector3::zeros()
            && self.torque_inertial == Vector3::zeros()
    }

    /// Net torque in body axes: direct torques plus the moment of the inertial force
    /// about the reference point.
    pub fn body_torque(&self, rotation: &RotationMatrix) -> Vector3<f64> {
        let f = rotation.transform(&self.force_inertial);
        self.torque_body + rotation.transform(&self.torque_inertial) + self.application_point.cross(&f)
    }

    /// Net force in body axes, including uniform gravity `g` (inertial) acting on `mass`.
    pub fn body_force(
        &self,
        rotation: &RotationMatrix,
        mass: f64,
        gravity: &Vector3<f64>,
    ) -> Vector3<f64> {
        self.force_body + rotation.transform(&(self.force_inertial + mass * gravity))
    }
}
