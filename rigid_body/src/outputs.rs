use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{
    eoms::RigidBody,
    linearize::Linearization,
    pose::PoseTransform,
    state::{BodyMode, BodyState},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Energy {
    pub kinetic: f64,
    /// Uniform gravity potential relative to the inertial origin.
    pub potential: f64,
    pub total: f64,
}

/// Quantities derived from the state at one instant.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Outputs {
    pub pose: PoseTransform,
    pub energy: Energy,
    /// Body-axis angular momentum `I * w` about the mass center.
    pub angular_momentum: Vector3<f64>,
    pub linearization: Option<Linearization>,
}

impl RigidBody {
    pub fn energy(&self, state: &BodyState) -> Energy {
        let mass = self.mass_properties().mass;
        let rotational = 0.5 * state.w.dot(&(self.inertia_matrix() * state.w));
        let (translational, potential) = match self.mode() {
            BodyMode::RotationOnly => (0.0, 0.0),
            BodyMode::FreeBody => (
                0.5 * mass * state.v.norm_squared(),
                -mass * self.gravity().dot(&state.r),
            ),
        };
        let kinetic = rotational + translational;
        Energy {
            kinetic,
            potential,
            total: kinetic + potential,
        }
    }

    /// Evaluates the outputs at state `x`. The linearization is only filled in for
    /// rotation-only bodies.
    pub fn outputs(&self, x: &[f64]) -> Outputs {
        let mode = self.mode();
        let state = BodyState::from_slice(mode, x);
        Outputs {
            pose: PoseTransform::from_state(mode, x),
            energy: self.energy(&state),
            angular_momentum: self.mass_properties().inertia.momentum(&state.w),
            linearization: self.linearize(x).ok(),
        }
    }
}
