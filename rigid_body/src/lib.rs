//! Euler-parameter dynamics of a single rigid body.
//!
//! A body is either pinned at a fixed point (7 states, rotation only) or free to
//! translate (13 states). [`simulation::Simulation`] integrates it with an adaptive
//! Runge-Kutta pair and renormalizes the quaternion after every accepted step.

pub mod config;
pub mod eoms;
pub mod inertia_solver;
pub mod linearize;
pub mod load;
pub mod outputs;
pub mod pose;
pub mod saving;
pub mod simulation;
pub mod state;

pub mod prelude {
    pub use crate::config::{ConfigErrors, SimulationConfig};
    pub use crate::eoms::RigidBody;
    pub use crate::inertia_solver::{EulerSolver, InertiaCofactors, InertiaSolverErrors};
    pub use crate::linearize::{Linearization, LinearizationErrors};
    pub use crate::load::AppliedLoad;
    pub use crate::outputs::{Energy, Outputs};
    pub use crate::pose::PoseTransform;
    pub use crate::saving::{FileWriter, FrameWriter, SavingErrors};
    pub use crate::simulation::{Frame, Simulation, SimulationErrors};
    pub use crate::state::{BodyMode, BodyState};
    pub use diffeq::solvers::Solver;
    pub use mass_properties::{Inertia, MassProperties};
    pub use rotations::prelude::*;
}
