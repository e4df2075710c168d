use diffeq::{solvers::Solver, stepping::AdaptiveStepControl};
use mass_properties::{Inertia, MassProperties, MassPropertiesErrors};
use nalgebra::Vector3;
use ron::ser::{PrettyConfig, to_string_pretty};
use rotations::quaternion::{Quaternion, QuaternionErrors};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error;

use crate::{
    eoms::RigidBody,
    inertia_solver::InertiaSolverErrors,
    load::AppliedLoad,
    state::{BodyMode, BodyState},
};

#[derive(Debug, Error)]
pub enum ConfigErrors {
    #[error("{0}")]
    MassProperties(#[from] MassPropertiesErrors),
    #[error("{0}")]
    Quaternion(#[from] QuaternionErrors),
    #[error("{0}")]
    InertiaSolver(#[from] InertiaSolverErrors),
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{0} must be finite")]
    NonFinite(&'static str),
    #[error("unsupported load: {0}")]
    UnsupportedLoad(&'static str),
    #[error("duration {duration} at {fps} fps produces no frames")]
    NoFrames { duration: f64, fps: f64 },
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    RonDe(#[from] ron::error::SpannedError),
    #[error("{0}")]
    RonSer(#[from] ron::Error),
}

/// Everything needed to start a run: the body, its initial state, the loads and how
/// the run is integrated and reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub mode: BodyMode,
    pub mass_properties: MassProperties,
    pub initial_state: BodyState,
    pub load: AppliedLoad,
    /// Uniform gravitational acceleration in inertial axes, free body only.
    pub gravity: Vector3<f64>,
    pub start_time: f64,
    pub duration: f64,
    /// Output cadence in frames per second.
    pub fps: f64,
    pub initial_dt: f64,
    pub solver: Solver,
    pub step_control: AdaptiveStepControl,
    /// Largest `| |q| - 1 |` tolerated before renormalizing.
    pub drift_tolerance: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            mode: BodyMode::RotationOnly,
            mass_properties: MassProperties::default(),
            initial_state: BodyState::new(),
            load: AppliedLoad::new(),
            gravity: Vector3::zeros(),
            start_time: 0.0,
            duration: 10.0,
            fps: 60.0,
            initial_dt: 1e-3,
            solver: Solver::DoPri45,
            step_control: AdaptiveStepControl::default()
                .with_rel_tol(1e-8)
                .with_abs_tol(1e-8),
            drift_tolerance: 1e-3,
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigErrors> {
    if !value.is_finite() {
        return Err(ConfigErrors::NonFinite(field));
    }
    if value <= 0.0 {
        return Err(ConfigErrors::NonPositive { field, value });
    }
    Ok(())
}

impl SimulationConfig {
    pub fn new(mode: BodyMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass_properties.mass = mass;
        self
    }

    pub fn with_inertia(mut self, inertia: Inertia) -> Self {
        self.mass_properties.inertia = inertia;
        self
    }

    pub fn with_initial_state(mut self, state: BodyState) -> Self {
        self.initial_state = state;
        self
    }

    pub fn with_attitude(mut self, q: Quaternion) -> Self {
        self.initial_state.q = q;
        self
    }

    pub fn with_rates(mut self, w: Vector3<f64>) -> Self {
        self.initial_state.w = w;
        self
    }

    pub fn with_load(mut self, load: AppliedLoad) -> Self {
        self.load = load;
        self
    }

    pub fn with_gravity(mut self, gravity: Vector3<f64>) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_start_time(mut self, t0: f64) -> Self {
        self.start_time = t0;
        self
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_initial_dt(mut self, dt: f64) -> Self {
        self.initial_dt = dt;
        self
    }

    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_tolerances(mut self, rel_tol: f64, abs_tol: f64) -> Self {
        self.step_control = self
            .step_control
            .with_rel_tol(rel_tol)
            .with_abs_tol(abs_tol);
        self
    }

    pub fn with_drift_tolerance(mut self, tol: f64) -> Self {
        self.drift_tolerance = tol;
        self
    }

    /// Number of frames a run reports, `floor(fps * duration)`.
    pub fn n_frames(&self) -> usize {
        (self.fps * self.duration).floor() as usize
    }

    /// Checks everything that would make a run meaningless. Called before any
    /// integration starts.
    pub fn validate(&self) -> Result<(), ConfigErrors> {
        if !self.start_time.is_finite() {
            return Err(ConfigErrors::NonFinite("start_time"));
        }
        positive("duration", self.duration)?;
        positive("fps", self.fps)?;
        positive("initial_dt", self.initial_dt)?;
        positive("rel_tol", self.step_control.rel_tol)?;
        positive("abs_tol", self.step_control.abs_tol)?;
        positive("drift_tolerance", self.drift_tolerance)?;
        if let Some(min_dt) = self.step_control.min_dt {
            positive("min_dt", min_dt)?;
        }
        if let Some(max_dt) = self.step_control.max_dt {
            positive("max_dt", max_dt)?;
        }
        if self.n_frames() == 0 {
            return Err(ConfigErrors::NoFrames {
                duration: self.duration,
                fps: self.fps,
            });
        }
        if !self.initial_state.is_finite() {
            return Err(ConfigErrors::NonFinite("initial_state"));
        }
        self.initial_state.q.normalize()?;
        // mass properties, inertia conditioning and load support
        RigidBody::from_config(self)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ConfigErrors> {
        let s = fs::read_to_string(path)?;
        let config: Self = ron::from_str(&s)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigErrors> {
        let s = to_string_pretty(self, PrettyConfig::new())?;
        fs::write(path, s)?;
        Ok(())
    }
}
