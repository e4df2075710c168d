use diffeq::{DiffeqErrors, solvers::Stepper, state::StateVector};
use rotations::quaternion::{Quaternion, QuaternionErrors};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    config::{ConfigErrors, SimulationConfig},
    eoms::RigidBody,
    linearize::{Linearization, LinearizationErrors},
    load::AppliedLoad,
    outputs::Outputs,
    pose::PoseTransform,
    saving::SavingErrors,
    state::BodyState,
};

#[derive(Debug, Error)]
pub enum SimulationErrors {
    #[error("{0}")]
    Config(#[from] ConfigErrors),
    #[error("integrator failed: {0}")]
    Integrator(#[from] DiffeqErrors),
    #[error("quaternion norm drifted by {drift:e} at t = {t} (tolerance {tolerance:e})")]
    OrientationDrift { t: f64, drift: f64, tolerance: f64 },
    #[error("{0}")]
    Quaternion(#[from] QuaternionErrors),
    #[error("{0}")]
    Linearization(#[from] LinearizationErrors),
    #[error("{0}")]
    Saving(#[from] SavingErrors),
    #[error("target time {target} is before current time {t}")]
    TargetInPast { t: f64, target: f64 },
}

/// State and outputs reported at one output tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub index: usize,
    pub t: f64,
    pub state: BodyState,
    pub quaternion_norm: f64,
    pub outputs: Outputs,
}

/// Drives the integrator over a run and owns the state vector.
///
/// Every accepted integrator step is followed by renormalizing the quaternion, so the
/// state seen by the next derivative evaluation and by any accessor has unit norm.
pub struct Simulation {
    body: RigidBody,
    stepper: Stepper<StateVector>,
    x: StateVector,
    t: f64,
    t0: f64,
    h: f64,
    fps: f64,
    frame: usize,
    n_frames: usize,
    drift_tolerance: f64,
    steps: usize,
    initial: Frame,
}

impl Simulation {
    pub fn new(config: &SimulationConfig) -> Result<Self, SimulationErrors> {
        config.validate()?;
        let body = RigidBody::from_config(config)?;
        let mode = config.mode;

        let mut initial = config.initial_state;
        initial.q = initial.q.normalize()?;
        let x = initial.to_vector(mode);
        let state = BodyState::from_slice(mode, &x);
        let initial_frame = Frame {
            index: 0,
            t: config.start_time,
            state,
            quaternion_norm: state.q.mag(),
            outputs: body.outputs(&x),
        };

        let stepper = config.solver.stepper(config.step_control);
        info!(
            ?mode,
            dim = mode.dim(),
            solver = ?config.solver,
            rel_tol = config.step_control.rel_tol,
            abs_tol = config.step_control.abs_tol,
            frames = config.n_frames(),
            "simulation created"
        );

        Ok(Self {
            body,
            stepper,
            x,
            t: config.start_time,
            t0: config.start_time,
            h: config.initial_dt,
            fps: config.fps,
            frame: 0,
            n_frames: config.n_frames(),
            drift_tolerance: config.drift_tolerance,
            steps: 0,
            initial: initial_frame,
        })
    }

    pub fn body(&self) -> &RigidBody {
        &self.body
    }

    pub fn time(&self) -> f64 {
        self.t
    }

    /// Index of the last reported frame, 0 before the first.
    pub fn frame_index(&self) -> usize {
        self.frame
    }

    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    /// Accepted integrator steps so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Step size the integrator will try next.
    pub fn step_size(&self) -> f64 {
        self.h
    }

    pub fn state_vector(&self) -> &[f64] {
        &self.x
    }

    pub fn state(&self) -> BodyState {
        BodyState::from_slice(self.body.mode(), &self.x)
    }

    pub fn pose(&self) -> PoseTransform {
        PoseTransform::from_state(self.body.mode(), &self.x)
    }

    pub fn outputs(&self) -> Outputs {
        self.body.outputs(&self.x)
    }

    pub fn linearize(&self) -> Result<Linearization, SimulationErrors> {
        Ok(self.body.linearize(&self.x)?)
    }

    /// Replaces the applied load from the current time on.
    pub fn set_load(&mut self, load: AppliedLoad) -> Result<(), SimulationErrors> {
        self.body.set_load(load)?;
        Ok(())
    }

    /// Integrates until the current time reaches `target`, renormalizing after every
    /// accepted step.
    pub fn advance_to(&mut self, target: f64) -> Result<(), SimulationErrors> {
        if target < self.t {
            return Err(SimulationErrors::TargetInPast { t: self.t, target });
        }
        while self.t < target {
            if let Err(e) = self
                .stepper
                .step(&self.body, &mut self.t, target, &mut self.h, &mut self.x)
            {
                error!(t = self.t, h = self.h, "integrator failed: {e}");
                return Err(e.into());
            }
            self.steps += 1;
            self.renormalize()?;
        }
        Ok(())
    }

    fn renormalize(&mut self) -> Result<(), SimulationErrors> {
        let q = Quaternion::from_slice(&self.x);
        let drift = (q.mag() - 1.0).abs();
        if drift > self.drift_tolerance {
            warn!(t = self.t, drift, "quaternion drift above tolerance");
            return Err(SimulationErrors::OrientationDrift {
                t: self.t,
                drift,
                tolerance: self.drift_tolerance,
            });
        }
        q.normalize()?.write_slice(&mut self.x);
        Ok(())
    }

    fn current_frame(&self) -> Frame {
        let state = self.state();
        Frame {
            index: self.frame,
            t: self.t,
            state,
            quaternion_norm: state.q.mag(),
            outputs: self.outputs(),
        }
    }

    /// Frame 0, the state the run starts from.
    pub fn initial_frame(&self) -> Frame {
        self.initial
    }

    /// Integrates to the next output tick and reports it. Returns `None` once every
    /// frame of the run has been reported.
    pub fn advance_frame(&mut self) -> Result<Option<Frame>, SimulationErrors> {
        if self.frame >= self.n_frames {
            return Ok(None);
        }
        // from the index, so the cadence does not accumulate rounding
        let target = self.t0 + (self.frame + 1) as f64 / self.fps;
        self.advance_to(target)?;
        self.frame += 1;

        let frame = self.current_frame();
        debug!(
            frame = frame.index,
            t = frame.t,
            norm = frame.quaternion_norm,
            steps = self.steps,
            "frame"
        );
        Ok(Some(frame))
    }

    /// Runs the remaining frames, handing each to `callback`. Stops at the first error.
    pub fn run<F>(&mut self, mut callback: F) -> Result<(), SimulationErrors>
    where
        F: FnMut(&Frame) -> Result<(), SimulationErrors>,
    {
        while let Some(frame) = self.advance_frame()? {
            callback(&frame)?;
        }
        info!(t = self.t, frames = self.frame, steps = self.steps, "simulation complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::BodyMode;
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;

    const TOL: f64 = 1e-9;

    #[test]
    fn test_initial_orientation_is_normalized() {
        let config =
            SimulationConfig::default().with_attitude(Quaternion::new(0.0, 0.0, 0.0, 2.0));
        let sim = Simulation::new(&config).unwrap();
        assert_eq!(sim.state().q, Quaternion::IDENTITY);
        assert_eq!(sim.initial_frame().index, 0);
    }

    #[test]
    fn test_frame_times() {
        let config = SimulationConfig::default()
            .with_start_time(2.0)
            .with_duration(1.0)
            .with_fps(10.0)
            .with_rates(Vector3::new(0.0, 1.0, 0.0));
        let mut sim = Simulation::new(&config).unwrap();
        let mut times = Vec::new();
        sim.run(|frame| {
            times.push(frame.t);
            Ok(())
        })
        .unwrap();
        assert_eq!(times.len(), 10);
        for (k, t) in times.iter().enumerate() {
            assert_eq!(*t, 2.0 + (k + 1) as f64 / 10.0);
        }
        assert!(sim.advance_frame().unwrap().is_none());
    }

    #[test]
    fn test_fractional_frame_count_is_floored() {
        let config = SimulationConfig::default()
            .with_duration(0.25)
            .with_fps(10.0);
        let mut sim = Simulation::new(&config).unwrap();
        let mut count = 0;
        sim.run(|_| {
            count += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_axis_spin_matches_closed_form() {
        let rate = 2.0;
        let config = SimulationConfig::default()
            .with_rates(Vector3::new(0.0, 0.0, rate))
            .with_duration(1.0);
        let mut sim = Simulation::new(&config).unwrap();
        sim.advance_to(1.0).unwrap();
        let q = sim.state().q;
        let expected = Quaternion::from_axis_angle(&Vector3::z(), rate).unwrap();
        assert_abs_diff_eq!(q.z, expected.z, epsilon = 1e-6);
        assert_abs_diff_eq!(q.w, expected.w, epsilon = 1e-6);
        assert_abs_diff_eq!(q.mag(), 1.0, epsilon = TOL);
    }

    #[test]
    fn test_initial_frame_is_kept_after_advancing() {
        let config = SimulationConfig::default().with_rates(Vector3::new(0.0, 0.0, 1.0));
        let mut sim = Simulation::new(&config).unwrap();
        let before = sim.initial_frame();
        sim.run(|_| Ok(())).unwrap();
        assert!(sim.state().q.z.abs() > 0.1);

        let after = sim.initial_frame();
        assert_eq!(after, before);
        assert_eq!(after.index, 0);
        assert_eq!(after.t, 0.0);
        assert_eq!(after.state.q, Quaternion::IDENTITY);
        assert_eq!(after.outputs.pose, PoseTransform::default());
    }

    #[test]
    fn test_integrator_failure_stops_the_run() {
        let mut config = SimulationConfig::default()
            .with_rates(Vector3::new(1.0, 2.0, 3.0))
            .with_initial_dt(0.1);
        config.step_control = config
            .step_control
            .with_rel_tol(1e-14)
            .with_abs_tol(1e-14)
            .with_min_dt(0.5);
        let mut sim = Simulation::new(&config).unwrap();
        let x0 = sim.state_vector().to_vec();

        let err = sim.advance_to(1.0).unwrap_err();
        assert!(matches!(
            err,
            SimulationErrors::Integrator(DiffeqErrors::StepSizeUnderflow { .. })
        ));
        assert_eq!(sim.time(), 0.0);
        assert_eq!(sim.steps(), 0);
        assert_eq!(sim.state_vector(), x0.as_slice());

        let mut sim = Simulation::new(&config).unwrap();
        let mut frames = 0;
        assert!(matches!(
            sim.run(|_| {
                frames += 1;
                Ok(())
            }),
            Err(SimulationErrors::Integrator(_))
        ));
        assert_eq!(frames, 0);
    }

    #[test]
    fn test_target_in_past() {
        let mut sim = Simulation::new(&SimulationConfig::default()).unwrap();
        sim.advance_to(0.5).unwrap();
        assert!(matches!(
            sim.advance_to(0.1),
            Err(SimulationErrors::TargetInPast { .. })
        ));
        // same time is a no-op
        let steps = sim.steps();
        sim.advance_to(0.5).unwrap();
        assert_eq!(sim.steps(), steps);
    }

    #[test]
    fn test_drift_above_tolerance_is_reported() {
        // a tolerance below the integrator's own error makes any drift fatal
        let config = SimulationConfig::default()
            .with_rates(Vector3::new(1.0, 2.0, 3.0))
            .with_tolerances(1e-2, 1e-2)
            .with_drift_tolerance(1e-300);
        let mut sim = Simulation::new(&config).unwrap();
        assert!(matches!(
            sim.advance_to(1.0),
            Err(SimulationErrors::OrientationDrift { .. })
        ));
    }

    #[test]
    fn test_linearize_follows_mode() {
        let sim = Simulation::new(&SimulationConfig::default()).unwrap();
        assert!(sim.linearize().is_ok());
        let sim = Simulation::new(&SimulationConfig::new(BodyMode::FreeBody)).unwrap();
        assert!(matches!(
            sim.linearize(),
            Err(SimulationErrors::Linearization(_))
        ));
    }

    #[test]
    fn test_set_load_is_validated() {
        let mut sim = Simulation::new(&SimulationConfig::default()).unwrap();
        let err = sim
            .set_load(AppliedLoad::new().with_torque_inertial(Vector3::x()))
            .unwrap_err();
        assert!(matches!(err, SimulationErrors::Config(ConfigErrors::UnsupportedLoad(_))));

        sim.set_load(AppliedLoad::new().with_torque_body(Vector3::new(0.0, 0.0, 1.0)))
            .unwrap();
        sim.advance_to(1.0).unwrap();
        // unit inertia, unit torque
        assert_abs_diff_eq!(sim.state().w[2], 1.0, epsilon = 1e-6);
    }
}
