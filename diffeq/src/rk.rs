use std::array;

use tracing::trace;

use crate::{
    DiffeqErrors, OdeModel, state::OdeState, stepping::AdaptiveStepControl, tableau::ButcherTableau,
};

/// Smallest step allowed relative to the current time.
const DT_UNDERFLOW: f64 = 1e-14;

/// Explicit embedded Runge-Kutta stepper.
///
/// Owns its stage buffers, so a single instance is reused for every step of a run.
pub struct RungeKutta<State: OdeState, const STAGES: usize> {
    tableau: ButcherTableau<STAGES>,
    control: AdaptiveStepControl,
    k: [State; STAGES],
    stage: State,
    scratch: State,
    y: State,
    y_tilde: State,
}

impl<State: OdeState, const STAGES: usize> RungeKutta<State, STAGES> {
    pub fn new(tableau: ButcherTableau<STAGES>, control: AdaptiveStepControl) -> Self {
        Self {
            tableau,
            control,
            k: array::from_fn(|_| State::default()),
            stage: State::default(),
            scratch: State::default(),
            y: State::default(),
            y_tilde: State::default(),
        }
    }

    pub fn control(&self) -> &AdaptiveStepControl {
        &self.control
    }

    /// Attempts one adaptive step from `*t` toward `t1`.
    ///
    /// The step taken is at most `*h` and never passes `t1`. Rejected attempts are retried
    /// with a smaller step until one is accepted. On success `t` and `x` are advanced and
    /// `h` holds the suggested size for the next step. On failure `t` and `x` are left as
    /// they were.
    pub fn step<Model: OdeModel<State = State>>(
        &mut self,
        model: &Model,
        t: &mut f64,
        t1: f64,
        h: &mut f64,
        x: &mut State,
    ) -> Result<(), DiffeqErrors> {
        if !h.is_finite() || *h <= 0.0 {
            return Err(DiffeqErrors::InvalidStepSize(*h));
        }
        if !(t1 > *t) {
            return Err(DiffeqErrors::InvalidTimeSpan { t: *t, t1 });
        }

        loop {
            let remaining = t1 - *t;
            let truncated = *h >= remaining;
            let dt = if truncated { remaining } else { *h };

            self.attempt(model, *t, dt, x)?;

            if !self.y.is_finite() {
                return Err(DiffeqErrors::NonFiniteState { t: *t });
            }

            let error = self
                .y
                .compute_error(x, &self.y_tilde, self.control.rel_tol, self.control.abs_tol);
            let next = self.control.next_dt(dt, error, self.tableau.order);

            if error <= 1.0 {
                *t = if truncated { t1 } else { *t + dt };
                x.clone_from(&self.y);
                // a step cut short by the target says little about the step that fits
                *h = if truncated { next.max(*h) } else { next };
                if let Some(max_dt) = self.control.max_dt {
                    *h = h.min(max_dt);
                }
                return Ok(());
            }

            trace!(t = *t, dt, error, "step rejected");
            let min_dt = self
                .control
                .min_dt
                .unwrap_or(0.0)
                .max(DT_UNDERFLOW * t.abs().max(1.0));
            if next < min_dt {
                return Err(DiffeqErrors::StepSizeUnderflow { t: *t, dt: next });
            }
            *h = next;
        }
    }

    /// Evaluates all stages for a step of size `dt`, filling `y` and `y_tilde`.
    fn attempt<Model: OdeModel<State = State>>(
        &mut self,
        model: &Model,
        t: f64,
        dt: f64,
        x: &State,
    ) -> Result<(), DiffeqErrors> {
        for s in 0..STAGES {
            // in place calculation of the intermediate point
            self.stage.clone_from(x);
            for i in 0..s {
                let a = self.tableau.a[s][i];
                if a != 0.0 {
                    self.scratch.clone_from(&self.k[i]);
                    self.scratch *= a * dt;
                    self.stage += &self.scratch;
                }
            }
            // size the derivative buffer like the state before the model writes into it
            self.k[s].clone_from(x);
            model
                .f(t + self.tableau.c[s] * dt, &self.stage, &mut self.k[s])
                .map_err(|e| DiffeqErrors::Model(e.to_string()))?;
        }

        self.y.clone_from(x);
        self.y_tilde.clone_from(x);
        for s in 0..STAGES {
            self.scratch.clone_from(&self.k[s]);
            self.scratch *= self.tableau.b[s] * dt;
            self.y += &self.scratch;

            self.scratch.clone_from(&self.k[s]);
            self.scratch *= self.tableau.b_tilde[s] * dt;
            self.y_tilde += &self.scratch;
        }
        Ok(())
    }
}
