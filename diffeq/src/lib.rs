use std::{error::Error, fmt::Debug};
use thiserror::Error;

/// Submodules for core ODE system components.
pub mod rk;
pub mod solvers;
pub mod state;
pub mod stepping;
pub mod tableau;

use state::OdeState;

/// Trait for defining a dynamical system model that can be numerically integrated.
///
/// Types implementing this trait must define how to compute the derivative (or RHS function)
/// of the ODE at a given time and state. The solver calls `f` several times per step at
/// trial states, so implementations must not keep anything between calls.
pub trait OdeModel: Debug {
    type State: OdeState;
    /// Compute the derivative at time `t` and state `state`, storing the result in `derivative`.
    fn f(
        &self,
        t: f64,
        state: &Self::State,
        derivative: &mut Self::State,
    ) -> Result<(), Box<dyn Error>>;
}

/// Failure status reported by a single adaptive step.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DiffeqErrors {
    #[error("step size must be finite and positive, got {0}")]
    InvalidStepSize(f64),
    #[error("target time {t1} is not ahead of current time {t}")]
    InvalidTimeSpan { t: f64, t1: f64 },
    #[error("step size underflow at t = {t}: required dt = {dt:e}")]
    StepSizeUnderflow { t: f64, dt: f64 },
    #[error("non-finite state produced at t = {t}")]
    NonFiniteState { t: f64 },
    #[error("model evaluation failed: {0}")]
    Model(String),
}
