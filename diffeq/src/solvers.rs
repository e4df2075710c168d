use serde::{Deserialize, Serialize};

use crate::{
    DiffeqErrors, OdeModel, rk::RungeKutta, state::OdeState, stepping::AdaptiveStepControl,
    tableau::ButcherTableau,
};

/// Enum representing the available embedded pairs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Solver {
    /// Dormand-Prince 4(5) method.
    #[default]
    DoPri45,
    /// Runge-Kutta-Fehlberg 4(5) method.
    Rkf45,
}

impl Solver {
    /// Builds a stepper for this method with the given step control.
    pub fn stepper<State: OdeState>(&self, control: AdaptiveStepControl) -> Stepper<State> {
        match self {
            Solver::DoPri45 => Stepper::DoPri45(RungeKutta::new(
                ButcherTableau::<7>::DORMANDPRINCE45,
                control,
            )),
            Solver::Rkf45 => {
                Stepper::Rkf45(RungeKutta::new(ButcherTableau::<6>::FEHLBERG45, control))
            }
        }
    }
}

/// A configured adaptive stepper, dispatching to the selected method.
pub enum Stepper<State: OdeState> {
    DoPri45(RungeKutta<State, 7>),
    Rkf45(RungeKutta<State, 6>),
}

impl<State: OdeState> Stepper<State> {
    /// Attempts one adaptive step toward `t1`, see [`RungeKutta::step`].
    pub fn step<Model: OdeModel<State = State>>(
        &mut self,
        model: &Model,
        t: &mut f64,
        t1: f64,
        h: &mut f64,
        x: &mut State,
    ) -> Result<(), DiffeqErrors> {
        match self {
            Stepper::DoPri45(rk) => rk.step(model, t, t1, h, x),
            Stepper::Rkf45(rk) => rk.step(model, t, t1, h, x),
        }
    }

    pub fn control(&self) -> &AdaptiveStepControl {
        match self {
            Stepper::DoPri45(rk) => rk.control(),
            Stepper::Rkf45(rk) => rk.control(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateVector;
    use approx::assert_abs_diff_eq;
    use std::error::Error;

    #[derive(Debug)]
    struct Decay {
        lambda: f64,
    }

    impl OdeModel for Decay {
        type State = StateVector;
        fn f(&self, _t: f64, x: &StateVector, dx: &mut StateVector) -> Result<(), Box<dyn Error>> {
            dx[0] = -self.lambda * x[0];
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Oscillator;

    impl OdeModel for Oscillator {
        type State = StateVector;
        fn f(&self, _t: f64, x: &StateVector, dx: &mut StateVector) -> Result<(), Box<dyn Error>> {
            dx[0] = x[1];
            dx[1] = -x[0];
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl OdeModel for Broken {
        type State = StateVector;
        fn f(&self, _t: f64, _x: &StateVector, _dx: &mut StateVector) -> Result<(), Box<dyn Error>> {
            Err("bad model".into())
        }
    }

    #[derive(Debug)]
    struct Blowup;

    impl OdeModel for Blowup {
        type State = StateVector;
        fn f(&self, _t: f64, x: &StateVector, dx: &mut StateVector) -> Result<(), Box<dyn Error>> {
            dx[0] = x[0] / 0.0;
            Ok(())
        }
    }

    fn integrate<Model: OdeModel<State = StateVector>>(
        solver: Solver,
        model: &Model,
        x0: Vec<f64>,
        tf: f64,
    ) -> (StateVector, usize) {
        let control = AdaptiveStepControl::default()
            .with_rel_tol(1e-10)
            .with_abs_tol(1e-12);
        let mut stepper = solver.stepper(control);
        let mut x = StateVector::new(x0);
        let mut t = 0.0;
        let mut h = 1e-3;
        let mut steps = 0;
        while t < tf {
            stepper.step(model, &mut t, tf, &mut h, &mut x).unwrap();
            steps += 1;
        }
        assert_eq!(t, tf);
        (x, steps)
    }

    #[test]
    fn test_exponential_decay() {
        for solver in [Solver::DoPri45, Solver::Rkf45] {
            let (x, _) = integrate(solver, &Decay { lambda: 0.7 }, vec![2.0], 3.0);
            assert_abs_diff_eq!(x[0], 2.0 * (-0.7f64 * 3.0).exp(), epsilon = 1e-8);
        }
    }

    #[test]
    fn test_oscillator_period() {
        let tf = 2.0 * std::f64::consts::PI;
        let (x, steps) = integrate(Solver::DoPri45, &Oscillator, vec![1.0, 0.0], tf);
        assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-7);
        assert_abs_diff_eq!(x[1], 0.0, epsilon = 1e-7);
        // step size control actually grows the initial step
        assert!(steps < 1000);
    }

    #[test]
    fn test_step_never_passes_target() {
        let mut stepper = Solver::DoPri45.stepper(AdaptiveStepControl::default());
        let mut x = StateVector::new(vec![1.0]);
        let (mut t, mut h) = (0.0, 10.0);
        stepper
            .step(&Decay { lambda: 1e-3 }, &mut t, 0.25, &mut h, &mut x)
            .unwrap();
        assert_eq!(t, 0.25);
        assert!(h >= 0.25);
    }

    #[test]
    fn test_failures_are_reported() {
        let mut stepper = Solver::DoPri45.stepper(AdaptiveStepControl::default());
        let mut x = StateVector::new(vec![1.0]);
        let (mut t, mut h) = (0.0, 0.1);

        let err = stepper.step(&Broken, &mut t, 1.0, &mut h, &mut x).unwrap_err();
        assert_eq!(err, DiffeqErrors::Model("bad model".to_string()));

        let err = stepper.step(&Blowup, &mut t, 1.0, &mut h, &mut x).unwrap_err();
        assert_eq!(err, DiffeqErrors::NonFiniteState { t: 0.0 });
        assert_eq!(*x, vec![1.0]);

        let mut bad_h = 0.0;
        let err = stepper
            .step(&Decay { lambda: 1.0 }, &mut t, 1.0, &mut bad_h, &mut x)
            .unwrap_err();
        assert_eq!(err, DiffeqErrors::InvalidStepSize(0.0));

        let err = stepper
            .step(&Decay { lambda: 1.0 }, &mut t, 0.0, &mut h, &mut x)
            .unwrap_err();
        assert!(matches!(err, DiffeqErrors::InvalidTimeSpan { .. }));
    }

    #[test]
    fn test_min_dt_underflow() {
        let control = AdaptiveStepControl::default()
            .with_rel_tol(1e-14)
            .with_abs_tol(1e-16)
            .with_min_dt(0.05);
        let mut stepper = Solver::Rkf45.stepper(control);
        let mut x = StateVector::new(vec![1.0]);
        let (mut t, mut h) = (0.0, 0.1);
        let err = stepper
            .step(&Decay { lambda: 50.0 }, &mut t, 1.0, &mut h, &mut x)
            .unwrap_err();
        assert!(matches!(err, DiffeqErrors::StepSizeUnderflow { .. }));
        assert_eq!(t, 0.0);
    }
}
