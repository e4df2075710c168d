use serde::{Deserialize, Serialize};

/// Adaptive step size controller.
///
/// Scales the step by `safety * error^(-1/order)`, limited to the growth bounds,
/// where `error` is the normalized RMS error of the last attempt.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveStepControl {
    /// Relative tolerance used for error estimation.
    pub rel_tol: f64,
    /// Absolute tolerance used for error estimation.
    pub abs_tol: f64,
    /// Optional minimum allowed step size.
    pub min_dt: Option<f64>,
    /// Optional maximum allowed step size.
    pub max_dt: Option<f64>,
    safety: f64,
    min_growth: f64,
    max_growth: f64,
}

impl Default for AdaptiveStepControl {
    fn default() -> Self {
        Self {
            rel_tol: 1e-6,
            abs_tol: 1e-6,
            min_dt: None,
            max_dt: None,
            safety: 0.9,
            min_growth: 0.2,
            max_growth: 5.0,
        }
    }
}

impl AdaptiveStepControl {
    /// Proposes the next step size from the step just attempted.
    ///
    /// - `dt`: attempted step size
    /// - `error`: normalized RMS error, <= 1.0 means the step was accepted
    /// - `order`: control order of the embedded pair
    pub fn next_dt(&self, dt: f64, error: f64, order: usize) -> f64 {
        let factor = if error <= f64::EPSILON {
            self.max_growth
        } else {
            (self.safety * error.powf(-1.0 / order as f64)).clamp(self.min_growth, self.max_growth)
        };

        let mut new_dt = dt * factor;
        if let Some(max_dt) = self.max_dt {
            new_dt = new_dt.min(max_dt);
        }
        new_dt
    }

    pub fn with_abs_tol(mut self, abs_tol: f64) -> Self {
        self.abs_tol = abs_tol;
        self
    }

    pub fn with_rel_tol(mut self, rel_tol: f64) -> Self {
        self.rel_tol = rel_tol;
        self
    }

    pub fn with_min_dt(mut self, min_dt: f64) -> Self {
        self.min_dt = Some(min_dt);
        self
    }

    pub fn with_max_dt(mut self, max_dt: f64) -> Self {
        self.max_dt = Some(max_dt);
        self
    }
}
