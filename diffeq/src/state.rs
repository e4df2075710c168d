use std::{
    fmt::Debug,
    ops::{AddAssign, Deref, DerefMut, MulAssign},
};

use tolerance::rms_error;

/// Trait representing an integrable state for use in ODE solvers.
///
/// The derivative of a state is represented by the same type. Buffers are sized lazily by
/// `clone_from`, so dynamically sized states work as long as every operand shares a length.
pub trait OdeState: Clone + Debug + Default + MulAssign<f64>
where
    for<'a> Self: AddAssign<&'a Self>,
{
    /// Root mean square of the scaled local error between the candidate `self` and the
    /// embedded estimate `x_tilde`, given the state at the start of the step.
    fn compute_error(&self, x_prev: &Self, x_tilde: &Self, rel_tol: f64, abs_tol: f64) -> f64;

    fn is_finite(&self) -> bool;
}

/// A dynamic-sized vector type for use in ODE solvers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateVector(Vec<f64>);

impl StateVector {
    /// Constructs a new `StateVector` from a `Vec<f64>`.
    pub fn new(value: Vec<f64>) -> Self {
        Self(value)
    }

    pub fn zeros(n: usize) -> Self {
        Self(vec![0.0; n])
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl AddAssign<&Self> for StateVector {
    /// Performs element-wise addition of two `StateVector`s.
    ///
    /// # Panics
    ///
    /// Panics if the vectors have different lengths.
    fn add_assign(&mut self, rhs: &Self) {
        assert_eq!(self.0.len(), rhs.0.len(), "state vectors do not have same length");
        for (x, dx) in self.0.iter_mut().zip(&rhs.0) {
            *x += dx;
        }
    }
}

impl MulAssign<f64> for StateVector {
    /// Multiplies each element in the vector by a scalar value.
    fn mul_assign(&mut self, rhs: f64) {
        for x in self.0.iter_mut() {
            *x *= rhs;
        }
    }
}

impl Deref for StateVector {
    type Target = Vec<f64>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for StateVector {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<f64>> for StateVector {
    fn from(value: Vec<f64>) -> Self {
        Self(value)
    }
}

impl OdeState for StateVector {
    fn compute_error(&self, x_prev: &Self, x_tilde: &Self, rel_tol: f64, abs_tol: f64) -> f64 {
        rms_error(&self.0, &x_prev.0, &x_tilde.0, rel_tol, abs_tol)
    }

    fn is_finite(&self) -> bool {
        self.0.iter().all(|x| x.is_finite())
    }
}
