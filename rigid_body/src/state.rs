use diffeq::state::StateVector;
use nalgebra::Vector3;
use rotations::quaternion::Quaternion;
use serde::{Deserialize, Serialize};

/// Which state blocks and load terms are active.
///
/// State ordering is `[e0 e1 e2 e3, (x y z), wx wy wz, (vx vy vz)]`, the bracketed
/// blocks only present for a free body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyMode {
    /// Body pinned at a fixed point, 7 states.
    #[default]
    RotationOnly,
    /// Free body translating and rotating, 13 states.
    FreeBody,
}

impl BodyMode {
    pub const fn dim(&self) -> usize {
        match self {
            BodyMode::RotationOnly => 7,
            BodyMode::FreeBody => 13,
        }
    }

    pub const fn rate_index(&self) -> usize {
        match self {
            BodyMode::RotationOnly => 4,
            BodyMode::FreeBody => 7,
        }
    }

    pub const fn position_index(&self) -> Option<usize> {
        match self {
            BodyMode::RotationOnly => None,
            BodyMode::FreeBody => Some(4),
        }
    }

    pub const fn velocity_index(&self) -> Option<usize> {
        match self {
            BodyMode::RotationOnly => None,
            BodyMode::FreeBody => Some(10),
        }
    }

    /// Column names of the state vector, in order.
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            BodyMode::RotationOnly => &["e0", "e1", "e2", "e3", "wx", "wy", "wz"],
            BodyMode::FreeBody => &[
                "e0", "e1", "e2", "e3", "x", "y", "z", "wx", "wy", "wz", "vx", "vy", "vz",
            ],
        }
    }
}

pub(crate) fn read3(x: &[f64], i: usize) -> Vector3<f64> {
    Vector3::new(x[i], x[i + 1], x[i + 2])
}

pub(crate) fn write3(x: &mut [f64], i: usize, v: &Vector3<f64>) {
    x[i..i + 3].copy_from_slice(v.as_slice());
}

/// Typed view of the body's dynamic state.
///
/// `w` and `v` are in body axes, `r` is the inertial position of the mass center.
/// Position and velocity stay zero for a rotation-only body.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyState {
    pub q: Quaternion,
    pub w: Vector3<f64>,
    pub r: Vector3<f64>,
    pub v: Vector3<f64>,
}

impl BodyState {
    pub fn new() -> Self {
        Self {
            q: Quaternion::IDENTITY,
            w: Vector3::zeros(),
            r: Vector3::zeros(),
            v: Vector3::zeros(),
        }
    }

    pub fn with_attitude(mut self, q: Quaternion) -> Self {
        self.q = q;
        self
    }

    pub fn with_rates(mut self, w: Vector3<f64>) -> Self {
        self.w = w;
        self
    }

    pub fn with_position(mut self, r: Vector3<f64>) -> Self {
        self.r = r;
        self
    }

    pub fn with_velocity(mut self, v: Vector3<f64>) -> Self {
        self.v = v;
        self
    }

    pub fn is_finite(&self) -> bool {
        self.q.is_finite()
            && self.w.iter().all(|x| x.is_finite())
            && self.r.iter().all(|x| x.is_finite())
            && self.v.iter().all(|x| x.is_finite())
    }

    /// Reads a state vector laid out for `mode`.
    pub fn from_slice(mode: BodyMode, x: &[f64]) -> Self {
        let mut state = Self::new()
            .with_attitude(Quaternion::from_slice(x))
            .with_rates(read3(x, mode.rate_index()));
        if let Some(i) = mode.position_index() {
            state.r = read3(x, i);
        }
        if let Some(i) = mode.velocity_index() {
            state.v = read3(x, i);
        }
        state
    }

    /// Packs the blocks active in `mode` into a state vector.
    pub fn to_vector(&self, mode: BodyMode) -> StateVector {
        let mut x = StateVector::zeros(mode.dim());
        self.q.write_slice(&mut x);
        write3(&mut x, mode.rate_index(), &self.w);
        if let Some(i) = mode.position_index() {
            write3(&mut x, i, &self.r);
        }
        if let Some(i) = mode.velocity_index() {
            write3(&mut x, i, &self.v);
        }
        x
    }
}
