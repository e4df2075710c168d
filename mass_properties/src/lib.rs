use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Leading minors at or below this fraction of the matching power of the largest
/// diagonal entry count as singular.
const DEGENERATE_TOL: f64 = 1e-12;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum MassPropertiesErrors {
    #[error("Ixx cant be less than or equal to  zero")]
    IxxLessThanOrEqualToZero,
    #[error("Iyy cant be less than or equal to zero")]
    IyyLessThanOrEqualToZero,
    #[error("Izz cant be less than or equal to zero")]
    IzzLessThanOrEqualToZero,
    #[error("mass cannot be less than or equal to zero")]
    MassLessThanOrEqualToZero,
    #[error("mass properties must be finite")]
    NonFinite,
    #[error("inertia tensor is not positive definite (leading minor {minor} = {value})")]
    NotPositiveDefinite { minor: usize, value: f64 },
}

/// Symmetric inertia tensor about the body's reference point, in body axes.
///
/// Products of inertia are the off-diagonal entries of the tensor as written,
/// i.e. `matrix()[(0, 2)] == ixz`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Inertia {
    pub ixx: f64,
    pub iyy: f64,
    pub izz: f64,
    pub ixy: f64,
    pub iyz: f64,
    pub ixz: f64,
}

impl Default for Inertia {
    fn default() -> Self {
        Self {
            ixx: 1.0,
            iyy: 1.0,
            izz: 1.0,
            ixy: 0.0,
            iyz: 0.0,
            ixz: 0.0,
        }
    }
}

impl Inertia {
    pub fn new(
        ixx: f64,
        iyy: f64,
        izz: f64,
        ixy: f64,
        iyz: f64,
        ixz: f64,
    ) -> Result<Self, MassPropertiesErrors> {
        let inertia = Self {
            ixx,
            iyy,
            izz,
            ixy,
            iyz,
            ixz,
        };
        inertia.validate()?;
        Ok(inertia)
    }

    pub fn diagonal(ixx: f64, iyy: f64, izz: f64) -> Result<Self, MassPropertiesErrors> {
        Self::new(ixx, iyy, izz, 0.0, 0.0, 0.0)
    }

    /// Checks the tensor is physically realizable.
    ///
    /// Uses Sylvester's criterion: all three leading principal minors must be
    /// strictly positive. The minors are compared against powers of the largest
    /// diagonal entry, so the check does not depend on the units of the tensor.
    pub fn validate(&self) -> Result<(), MassPropertiesErrors> {
        let values = [self.ixx, self.iyy, self.izz, self.ixy, self.iyz, self.ixz];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(MassPropertiesErrors::NonFinite);
        }
        if self.ixx <= 0.0 {
            return Err(MassPropertiesErrors::IxxLessThanOrEqualToZero);
        }
        if self.iyy <= 0.0 {
            return Err(MassPropertiesErrors::IyyLessThanOrEqualToZero);
        }
        if self.izz <= 0.0 {
            return Err(MassPropertiesErrors::IzzLessThanOrEqualToZero);
        }
        let scale = self.ixx.max(self.iyy).max(self.izz);
        let minor2 = self.ixx * self.iyy - self.ixy * self.ixy;
        if minor2 <= DEGENERATE_TOL * scale * scale {
            return Err(MassPropertiesErrors::NotPositiveDefinite {
                minor: 2,
                value: minor2,
            });
        }
        let det = self.matrix().determinant();
        if det <= DEGENERATE_TOL * scale.powi(3) {
            return Err(MassPropertiesErrors::NotPositiveDefinite {
                minor: 3,
                value: det,
            });
        }
        Ok(())
    }

    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.ixx, self.ixy, self.ixz, //
            self.ixy, self.iyy, self.iyz, //
            self.ixz, self.iyz, self.izz,
        )
    }

    /// True when the only non-zero product of inertia is `ixz`.
    pub fn is_xz_symmetric(&self) -> bool {
        self.ixy == 0.0 && self.iyz == 0.0
    }

    pub fn is_diagonal(&self) -> bool {
        self.is_xz_symmetric() && self.ixz == 0.0
    }

    /// Angular momentum `I * w`.
    pub fn momentum(&self, w: &Vector3<f64>) -> Vector3<f64> {
        self.matrix() * w
    }
}

impl TryFrom<Matrix3<f64>> for Inertia {
    type Error = MassPropertiesErrors;

    /// Reads the upper triangle of `m`, which is assumed symmetric.
    fn try_from(m: Matrix3<f64>) -> Result<Self, MassPropertiesErrors> {
        Inertia::new(
            m[(0, 0)],
            m[(1, 1)],
            m[(2, 2)],
            m[(0, 1)],
            m[(1, 2)],
            m[(0, 2)],
        )
    }
}

/// Represents the mass properties of an object
/// Mass, Inertia
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassProperties {
    pub mass: f64,
    pub inertia: Inertia,
}

impl Default for MassProperties {
    fn default() -> Self {
        Self {
            mass: 1.0,
            inertia: Inertia::default(),
        }
    }
}

impl MassProperties {
    pub fn new(mass: f64, inertia: Inertia) -> Result<Self, MassPropertiesErrors> {
        let mass_properties = MassProperties { mass, inertia };
        mass_properties.validate()?;
        Ok(mass_properties)
    }

    pub fn validate(&self) -> Result<(), MassPropertiesErrors> {
        if !self.mass.is_finite() {
            return Err(MassPropertiesErrors::NonFinite);
        }
        if self.mass <= 0.0 {
            return Err(MassPropertiesErrors::MassLessThanOrEqualToZero);
        }
        self.inertia.validate()
    }
}
