use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::CELL_TOLERANCE;
use crate::error::{Error, Result};
use crate::miller::MillerIndex;

/// A unit cell given by its six parameters.
///
/// Lengths are in Å, angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitCell {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl UnitCell {
    /// Construct a cell. No validation happens here; geometry methods check it.
    pub fn new(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        Self {
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
        }
    }

    pub fn from_parameters(p: [f64; 6]) -> Self {
        Self::new(p[0], p[1], p[2], p[3], p[4], p[5])
    }

    pub fn parameters(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.alpha, self.beta, self.gamma]
    }

    fn cosines(&self) -> (f64, f64, f64) {
        (
            self.alpha.to_radians().cos(),
            self.beta.to_radians().cos(),
            self.gamma.to_radians().cos(),
        )
    }

    /// Cell volume in Å³; zero for cells whose angles cannot close
    pub fn volume(&self) -> f64 {
        let (ca, cb, cg) = self.cosines();
        let radicand = 1.0 - ca * ca - cb * cb - cg * cg + 2.0 * ca * cb * cg;
        if !(radicand > 0.0) {
            return 0.0;
        }
        self.a * self.b * self.c * radicand.sqrt()
    }

    /// Whether the cell describes a real crystal (positive lengths and volume)
    pub fn is_crystal(&self) -> bool {
        self.parameters().iter().all(|p| p.is_finite())
            && self.a > 0.0
            && self.b > 0.0
            && self.c > 0.0
            && self.volume() > CELL_TOLERANCE
    }

    /// Fail with `DegenerateCell` unless the cell has a positive volume
    pub fn validate(&self) -> Result<()> {
        if self.is_crystal() {
            Ok(())
        } else {
            Err(Error::DegenerateCell {
                a: self.a,
                b: self.b,
                c: self.c,
                alpha: self.alpha,
                beta: self.beta,
                gamma: self.gamma,
            })
        }
    }

    /// Orthogonalization matrix (PDB convention: a along x, b in the xy plane).
    ///
    /// Columns are the real-space basis vectors in Cartesian Å.
    pub fn orthogonalization_matrix(&self) -> Result<Matrix3<f64>> {
        self.validate()?;
        let (ca, cb, cg) = self.cosines();
        let sg = self.gamma.to_radians().sin();
        let volume = self.volume();
        Ok(Matrix3::new(
            self.a,
            self.b * cg,
            self.c * cb,
            0.0,
            self.b * sg,
            self.c * (ca - cb * cg) / sg,
            0.0,
            0.0,
            volume / (self.a * self.b * sg),
        ))
    }

    /// Fractionalization matrix, the inverse of the orthogonalization matrix
    pub fn fractionalization_matrix(&self) -> Result<Matrix3<f64>> {
        self.orthogonalization_matrix()?
            .try_inverse()
            .ok_or_else(|| self.degenerate())
    }

    /// Real-space metric tensor G = Aᵀ·A
    pub fn metric_tensor(&self) -> Result<Matrix3<f64>> {
        let direct = self.orthogonalization_matrix()?;
        Ok(direct.transpose() * direct)
    }

    /// Reciprocal metric tensor G* = G⁻¹
    pub fn reciprocal_metric_tensor(&self) -> Result<Matrix3<f64>> {
        self.metric_tensor()?
            .try_inverse()
            .ok_or_else(|| self.degenerate())
    }

    /// Reciprocal cell parameters (a*, b*, c* in Å⁻¹, angles in degrees)
    pub fn reciprocal(&self) -> Result<UnitCell> {
        let g = self.reciprocal_metric_tensor()?;
        let (a, b, c) = (g[(0, 0)].sqrt(), g[(1, 1)].sqrt(), g[(2, 2)].sqrt());
        Ok(UnitCell::new(
            a,
            b,
            c,
            (g[(1, 2)] / (b * c)).acos().to_degrees(),
            (g[(0, 2)] / (a * c)).acos().to_degrees(),
            (g[(0, 1)] / (a * b)).acos().to_degrees(),
        ))
    }

    /// 1/d² for a single reflection
    pub fn one_over_d2(&self, hkl: &MillerIndex) -> Result<f64> {
        let gstar = self.reciprocal_metric_tensor()?;
        Ok(quadratic_form(&gstar, hkl))
    }

    /// Resolution (d-spacing, Å) of a single reflection
    pub fn d_spacing(&self, hkl: &MillerIndex) -> Result<f64> {
        Ok(1.0 / self.one_over_d2(hkl)?.sqrt())
    }

    /// d-spacings for many reflections, sharing one metric computation
    pub fn d_spacings(&self, hkls: &[MillerIndex]) -> Result<Vec<f64>> {
        let gstar = self.reciprocal_metric_tensor()?;
        Ok(hkls
            .iter()
            .map(|hkl| 1.0 / quadratic_form(&gstar, hkl).sqrt())
            .collect())
    }

    fn degenerate(&self) -> Error {
        Error::DegenerateCell {
            a: self.a,
            b: self.b,
            c: self.c,
            alpha: self.alpha,
            beta: self.beta,
            gamma: self.gamma,
        }
    }
}

impl Default for UnitCell {
    /// Unit cube, a placeholder for tables without a real cell
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0, 90.0, 90.0, 90.0)
    }
}

impl fmt::Display for UnitCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.4}, {:.4}, {:.4}, {:.3}, {:.3}, {:.3})",
            self.a, self.b, self.c, self.alpha, self.beta, self.gamma
        )
    }
}

fn quadratic_form(g: &Matrix3<f64>, hkl: &MillerIndex) -> f64 {
    let h: Vector3<f64> = hkl.map(f64::from);
    h.dot(&(g * h))
}
