use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::TRANSLATION_DENOMINATOR as DEN;
use crate::error::{Error, Result};
use crate::miller::MillerIndex;

/// A single symmetry operation: rotation (integer matrix) + translation.
///
/// Acts on fractional coordinates as `x' = R·x + t`. The translation is kept
/// as integers in units of `1/24`, so compositions stay exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymOp {
    /// Rotation matrix with determinant ±1 (for valid operators)
    pub rotation: Matrix3<i32>,
    /// Translation in units of 1/24, reduced to [0, 24)
    pub translation: Vector3<i32>,
}

impl SymOp {
    /// Create a new symmetry operation; the translation is wrapped into the unit cell
    pub fn new(rotation: Matrix3<i32>, translation: Vector3<i32>) -> Self {
        Self {
            rotation,
            translation,
        }
        .wrap()
    }

    /// Create identity operation
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Parse a coordinate triplet such as `"-y+1/2, x-y, z+1/3"`
    pub fn parse(triplet: &str) -> Result<Self> {
        let rows: Vec<&str> = triplet.split(',').collect();
        if rows.len() != 3 {
            return Err(Error::InvalidTriplet(triplet.to_string()));
        }

        let mut rotation = Matrix3::zeros();
        let mut translation = Vector3::zeros();
        for (i, row) in rows.iter().enumerate() {
            let (coeffs, shift) =
                parse_row(row).ok_or_else(|| Error::InvalidTriplet(triplet.to_string()))?;
            for (j, c) in coeffs.iter().enumerate() {
                rotation[(i, j)] = *c;
            }
            translation[i] = shift;
        }
        Ok(Self::new(rotation, translation))
    }

    /// Render as a lowercase coordinate triplet, e.g. `-y+1/2,x-y,z+1/3`
    pub fn triplet(&self) -> String {
        (0..3)
            .map(|i| format_row(self.rotation.row(i).iter().copied(), self.translation[i]))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Determinant of the rotation part
    pub fn det(&self) -> i32 {
        let r = &self.rotation;
        r[(0, 0)] * (r[(1, 1)] * r[(2, 2)] - r[(1, 2)] * r[(2, 1)])
            - r[(0, 1)] * (r[(1, 0)] * r[(2, 2)] - r[(1, 2)] * r[(2, 0)])
            + r[(0, 2)] * (r[(1, 0)] * r[(2, 1)] - r[(1, 1)] * r[(2, 0)])
    }

    /// Check that the rotation is unimodular (|det| = 1)
    pub fn is_unimodular(&self) -> bool {
        self.det().abs() == 1
    }

    /// Fail with `InvalidOperator` unless the rotation is unimodular
    pub fn validate(&self) -> Result<()> {
        if self.is_unimodular() {
            Ok(())
        } else {
            Err(Error::InvalidOperator {
                op: self.triplet(),
                det: self.det(),
            })
        }
    }

    /// Apply the operator to a Miller index (reciprocal space, `h' = h·R`)
    pub fn apply_to_hkl(&self, hkl: &MillerIndex) -> Result<MillerIndex> {
        self.validate()?;
        Ok(self.rotate_hkl(hkl))
    }

    /// Rotate a Miller index without validating the operator.
    ///
    /// Space groups validate their operators on construction and use this in hot loops.
    pub fn rotate_hkl(&self, hkl: &MillerIndex) -> MillerIndex {
        self.rotation.transpose() * hkl
    }

    /// Phase shift in degrees picked up by a reflection mapped with this operator
    pub fn phase_shift(&self, hkl: &MillerIndex) -> f64 {
        -360.0 * f64::from(hkl.dot(&self.translation)) / f64::from(DEN)
    }

    /// Composition `self ∘ other`: apply `other` first, then `self`
    pub fn compose(&self, other: &Self) -> Self {
        Self::new(
            self.rotation * other.rotation,
            self.rotation * other.translation + self.translation,
        )
    }

    /// Inverse operation.
    ///
    /// Fails with `InvalidOperator` when the rotation has no integer inverse.
    pub fn inverse(&self) -> Result<Self> {
        self.validate()?;
        let r = &self.rotation;
        let det = self.det();
        // adjugate / det, exact for unimodular matrices
        let mut inv = Matrix3::zeros();
        for i in 0..3 {
            for j in 0..3 {
                let (a, b) = ((j + 1) % 3, (j + 2) % 3);
                let (c, d) = ((i + 1) % 3, (i + 2) % 3);
                inv[(i, j)] = (r[(a, c)] * r[(b, d)] - r[(a, d)] * r[(b, c)]) * det;
            }
        }
        Ok(Self::new(inv, -(inv * self.translation)))
    }

    /// Get the order of this symmetry operation (how many times to apply to get identity)
    pub fn order(&self) -> usize {
        let mut power = *self;
        let mut n = 1;
        while !power.is_identity() && n < 2 * DEN as usize {
            power = power.compose(self);
            n += 1;
        }
        n
    }

    /// Check if this is the identity operation
    pub fn is_identity(&self) -> bool {
        self.rotation == Matrix3::identity() && self.translation == Vector3::zeros()
    }

    /// Reduce the translation to [0, 1)
    pub fn wrap(mut self) -> Self {
        self.translation = self.translation.map(|t| t.rem_euclid(DEN));
        self
    }

    /// Same operator shifted by a centering vector (1/24 units)
    pub fn translated(&self, shift: &Vector3<i32>) -> Self {
        Self::new(self.rotation, self.translation + shift)
    }

    /// Rotation with the sign flipped when improper, i.e. the proper part of `±R`
    pub fn proper_rotation(&self) -> Matrix3<i32> {
        if self.det() < 0 {
            -self.rotation
        } else {
            self.rotation
        }
    }
}

impl Default for SymOp {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Display for SymOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.triplet())
    }
}

fn parse_row(row: &str) -> Option<([i32; 3], i32)> {
    let chars: Vec<char> = row
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if chars.is_empty() {
        return None;
    }

    let mut coeffs = [0i32; 3];
    let mut shift = 0;
    let mut i = 0;
    while i < chars.len() {
        let sign = match chars[i] {
            '+' => {
                i += 1;
                1
            }
            '-' => {
                i += 1;
                -1
            }
            _ => 1,
        };
        let c = *chars.get(i)?;
        match c {
            'x' | 'y' | 'z' => {
                coeffs[(c as u8 - b'x') as usize] += sign;
                i += 1;
            }
            _ if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '/' || chars[i] == '.') {
                    i += 1;
                }
                let number: String = chars[start..i].iter().collect();
                let value = parse_fraction(&number)?;
                // "2x" style coefficients
                if let Some(&v) = chars.get(i) {
                    if matches!(v, 'x' | 'y' | 'z') {
                        if value % DEN != 0 {
                            return None;
                        }
                        let axis = (v as u8 - b'x') as usize;
                        coeffs[axis] = coeffs[axis].checked_add(sign * value / DEN)?;
                        i += 1;
                        continue;
                    }
                    if v == '*' {
                        let w = *chars.get(i + 1)?;
                        if !matches!(w, 'x' | 'y' | 'z') || value % DEN != 0 {
                            return None;
                        }
                        let axis = (w as u8 - b'x') as usize;
                        coeffs[axis] = coeffs[axis].checked_add(sign * value / DEN)?;
                        i += 2;
                        continue;
                    }
                }
                shift = i32::checked_add(shift, sign * value)?;
            }
            _ => return None,
        }
    }
    Some((coeffs, shift))
}

/// Parse `1/2`, `0.5` or `1` into 1/24 units; `None` on overflow
fn parse_fraction(text: &str) -> Option<i32> {
    if let Some((num, den)) = text.split_once('/') {
        let num: i32 = num.parse().ok()?;
        let den: i32 = den.parse().ok()?;
        let scaled = num.checked_mul(DEN)?;
        if den == 0 || scaled % den != 0 {
            return None;
        }
        scaled.checked_div(den)
    } else if text.contains('.') {
        let value: f64 = text.parse().ok()?;
        let scaled = value * f64::from(DEN);
        if !scaled.is_finite()
            || (scaled - scaled.round()).abs() > 1e-6
            || scaled.abs() > f64::from(i32::MAX)
        {
            return None;
        }
        Some(scaled.round() as i32)
    } else {
        text.parse::<i32>().ok()?.checked_mul(DEN)
    }
}

fn format_row(coeffs: impl Iterator<Item = i32>, shift: i32) -> String {
    let mut out = String::new();
    for (c, var) in coeffs.zip(['x', 'y', 'z']) {
        match c {
            0 => continue,
            1 => out.push('+'),
            -1 => out.push('-'),
            c if c > 0 => out.push_str(&format!("+{c}")),
            c => out.push_str(&format!("{c}")),
        }
        out.push(var);
    }
    if shift != 0 {
        let g = gcd(shift.abs(), DEN);
        let (num, den) = (shift / g, DEN / g);
        if den == 1 {
            out.push_str(&format!("{num:+}"));
        } else {
            out.push_str(&format!("{num:+}/{den}"));
        }
    }
    if out.is_empty() {
        return "0".to_string();
    }
    out.strip_prefix('+').map(str::to_string).unwrap_or(out)
}

fn gcd(a: i32, b: i32) -> i32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}
