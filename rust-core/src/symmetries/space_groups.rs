use log::debug;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::TRANSLATION_DENOMINATOR as DEN;
use crate::error::{Error, Result};
use crate::miller::MillerIndex;
use crate::symmetries::reciprocal_asu::LaueClass;
use crate::symmetries::space_group_catalog::{find_entry, CatalogEntry, CATALOG};
use crate::symmetries::symmetry_operations::SymOp;

/// Upper bound on the size of a crystallographic space group (Fm-3m has 192 operators)
const MAX_GROUP_ORDER: usize = 192;

/// A space group: identifying symbols plus its full operator list.
///
/// Operators are stored with the identity first and include the centering
/// translations, in the same way they are listed in MTZ `SYMM` records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceGroup {
    /// International Tables number (0 if unknown)
    pub number: u16,
    /// Hermann–Mauguin symbol, e.g. `P 43 21 2`
    pub hm: String,
    /// Point group symbol without the `PG` prefix, e.g. `422`
    pub point_group: String,
    ops: Vec<SymOp>,
}

impl SpaceGroup {
    /// Build a space group from an explicit operator list.
    ///
    /// Every operator must be unimodular. Duplicates are dropped and the identity
    /// is moved to the front (inserted if missing). The list is not checked for closure.
    pub fn from_ops(
        number: u16,
        hm: impl Into<String>,
        point_group: impl Into<String>,
        ops: Vec<SymOp>,
    ) -> Result<Self> {
        let mut unique: Vec<SymOp> = vec![SymOp::identity()];
        for op in ops {
            op.validate()?;
            let op = op.wrap();
            if !unique.contains(&op) {
                unique.push(op);
            }
        }
        Ok(Self {
            number,
            hm: hm.into(),
            point_group: point_group.into(),
            ops: unique,
        })
    }

    /// Build a space group by closing a set of generators and adding lattice centering.
    ///
    /// `centering` is the lattice letter: P, A, B, C, I, F or R (hexagonal axes).
    pub fn from_generators(
        number: u16,
        hm: impl Into<String>,
        point_group: impl Into<String>,
        generators: &[&str],
        centering: char,
    ) -> Result<Self> {
        let hm = hm.into();
        let mut ops = vec![SymOp::identity()];
        for text in generators {
            let op = SymOp::parse(text)?;
            op.validate()?;
            if !ops.contains(&op) {
                ops.push(op);
            }
        }

        // Close under composition
        loop {
            let mut added = false;
            let n = ops.len();
            for i in 0..n {
                for j in 0..n {
                    let product = ops[i].compose(&ops[j]);
                    if !ops.contains(&product) {
                        ops.push(product);
                        added = true;
                    }
                }
            }
            if ops.len() > MAX_GROUP_ORDER {
                return Err(Error::UnknownSpaceGroup(format!(
                    "generators of {hm} do not close into a finite group"
                )));
            }
            if !added {
                break;
            }
        }

        let vectors = centering_vectors(centering)
            .ok_or_else(|| Error::UnknownSpaceGroup(format!("lattice centering '{centering}'")))?;
        let primitive = ops.clone();
        for shift in vectors.iter().skip(1) {
            for op in &primitive {
                let centered = op.translated(shift);
                // generators of centered groups may already produce some of these
                if !ops.contains(&centered) {
                    ops.push(centered);
                }
            }
        }

        debug!("Built space group {} ({} operators)", hm, ops.len());
        Ok(Self {
            number,
            hm,
            point_group: point_group.into(),
            ops,
        })
    }

    /// Look up a space group in the built-in catalog by its number
    pub fn from_number(number: u16) -> Result<Self> {
        let entry = CATALOG
            .iter()
            .find(|e| e.number == number)
            .ok_or_else(|| Error::UnknownSpaceGroup(number.to_string()))?;
        Self::from_entry(entry)
    }

    /// Look up a space group by Hermann–Mauguin symbol (full or short, spacing ignored)
    pub fn from_hm(symbol: &str) -> Result<Self> {
        let entry = find_entry(symbol).ok_or_else(|| Error::UnknownSpaceGroup(symbol.to_string()))?;
        Self::from_entry(entry)
    }

    /// Triclinic P 1
    pub fn p1() -> Self {
        Self {
            number: 1,
            hm: "P 1".to_string(),
            point_group: "1".to_string(),
            ops: vec![SymOp::identity()],
        }
    }

    fn from_entry(entry: &CatalogEntry) -> Result<Self> {
        Self::from_generators(
            entry.number,
            entry.hm,
            entry.point_group,
            entry.generators,
            entry.centering(),
        )
    }

    /// All operators, identity first
    pub fn ops(&self) -> &[SymOp] {
        &self.ops
    }

    /// Number of operators including centering
    pub fn order(&self) -> usize {
        self.ops.len()
    }

    /// Lattice letter taken from the Hermann–Mauguin symbol
    pub fn lattice_type(&self) -> char {
        self.hm
            .chars()
            .find(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('P')
    }

    /// Pure translations of the group (the zero vector included)
    pub fn centering_vectors(&self) -> Vec<Vector3<i32>> {
        self.ops
            .iter()
            .filter(|op| op.rotation == Matrix3::identity())
            .map(|op| op.translation)
            .collect()
    }

    /// Number of operators modulo centering
    pub fn n_primitive_ops(&self) -> usize {
        self.ops.len() / self.centering_vectors().len().max(1)
    }

    /// Distinct rotation matrices of the group
    pub fn rotations(&self) -> Vec<Matrix3<i32>> {
        let mut rotations: Vec<Matrix3<i32>> = Vec::new();
        for op in &self.ops {
            if !rotations.contains(&op.rotation) {
                rotations.push(op.rotation);
            }
        }
        rotations
    }

    /// Whether the group contains the inversion
    pub fn is_centrosymmetric(&self) -> bool {
        self.ops.iter().any(|op| op.rotation == -Matrix3::identity())
    }

    /// True iff some operator maps `hkl` onto its Friedel mate `-hkl`
    pub fn is_centric(&self, hkl: &MillerIndex) -> bool {
        let mate = -hkl;
        self.ops.iter().any(|op| op.rotate_hkl(hkl) == mate)
    }

    /// Laue class of the group, derived from its rotations
    pub fn laue_class(&self) -> LaueClass {
        LaueClass::classify(&self.rotations())
    }
}

impl fmt::Display for SpaceGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.hm, self.number)
    }
}

/// Lattice centering vectors in 1/24 units, the zero vector first
pub fn centering_vectors(lattice: char) -> Option<Vec<Vector3<i32>>> {
    let h = DEN / 2;
    let (t1, t2) = (DEN / 3, 2 * DEN / 3);
    let vectors = match lattice.to_ascii_uppercase() {
        'P' => vec![],
        'A' => vec![Vector3::new(0, h, h)],
        'B' => vec![Vector3::new(h, 0, h)],
        'C' => vec![Vector3::new(h, h, 0)],
        'I' => vec![Vector3::new(h, h, h)],
        'F' => vec![Vector3::new(0, h, h), Vector3::new(h, 0, h), Vector3::new(h, h, 0)],
        'R' | 'H' => vec![Vector3::new(t2, t1, t1), Vector3::new(t1, t2, t2)],
        _ => return None,
    };
    let mut all = vec![Vector3::zeros()];
    all.extend(vectors);
    Some(all)
}
