use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::miller::miller_index::MillerIndex;
use crate::symmetries::{ReciprocalAsu, SpaceGroup, SymOp};

/// Result of mapping one observed reflection into the reciprocal ASU
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AsuMapping {
    /// Index inside the ASU (or the observed index, for the inverse mapping)
    pub hkl: MillerIndex,
    /// MTZ M/ISYM code: 2·op+1 for the plus image, 2·op+2 for the Friedel mate
    pub isym: i32,
    /// Phase shift of the operator evaluated at the observed index, in degrees
    pub phase_shift: f64,
    /// Whether the Friedel mate of the rotated index was taken
    pub friedel: bool,
}

impl AsuMapping {
    /// Operator index encoded in `isym`
    pub fn op_index(&self) -> usize {
        ((self.isym - 1) / 2) as usize
    }

    /// Phase of the ASU reflection given the observed phase
    pub fn apply_phase(&self, phase: f64) -> f64 {
        let shifted = phase + self.phase_shift;
        if self.friedel {
            -shifted
        } else {
            shifted
        }
    }

    /// Observed phase given the phase stored at the ASU reflection
    pub fn revert_phase(&self, phase: f64) -> f64 {
        let unflipped = if self.friedel { -phase } else { phase };
        unflipped - self.phase_shift
    }
}

/// Maps reflections of one space group to and from its reciprocal ASU.
///
/// Holds the operator list and ASU so per-row mapping does not rebuild them.
#[derive(Debug, Clone)]
pub struct AsuMapper {
    asu: ReciprocalAsu,
    ops: Vec<SymOp>,
}

impl AsuMapper {
    pub fn new(spacegroup: &SpaceGroup) -> Self {
        Self {
            asu: ReciprocalAsu::new(spacegroup),
            ops: spacegroup.ops().to_vec(),
        }
    }

    pub fn asu(&self) -> &ReciprocalAsu {
        &self.asu
    }

    pub fn n_ops(&self) -> usize {
        self.ops.len()
    }

    /// Whether `hkl` is its own representative (inside the ASU)
    pub fn contains(&self, hkl: &MillerIndex) -> bool {
        if self.asu.is_tabulated() {
            self.asu.is_in(hkl)
        } else {
            self.map_lexicographic(hkl).hkl == *hkl
        }
    }

    /// Map an observed index into the ASU.
    ///
    /// Operators are tried in group order, the plus image before its Friedel
    /// mate; the first candidate inside the ASU wins. Groups in non-standard
    /// settings fall back to the lexicographically largest equivalent.
    pub fn map(&self, hkl: &MillerIndex) -> AsuMapping {
        if self.asu.is_tabulated() {
            for (i, op) in self.ops.iter().enumerate() {
                let plus = op.rotate_hkl(hkl);
                for (friedel, candidate) in [(false, plus), (true, -plus)] {
                    if self.asu.is_in(&candidate) {
                        return self.mapping(i, op, hkl, candidate, friedel);
                    }
                }
            }
        }
        self.map_lexicographic(hkl)
    }

    fn map_lexicographic(&self, hkl: &MillerIndex) -> AsuMapping {
        let key = |m: &MillerIndex| (m.x, m.y, m.z);
        let mut best: Option<(usize, MillerIndex, bool)> = None;
        for (i, op) in self.ops.iter().enumerate() {
            let plus = op.rotate_hkl(hkl);
            for (friedel, candidate) in [(false, plus), (true, -plus)] {
                let better = match &best {
                    Some((_, current, _)) => key(&candidate) > key(current),
                    None => true,
                };
                if better {
                    best = Some((i, candidate, friedel));
                }
            }
        }
        match best {
            Some((i, candidate, friedel)) => self.mapping(i, &self.ops[i], hkl, candidate, friedel),
            None => AsuMapping {
                hkl: *hkl,
                isym: 1,
                phase_shift: 0.0,
                friedel: false,
            },
        }
    }

    fn mapping(
        &self,
        i: usize,
        op: &SymOp,
        observed: &MillerIndex,
        candidate: MillerIndex,
        friedel: bool,
    ) -> AsuMapping {
        AsuMapping {
            hkl: candidate,
            isym: 2 * i as i32 + if friedel { 2 } else { 1 },
            phase_shift: op.phase_shift(observed),
            friedel,
        }
    }

    /// Recover the observed index from an ASU index and its M/ISYM code.
    ///
    /// The returned mapping's `hkl` is the observed index; its phase helpers
    /// convert between the two phases exactly as `map` does.
    pub fn unmap(&self, hkl_asu: &MillerIndex, isym: i32) -> Result<AsuMapping> {
        let n_ops = self.ops.len();
        if isym < 1 || isym as usize > 2 * n_ops {
            return Err(Error::InvalidIsym { isym, n_ops });
        }
        let i = ((isym - 1) / 2) as usize;
        let friedel = isym % 2 == 0;
        let op = &self.ops[i];
        let image = if friedel { -hkl_asu } else { *hkl_asu };
        let observed = op.inverse()?.rotate_hkl(&image);
        Ok(AsuMapping {
            hkl: observed,
            isym,
            phase_shift: op.phase_shift(&observed),
            friedel,
        })
    }
}

/// Map one index into the ASU of `spacegroup`
pub fn to_asu(hkl: &MillerIndex, spacegroup: &SpaceGroup) -> AsuMapping {
    AsuMapper::new(spacegroup).map(hkl)
}

/// Inverse of [`to_asu`]
pub fn from_asu(hkl_asu: &MillerIndex, isym: i32, spacegroup: &SpaceGroup) -> Result<AsuMapping> {
    AsuMapper::new(spacegroup).unmap(hkl_asu, isym)
}
