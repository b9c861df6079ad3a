use nalgebra::Vector3;

use crate::config::TRANSLATION_DENOMINATOR as DEN;
use crate::symmetries::SpaceGroup;

/// Miller index (h, k, l)
pub type MillerIndex = Vector3<i32>;

/// Friedel mate of a reflection
pub fn negate(hkl: &MillerIndex) -> MillerIndex {
    -hkl
}

/// True iff `b == -a`. The origin is its own Friedel mate.
pub fn is_friedel_pair(a: &MillerIndex, b: &MillerIndex) -> bool {
    *b == -a
}

/// Wrap a phase in degrees into [-180, 180)
pub fn wrap_phase(phase: f64) -> f64 {
    (phase + 180.0).rem_euclid(360.0) - 180.0
}

/// Systematically absent: some operator fixes `hkl` but shifts its phase
/// by a non-integral number of turns.
pub fn is_absent(hkl: &MillerIndex, spacegroup: &SpaceGroup) -> bool {
    spacegroup.ops().iter().any(|op| {
        op.rotate_hkl(hkl) == *hkl && hkl.dot(&op.translation).rem_euclid(DEN) != 0
    })
}

/// Epsilon factor: number of distinct rotations leaving `hkl` unchanged
pub fn epsilon(hkl: &MillerIndex, spacegroup: &SpaceGroup) -> i32 {
    spacegroup
        .rotations()
        .iter()
        .filter(|r| r.transpose() * hkl == *hkl)
        .count() as i32
}
