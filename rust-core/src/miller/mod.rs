// Miller module: Utilities on Miller indices under a space group
// ASU canonicalization, Friedel mates, systematic absences and epsilon factors

// ======================== MODULE DECLARATIONS ========================
pub mod asu_mapping;
pub mod miller_index;

// Test modules
mod _tests_asu_mapping;

// ======================== MILLER INDICES ========================
pub use miller_index::{
    MillerIndex,      // type - Vector3<i32>
    epsilon,          // fn(hkl, sg) -> i32 - number of rotations fixing hkl
    is_absent,        // fn(hkl, sg) -> bool - systematic absence
    is_friedel_pair,  // fn(a, b) -> bool - b == -a
    negate,           // fn(hkl) -> MillerIndex - Friedel mate
    wrap_phase,       // fn(phase) -> f64 - phase into [-180, 180)
};

// ======================== ASU MAPPING ========================
pub use asu_mapping::{
    AsuMapper,   // struct - per-space-group mapper to and from the reciprocal ASU
    AsuMapping,  // struct - ASU index, M/ISYM code, phase shift, Friedel flag
    from_asu,    // fn(hkl_asu, isym, sg) -> Result<AsuMapping> - inverse mapping
    to_asu,      // fn(hkl, sg) -> AsuMapping - forward mapping
};
// AsuMapping impl methods:
//   op_index(&self) -> usize                - operator index encoded in isym
//   apply_phase(&self, phase) -> f64        - observed phase to ASU phase
//   revert_phase(&self, phase) -> f64       - ASU phase to observed phase
// AsuMapper impl methods:
//   new(sg: &SpaceGroup) -> Self
//   map(&self, hkl) -> AsuMapping           - first operator (plus, then minus) landing in the ASU
//   unmap(&self, hkl_asu, isym) -> Result<AsuMapping> - InvalidIsym for out-of-range codes
//   contains(&self, hkl) -> bool           - hkl is its own ASU representative
