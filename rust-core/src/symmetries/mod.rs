// Symmetries module: Contains symmetry operations, space groups and the reciprocal ASU
// This module is the symmetry library that reflection tables build on

// ======================== MODULE DECLARATIONS ========================
pub mod reciprocal_asu;
pub mod space_group_catalog;
pub mod space_groups;
pub mod symmetry_operations;

mod _tests_symmetry_operations;

// ======================== SYMMETRY OPERATIONS ========================
pub use symmetry_operations::SymOp; // struct - crystallographic symmetry operation (rotation + translation in 1/24 units)
// SymOp impl methods:
//   new(rotation: Matrix3<i32>, translation: Vector3<i32>) -> Self  - creates operation, translation wrapped to [0, 1)
//   identity() -> Self                                              - creates identity symmetry operation
//   parse(triplet: &str) -> Result<Self>                            - parses "-y+1/2,x-y,z+1/3" style text
//   triplet(&self) -> String                                        - renders back to lowercase triplet text
//   det(&self) -> i32 / is_unimodular(&self) -> bool / validate(&self) -> Result<()>
//   apply_to_hkl(&self, hkl: &MillerIndex) -> Result<MillerIndex>   - validated reciprocal-space action h' = h·R
//   rotate_hkl(&self, hkl: &MillerIndex) -> MillerIndex             - unchecked reciprocal-space action
//   phase_shift(&self, hkl: &MillerIndex) -> f64                    - phase shift in degrees, -360·h·t
//   compose(&self, other: &Self) -> Self                            - composes two operations (other first)
//   inverse(&self) -> Result<Self>                                  - returns inverse operation
//   order(&self) -> usize                                           - smallest n with op^n = identity
//   is_identity(&self) -> bool

// ======================== SPACE GROUPS ========================
pub use space_groups::{
    SpaceGroup,         // struct - number, symbols and full operator list (identity first)
    centering_vectors,  // fn(lattice: char) -> Option<Vec<Vector3<i32>>> - lattice centering translations
};
// SpaceGroup impl methods:
//   from_ops(number, hm, point_group, ops) -> Result<Self>         - validated explicit operator list
//   from_generators(number, hm, point_group, gens, centering) -> Result<Self> - closes generators into a group
//   from_number(number: u16) -> Result<Self>                       - catalog lookup by number
//   from_hm(symbol: &str) -> Result<Self>                          - catalog lookup by symbol
//   p1() -> Self                                                   - triclinic P 1
//   ops(&self) -> &[SymOp] / order(&self) -> usize / n_primitive_ops(&self) -> usize
//   lattice_type(&self) -> char / centering_vectors(&self) -> Vec<Vector3<i32>>
//   is_centrosymmetric(&self) -> bool
//   is_centric(&self, hkl: &MillerIndex) -> bool                  - some op maps hkl onto -hkl
//   laue_class(&self) -> LaueClass

pub use space_group_catalog::{CatalogEntry, CATALOG};

// ======================== RECIPROCAL ASU ========================
pub use reciprocal_asu::{
    LaueClass,      // enum - Laue classes in standard orientations
    ReciprocalAsu,  // struct - CCP4 reciprocal asymmetric unit for a Laue class
    UniqueAxis,     // enum - monoclinic unique axis
};
