// Lattice module: Contains the unit cell and its metric
// Real and reciprocal metric tensors feed resolution calculations for reflection tables

// ======================== MODULE DECLARATIONS ========================
pub mod unit_cell;

// Test modules
mod _tests_unit_cell;

// ======================== UNIT CELL ========================
pub use unit_cell::UnitCell; // struct - six cell parameters (Å, degrees)
// UnitCell impl methods:
//   new(a, b, c, alpha, beta, gamma) -> Self                      - constructs cell without validation
//   from_parameters(p: [f64; 6]) -> Self / parameters(&self) -> [f64; 6]
//   volume(&self) -> f64                                          - cell volume, 0 for impossible angles
//   is_crystal(&self) -> bool / validate(&self) -> Result<()>     - positive volume check (DegenerateCell)
//   orthogonalization_matrix(&self) -> Result<Matrix3<f64>>       - basis vectors as columns (PDB convention)
//   fractionalization_matrix(&self) -> Result<Matrix3<f64>>       - inverse of the above
//   metric_tensor(&self) -> Result<Matrix3<f64>>                  - G = A^T * A
//   reciprocal_metric_tensor(&self) -> Result<Matrix3<f64>>       - G* = G^-1
//   reciprocal(&self) -> Result<UnitCell>                         - reciprocal cell parameters
//   one_over_d2(&self, hkl) -> Result<f64> / d_spacing(&self, hkl) -> Result<f64>
//   d_spacings(&self, hkls: &[MillerIndex]) -> Result<Vec<f64>>   - batched resolution calculation
