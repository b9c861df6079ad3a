//! Reciprocal-space reflection data library
//!
//! This library provides symmetry-aware tables of crystallographic reflections:
//! Miller index reduction to the reciprocal asymmetric unit, Friedel pair handling,
//! resolution calculations and lossless MTZ file I/O.

pub mod config;
pub mod dataset;
pub mod error;
pub mod io;
pub mod lattice;
pub mod miller;
pub mod symmetries;

pub use dataset::{ColumnType, ColumnValues, ReflectionTable, Series};
pub use error::{Error, Result};
pub use lattice::UnitCell;
pub use miller::MillerIndex;
pub use symmetries::{SpaceGroup, SymOp};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
