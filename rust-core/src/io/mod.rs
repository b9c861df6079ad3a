// IO module: File codecs for reflection tables
// MTZ binary read/write and the plain-text SHELX HKL writer

// ======================== MODULE DECLARATIONS ========================
pub mod hkl;
pub mod mtz;
pub mod mtz_header;

mod _tests_mtz;

use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};

// ======================== RE-EXPORTS ========================
pub use hkl::write_hkl; // fn(table, path, value, sigma, batch) -> Result<()> - SHELX HKLF-4 text
pub use mtz::{
    decode_mtz,  // fn(bytes, path, config) -> Result<ReflectionTable> - parse an in-memory MTZ image
    encode_mtz,  // fn(table, config, endian) -> Result<Vec<u8>> - build an MTZ image
    read_mtz,    // fn(path, config) -> Result<ReflectionTable>
    write_mtz,   // fn(table, path, config) -> Result<()> - little-endian, atomic
};
pub use mtz_header::{ColumnRecord, Endian, MtzHeader, SymmetryInfo};

/// Write `bytes` to `path` through a temporary file in the same directory.
///
/// The destination only changes once the whole file has been written.
pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
